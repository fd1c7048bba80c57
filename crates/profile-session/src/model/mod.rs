//! Session data model

mod media;
mod profile;

pub use media::{MediaSelection, MediaSource, PortfolioItem};
pub use profile::{CommittedProfile, ProfileDraft, ProfileField};
