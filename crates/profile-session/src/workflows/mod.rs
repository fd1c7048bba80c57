//! # Session Workflows
//!
//! Async operations on [`ProfileEditSession`](crate::ProfileEditSession),
//! grouped by what they change:
//!
//! - [`acquisition`]: picking an avatar from the library or the portfolio
//! - [`upload`]: uploading the chosen image with synthetic progress
//! - [`profile`]: committing display name and bio
//!
//! Every workflow follows the same shape: claim the operation under the
//! state lock, release the lock, await the port, then apply the result only
//! if the session has not been torn down since. Results that outlive a close
//! still land; view and selection changes are skipped once a reopen has
//! started a new cycle. Each returns an
//! [`Outcome`](crate::Outcome); user-facing messages go out as
//! [`Notice`](crate::Notice) events.

pub mod acquisition;
pub mod profile;
pub mod upload;
