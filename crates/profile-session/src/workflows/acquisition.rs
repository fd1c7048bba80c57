//! Avatar acquisition: device library and remote portfolio.
//!
//! The library path is a single hop (pick, then upload). The portfolio path
//! walks the view machine: fetch and show the list, select an item, confirm
//! it, and only then upload.

use crate::errors::SessionError;
use crate::events::Notice;
use crate::model::{MediaSelection, MediaSource, PortfolioItem};
use crate::portfolio::{map_portfolio, PortfolioQuery};
use crate::ports::PickerOptions;
use crate::session::{ActiveOperation, LivenessToken, Outcome, ProfileEditSession, Rejection};
use crate::views::{ViewEvent, ViewState};

/// Inline message shown under the portfolio list when the fetch fails
pub const PORTFOLIO_ERROR_MESSAGE: &str = "Failed to load NFTs. Please try again.";

/// How a portfolio fetch ended
#[derive(Debug)]
enum FetchOutcome {
    Loaded(usize),
    Failed(SessionError),
    /// A later fetch or a cancel replaced this one
    Superseded,
    Detached,
}

impl ProfileEditSession {
    /// Pick an image from the device library and upload it.
    pub async fn acquire_from_library(&self) -> Outcome {
        let token = match self.inner.begin(ActiveOperation::AcquiringLibrary, |state| {
            let guards = state.guards();
            if guards.is_preparing_portfolio {
                return Err(Rejection::PreparingPortfolio);
            }
            if guards.is_busy() {
                return Err(Rejection::Busy);
            }
            Ok(())
        }) {
            Ok(token) => token,
            Err(rejection) => return rejection.into(),
        };
        self.hide_media_options();

        let picked = self
            .inner
            .ports
            .picker
            .pick_image(PickerOptions::avatar())
            .await;

        let uri = match picked {
            Ok(result) => result.into_uri(),
            Err(err) => {
                let released = self.inner.with_live(token, |state, events| {
                    if state.in_cycle(token) {
                        state.operation = ActiveOperation::None;
                    }
                    events.notice(Notice::error("Error picking image", err.to_string()));
                });
                if released.is_none() {
                    return Outcome::Detached;
                }
                tracing::warn!(error = %err, "image picker failed");
                return Outcome::failed(SessionError::picker(&err));
            }
        };

        let Some(uri) = uri else {
            let released = self.inner.with_live(token, |state, _| {
                if state.in_cycle(token) {
                    state.operation = ActiveOperation::None;
                }
            });
            return match released {
                Some(()) => Outcome::Canceled,
                None => Outcome::Detached,
            };
        };

        let selected = self.inner.with_live(token, |state, _| {
            // A reopen re-seeded the selection this pick was meant for
            if !state.in_cycle(token) {
                return false;
            }
            state.selection = MediaSelection::Library {
                local_image: uri.clone(),
            };
            true
        });
        match selected {
            Some(true) => {}
            Some(false) => return Outcome::Canceled,
            None => return Outcome::Detached,
        }

        // The AcquiringLibrary claim is handed over to the upload
        self.upload_image(Some(token), Some(uri), Some(MediaSource::Library))
            .await
    }

    /// Fetch the portfolio and open the list.
    ///
    /// The list opens whether or not the fetch succeeded; a failure shows as
    /// an inline error with a retry affordance.
    pub async fn prepare_portfolio(&self) -> Outcome {
        let token = match self.inner.begin(ActiveOperation::PreparingPortfolio, |state| {
            let guards = state.guards();
            if guards.is_preparing_portfolio {
                return Err(Rejection::PreparingPortfolio);
            }
            if guards.is_busy() {
                return Err(Rejection::Busy);
            }
            let from = state.view.current();
            if from != ViewState::ProfileEdit {
                return Err(Rejection::InvalidTransition {
                    from,
                    event: ViewEvent::PortfolioReady,
                });
            }
            Ok(())
        }) {
            Ok(token) => token,
            Err(rejection) => return rejection.into(),
        };
        self.hide_media_options();

        let fetched = self.fetch_portfolio(token).await;

        let opened = self.inner.with_live(token, |state, events| {
            if !state.in_cycle(token) {
                return;
            }
            if let Err(rejection) = state.fire_view(ViewEvent::PortfolioReady, events) {
                tracing::warn!(%rejection, "portfolio list could not open");
            }
            state.operation = ActiveOperation::None;
        });
        if opened.is_none() {
            return Outcome::Detached;
        }

        match fetched {
            FetchOutcome::Loaded(count) => {
                tracing::info!(count, "portfolio list opened");
                Outcome::done()
            }
            FetchOutcome::Superseded => Outcome::done(),
            FetchOutcome::Failed(error) => Outcome::failed(error),
            FetchOutcome::Detached => Outcome::Detached,
        }
    }

    /// Re-run the portfolio fetch from the inline error.
    pub async fn retry_portfolio(&self) -> Outcome {
        let token = {
            let state = self.inner.state.lock();
            if let Err(rejection) = state.ensure_active() {
                return rejection.into();
            }
            if state.portfolio.loading {
                return Rejection::Loading.into();
            }
            if state.guards().is_busy() {
                return Rejection::Busy.into();
            }
            state.token()
        };

        match self.fetch_portfolio(token).await {
            FetchOutcome::Loaded(count) => {
                tracing::info!(count, "portfolio reloaded");
                Outcome::done()
            }
            FetchOutcome::Superseded => Outcome::done(),
            FetchOutcome::Failed(error) => Outcome::failed(error),
            FetchOutcome::Detached => Outcome::Detached,
        }
    }

    /// Choose a portfolio item and move to the confirmation view.
    pub fn select_item(&self, item: PortfolioItem) -> Outcome {
        let mut state = self.inner.state.lock();
        if let Err(rejection) = state.ensure_idle() {
            return rejection.into();
        }
        if let Err(rejection) = state.view.can_fire(ViewEvent::SelectItem, state.guards()) {
            return rejection.into();
        }
        if !item.has_image() {
            tracing::debug!(item = %item.short_id(), "selected item has no image");
            self.inner.events.notice(Notice::info(
                "Invalid NFT",
                "This NFT does not have a valid image.",
            ));
            return Outcome::failed(SessionError::InvalidItem { id: item.id });
        }

        state.selection = MediaSelection::Portfolio { item };
        match state.fire_view(ViewEvent::SelectItem, &self.inner.events) {
            Ok(_) => Outcome::done(),
            Err(rejection) => rejection.into(),
        }
    }

    /// Upload the selected portfolio item.
    pub async fn confirm_selection(&self) -> Outcome {
        let image = {
            let state = self.inner.state.lock();
            if let Err(rejection) = state.ensure_idle() {
                return rejection.into();
            }
            match state.selection.selected_item() {
                Some(item) if item.has_image() => item.image_reference.clone(),
                _ => return Rejection::NoImage.into(),
            }
        };
        self.confirm_upload(Some(image), Some(MediaSource::Portfolio))
            .await
    }

    /// Back from confirmation to the list, dropping the selection.
    pub fn cancel_selection(&self) -> Outcome {
        self.fire_user_event(ViewEvent::Back)
    }

    /// Leave the portfolio flow, dropping the selection and the cache.
    pub fn cancel_flow(&self) -> Outcome {
        self.fire_user_event(ViewEvent::CancelFlow)
    }

    fn fire_user_event(&self, event: ViewEvent) -> Outcome {
        let mut state = self.inner.state.lock();
        if let Err(rejection) = state.ensure_active() {
            return rejection.into();
        }
        match state.fire_view(event, &self.inner.events) {
            Ok(_) => Outcome::done(),
            Err(rejection) => {
                tracing::debug!(?event, %rejection, "view event refused");
                rejection.into()
            }
        }
    }

    async fn fetch_portfolio(&self, token: LivenessToken) -> FetchOutcome {
        let started = self.inner.with_live(token, |state, _| {
            state.portfolio.loading = true;
            state.portfolio.error = None;
            state.portfolio.request_id += 1;
            let query = PortfolioQuery::for_owner(
                state.committed.user_id.clone(),
                &self.inner.config.portfolio,
            );
            (state.portfolio.request_id, query)
        });
        let Some((request_id, query)) = started else {
            return FetchOutcome::Detached;
        };

        let result = self.inner.ports.portfolio.fetch_portfolio(&query).await;
        let fallback = &self.inner.config.portfolio.fallback_name;

        self.inner
            .with_live(token, |state, _| {
                if state.portfolio.request_id != request_id {
                    tracing::debug!(request_id, "discarding superseded portfolio fetch");
                    return FetchOutcome::Superseded;
                }
                state.portfolio.loading = false;
                match result {
                    Ok(body) => {
                        state.portfolio.items = map_portfolio(body, fallback);
                        state.portfolio.error = None;
                        FetchOutcome::Loaded(state.portfolio.items.len())
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "portfolio fetch failed");
                        state.portfolio.items.clear();
                        state.portfolio.error = Some(PORTFOLIO_ERROR_MESSAGE.to_string());
                        FetchOutcome::Failed(SessionError::PortfolioFetch(err.to_string()))
                    }
                }
            })
            .unwrap_or(FetchOutcome::Detached)
    }
}
