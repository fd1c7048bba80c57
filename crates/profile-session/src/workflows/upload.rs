//! Avatar upload with synthetic progress.
//!
//! An upload opens an [`UploadSession`] carrying a progress ticker. The
//! ticker climbs to the configured cap while the upload call is in flight;
//! success jumps to 100 and hides the bar after a short delay, failure drops
//! the bar at once. Either way the view settles back on the profile form.

use crate::errors::SessionError;
use crate::events::{EventBus, Notice, SessionEvent};
use crate::model::{MediaSelection, MediaSource, ProfileField};
use crate::ports::PortError;
use crate::progress::{Advance, ProgressTicker};
use crate::session::{
    ActiveOperation, LivenessToken, Outcome, ProfileEditSession, Rejection, SessionInner,
    SessionState, UploadSession,
};
use crate::views::ViewEvent;
use std::sync::{Arc, Weak};

/// Upload claimed under the lock, ready to run
#[derive(Debug)]
struct PendingUpload {
    token: LivenessToken,
    upload_id: u64,
    user_id: String,
    image: String,
    source: Option<MediaSource>,
}

impl ProfileEditSession {
    /// Upload `image` as the new avatar.
    ///
    /// `image` falls back to the pending selection. Also reached by
    /// [`Self::confirm_selection`] for portfolio items.
    pub async fn confirm_upload(
        &self,
        image: Option<String>,
        source: Option<MediaSource>,
    ) -> Outcome {
        self.upload_image(None, image, source).await
    }

    /// Run an upload. `claim` is the library pick's token when the upload
    /// continues that operation rather than starting from a user action.
    pub(crate) async fn upload_image(
        &self,
        claim: Option<LivenessToken>,
        image: Option<String>,
        source: Option<MediaSource>,
    ) -> Outcome {
        let pending = {
            let mut state = self.inner.state.lock();
            match self.start_upload(&mut state, claim, image, source) {
                Ok(pending) => pending,
                Err(outcome) => return outcome,
            }
        };
        tracing::info!(
            upload_id = pending.upload_id,
            source = ?pending.source,
            "avatar upload started"
        );

        self.start_ticker(&pending);

        let result = self
            .inner
            .ports
            .uploader
            .upload(&pending.user_id, &pending.image)
            .await;

        match result {
            Ok(url) => self.settle_success(&pending, url),
            Err(err) => self.settle_failure(&pending, &err),
        }
    }

    fn start_upload(
        &self,
        state: &mut SessionState,
        claim: Option<LivenessToken>,
        image: Option<String>,
        source: Option<MediaSource>,
    ) -> Result<PendingUpload, Outcome> {
        match claim {
            None => state.ensure_active()?,
            // The pick may have returned after the panel closed
            Some(token) if state.in_cycle(token) => {}
            Some(token) if state.is_live(token) => return Err(Outcome::Canceled),
            Some(_) => return Err(Outcome::Detached),
        }
        match state.operation {
            // Leave the running upload's claim untouched
            ActiveOperation::Uploading => return Err(Rejection::AlreadyUploading.into()),
            ActiveOperation::None | ActiveOperation::AcquiringLibrary => {}
            _ => return Err(Rejection::Busy.into()),
        }

        let image = image
            .filter(|image| !image.trim().is_empty())
            .or_else(|| state.selection.local_image_reference().map(str::to_owned))
            .filter(|image| !image.trim().is_empty());
        let Some(image) = image else {
            state.operation = ActiveOperation::None;
            return Err(Rejection::NoImage.into());
        };

        if !state.committed.has_identity() {
            state.operation = ActiveOperation::None;
            self.inner
                .events
                .notice(Notice::error("Missing Data", "No valid user to upload to"));
            return Err(Outcome::failed(SessionError::MissingIdentity));
        }

        state.operation = ActiveOperation::Uploading;
        state.upload_seq += 1;
        let upload_id = state.upload_seq;
        if let Some(mut previous) = state.upload.replace(UploadSession::new(upload_id)) {
            // Still waiting on its hide delay
            previous.stop_ticker();
        }
        self.inner
            .events
            .emit(SessionEvent::UploadProgress { percent: 0 });

        Ok(PendingUpload {
            token: state.token(),
            upload_id,
            user_id: state.committed.user_id.clone(),
            image,
            source: source.or_else(|| state.selection.source()),
        })
    }

    fn start_ticker(&self, pending: &PendingUpload) {
        let weak = Arc::downgrade(&self.inner);
        let token = pending.token;
        let upload_id = pending.upload_id;

        let handle = ProgressTicker::from_config(&self.inner.config.upload)
            .spawn(move |advance| tick(&weak, token, upload_id, advance));

        // Handle dropped (and ticker stopped) if the upload is already gone
        self.inner.with_live(token, move |state, _| {
            if let Some(upload) = state.upload.as_mut().filter(|u| u.id == upload_id) {
                upload.ticker = Some(handle);
            }
        });
    }

    fn settle_success(&self, pending: &PendingUpload, url: String) -> Outcome {
        let upload_id = pending.upload_id;
        let settled = self.inner.with_live(pending.token, |state, events| {
            if let Some(upload) = state.upload.as_mut().filter(|u| u.id == upload_id) {
                upload.stop_ticker();
                upload.progress = 100;
                upload.active = false;
                events.emit(SessionEvent::UploadProgress { percent: 100 });
            }
            state.committed.profile_pic_url = url.clone();
            if state.in_cycle(pending.token) {
                state.selection = MediaSelection::None;
                state.operation = ActiveOperation::None;
                settle_view(state, events);
            }
            state.committed.user_id.clone()
        });
        let Some(user_id) = settled else {
            return Outcome::Detached;
        };

        schedule_hide(
            Arc::downgrade(&self.inner),
            pending.token,
            upload_id,
            self.inner.config.upload.hide_delay(),
        );

        self.inner.ports.mutations.set_image(&user_id, &url);
        let events = &self.inner.events;
        events.emit(SessionEvent::FieldUpdated(ProfileField::Image));
        events.notice(Notice::success(
            "Success",
            "Profile picture updated successfully",
        ));
        tracing::info!(upload_id, "avatar upload completed");

        Outcome::Completed {
            updated: vec![ProfileField::Image],
        }
    }

    fn settle_failure(&self, pending: &PendingUpload, err: &PortError) -> Outcome {
        let upload_id = pending.upload_id;
        let settled = self.inner.with_live(pending.token, |state, events| {
            if state.upload.as_ref().is_some_and(|u| u.id == upload_id) {
                if let Some(mut upload) = state.upload.take() {
                    upload.stop_ticker();
                }
            }
            // Selection kept so the user can confirm again
            if state.in_cycle(pending.token) {
                state.operation = ActiveOperation::None;
                settle_view(state, events);
            }
        });
        if settled.is_none() {
            return Outcome::Detached;
        }

        tracing::warn!(upload_id, error = %err, "avatar upload failed");
        let message = err
            .user_message()
            .unwrap_or_else(|| "Failed to upload image".to_string());
        self.inner
            .events
            .notice(Notice::error("Upload Error", message.clone()));
        Outcome::failed(SessionError::Upload(message))
    }
}

/// One ticker step. Returns `false` once the upload is no longer running.
fn tick(
    weak: &Weak<SessionInner>,
    token: LivenessToken,
    upload_id: u64,
    advance: Advance,
) -> bool {
    let Some(inner) = weak.upgrade() else {
        return false;
    };
    inner
        .with_live(token, |state, events| match state.upload.as_mut() {
            Some(upload) if upload.id == upload_id && upload.active => {
                upload.progress = advance.apply(upload.progress);
                events.emit(SessionEvent::UploadProgress {
                    percent: upload.progress,
                });
                true
            }
            _ => false,
        })
        .unwrap_or(false)
}

fn settle_view(state: &mut SessionState, events: &EventBus) {
    if let Err(rejection) = state.fire_view(ViewEvent::UploadSettled, events) {
        tracing::warn!(%rejection, "upload settle transition refused");
    }
}

/// Drop the finished upload bar after `delay`, unless a newer upload or a
/// new session has replaced it.
fn schedule_hide(
    weak: Weak<SessionInner>,
    token: LivenessToken,
    upload_id: u64,
    delay: std::time::Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(inner) = weak.upgrade() else {
            return;
        };
        inner.with_live(token, |state, _| {
            if state.upload.as_ref().is_some_and(|u| u.id == upload_id && !u.active) {
                state.upload = None;
            }
        });
    });
}
