//! Display name and bio commits.
//!
//! Fields commit one at a time, username first. A failure stops the sequence
//! but does not roll back fields that already landed; the outcome lists them
//! so the host can reconcile.

use crate::errors::SessionError;
use crate::events::{Notice, SessionEvent};
use crate::model::ProfileField;
use crate::ports::PortError;
use crate::session::{ActiveOperation, LivenessToken, Outcome, ProfileEditSession, Rejection};

/// Field values to send, computed from the draft at commit time
#[derive(Debug)]
struct PendingCommit {
    token: LivenessToken,
    user_id: String,
    changes: Vec<(ProfileField, String)>,
}

impl ProfileEditSession {
    /// Commit changed draft fields to the profile store.
    ///
    /// With nothing to commit the panel just asks to close.
    pub async fn commit_profile(&self) -> Outcome {
        let pending = match self.start_commit() {
            Ok(Some(pending)) => pending,
            Ok(None) => {
                self.inner.events.notice(Notice::info(
                    "No Changes",
                    "No changes were made to your profile details.",
                ));
                self.request_close();
                return Outcome::done();
            }
            Err(rejection) => return rejection.into(),
        };

        let mut updated = Vec::with_capacity(pending.changes.len());
        for (field, value) in &pending.changes {
            let result = self.send_field(&pending.user_id, *field, value).await;
            if let Err(err) = result {
                return self.fail_commit(&pending, *field, &err, updated);
            }

            let live = self
                .inner
                .with_live(pending.token, |state, _| match field {
                    ProfileField::Username => state.committed.username = value.clone(),
                    ProfileField::Description => state.committed.description = value.clone(),
                    ProfileField::Image => {}
                })
                .is_some();
            // The store already has it, so the host hears about it either way
            self.inner.events.emit(SessionEvent::FieldUpdated(*field));
            updated.push(*field);
            tracing::info!(%field, "profile field committed");

            if !live {
                return Outcome::Detached;
            }
        }

        self.inner.finish(pending.token);
        self.inner.events.notice(Notice::success(
            "Profile Updated",
            "Your profile has been updated successfully",
        ));
        self.request_close();
        Outcome::Completed { updated }
    }

    /// Claim the mutation under the lock. `Ok(None)` means nothing changed.
    fn start_commit(&self) -> Result<Option<PendingCommit>, Rejection> {
        let mut state = self.inner.state.lock();
        state.ensure_active()?;
        if !state.committed.has_identity() {
            return Err(Rejection::MissingIdentity);
        }
        if state.guards().is_busy() {
            return Err(Rejection::Busy);
        }

        let mut changes = Vec::new();
        if let Some(username) = state.draft.username_change(&state.committed) {
            changes.push((ProfileField::Username, username));
        }
        if let Some(description) = state.draft.description_change(&state.committed) {
            changes.push((ProfileField::Description, description));
        }
        if changes.is_empty() {
            return Ok(None);
        }

        state.operation = ActiveOperation::MutatingProfile;
        tracing::debug!(fields = changes.len(), "profile commit started");
        Ok(Some(PendingCommit {
            token: state.token(),
            user_id: state.committed.user_id.clone(),
            changes,
        }))
    }

    async fn send_field(
        &self,
        user_id: &str,
        field: ProfileField,
        value: &str,
    ) -> Result<(), PortError> {
        let mutations = &self.inner.ports.mutations;
        match field {
            ProfileField::Username => mutations.set_username(user_id, value).await,
            ProfileField::Description => mutations.set_description(user_id, value).await,
            ProfileField::Image => {
                mutations.set_image(user_id, value);
                Ok(())
            }
        }
    }

    fn fail_commit(
        &self,
        pending: &PendingCommit,
        field: ProfileField,
        err: &PortError,
        updated: Vec<ProfileField>,
    ) -> Outcome {
        if self.inner.with_live(pending.token, |_, _| ()).is_none() {
            return Outcome::Detached;
        }
        self.inner.finish(pending.token);

        tracing::warn!(%field, error = %err, committed = updated.len(), "profile commit failed");
        let message = err
            .user_message()
            .unwrap_or_else(|| "An unknown error occurred during update.".to_string());
        self.inner
            .events
            .notice(Notice::error("Update Failed", message.clone()));
        Outcome::Failed {
            error: SessionError::Mutation { field, message },
            updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::session::test_support::{profile, quiet_session};
    use crate::{CommittedProfile, Outcome, ProfileField, Rejection, SessionEvent};

    #[tokio::test]
    async fn test_no_changes_asks_to_close() {
        let session = quiet_session();
        let mut events = session.subscribe();
        session.set_visible(true, &profile());
        session.set_display_name("  alice ");

        assert_eq!(session.commit_profile().await, Outcome::done());
        match events.try_recv().unwrap() {
            SessionEvent::Notice(notice) => assert_eq!(notice.title, "No Changes"),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(events.try_recv().unwrap(), SessionEvent::CloseRequested);
    }

    #[tokio::test]
    async fn test_commit_requires_identity() {
        let session = quiet_session();
        session.set_visible(
            true,
            &CommittedProfile {
                user_id: String::new(),
                ..profile()
            },
        );
        session.set_bio("new bio");

        assert_eq!(
            session.commit_profile().await,
            Outcome::Rejected(Rejection::MissingIdentity)
        );
    }

    #[tokio::test]
    async fn test_commits_username_then_description() {
        let session = quiet_session();
        session.set_visible(true, &profile());
        session.set_display_name("bob");
        session.set_bio("wagmi");

        let outcome = session.commit_profile().await;
        assert_eq!(
            outcome.updated_fields(),
            &[ProfileField::Username, ProfileField::Description]
        );
        let snapshot = session.snapshot();
        assert_eq!(snapshot.committed.username, "bob");
        assert_eq!(snapshot.committed.description, "wagmi");
        assert!(!snapshot.guards.is_processing);
        assert!(!session.has_unsaved_changes());
    }
}
