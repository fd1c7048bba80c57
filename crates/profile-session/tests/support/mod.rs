#![allow(dead_code, missing_docs, clippy::unwrap_used)]
//! In-memory ports for scenario tests.
//!
//! Every port replies from a script and records what it was asked. Ports can
//! be held at a [`Gate`] so a test can act while a call is in flight.

use async_trait::async_trait;
use parking_lot::Mutex;
use profile_session::{
    AvatarUploader, CommittedProfile, MediaPicker, PickResult, PickerOptions, PortError,
    PortfolioQuery, PortfolioSource, ProfileEditSession, ProfileField, ProfileMutations,
    SessionConfig, SessionEvent, SessionPorts, UploadConfig,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

// ============================================================================
// Gate
// ============================================================================

/// Holds a port call until opened
#[derive(Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn closed() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

// ============================================================================
// Fake ports
// ============================================================================

pub struct FakePorts {
    pub picks: Mutex<VecDeque<Result<PickResult, PortError>>>,
    pub portfolio_replies: Mutex<VecDeque<Result<serde_json::Value, PortError>>>,
    pub portfolio_gate: Mutex<Option<Gate>>,
    pub portfolio_queries: Mutex<Vec<PortfolioQuery>>,
    pub upload_reply: Mutex<Result<String, PortError>>,
    pub upload_gate: Mutex<Option<Gate>>,
    pub uploads: Mutex<Vec<(String, String)>>,
    pub username_reply: Mutex<Result<(), PortError>>,
    pub description_reply: Mutex<Result<(), PortError>>,
    pub mutation_gate: Mutex<Option<Gate>>,
    pub mutations: Mutex<Vec<(ProfileField, String)>>,
    pub images_set: Mutex<Vec<(String, String)>>,
}

impl Default for FakePorts {
    fn default() -> Self {
        Self {
            picks: Mutex::new(VecDeque::new()),
            portfolio_replies: Mutex::new(VecDeque::new()),
            portfolio_gate: Mutex::new(None),
            portfolio_queries: Mutex::new(Vec::new()),
            upload_reply: Mutex::new(Ok(NEW_AVATAR.to_string())),
            upload_gate: Mutex::new(None),
            uploads: Mutex::new(Vec::new()),
            username_reply: Mutex::new(Ok(())),
            description_reply: Mutex::new(Ok(())),
            mutation_gate: Mutex::new(None),
            mutations: Mutex::new(Vec::new()),
            images_set: Mutex::new(Vec::new()),
        }
    }
}

impl FakePorts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pick(&self, reply: Result<PickResult, PortError>) {
        self.picks.lock().push_back(reply);
    }

    pub fn portfolio(&self, reply: Result<serde_json::Value, PortError>) {
        self.portfolio_replies.lock().push_back(reply);
    }

    /// Hold the next uploads until the returned gate opens
    pub fn hold_uploads(&self) -> Gate {
        let gate = Gate::closed();
        *self.upload_gate.lock() = Some(gate.clone());
        gate
    }

    /// Hold the next portfolio fetches until the returned gate opens
    pub fn hold_portfolio(&self) -> Gate {
        let gate = Gate::closed();
        *self.portfolio_gate.lock() = Some(gate.clone());
        gate
    }

    /// Hold the next field commits until the returned gate opens
    pub fn hold_mutations(&self) -> Gate {
        let gate = Gate::closed();
        *self.mutation_gate.lock() = Some(gate.clone());
        gate
    }

    async fn mutation_turn(&self) {
        let gate = self.mutation_gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
    }

    pub fn ports(self: &Arc<Self>) -> SessionPorts {
        SessionPorts {
            picker: self.clone(),
            portfolio: self.clone(),
            uploader: self.clone(),
            mutations: self.clone(),
        }
    }
}

#[async_trait]
impl MediaPicker for FakePorts {
    async fn pick_image(&self, options: PickerOptions) -> Result<PickResult, PortError> {
        assert_eq!(options, PickerOptions::avatar());
        self.picks
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(PickResult::canceled()))
    }
}

#[async_trait]
impl PortfolioSource for FakePorts {
    async fn fetch_portfolio(
        &self,
        query: &PortfolioQuery,
    ) -> Result<serde_json::Value, PortError> {
        self.portfolio_queries.lock().push(query.clone());
        let gate = self.portfolio_gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        self.portfolio_replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(serde_json::json!([])))
    }
}

#[async_trait]
impl AvatarUploader for FakePorts {
    async fn upload(&self, user_id: &str, local_image: &str) -> Result<String, PortError> {
        self.uploads
            .lock()
            .push((user_id.to_string(), local_image.to_string()));
        let gate = self.upload_gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        self.upload_reply.lock().clone()
    }
}

#[async_trait]
impl ProfileMutations for FakePorts {
    fn set_image(&self, user_id: &str, image_url: &str) {
        self.images_set
            .lock()
            .push((user_id.to_string(), image_url.to_string()));
    }

    async fn set_username(&self, _user_id: &str, username: &str) -> Result<(), PortError> {
        self.mutation_turn().await;
        let reply = self.username_reply.lock().clone();
        if reply.is_ok() {
            self.mutations
                .lock()
                .push((ProfileField::Username, username.to_string()));
        }
        reply
    }

    async fn set_description(&self, _user_id: &str, description: &str) -> Result<(), PortError> {
        self.mutation_turn().await;
        let reply = self.description_reply.lock().clone();
        if reply.is_ok() {
            self.mutations
                .lock()
                .push((ProfileField::Description, description.to_string()));
        }
        reply
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
pub const OLD_AVATAR: &str = "https://cdn.example/old.png";
pub const NEW_AVATAR: &str = "https://cdn.example/new.png";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn committed() -> CommittedProfile {
    CommittedProfile {
        user_id: WALLET.to_string(),
        profile_pic_url: OLD_AVATAR.to_string(),
        username: "alice".to_string(),
        description: "gm".to_string(),
    }
}

/// Seeded session over `fake`, not yet opened
pub fn session(fake: &Arc<FakePorts>) -> ProfileEditSession {
    init_tracing();
    let config = SessionConfig {
        upload: UploadConfig {
            seed: Some(7),
            ..UploadConfig::default()
        },
        ..SessionConfig::default()
    };
    ProfileEditSession::new(config, fake.ports()).unwrap()
}

/// Let spawned tasks run up to their next await
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn progress_of(events: &[SessionEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::UploadProgress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

pub fn notice_titles(events: &[SessionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::Notice(notice) => Some(notice.title.clone()),
            _ => None,
        })
        .collect()
}
