use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lightchat_core::{
    DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL_SECS, Message, Role, SESSION_SWEEP_INTERVAL_SECS,
    SessionId, env_parse_with_default,
};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::ServiceError;

/// Expiry policy for live sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Sessions idle at least this long are dropped.
    pub ttl: Duration,
    /// Live session cap; creating past it evicts the least recently active idle session.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl SessionConfig {
    /// Reads `LIGHTCHAT_SESSION_TTL_SECS` and `LIGHTCHAT_MAX_SESSIONS`.
    #[must_use]
    pub fn from_env() -> Self {
        let ttl_secs = env_parse_with_default("LIGHTCHAT_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS);
        let max_sessions = env_parse_with_default("LIGHTCHAT_MAX_SESSIONS", DEFAULT_MAX_SESSIONS);
        Self { ttl: Duration::from_secs(ttl_secs), max_sessions: max_sessions.max(1) }
    }
}

struct SessionSlot {
    transcript: Mutex<Vec<Message>>,
    /// Milliseconds since the store epoch at the last activity.
    touched_ms: AtomicU64,
    turn: Arc<Mutex<()>>,
}

fn millis_since(epoch: Instant) -> u64 {
    u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl SessionSlot {
    fn new(epoch: Instant) -> Self {
        Self {
            transcript: Mutex::new(Vec::new()),
            touched_ms: AtomicU64::new(millis_since(epoch)),
            turn: Arc::new(Mutex::new(())),
        }
    }

    fn touch(&self, epoch: Instant) {
        self.touched_ms.store(millis_since(epoch), Ordering::Relaxed);
    }

    fn is_busy(&self) -> bool {
        self.turn.try_lock().is_err()
    }

    /// Idle time, or `None` while a turn holds the session.
    fn idle_for(&self, epoch: Instant) -> Option<Duration> {
        if self.is_busy() {
            return None;
        }
        let touched = Duration::from_millis(self.touched_ms.load(Ordering::Relaxed));
        Some(epoch.elapsed().saturating_sub(touched))
    }
}

/// Exclusive right to run one turn on a session. Released on drop.
#[must_use = "the turn ends as soon as the guard is dropped"]
pub struct TurnGuard {
    session: SessionId,
    _permit: OwnedMutexGuard<()>,
}

impl TurnGuard {
    pub fn session(&self) -> SessionId {
        self.session
    }
}

impl std::fmt::Debug for TurnGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnGuard").field("session", &self.session).finish_non_exhaustive()
    }
}

/// In-memory transcripts keyed by session id.
///
/// The outer lock is held only to resolve an id to its slot; transcript
/// writes lock that one session.
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<SessionSlot>>>,
    config: SessionConfig,
    epoch: Instant,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), config, epoch: Instant::now() }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Register a new empty session. At the cap, the longest idle session
    /// that is not mid-turn makes room.
    pub async fn create_session(&self) -> SessionId {
        let mut sessions = self.sessions.write().await;

        if sessions.len() >= self.config.max_sessions {
            let victim = sessions
                .iter()
                .filter_map(|(id, slot)| slot.idle_for(self.epoch).map(|idle| (*id, idle)))
                .max_by_key(|(_, idle)| *idle);
            match victim {
                Some((victim, idle)) => {
                    sessions.remove(&victim);
                    tracing::info!(session = %victim, idle_secs = idle.as_secs(), "session cap reached, evicted least recently active session");
                },
                None => tracing::warn!(
                    max_sessions = self.config.max_sessions,
                    "session cap reached but every session is mid-turn"
                ),
            }
        }

        let id = SessionId::new_random();
        sessions.insert(id, Arc::new(SessionSlot::new(self.epoch)));
        tracing::debug!(session = %id, live = sessions.len(), "session created");
        id
    }

    /// Resolve a live slot. Expired idle sessions are removed on sight.
    async fn slot(&self, id: SessionId) -> Result<Arc<SessionSlot>, ServiceError> {
        let slot = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ServiceError::SessionNotFound(id))?;
        if slot.idle_for(self.epoch).is_some_and(|idle| idle >= self.config.ttl) {
            self.sessions.write().await.remove(&id);
            tracing::debug!(session = %id, "session expired");
            return Err(ServiceError::SessionNotFound(id));
        }
        Ok(slot)
    }

    pub async fn append_user_message(
        &self,
        id: SessionId,
        text: impl Into<String>,
    ) -> Result<(), ServiceError> {
        self.append_message(id, Role::User, text).await
    }

    pub async fn append_message(
        &self,
        id: SessionId,
        role: Role,
        text: impl Into<String>,
    ) -> Result<(), ServiceError> {
        let slot = self.slot(id).await?;
        slot.transcript.lock().await.push(Message::new(role, text));
        slot.touch(self.epoch);
        Ok(())
    }

    /// Snapshot of the transcript in conversational order.
    pub async fn get_transcript(&self, id: SessionId) -> Result<Vec<Message>, ServiceError> {
        let slot = self.slot(id).await?;
        let transcript = slot.transcript.lock().await;
        Ok(transcript.clone())
    }

    /// Claim the session for one turn; fails fast if a turn is already running.
    pub async fn begin_turn(&self, id: SessionId) -> Result<TurnGuard, ServiceError> {
        let slot = self.slot(id).await?;
        let permit = Arc::clone(&slot.turn)
            .try_lock_owned()
            .map_err(|_| ServiceError::SessionBusy(id))?;
        slot.touch(self.epoch);
        Ok(TurnGuard { session: id, _permit: permit })
    }

    /// Drop every idle session past its TTL. Returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| slot.idle_for(self.epoch).is_none_or(|idle| idle < self.config.ttl));
        before - sessions.len()
    }
}

/// Spawns the periodic expiry sweep.
pub fn start_session_sweeper(store: Arc<SessionStore>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let evicted = store.evict_expired().await;
            if evicted > 0 {
                let live = store.len().await;
                tracing::info!(evicted, live, "session sweep");
            }
        }
    })
}
