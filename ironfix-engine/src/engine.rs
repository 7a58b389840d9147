/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The engine: owns a pool of sessions keyed by session id and adapts the
//! host-facing [`Application`] callbacks onto each session's
//! [`SessionCallbacks`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ironfix_core::error::SessionError;
use ironfix_core::message::OwnedMessage;
use ironfix_store::{FileStore, MessageStore, StoreDbError};
use ironfix_session::{InboundAction, Session, SessionCallbacks};
use thiserror::Error;

use crate::application::{Application, SessionId};
use crate::builder::{EngineBuilder, EngineConfig};

/// Errors raised while assembling or driving an [`Engine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// A session's file-backed store could not be acquired.
    #[error("failed to acquire session store: {0}")]
    Store(#[from] StoreDbError),
    /// A session-layer operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// No session is registered under the requested id.
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

/// Bridges [`Application`]'s host-facing callbacks onto one [`Session`]'s
/// [`SessionCallbacks`]. Lifecycle callbacks (`on_create`/`on_logon`/
/// `on_logout`) translate directly; inbound admin/app messages are
/// re-decoded into a [`ironfix_core::message::RawMessage`] so
/// `from_admin`/`from_app` see the same zero-copy view the rest of the
/// stack uses. Outbound `to_admin`/`to_app` mutation hooks are not wired:
/// by the time a `Session` has bytes to send, they have already been
/// serialized by the session's own encoder, so there is no `OwnedMessage`
/// left to mutate in place.
struct ApplicationAdapter<A: Application> {
    application: Arc<A>,
    session_id: SessionId,
}

#[async_trait]
impl<A: Application> SessionCallbacks for ApplicationAdapter<A> {
    async fn on_session_opened(&self, _session_id: &str) {
        self.application.on_create(&self.session_id).await;
    }

    async fn on_session_logon(&self, _session_id: &str) {
        self.application.on_logon(&self.session_id).await;
    }

    async fn on_session_logout(&self, _session_id: &str) {
        self.application.on_logout(&self.session_id).await;
    }

    async fn on_session_rx_adm_message(&self, _session_id: &str, message: &OwnedMessage) {
        if let Ok(raw) = ironfix_tagvalue::Decoder::new(message.as_bytes()).with_checksum_validation(false).decode() {
            let _ = self.application.from_admin(&raw, &self.session_id).await;
        }
    }

    async fn on_session_rx_app_message(&self, _session_id: &str, message: &OwnedMessage) {
        if let Ok(raw) = ironfix_tagvalue::Decoder::new(message.as_bytes()).with_checksum_validation(false).decode() {
            let _ = self.application.from_app(&raw, &self.session_id).await;
        }
    }

    async fn on_session_tx_adm_message(&self, _session_id: &str, _message: &OwnedMessage) {}

    async fn on_session_tx_app_message(&self, _session_id: &str, _message: &OwnedMessage) {}

    async fn on_session_timeout(&self, _session_id: &str, _error: &SessionError) {}

    async fn on_session_closed(&self, _session_id: &str) {}
}

type EngineSession<A> = Session<ApplicationAdapter<A>>;

/// Owns every configured session for one [`Application`], each bound to
/// its own file-backed store and driven through the per-session FSM in
/// [`ironfix_session::session::Session`]. Per spec, each session's
/// sequencer is single-writer: callers must serialize `handle_inbound`/
/// `handle_outbound` calls per session, which the engine does not enforce
/// beyond handing out one `Arc<Session<_>>` per id (callers are expected
/// to route a session's traffic through one task).
pub struct Engine<A: Application> {
    config: EngineConfig,
    application: Arc<A>,
    sessions: HashMap<String, Arc<EngineSession<A>>>,
}

impl<A: Application> Engine<A> {
    /// Assembles an [`Engine`] from a configured [`EngineBuilder`],
    /// acquiring a [`FileStore`] lease for every configured session.
    ///
    /// # Errors
    /// Returns [`EngineError::Store`] if any session's store cannot be
    /// acquired (e.g. it is already leased by another process).
    pub async fn from_builder(builder: EngineBuilder<A>) -> Result<Self, EngineError> {
        let config = builder.engine_config();
        let application = builder.application();
        let mut sessions = HashMap::new();

        for session_config in builder.sessions() {
            let session_id = SessionId::new(
                session_config.begin_string.clone(),
                session_config.sender_comp_id.as_str(),
                session_config.target_comp_id.as_str(),
            );
            let store_key = format!("{}-{}", session_config.sender_comp_id.as_str(), session_config.target_comp_id.as_str());
            let store = FileStore::acquire(&session_config.store_root, &store_key, session_config.lock_staleness).await?;
            let store: Arc<dyn MessageStore> = Arc::new(store);

            let adapter = Arc::new(ApplicationAdapter {
                application: Arc::clone(&application),
                session_id: session_id.clone(),
            });

            let id_str = session_id.to_string();
            let session = Arc::new(Session::new(id_str.clone(), session_config.clone(), adapter, store));
            sessions.insert(id_str, session);
        }

        Ok(Self { config, application, sessions })
    }

    /// Engine-wide configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared application handler.
    #[must_use]
    pub fn application(&self) -> Arc<A> {
        Arc::clone(&self.application)
    }

    /// Looks up a session by its `"BeginString:Sender->Target"` id.
    #[must_use]
    pub fn session(&self, id: &str) -> Option<Arc<EngineSession<A>>> {
        self.sessions.get(id).cloned()
    }

    /// Number of sessions this engine owns.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Iterates over every owned session id.
    pub fn session_ids(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    /// Feeds one decoded inbound message to the named session.
    ///
    /// # Errors
    /// Returns [`EngineError::UnknownSession`] if `id` names no session,
    /// or propagates the session's own processing error.
    pub async fn dispatch_inbound(&self, id: &str, message: OwnedMessage) -> Result<InboundAction, EngineError> {
        let session = self.sessions.get(id).ok_or_else(|| EngineError::UnknownSession(id.to_owned()))?;
        Ok(session.handle_inbound(message).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::NoOpApplication;
    use ironfix_core::types::CompId;
    use ironfix_session::config::SessionConfig;

    #[tokio::test]
    async fn test_engine_from_builder_acquires_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let session_config = SessionConfig::new(CompId::new("SENDER").unwrap(), CompId::new("TARGET").unwrap(), "FIX.4.4")
            .with_store_root(dir.path());

        let builder = EngineBuilder::new().with_application(NoOpApplication).add_session(session_config);
        let engine = Engine::from_builder(builder).await.unwrap();

        assert_eq!(engine.session_count(), 1);
        assert!(engine.session("FIX.4.4:SENDER->TARGET").is_some());
    }

    #[tokio::test]
    async fn test_engine_rejects_unknown_session_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let builder: EngineBuilder<NoOpApplication> = EngineBuilder::new().with_worker_threads(1);
        let engine = Engine::from_builder(builder).await.unwrap();
        let _ = dir;

        let message = OwnedMessage::new(bytes::Bytes::new(), ironfix_core::message::MsgType::default(), vec![]);
        let result = engine.dispatch_inbound("does-not-exist", message).await;
        assert!(matches!(result, Err(EngineError::UnknownSession(_))));
    }
}
