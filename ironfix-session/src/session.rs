/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! The concrete session driver.
//!
//! `Session` owns the five-state FSM from [`crate::state`], the sequence
//! counters from [`crate::sequence`], and the heartbeat clock from
//! [`crate::heartbeat`], and wires them to a [`MessageStore`] and a
//! [`SessionCallbacks`] implementation. It is the single point through
//! which both outbound (`handle_outbound`) and inbound (`handle_inbound`)
//! traffic for one counterparty relationship passes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use ironfix_core::error::SessionError;
use ironfix_core::message::OwnedMessage;
use ironfix_core::types::{CompId, Timestamp};
use ironfix_store::MessageStore;
use ironfix_tagvalue::Encoder;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::heartbeat::{generate_test_req_id, HeartbeatManager};
use crate::sequence::{SequenceManager, SequenceResult};
use crate::state::SessionState;

const TAG_BEGIN_SEQ_NO: u32 = 7;
const TAG_END_SEQ_NO: u32 = 16;
const TAG_MSG_SEQ_NUM: u32 = 34;
const TAG_SENDER_COMP_ID: u32 = 49;
const TAG_SENDING_TIME: u32 = 52;
const TAG_TARGET_COMP_ID: u32 = 56;
const TAG_TEXT: u32 = 58;
const TAG_MSG_TYPE: u32 = 35;
const TAG_POSS_DUP_FLAG: u32 = 43;
const TAG_TEST_REQ_ID: u32 = 112;
const TAG_NEW_SEQ_NO: u32 = 36;
const TAG_GAP_FILL_FLAG: u32 = 123;

const MSG_TYPE_HEARTBEAT: &str = "0";
const MSG_TYPE_TEST_REQUEST: &str = "1";
const MSG_TYPE_RESEND_REQUEST: &str = "2";
const MSG_TYPE_REJECT: &str = "3";
const MSG_TYPE_SEQUENCE_RESET: &str = "4";
const MSG_TYPE_LOGOUT: &str = "5";
const MSG_TYPE_LOGON: &str = "A";

/// Host-facing callbacks invoked as a session moves through its lifecycle.
///
/// Every callback is delivered serially for a given session: the engine
/// must not invoke a second callback for the same session before the
/// previous one's future resolves.
#[async_trait]
pub trait SessionCallbacks: Send + Sync {
    /// The session's transport has connected and it has entered `Active`.
    async fn on_session_opened(&self, session_id: &str);

    /// A Logon exchange completed; the session entered `Opened`.
    async fn on_session_logon(&self, session_id: &str);

    /// A Logout exchange completed; the session entered `Closed`.
    async fn on_session_logout(&self, session_id: &str);

    /// An inbound admin-level message was processed by the session layer.
    async fn on_session_rx_adm_message(&self, session_id: &str, message: &OwnedMessage);

    /// An inbound application-level message is ready for the host to consume.
    async fn on_session_rx_app_message(&self, session_id: &str, message: &OwnedMessage);

    /// An outbound admin-level message was sent.
    async fn on_session_tx_adm_message(&self, session_id: &str, message: &OwnedMessage);

    /// An outbound application-level message was sent.
    async fn on_session_tx_app_message(&self, session_id: &str, message: &OwnedMessage);

    /// The session timed out waiting for a TestRequest reply or Logout reply.
    async fn on_session_timeout(&self, session_id: &str, error: &SessionError);

    /// The session reached `Shutdown` and may be discarded.
    async fn on_session_closed(&self, session_id: &str);
}

/// Outcome of feeding one decoded message through [`Session::handle_inbound`].
#[derive(Debug)]
pub enum InboundAction {
    /// The message was session-layer traffic; nothing further to deliver.
    Consumed,
    /// An application message is ready for [`SessionCallbacks::on_session_rx_app_message`]
    /// (already invoked); returned so the caller can also inspect it.
    Delivered(OwnedMessage),
    /// Bytes the session wants emitted on the transport (a reply, a
    /// ResendRequest, a Logout, retransmitted messages, ...).
    Reply(Vec<Vec<u8>>),
}

/// A message sequence-gapped ahead of where the session is waiting to
/// resend from, buffered until the gap is filled.
struct PendingResend {
    begin: u64,
    end: u64,
    buffered: BTreeMap<u64, OwnedMessage>,
}

/// Drives one FIX counterparty relationship through its session lifecycle.
pub struct Session<C: SessionCallbacks> {
    id: String,
    config: SessionConfig,
    state: Mutex<SessionState>,
    sequences: SequenceManager,
    heartbeat: Mutex<HeartbeatManager>,
    callbacks: Arc<C>,
    store: Arc<dyn MessageStore>,
    resend: Mutex<Option<PendingResend>>,
}

impl<C: SessionCallbacks> Session<C> {
    /// Creates a new session in the `Active` state.
    #[must_use]
    pub fn new(id: impl Into<String>, config: SessionConfig, callbacks: Arc<C>, store: Arc<dyn MessageStore>) -> Self {
        let interval = config.heartbeat_interval;
        Self {
            id: id.into(),
            config,
            state: Mutex::new(SessionState::Active),
            sequences: SequenceManager::with_initial(store.next_sender_seq(), store.next_target_seq()),
            heartbeat: Mutex::new(HeartbeatManager::new(interval)),
            callbacks,
            store,
            resend: Mutex::new(None),
        }
    }

    /// The session identifier (e.g. `"FIX.4.4:SENDER->TARGET"`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current FSM state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    fn set_state(&self, next: SessionState) {
        let prev = {
            let mut guard = self.state.lock();
            let prev = *guard;
            *guard = next;
            prev
        };
        if prev != next {
            info!(session = %self.id, from = %prev, to = %next, "session state transition");
        }
    }

    /// Builds an admin message encoder pre-loaded with the standard header
    /// fields (`BeginString`/`BodyLength` via [`Encoder::finish`], plus
    /// `MsgType`, `MsgSeqNum`, `SenderCompID`, `TargetCompID`, `SendingTime`).
    fn new_admin_encoder(&self, msg_type: &str) -> Encoder {
        let mut enc = Encoder::new(self.config.begin_string.clone());
        enc.put_str(TAG_MSG_TYPE, msg_type);
        enc.put_str(TAG_SENDER_COMP_ID, self.config.sender_comp_id.as_str());
        enc.put_str(TAG_TARGET_COMP_ID, self.config.target_comp_id.as_str());
        enc.put_uint(TAG_MSG_SEQ_NUM, self.sequences.allocate_sender_seq().value());
        enc.put_str(TAG_SENDING_TIME, Timestamp::now().format_millis().as_str());
        enc
    }

    async fn send_admin(&self, msg_type: &str, mut build: impl FnMut(&mut Encoder)) -> Vec<u8> {
        let mut enc = self.new_admin_encoder(msg_type);
        build(&mut enc);
        let bytes = enc.finish().to_vec();
        self.heartbeat.lock().on_message_sent();
        if let Err(err) = self.store.store(self.sequences.next_sender_seq().value() - 1, &bytes).await {
            warn!(session = %self.id, error = %err, "failed to persist outbound admin message");
        }
        bytes
    }

    /// Sends an application message: stamps the standard header fields,
    /// persists it for resend, and increments the outbound sequence.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] if the session is not `Opened`.
    pub async fn handle_outbound(&self, msg_type: &str, body: impl FnOnce(&mut Encoder)) -> Result<Vec<u8>, SessionError> {
        if self.state() != SessionState::Opened {
            return Err(SessionError::InvalidState {
                expected: "Opened".into(),
                current: self.state().to_string(),
            });
        }
        let mut enc = self.new_admin_encoder(msg_type);
        body(&mut enc);
        let bytes = enc.finish().to_vec();
        let seq = self.sequences.next_sender_seq().value() - 1;
        self.store
            .store(seq, &bytes)
            .await
            .map_err(|e| SessionError::Connection(e.to_string()))?;
        self.heartbeat.lock().on_message_sent();
        Ok(bytes)
    }

    /// Initiates the Logon exchange for an initiator session.
    pub async fn initiate_logon(&self) -> Vec<u8> {
        let heartbeat_secs = self.config.heartbeat_interval.as_secs();
        self.send_admin(MSG_TYPE_LOGON, |enc| {
            enc.put_uint(98, 0); // EncryptMethod: none
            enc.put_uint(108, heartbeat_secs);
        })
        .await
    }

    /// Begins a local logout (`Opened -> Closing`), sending a Logout message.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidState`] if the session is not `Opened`.
    pub async fn initiate_logout(&self, reason: Option<&str>) -> Result<Vec<u8>, SessionError> {
        if self.state() != SessionState::Opened {
            return Err(SessionError::InvalidState {
                expected: "Opened".into(),
                current: self.state().to_string(),
            });
        }
        let reason = reason.map(str::to_owned);
        let bytes = self
            .send_admin(MSG_TYPE_LOGOUT, |enc| {
                if let Some(text) = &reason {
                    enc.put_str(TAG_TEXT, text);
                }
            })
            .await;
        self.set_state(SessionState::Closing);
        Ok(bytes)
    }

    /// Called when the transport reports disconnection.
    pub async fn handle_disconnect(&self) {
        self.set_state(SessionState::Shutdown);
        self.callbacks.on_session_closed(&self.id).await;
    }

    /// Feeds one fully decoded inbound message through sequence checking,
    /// the session-layer admin handlers, or application delivery.
    ///
    /// A too-low sequence number arriving without `PossDupFlag` is a
    /// protocol violation: the session sends a rejecting Logout, moves to
    /// `Shutdown`, and the returned [`InboundAction::Reply`] carries that
    /// Logout for the caller to flush before tearing down the transport.
    /// Callers can detect this by checking [`Session::state`] afterward.
    ///
    /// # Errors
    /// Propagates errors from resend-request servicing against the
    /// backing store.
    pub async fn handle_inbound(&self, message: OwnedMessage) -> Result<InboundAction, SessionError> {
        let msg_type = message.msg_type().as_str().to_owned();
        let seq_num = message
            .get_field_str(TAG_MSG_SEQ_NUM)
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let poss_dup = message.get_field_str(TAG_POSS_DUP_FLAG) == Some("Y");

        if msg_type == MSG_TYPE_LOGON {
            return self.handle_logon(message).await;
        }

        match self.sequences.validate_incoming(seq_num) {
            SequenceResult::Ok => self.deliver(message, &msg_type, poss_dup).await,
            SequenceResult::TooLow { expected, received } => {
                if poss_dup {
                    debug!(session = %self.id, expected, received, "accepting possibly-duplicate message");
                    self.callbacks.on_session_rx_adm_message(&self.id, &message).await;
                    Ok(InboundAction::Consumed)
                } else {
                    warn!(session = %self.id, expected, received, "sequence too low without PossDupFlag, protocol violation");
                    let reason = format!("MsgSeqNum too low, expected {expected} but received {received}");
                    let logout = self.send_admin(MSG_TYPE_LOGOUT, |enc| enc.put_str(TAG_TEXT, &reason)).await;
                    self.set_state(SessionState::Shutdown);
                    self.callbacks.on_session_closed(&self.id).await;
                    Ok(InboundAction::Reply(vec![logout]))
                }
            }
            SequenceResult::Gap { expected, received } => {
                self.open_resend_gap(expected, received, message);
                let req = self
                    .send_admin(MSG_TYPE_RESEND_REQUEST, |enc| {
                        enc.put_uint(TAG_BEGIN_SEQ_NO, expected);
                        enc.put_uint(TAG_END_SEQ_NO, received - 1);
                    })
                    .await;
                Ok(InboundAction::Reply(vec![req]))
            }
        }
    }

    async fn handle_logon(&self, message: OwnedMessage) -> Result<InboundAction, SessionError> {
        if self.state() != SessionState::Active {
            warn!(session = %self.id, state = %self.state(), "unexpected Logon");
        }
        self.sequences.set_target_seq(
            message
                .get_field_str(TAG_MSG_SEQ_NUM)
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1)
                + 1,
        );
        self.heartbeat.lock().on_message_received(false, None);
        self.set_state(SessionState::Opened);
        self.callbacks.on_session_opened(&self.id).await;
        self.callbacks.on_session_logon(&self.id).await;
        self.callbacks.on_session_rx_adm_message(&self.id, &message).await;
        Ok(InboundAction::Consumed)
    }

    fn open_resend_gap(&self, expected: u64, received: u64, triggering: OwnedMessage) {
        let mut guard = self.resend.lock();
        let resend = guard.get_or_insert_with(|| PendingResend {
            begin: expected,
            end: received - 1,
            buffered: BTreeMap::new(),
        });
        resend.buffered.insert(received, triggering);
    }

    async fn deliver(&self, message: OwnedMessage, msg_type: &str, poss_dup: bool) -> Result<InboundAction, SessionError> {
        self.sequences.increment_target_seq();
        self.heartbeat.lock().on_message_received(msg_type == MSG_TYPE_HEARTBEAT, message.get_field_str(TAG_TEST_REQ_ID));

        let in_resend_window = {
            let guard = self.resend.lock();
            guard.as_ref().is_some_and(|r| {
                message
                    .get_field_str(TAG_MSG_SEQ_NUM)
                    .and_then(|s| s.parse::<u64>().ok())
                    .is_some_and(|seq| seq <= r.end)
            })
        };
        if in_resend_window && !poss_dup && msg_type != MSG_TYPE_SEQUENCE_RESET {
            debug!(session = %self.id, "message within resend window lacked PossDupFlag");
        }

        let action = self.dispatch_admin_or_app(message, msg_type).await?;

        let mut drained = self.drain_resend_buffer().await?;
        if drained.is_empty() {
            return Ok(action);
        }
        if let InboundAction::Reply(replies) = action {
            drained.splice(0..0, replies);
        }
        Ok(InboundAction::Reply(drained))
    }

    async fn drain_resend_buffer(&self) -> Result<Vec<Vec<u8>>, SessionError> {
        let mut replies = Vec::new();
        loop {
            let next = {
                let mut guard = self.resend.lock();
                let Some(resend) = guard.as_mut() else { return Ok(replies) };
                let expected = self.sequences.next_target_seq().value();
                let popped = resend.buffered.remove(&expected);
                if popped.is_none() && resend.buffered.is_empty() {
                    *guard = None;
                }
                popped
            };
            let Some(message) = next else { break };
            let msg_type = message.msg_type().as_str().to_owned();
            self.sequences.increment_target_seq();
            if let InboundAction::Reply(bytes) = self.dispatch_admin_or_app(message, &msg_type).await? {
                replies.extend(bytes);
            }
        }
        Ok(replies)
    }

    async fn dispatch_admin_or_app(&self, message: OwnedMessage, msg_type: &str) -> Result<InboundAction, SessionError> {
        match msg_type {
            MSG_TYPE_HEARTBEAT => {
                self.callbacks.on_session_rx_adm_message(&self.id, &message).await;
                Ok(InboundAction::Consumed)
            }
            MSG_TYPE_TEST_REQUEST => {
                let id = message.get_field_str(TAG_TEST_REQ_ID).unwrap_or_default().to_owned();
                self.callbacks.on_session_rx_adm_message(&self.id, &message).await;
                let reply = self.send_admin(MSG_TYPE_HEARTBEAT, |enc| enc.put_str(TAG_TEST_REQ_ID, &id)).await;
                Ok(InboundAction::Reply(vec![reply]))
            }
            MSG_TYPE_RESEND_REQUEST => {
                self.callbacks.on_session_rx_adm_message(&self.id, &message).await;
                let begin = message.get_field_str(TAG_BEGIN_SEQ_NO).and_then(|s| s.parse::<u64>().ok()).unwrap_or(1);
                let end = message.get_field_str(TAG_END_SEQ_NO).and_then(|s| s.parse::<u64>().ok()).unwrap_or(0);
                let replies = self.handle_resend_request(begin, end).await?;
                Ok(InboundAction::Reply(replies))
            }
            MSG_TYPE_SEQUENCE_RESET => {
                self.callbacks.on_session_rx_adm_message(&self.id, &message).await;
                if message.get_field_str(TAG_GAP_FILL_FLAG) == Some("Y") {
                    if let Some(new_seq) = message.get_field_str(TAG_NEW_SEQ_NO).and_then(|s| s.parse::<u64>().ok()) {
                        self.sequences.set_target_seq(new_seq);
                        info!(session = %self.id, new_seq, "gap fill advanced inbound sequence");
                    }
                }
                Ok(InboundAction::Consumed)
            }
            MSG_TYPE_LOGOUT => {
                self.callbacks.on_session_rx_adm_message(&self.id, &message).await;
                let was_closing = self.state() == SessionState::Closing;
                self.set_state(SessionState::Closed);
                self.callbacks.on_session_logout(&self.id).await;
                if was_closing {
                    Ok(InboundAction::Consumed)
                } else {
                    let ack = self.send_admin(MSG_TYPE_LOGOUT, |_| {}).await;
                    Ok(InboundAction::Reply(vec![ack]))
                }
            }
            MSG_TYPE_REJECT => {
                self.callbacks.on_session_rx_adm_message(&self.id, &message).await;
                Ok(InboundAction::Consumed)
            }
            _ => {
                self.callbacks.on_session_rx_app_message(&self.id, &message).await;
                Ok(InboundAction::Delivered(message))
            }
        }
    }

    /// Services an inbound ResendRequest by replaying our own previously
    /// stored outbound bytes verbatim. This does not rewrite `PossDupFlag`
    /// into the retransmitted bytes, so a counterparty strictly validating
    /// that flag on replayed traffic may reject it; full byte-accurate
    /// resend would require dictionary-aware re-assembly, which the
    /// session layer deliberately does not depend on.
    ///
    /// # Errors
    /// Returns [`SessionError::ResendUnavailable`] if the store cannot
    /// supply the requested range.
    async fn handle_resend_request(&self, begin: u64, end: u64) -> Result<Vec<Vec<u8>>, SessionError> {
        let messages = self.store.get_range(begin, end).await.map_err(|_| SessionError::ResendUnavailable { begin, end })?;
        Ok(messages.into_iter().map(|m| m.as_bytes().to_vec()).collect())
    }

    /// Returns outbound bytes for a Heartbeat if one is due, and/or a
    /// TestRequest if the peer has gone quiet past the idle threshold.
    /// Returns `Err` if the session has timed out waiting for a reply.
    ///
    /// # Errors
    /// Returns [`SessionError::HeartbeatTimeout`] once a pending
    /// `TestRequest` has gone unanswered past the timeout window.
    pub async fn poll_heartbeat(&self) -> Result<Vec<Vec<u8>>, SessionError> {
        let mut out = Vec::new();
        let timed_out = self.heartbeat.lock().is_timed_out();
        if timed_out {
            let elapsed_ms = self.heartbeat.lock().time_since_last_received().as_millis() as u64;
            let err = SessionError::HeartbeatTimeout { elapsed_ms };
            self.callbacks.on_session_timeout(&self.id, &err).await;
            return Err(err);
        }
        if self.heartbeat.lock().should_send_heartbeat() {
            out.push(self.send_admin(MSG_TYPE_HEARTBEAT, |_| {}).await);
        }
        if self.heartbeat.lock().should_send_test_request() {
            let id = generate_test_req_id();
            out.push(self.send_admin(MSG_TYPE_TEST_REQUEST, |enc| enc.put_str(TAG_TEST_REQ_ID, &id)).await);
            self.heartbeat.lock().on_test_request_sent(id);
        }
        Ok(out)
    }

    /// Resets sequence counters and the backing store (e.g. on a logon with
    /// `ResetSeqNumFlag=Y`).
    ///
    /// # Errors
    /// Returns whatever error the backing store reports.
    pub async fn reset_sequences(&self) -> Result<(), SessionError> {
        self.store.reset().await.map_err(|e| SessionError::Configuration(e.to_string()))?;
        self.sequences.reset();
        self.heartbeat.lock().reset();
        Ok(())
    }

    /// Sender/target comp IDs this session was configured with.
    #[must_use]
    pub fn comp_ids(&self) -> (CompId, CompId) {
        (self.config.sender_comp_id.clone(), self.config.target_comp_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironfix_store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingCallbacks {
        opened: AtomicUsize,
        logon: AtomicUsize,
        logout: AtomicUsize,
        app_rx: AtomicUsize,
        closed: AtomicUsize,
    }

    #[async_trait]
    impl SessionCallbacks for CountingCallbacks {
        async fn on_session_opened(&self, _session_id: &str) {
            self.opened.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_session_logon(&self, _session_id: &str) {
            self.logon.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_session_logout(&self, _session_id: &str) {
            self.logout.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_session_rx_adm_message(&self, _session_id: &str, _message: &OwnedMessage) {}
        async fn on_session_rx_app_message(&self, _session_id: &str, _message: &OwnedMessage) {
            self.app_rx.fetch_add(1, Ordering::SeqCst);
        }
        async fn on_session_tx_adm_message(&self, _session_id: &str, _message: &OwnedMessage) {}
        async fn on_session_tx_app_message(&self, _session_id: &str, _message: &OwnedMessage) {}
        async fn on_session_timeout(&self, _session_id: &str, _error: &SessionError) {}
        async fn on_session_closed(&self, _session_id: &str) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn make_session() -> (Session<CountingCallbacks>, Arc<CountingCallbacks>) {
        let sender = CompId::new("SENDER").unwrap();
        let target = CompId::new("TARGET").unwrap();
        let config = SessionConfig::new(sender, target, "FIX.4.4");
        let callbacks = Arc::new(CountingCallbacks::default());
        let store = Arc::new(MemoryStore::new());
        let session = Session::new("FIX.4.4:SENDER->TARGET", config, callbacks.clone(), store);
        (session, callbacks)
    }

    /// Builds an `OwnedMessage` directly from tag/value pairs, bypassing
    /// wire parsing: tests only need field lookups, not framing.
    fn owned_message(msg_type: &str, fields: &[(u32, String)]) -> OwnedMessage {
        use ironfix_core::message::MsgType;
        use std::str::FromStr;

        let mut buf = Vec::new();
        let mut offsets = Vec::new();
        for (tag, value) in fields {
            let start = buf.len();
            buf.extend_from_slice(value.as_bytes());
            offsets.push((*tag, start..buf.len()));
            buf.push(0x01);
        }
        OwnedMessage::new(bytes::Bytes::from(buf), MsgType::from_str(msg_type).unwrap(), offsets)
    }

    fn logon_message(seq: u64) -> OwnedMessage {
        owned_message(
            MSG_TYPE_LOGON,
            &[
                (TAG_MSG_SEQ_NUM, seq.to_string()),
                (TAG_SENDER_COMP_ID, "TARGET".to_string()),
                (TAG_TARGET_COMP_ID, "SENDER".to_string()),
            ],
        )
    }

    #[tokio::test]
    async fn test_initial_state_is_active() {
        let (session, _) = make_session();
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn test_logon_opens_session() {
        let (session, callbacks) = make_session();
        let message = logon_message(1);
        let action = session.handle_inbound(message).await.unwrap();
        assert!(matches!(action, InboundAction::Consumed));
        assert_eq!(session.state(), SessionState::Opened);
        assert_eq!(callbacks.opened.load(Ordering::SeqCst), 1);
        assert_eq!(callbacks.logon.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_initiate_logout_enters_closing() {
        let (session, _) = make_session();
        session.handle_inbound(logon_message(1)).await.unwrap();
        session.initiate_logout(None).await.unwrap();
        assert_eq!(session.state(), SessionState::Closing);
    }

    #[tokio::test]
    async fn test_outbound_app_message_requires_opened_state() {
        let (session, _) = make_session();
        let result = session.handle_outbound("D", |_| {}).await;
        assert!(result.is_err());
    }
}
