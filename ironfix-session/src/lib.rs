/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFix Session
//!
//! FIX session layer protocol implementation for the IronFix engine.
//!
//! This crate provides:
//! - **State machine**: The five-state session FSM (`Active`/`Opened`/`Closing`/
//!   `Closed`/`Shutdown`) driving logon, heartbeat, and logout handling
//! - **Validation**: [`Validator`] diagnoses a decoded message field-by-field
//!   against its dictionary layout
//! - **Sequence management**: Atomic sequence number handling
//! - **Heartbeat handling**: Heartbeat/TestRequest logic
//! - **Recovery**: Gap fill and ResendRequest processing
//! - **Configuration**: Session configuration options

pub mod config;
pub mod heartbeat;
pub mod sequence;
pub mod session;
pub mod state;
pub mod validator;

pub use config::SessionConfig;
pub use heartbeat::HeartbeatManager;
pub use sequence::SequenceManager;
pub use session::{InboundAction, Session, SessionCallbacks};
pub use state::SessionState;
pub use validator::{FieldResult, GroupResult, ValidationCode, ValidationElement, ValidationReport, Validator};
