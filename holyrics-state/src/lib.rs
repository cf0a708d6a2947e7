//! Polling state synchronisation for Holyrics-compatible presentation controllers
//!
//! Once per interval the [`PollingEngine`] asks the controller for the
//! current presentation, the alert, and the F8/F9/F10 screen states,
//! flattens the answers into a [`StateSnapshot`], swaps it in, and notifies
//! every registered [`StateConsumer`]. The [`Coordinator`] wires
//! configuration changes to the command client and restarts the engine.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use holyrics_client::ConnectionConfig;
//! use holyrics_state::{Coordinator, EngineConfig};
//!
//! let coordinator = Coordinator::new(EngineConfig::default())?;
//! coordinator
//!     .configure(ConnectionConfig::new("192.168.1.50", 8091, "token"))
//!     .await?;
//!
//! let mut updates = coordinator.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow_and_update().clone();
//!     println!("countdown: {}", snapshot.countdown);
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Coordinator
//!     │
//!     ├── CommandClient (target replaced on configure)
//!     │
//!     └── PollingEngine ── Stopped | Running(PollingTask)
//!             │
//!             ├── tick: 5 concurrent commands → merge_tick → snapshot swap
//!             │
//!             └── consumers: publish_variables, check_feedbacks
//! ```

pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod extract;
pub mod lifecycle;
pub mod logging;
pub mod snapshot;
pub mod surface;

pub use config::EngineConfig;
pub use consumer::StateConsumer;
pub use engine::{EngineState, EngineStats, PollingEngine};
pub use error::{Result, StateError};
pub use extract::{
    derive_countdown, merge_tick, MergedTick, PresentationDescriptor, Slide, TickResponses,
};
pub use lifecycle::{BibleVersion, Coordinator, InstanceStatus};
pub use snapshot::{FieldValue, StateSnapshot, FIELD_NAMES};
pub use surface::{Feedback, FunctionKey, VariableDefinition};

pub use holyrics_client::ConnectionConfig;
