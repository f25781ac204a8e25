//! Call-event monitoring and admission-decision pipeline.
//!
//! The monitor consumes the organization's call-lifecycle events, classifies
//! each one, decides whether the call may proceed, and terminates calls whose
//! internal party is not currently permitted to converse. It runs as a single
//! long-lived consumer task next to the web surface; the two share only the
//! immutable [`DirectorySnapshot`] and the externally owned permission store.
//!
//! Pipeline: event source -> ingestion loop -> classifier -> decision engine
//! -> (permission oracle, for external-leg calls) -> termination actuator.
//!
//! Every component is dependency-injected at construction; there is no global
//! state. A failure anywhere inside one loop iteration is logged and the loop
//! moves on to the next event.

pub mod actuator;
pub mod classifier;
pub mod decision;
pub mod directory;
pub mod error;
pub mod monitor;
pub mod permission;
pub mod platform;

pub use actuator::CallTerminator;
pub use classifier::{classify, CallEvent, CallEventKind};
pub use decision::{DecisionEngine, Verdict};
pub use directory::{DirectoryEntry, DirectorySnapshot};
pub use error::{
    ClassificationError, DecisionError, DirectoryBuildError, HangupFailure, MonitorError,
    SubscriptionError, TerminationError,
};
pub use monitor::{CallMonitor, MonitorHandle};
pub use permission::{PermissionOracle, PermissionStore};
pub use platform::{ActiveCall, EventSource, PhoneNumber, RosterMember, RosterSource, UserCalls};
