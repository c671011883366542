//! Document state model: records, pipeline actions and derived status.

pub mod action;
pub mod record;
pub mod status;

pub use action::{Action, UnknownAction, PIPELINE};
pub use record::{DocumentId, DocumentRecord, Presence};
pub use status::DocumentStatus;
