//! The processing state machine that turns one recording into one fill.

pub mod machine;
pub mod state;

use thiserror::Error;

use crate::backend::BackendError;
use crate::capture::CaptureError;
use crate::form::{FieldDescriptor, FillReport};
use crate::page::{PageError, WritePath};

pub use machine::{Dwell, MachineBuilder, ProcessingMachine, Recording};
pub use state::{SessionState, StatusUpdate, Step};

/// Failures that end a session in ERROR. Fields that cannot be resolved are
/// not among them; those are reported in [`FillReport::unresolved`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A session is already in progress")]
    Busy,

    #[error(transparent)]
    CaptureUnavailable(#[from] CaptureError),

    #[error("No form fields found on this page")]
    NoFieldsFound,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Could not fill the page: {0}")]
    FillChannelUnavailable(#[source] PageError),

    #[error("Could not read the page: {0}")]
    Extraction(#[source] PageError),

    /// The pipeline task died without returning, e.g. a collaborator panicked.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// What a successful session did.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub fields: Vec<FieldDescriptor>,
    pub report: FillReport,
    pub write_path: WritePath,
}
