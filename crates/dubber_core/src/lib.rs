//! Dubber core: pure upload/processing lifecycle state machine.
//!
//! All decisions live in [`update`]; IO is requested through [`Effect`]s and
//! results come back as [`Msg`]s tagged with the [`Generation`] that issued
//! them.
mod effect;
mod msg;
mod phase;
mod settings;
mod state;
mod update;
mod validate;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use phase::{Phase, ReportedPhase};
pub use settings::{ControllerSettings, PreviewPolicy, DEFAULT_SERVICE_BASE};
pub use state::{AppState, Generation, JobId, PreviewId};
pub use update::update;
pub use validate::{
    validate, AcceptedAsset, AssetLimits, CandidateFile, ValidationError, ALLOWED_CONTENT_TYPES,
    MAX_UPLOAD_BYTES,
};
pub use view_model::AppViewModel;
