//! Session state: model, normalization and versioned migration.
//!
//! State is client-held. Every turn starts by running the incoming blob
//! through [`migrate`] (which normalizes first), so the rest of the crate
//! only ever sees a well-formed [`CanvasState`].

pub mod migrate;
pub mod model;
pub mod normalize;

pub use migrate::migrate;
pub use model::{
    CanvasState, DreamRuntimeMode, StepId, CURRENT_STATE_VERSION, FINALS_KEYS,
};
pub use normalize::normalize;
