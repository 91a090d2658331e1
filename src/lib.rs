//! Client for a smart-grid stability inference backend: typed endpoint
//! access, correlation payload normalization, feature ranking and plain-text
//! views.

pub mod api;
pub mod dataset;
pub mod logging;
pub mod prediction;
pub mod rank;
pub mod render;
pub mod report;
pub mod session;
pub mod shape;
pub mod state;
