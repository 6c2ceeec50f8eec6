//! Refresh pipeline for botskills.
//!
//! Reads the cognitive models manifest, assembles the refresh configuration,
//! and drives the external generators that rebuild the dispatcher model and
//! its binding classes.

pub mod assembler;
pub mod manifest;
pub mod recognizer;
pub mod refresh;
