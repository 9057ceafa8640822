//! Testing utilities for wrapper chains.
//!
//! This module provides:
//! - An order-recording call log
//! - Recording and pass-through wrapper doubles
//! - Assertions over install/teardown nesting

mod assertions;
mod recording;

pub use assertions::{assert_contexts_nested, assert_torn_down_once};
pub use recording::{CallLog, PassThroughWrapper, RecordingWrapper};
