//! Ambient, thread-associated context slots.
//!
//! This module provides:
//! - The diagnostic (logging) context map
//! - Request-scoped attributes and their holder
//! - The release-on-drop guard used to tear installed context down
//!
//! Every thread owns an independent slot per context kind. Slots are changed
//! through scoped guards so each install is paired with a release.

mod diagnostic;
mod guard;
mod request;

pub use diagnostic::{DiagnosticContext, DiagnosticMap, DiagnosticScope};
pub use guard::TeardownGuard;
pub use request::{RequestAttributes, RequestContextHolder, RequestScope};
