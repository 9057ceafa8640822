//! Context wrappers and the chain that composes them.

mod chain;
mod diagnostic;
mod request;
mod span;

pub use chain::{
    build_chain, CapturedChain, CapturedContext, ContextWrapper, ContextWrapperExt, WrapperChain,
};
pub use diagnostic::{DiagnosticContextWrapper, TeardownMode};
pub use request::RequestAttributesWrapper;
pub use span::SpanContextWrapper;
