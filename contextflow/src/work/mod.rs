//! Units of deferred work handed to the command engine.

mod unit;

pub use unit::{UnitOfWork, WorkError, WorkResult};
