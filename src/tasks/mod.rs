//! Background jobs.

mod refresh;

pub use refresh::RefreshTask;
