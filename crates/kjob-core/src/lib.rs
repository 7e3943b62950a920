//! Admission-controlled dispatch of batch jobs.
//!
//! A [`Dispatcher`] walks unit indices `0..n` in order. Before each submission it
//! asks its [`Backend`] how many jobs are active and holds the unit back while
//! that number is at or above the configured ceiling.

pub mod error;
pub use error::{CoreError, ObserveError, SubmitError};

pub mod backend;
pub use backend::Backend;

pub mod config;
pub use config::DispatchConfig;

pub mod dispatcher;
pub use dispatcher::Dispatcher;

pub mod report;
pub use report::{Abandoned, DispatchReport, Submitted};
