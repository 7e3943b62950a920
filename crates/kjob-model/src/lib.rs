//! Data model shared by the dispatcher, its backends and the worker program.
//!
//! Everything here is plain data: a [`WorkItem`] becomes a [`JobSpec`] through a
//! [`JobTemplate`], and a backend turns that into a running unit of work.

mod error;
pub use error::{ModelError, PayloadError};

mod constants;
pub use constants::*;

mod domain;
pub use domain::*;

mod spec;
pub use spec::*;
