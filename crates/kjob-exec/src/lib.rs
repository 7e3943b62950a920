//! Execution backends for the kjob dispatcher.
//!
//! - `kube`: Kubernetes `batch/v1` Jobs over the API server's REST interface.
//! - `proc`: local child processes, one per job; mostly for development and tests.

#[cfg(feature = "kube")]
pub mod kube;
#[cfg(feature = "kube")]
pub use kube::{KubeBackend, KubeConfig, KubeError};

#[cfg(feature = "proc")]
pub mod proc;
#[cfg(feature = "proc")]
pub use proc::{ProcBackend, ProcConfig};
