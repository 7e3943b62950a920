mod kv;
pub use kv::KeyValue;

mod env;
pub use env::Env;

mod secret;
pub use secret::SecretRef;

mod job_name;
pub use job_name::JobName;

mod job_status;
pub use job_status::JobStatus;

mod work_item;
pub use work_item::WorkItem;

/// Index of a unit of work within one dispatch run.
pub type UnitIndex = usize;
