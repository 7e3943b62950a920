/// Environment variable carrying the serialized work item into each unit.
pub const QUEUE_MESSAGE_ENV: &str = "QUEUE_MESSAGE";

/// Label attached to every job this dispatcher creates.
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`].
pub const MANAGED_BY: &str = "kjob";

/// Label carrying the unit index a job was built from.
pub const LABEL_INDEX: &str = "kjob.io/index";

pub const DEFAULT_JOB_PREFIX: &str = "job";
pub const DEFAULT_CONTAINER_NAME: &str = "my-sample-app";
pub const DEFAULT_IMAGE: &str = "my-sample-image:latest";

/// Seconds a finished job lingers before the backend deletes it.
pub const DEFAULT_TTL_SECONDS_AFTER_FINISHED: u32 = 1;

/// Kubernetes object names are DNS-1123 labels.
pub const MAX_JOB_NAME_LEN: usize = 63;
