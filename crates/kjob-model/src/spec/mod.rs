mod policy;
pub use policy::{ExecutionPolicy, PullPolicy, RestartPolicy};

mod job_spec;
pub use job_spec::{JobSpec, Labels};

mod template;
pub use template::JobTemplate;
