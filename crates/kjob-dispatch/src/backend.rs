use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use kjob_core::Backend;
use kjob_exec::{KubeBackend, KubeConfig, ProcBackend, ProcConfig};

use crate::args::{Args, BackendKind};

pub fn build(args: &Args) -> anyhow::Result<Arc<dyn Backend>> {
    match args.backend {
        BackendKind::Kube => {
            let cfg = KubeConfig::from_env().context("kubernetes configuration")?;
            info!(api_server = %cfg.api_server, namespace = %cfg.namespace, "using kubernetes backend");
            Ok(Arc::new(KubeBackend::new(cfg)?))
        }
        BackendKind::Proc => {
            let program = args
                .worker_program
                .clone()
                .context("--worker-program is required with --backend proc")?;
            info!(program = %program.display(), "using local process backend");
            Ok(Arc::new(ProcBackend::new(
                ProcConfig::new(program).with_args(args.worker_args.iter().cloned()),
            )))
        }
    }
}
