//! Process-wide `tracing` setup for the kjob binaries.
//!
//! Call [`init_logger`] once at startup; a second call fails with
//! [`LoggerError::AlreadyInitialized`].

mod config;
pub use config::LoggerConfig;

mod error;
pub use error::LoggerError;

mod format;
pub use format::LoggerFormat;

mod level;
pub use level::LoggerLevel;

mod init;

pub fn init_logger(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    match cfg.format {
        LoggerFormat::Text => init::text(cfg),
        LoggerFormat::Json => init::json(cfg),
        LoggerFormat::Journald => init::journald(cfg),
    }
}
