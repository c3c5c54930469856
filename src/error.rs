use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Target cannot be empty")]
    EmptyTarget,

    #[error("Target seems too short")]
    TargetTooShort,

    #[error("failed to launch {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// nmap produced no usable XML; carries whatever it wrote to stderr.
    #[error("{stderr}")]
    NmapReported { stderr: String },

    #[error("nmap exited with status {code}")]
    NmapExit { code: i32 },

    #[error("unreadable nmap output: {0}")]
    InvalidXml(String),

    #[error("Scan timed out after {0}s")]
    Timeout(u64),

    #[error("config error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}
