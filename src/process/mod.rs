//! Process and host introspection backing `ps`, `top`, `df`, `free` and
//! `whoami`, read through `sysinfo`.

pub mod host;
pub mod table;

pub use host::{DiskUsage, MemoryInfo};
pub use table::{ProcessInfo, ProcessTable};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    #[error("no mounted filesystem found for {0}")]
    NoFilesystem(String),
}

pub(crate) fn ensure_supported(what: &'static str) -> Result<(), ProcessError> {
    if sysinfo::IS_SUPPORTED_SYSTEM {
        Ok(())
    } else {
        Err(ProcessError::Unsupported(what))
    }
}

pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Human readable size: `512B`, `1.5K`, `3.2G`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];

    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return if unit == "B" {
                format!("{:.0}{}", value, unit)
            } else {
                format!("{:.1}{}", value, unit)
            };
        }
        value /= 1024.0;
    }
    format!("{:.1}P", value)
}
