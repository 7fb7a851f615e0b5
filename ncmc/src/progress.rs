use colored::Colorize;
use log::{debug, error, info};
use serde::Serialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Converting,
    Done,
    Error,
}

/// Progress of a single file. The first event of a file is `Converting` with
/// a zero fraction and the last one is `Done` or `Error`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertProgress {
    pub path: PathBuf,
    pub status: Status,
    pub size_bytes: u64,
    pub fraction: f64,
    pub output_path: Option<PathBuf>,
    pub error_message: Option<String>,
}

impl ConvertProgress {
    pub fn converting(path: &Path, size_bytes: u64, fraction: f64) -> Self {
        Self {
            path: path.to_owned(),
            status: Status::Converting,
            size_bytes,
            fraction,
            output_path: None,
            error_message: None,
        }
    }

    pub fn done(path: &Path, size_bytes: u64, output_path: PathBuf) -> Self {
        Self {
            path: path.to_owned(),
            status: Status::Done,
            size_bytes,
            fraction: 1.0,
            output_path: Some(output_path),
            error_message: None,
        }
    }

    pub fn error(path: &Path, size_bytes: u64, message: String) -> Self {
        Self {
            path: path.to_owned(),
            status: Status::Error,
            size_bytes,
            fraction: 0.0,
            output_path: None,
            error_message: Some(message),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != Status::Converting
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

/// Receiver of conversion events. Called concurrently from worker threads.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ConvertProgress);

    fn on_summary(&self, _summary: &BatchSummary) {}
}

/// Reports events through the `log` facade.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn on_progress(&self, event: &ConvertProgress) {
        let name = event.path.to_string_lossy();

        match event.status {
            Status::Converting if event.fraction == 0.0 => {
                info!("Converting {} ({})", name.bold(), ByteSize(event.size_bytes))
            }
            Status::Converting => debug!("{} {:.0}%", name, event.fraction * 100.0),
            Status::Done => info!(
                "{} {} -> {}",
                "Done".green(),
                name,
                event
                    .output_path
                    .as_deref()
                    .unwrap_or(Path::new(""))
                    .to_string_lossy()
                    .bold()
            ),
            Status::Error => error!(
                "{}: {}",
                name,
                event.error_message.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    fn on_summary(&self, summary: &BatchSummary) {
        info!(
            "Converted {}/{} files ({} failed)",
            summary.succeeded.to_string().green(),
            summary.total,
            if summary.failed > 0 {
                summary.failed.to_string().red()
            } else {
                summary.failed.to_string().normal()
            }
        );
    }
}

pub struct ByteSize(pub u64);

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KIB: f64 = 1024.0;
        const MIB: f64 = KIB * 1024.0;
        const GIB: f64 = MIB * 1024.0;

        let bytes = self.0 as f64;

        if bytes >= GIB {
            write!(f, "{:.1}GiB", bytes / GIB)
        } else if bytes >= MIB {
            write!(f, "{:.1}MiB", bytes / MIB)
        } else if bytes >= KIB {
            write!(f, "{:.1}KiB", bytes / KIB)
        } else {
            write!(f, "{}B", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_size() {
        assert_eq!(ByteSize(512).to_string(), "512B");
        assert_eq!(ByteSize(1536).to_string(), "1.5KiB");
        assert_eq!(ByteSize(10 * 1024 * 1024).to_string(), "10.0MiB");
    }

    #[test]
    fn test_event_json() {
        let event = ConvertProgress::error(Path::new("a.ncm"), 3, "boom".to_owned());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["sizeBytes"], 3);
        assert_eq!(json["errorMessage"], "boom");
        assert!(event.is_terminal());
        assert!(!ConvertProgress::converting(Path::new("a.ncm"), 3, 0.5).is_terminal());
    }
}
