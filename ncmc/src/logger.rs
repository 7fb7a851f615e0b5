use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

static LOGGER: Logger = Logger;

/// Writes log records to stderr, keeping stdout free for command output.
///
/// Info records are printed bare. At debug verbosity every record carries its
/// level, target and source location.
pub struct Logger;

impl Logger {
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let verbose = log::max_level() >= LevelFilter::Debug;
        let mut prefix = String::new();

        if verbose || record.level() != Level::Info {
            prefix = format!("{} ", label(record.level()));
        }

        if verbose {
            prefix = format!("{prefix}{} {} ", record.target().dimmed(), location(record));
        }

        eprintln!("{prefix}{}", record.args());
    }

    fn flush(&self) {}
}

fn location(record: &Record) -> ColoredString {
    match (record.file(), record.line()) {
        (Some(file), Some(line)) => format!("[{file}:{line}]").dimmed(),
        _ => "[unk]".dimmed(),
    }
}

fn label(level: Level) -> ColoredString {
    match level {
        Level::Error => "error:".bold().red(),
        Level::Warn => "warning:".bold().yellow(),
        Level::Info => "info:".bold().green(),
        Level::Debug => "debug:".bold().blue(),
        Level::Trace => "trace:".bold().purple(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_falls_back() {
        colored::control::set_override(false);
        let record = Record::builder().args(format_args!("x")).build();
        assert_eq!(location(&record).to_string(), "[unk]");

        let record = Record::builder()
            .args(format_args!("x"))
            .file(Some("src/convert.rs"))
            .line(Some(7))
            .build();
        assert_eq!(location(&record).to_string(), "[src/convert.rs:7]");
    }

    #[test]
    fn test_second_init_fails() {
        let _ = Logger::init(LevelFilter::Off);
        let error = anyhow::Error::from(Logger::init(LevelFilter::Off).unwrap_err());
        assert!(!error.to_string().is_empty());
    }
}
