//! Batch conversion of NCM containers into tagged mp3 and flac files.
//!
//! ```no_run
//! use ncmc::{ConvertOptions, Converter, LogSink};
//! use std::path::PathBuf;
//!
//! let options = ConvertOptions {
//!     output_dir: Some(PathBuf::from("out")),
//!     filename_pattern: "{artist} - {title}".to_owned(),
//!     ..Default::default()
//! };
//!
//! let summary = Converter::new(options).run(&[PathBuf::from("song.ncm")], &LogSink)?;
//! assert_eq!(summary.succeeded + summary.failed, summary.total);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod commands;
mod cover;

pub mod convert;
pub mod logger;
pub mod naming;
pub mod options;
pub mod progress;
pub mod tag;

#[doc(hidden)]
pub use commands::Args;
pub use convert::{CancelToken, Converter};
pub use ncm_crypt;
pub use options::ConvertOptions;
pub use progress::{BatchSummary, ConvertProgress, LogSink, ProgressSink, Status};
