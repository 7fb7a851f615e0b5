use crate::{ConvertOptions, Converter, LogSink};
use anyhow::{Result, bail};
use clap::Args;
use log::{error, warn};
use ncm_crypt::MetaPolicy;
use std::{num::NonZeroUsize, path::PathBuf, process};

/// Decrypt NCM files and write tagged audio.
#[derive(Debug, Clone, Args)]
pub struct Convert {
    /// NCM files to convert.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory for converted files.
    /// By default each file is written next to its source.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output file name. Supports {title}, {artist} and {album} placeholders.
    #[arg(short, long, value_name = "PATTERN")]
    pattern: Option<String>,

    /// Copy `<name>.lrc` lyrics found next to a source file into the output directory.
    /// Has no effect without `--output-dir`.
    #[arg(long)]
    copy_lrc: bool,

    /// Maximum number of files converted at once.
    /// By default the number of available cpus is used.
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Fail a file whose metadata cannot be decoded instead of writing its audio untagged.
    #[arg(long)]
    abort_on_bad_meta: bool,

    /// Read options from a json file (outputDir, filenamePattern, copyLrc).
    /// Flags given on the command line take precedence.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Convert {
    fn options(&self) -> Result<ConvertOptions> {
        let mut options = match &self.config {
            Some(path) => ConvertOptions::from_json_file(path)?,
            None => ConvertOptions::default(),
        };

        if let Some(output_dir) = &self.output_dir {
            options.output_dir = Some(output_dir.to_owned());
        }

        if let Some(pattern) = &self.pattern {
            options.filename_pattern = pattern.to_owned();
        }

        if self.copy_lrc {
            options.copy_sidecar = true;
        }

        if self.threads.is_some() {
            options.workers = self.threads;
        }

        if self.abort_on_bad_meta {
            options.meta_policy = MetaPolicy::Abort;
        }

        Ok(options)
    }

    pub fn execute(self) -> Result<()> {
        let converter = Converter::new(self.options()?);
        let token = converter.cancel_token();

        ctrlc::set_handler(move || {
            if token.is_cancelled() {
                error!("Ctrl+C received, force exiting.");
                process::exit(1);
            }

            warn!("Ctrl+C received, finishing running conversions.");
            token.cancel();
        })?;

        let summary = converter.run(&self.files, &LogSink)?;

        if summary.failed > 0 {
            bail!("{} of {} files failed to convert.", summary.failed, summary.total);
        }

        Ok(())
    }
}
