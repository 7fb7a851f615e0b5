//! Concurrent batch conversion.

use crate::{
    ConvertOptions,
    progress::{BatchSummary, ConvertProgress, ProgressSink},
    tag::TagWriter,
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::{
    any::Any,
    fs,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// Stops a running batch from starting further files. Files already being
/// converted run to completion.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Tally {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    running: AtomicUsize,
    peak: AtomicUsize,
}

/// Marks one unit of work as running for as long as it lives.
struct Slot<'a>(&'a Tally);

impl<'a> Slot<'a> {
    fn acquire(tally: &'a Tally) -> Self {
        let running = tally.running.fetch_add(1, Ordering::SeqCst) + 1;
        tally.peak.fetch_max(running, Ordering::SeqCst);
        Self(tally)
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Converts batches of containers with a fixed size worker pool.
pub struct Converter {
    options: ConvertOptions,
    cancel: CancelToken,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options: options.normalized(),
            cancel: CancelToken::default(),
        }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Converts every file in `paths`, emitting exactly one terminal event per
    /// file, then the batch summary.
    ///
    /// Per file failures never fail the batch; an error is returned only when
    /// the worker pool itself cannot be set up.
    pub fn run(&self, paths: &[PathBuf], sink: &dyn ProgressSink) -> Result<BatchSummary> {
        let workers = self.options.worker_count().min(paths.len()).max(1);
        let writer = TagWriter::new().context("cannot create http client")?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ncmc-worker-{i}"))
            .build()
            .context("cannot create worker pool")?;
        let (tx, rx) = crossbeam_channel::bounded::<&Path>(workers);
        let tally = Tally::default();

        debug!("converting {} files with {} workers", paths.len(), workers);

        pool.in_place_scope(|scope| {
            for _ in 0..workers {
                let rx = rx.clone();
                let writer = writer.clone();
                let tally = &tally;

                scope.spawn(move |_| {
                    for path in rx {
                        self.run_unit(path, &writer, sink, tally);
                    }
                });
            }

            drop(rx);

            for (i, path) in paths.iter().enumerate() {
                let reason = if self.cancel.is_cancelled() {
                    "cancelled before start"
                } else if tx.send(path).is_err() {
                    "worker pool stopped"
                } else {
                    continue;
                };

                warn!("{} files not converted: {}", paths.len() - i, reason);

                for path in &paths[i..] {
                    tally.failed.fetch_add(1, Ordering::SeqCst);
                    sink.on_progress(&ConvertProgress::error(path, 0, reason.to_owned()));
                }

                break;
            }

            drop(tx);
        });

        let summary = BatchSummary {
            succeeded: tally.succeeded.load(Ordering::SeqCst),
            failed: tally.failed.load(Ordering::SeqCst),
            total: paths.len(),
        };

        debug!("peak concurrency {}", tally.peak.load(Ordering::SeqCst));
        sink.on_summary(&summary);
        Ok(summary)
    }

    fn run_unit(&self, path: &Path, writer: &TagWriter, sink: &dyn ProgressSink, tally: &Tally) {
        let _slot = Slot::acquire(tally);
        let size = fs::metadata(path).map(|x| x.len());
        let size_bytes = size.as_ref().map_or(0, |x| *x);

        sink.on_progress(&ConvertProgress::converting(path, size_bytes, 0.0));

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            size.with_context(|| format!("cannot read {}", path.display()))?;
            self.convert_one(path, size_bytes, writer, sink)
        }));

        let event = match outcome {
            Ok(Ok(output)) => {
                tally.succeeded.fetch_add(1, Ordering::SeqCst);
                ConvertProgress::done(path, size_bytes, output)
            }
            Ok(Err(e)) => {
                tally.failed.fetch_add(1, Ordering::SeqCst);
                ConvertProgress::error(path, size_bytes, format!("{e:#}"))
            }
            Err(panic) => {
                tally.failed.fetch_add(1, Ordering::SeqCst);
                ConvertProgress::error(path, size_bytes, panic_message(panic))
            }
        };

        sink.on_progress(&event);
    }

    fn convert_one(
        &self,
        path: &Path,
        size_bytes: u64,
        writer: &TagWriter,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf> {
        let output_dir = match &self.options.output_dir {
            Some(dir) => dir.to_owned(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };

        if !output_dir.as_os_str().is_empty() {
            fs::create_dir_all(&output_dir)
                .with_context(|| format!("cannot create directory {}", output_dir.display()))?;
        }

        let result = ncm_crypt::decrypt_file(path, self.options.meta_policy)
            .with_context(|| format!("cannot decrypt {}", path.display()))?;

        if let Some(e) = &result.meta_failure {
            warn!("{}: {}, writing audio without tags", path.display(), e);
        }

        let mut on_progress =
            |fraction| sink.on_progress(&ConvertProgress::converting(path, size_bytes, fraction));
        let output = writer.write(
            result,
            &output_dir,
            &self.options.filename_pattern,
            Some(&mut on_progress),
        )?;

        if self.options.copy_sidecar && self.options.output_dir.is_some() {
            copy_sidecar(path, &output)?;
        }

        Ok(output)
    }
}

/// Copies `<source>.lrc`, if present, next to `output` under the output's
/// file stem.
fn copy_sidecar(source: &Path, output: &Path) -> Result<Option<PathBuf>> {
    let lyrics = source.with_extension("lrc");

    if !lyrics.is_file() {
        return Ok(None);
    }

    let target = output.with_extension("lrc");

    if target == lyrics {
        return Ok(None);
    }

    fs::copy(&lyrics, &target).with_context(|| {
        format!(
            "cannot copy lyrics {} to {}",
            lyrics.display(),
            target.display()
        )
    })?;

    info!("Copied lyrics {}", target.display());
    Ok(Some(target))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    let reason = panic
        .downcast_ref::<&str>()
        .map(|x| x.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown reason".to_owned());

    format!("conversion panicked: {reason}")
}
