use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

/// Counts bytes written to `inner` and reports the cumulative fraction.
///
/// The callback fires at most once per whole percent and exactly once at
/// 100%, including for empty payloads (on [`ProgressWriter::finish`]).
pub struct ProgressWriter<'a, W> {
    inner: W,
    total: u64,
    written: u64,
    reported: u8,
    callback: Option<&'a mut dyn FnMut(f64)>,
}

impl<'a, W: Write> ProgressWriter<'a, W> {
    pub fn new(inner: W, total: u64, callback: Option<&'a mut dyn FnMut(f64)>) -> Self {
        Self {
            inner,
            total,
            written: 0,
            reported: 0,
            callback,
        }
    }

    /// Flushes the inner writer and emits the final 100% if it is still due.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;

        if self.reported < 100 {
            self.reported = 100;
            self.emit(1.0);
        }

        Ok(self.inner)
    }

    fn report(&mut self) {
        if self.total == 0 {
            return;
        }

        let written = self.written.min(self.total);
        let percent = (written * 100 / self.total) as u8;

        if percent > self.reported {
            self.reported = percent;
            self.emit(written as f64 / self.total as f64);
        }
    }

    fn emit(&mut self, fraction: f64) {
        if let Some(callback) = &mut self.callback {
            callback(fraction);
        }
    }
}

impl<W: Write> Write for ProgressWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        self.report();
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Writes `parts` back to back into a new file at `path`.
pub(crate) fn write_file(
    path: &Path,
    parts: &[&[u8]],
    progress: Option<&mut dyn FnMut(f64)>,
) -> io::Result<()> {
    let total = parts.iter().map(|x| x.len() as u64).sum();
    let mut writer = ProgressWriter::new(File::create(path)?, total, progress);

    for mut part in parts.iter().copied() {
        io::copy(&mut part, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(total: usize, chunk: usize) -> Vec<f64> {
        let mut seen = Vec::new();
        let mut callback = |x: f64| seen.push(x);
        let mut writer = ProgressWriter::new(Vec::new(), total as u64, Some(&mut callback));

        for part in vec![0u8; total].chunks(chunk.max(1)) {
            writer.write_all(part).unwrap();
        }

        assert_eq!(writer.finish().unwrap().len(), total);
        seen
    }

    #[test]
    fn test_throttled_to_whole_percent() {
        let seen = record(100_000, 7);
        assert_eq!(seen.len(), 100);
        assert_eq!(seen.iter().filter(|x| **x == 1.0).count(), 1);
        assert!(seen.windows(2).all(|x| x[0] < x[1]));
        assert_eq!(*seen.last().unwrap(), 1.0);
    }

    #[test]
    fn test_large_chunks_skip_percents() {
        let seen = record(1000, 400);
        assert_eq!(seen, vec![0.4, 0.8, 1.0]);
    }

    #[test]
    fn test_empty_payload_reports_once() {
        assert_eq!(record(0, 1), vec![1.0]);
    }

    #[test]
    fn test_without_callback() {
        let mut writer = ProgressWriter::new(Vec::new(), 3, None);
        writer.write_all(b"abc").unwrap();
        assert_eq!(writer.finish().unwrap(), b"abc");
    }
}
