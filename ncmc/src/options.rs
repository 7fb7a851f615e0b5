use crate::naming::DEFAULT_PATTERN;
use anyhow::{Context, Result};
use ncm_crypt::MetaPolicy;
use serde::Deserialize;
use std::{fs, num::NonZeroUsize, path::PathBuf, thread};

/// Settings of one conversion batch.
///
/// Field names follow the json written by the desktop front end, so a
/// configuration file can be deserialized directly.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Directory for converted files. `None` writes next to each source file.
    pub output_dir: Option<PathBuf>,
    pub filename_pattern: String,
    /// Copy `<name>.lrc` lyrics next to the output. Only honoured together
    /// with an explicit `output_dir`.
    #[serde(alias = "copyLrc")]
    pub copy_sidecar: bool,
    pub workers: Option<NonZeroUsize>,
    pub meta_policy: MetaPolicy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            filename_pattern: DEFAULT_PATTERN.to_owned(),
            copy_sidecar: false,
            workers: None,
            meta_policy: MetaPolicy::default(),
        }
    }
}

impl ConvertOptions {
    pub fn from_json_file<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let options = serde_json::from_str::<Self>(&text)
            .with_context(|| format!("cannot parse config {}", path.display()))?;
        Ok(options.normalized())
    }

    /// Maps empty strings coming from configuration files to their defaults.
    pub fn normalized(mut self) -> Self {
        if self
            .output_dir
            .as_ref()
            .is_some_and(|x| x.as_os_str().is_empty())
        {
            self.output_dir = None;
        }

        if self.filename_pattern.trim().is_empty() {
            self.filename_pattern = DEFAULT_PATTERN.to_owned();
        }

        self
    }

    /// Number of conversions allowed to run at once.
    pub fn worker_count(&self) -> usize {
        self.workers
            .or_else(|| thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_end_config() {
        let options = serde_json::from_str::<ConvertOptions>(
            r#"{"outputDir":"","filenamePattern":"","copyLrc":true}"#,
        )
        .unwrap()
        .normalized();

        assert_eq!(options.output_dir, None);
        assert_eq!(options.filename_pattern, "{title}");
        assert!(options.copy_sidecar);
        assert_eq!(options.meta_policy, MetaPolicy::Skip);
    }

    #[test]
    fn test_full_config() {
        let options = serde_json::from_str::<ConvertOptions>(
            r#"{"outputDir":"out","filenamePattern":"{artist} - {title}","copySidecar":false,"workers":3,"metaPolicy":"abort"}"#,
        )
        .unwrap()
        .normalized();

        assert_eq!(options.output_dir, Some(PathBuf::from("out")));
        assert_eq!(options.worker_count(), 3);
        assert_eq!(options.meta_policy, MetaPolicy::Abort);
    }

    #[test]
    fn test_default_workers() {
        assert!(ConvertOptions::default().worker_count() >= 1);
    }
}
