//! Writes decrypted audio to disk as tagged mp3 or flac.

mod flac;
mod mp3;
mod writer;

pub use writer::ProgressWriter;

use crate::{cover, naming};
use anyhow::{Context, Result};
use log::{debug, warn};
use ncm_crypt::{AudioFormat, DecryptResult, Meta};
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};

/// Text fields written into the output tag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tags {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl From<&Meta> for Tags {
    fn from(meta: &Meta) -> Self {
        Self {
            title: meta.music_name.clone(),
            artist: meta.display_artist(),
            album: meta.album.clone(),
        }
    }
}

/// Turns [`DecryptResult`]s into files. Cheap to clone.
#[derive(Clone)]
pub struct TagWriter {
    client: Client,
}

impl TagWriter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: cover::client()?,
        })
    }

    /// Writes `result` into `output_dir` using the file name `pattern` and
    /// returns the path of the new file.
    ///
    /// Only I/O errors fail the write. A cover that cannot be downloaded is
    /// skipped and a tag that cannot be encoded leaves the audio untagged.
    pub fn write(
        &self,
        result: DecryptResult,
        output_dir: &Path,
        pattern: &str,
        progress: Option<&mut dyn FnMut(f64)>,
    ) -> Result<PathBuf> {
        let name = naming::apply_pattern(pattern, &result.meta);
        let path = output_dir.join(format!("{}.{}", name, result.format.extension()));

        // Undecodable metadata leaves nothing trustworthy to tag with.
        let tags = match result.meta_failure {
            Some(_) => None,
            None => Some(Tags::from(&result.meta)),
        };

        let cover = match &tags {
            Some(_) => self.resolve_cover(&result),
            None => None,
        };

        debug!(
            "writing {} ({} bytes, cover: {})",
            path.display(),
            result.audio.len(),
            cover.as_ref().map_or(0, Vec::len)
        );

        let (audio, tags, cover) = (&result.audio, tags.as_ref(), cover.as_deref());

        match result.format {
            AudioFormat::Mp3 => mp3::write(audio, &path, tags, cover, progress),
            AudioFormat::Flac => flac::write(audio, &path, tags, cover, progress),
        }
        .with_context(|| format!("cannot write {}", path.display()))?;

        Ok(path)
    }

    fn resolve_cover(&self, result: &DecryptResult) -> Option<Vec<u8>> {
        if let Some(cover) = &result.cover_image {
            return Some(cover.clone());
        }

        let url = result.meta.album_pic_url.as_str();

        if url.is_empty() {
            return None;
        }

        match cover::fetch(&self.client, url) {
            Ok(cover) => cover,
            Err(e) => {
                warn!("cannot download cover {url}: {e:#}");
                None
            }
        }
    }
}
