//! FLAC tagging through lofty's Vorbis comment writer.
//!
//! lofty 0.18 rewrites the last-block flag at the wrong offset when a stream
//! has no PADDING block, so one is inserted before the tag is saved.

use super::{Tags, writer};
use anyhow::{Result, bail};
use lofty::{
    Accessor, MimeType, Picture, PictureInformation, PictureType, TagExt,
    ogg::{OggPictureStorage, VorbisComments},
};
use log::warn;
use std::{borrow::Cow, path::Path};

const SIGNATURE: &[u8] = b"fLaC";
const LAST_BLOCK: u8 = 0x80;
const PADDING: u8 = 1;
const VENDOR: &str = concat!("ncmc ", env!("CARGO_PKG_VERSION"));

/// Returns `audio` with an empty PADDING block appended after the last
/// metadata block, or unchanged when it already carries one.
fn with_padding(audio: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !audio.starts_with(SIGNATURE) {
        bail!("missing fLaC signature");
    }

    let mut pos = SIGNATURE.len();

    loop {
        let Some(header) = audio.get(pos..pos + 4) else {
            bail!("truncated metadata block header at {pos}");
        };

        if header[0] & 0x7f == PADDING {
            return Ok(Cow::Borrowed(audio));
        }

        let end = pos + 4 + u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;

        if end > audio.len() {
            bail!("truncated metadata block at {pos}");
        }

        if header[0] & LAST_BLOCK != 0 {
            let mut padded = Vec::with_capacity(audio.len() + 4);
            padded.extend_from_slice(&audio[..end]);
            padded[pos] &= !LAST_BLOCK;
            padded.extend_from_slice(&[LAST_BLOCK | PADDING, 0, 0, 0]);
            padded.extend_from_slice(&audio[end..]);
            return Ok(Cow::Owned(padded));
        }

        pos = end;
    }
}

/// Replaces the Vorbis comments of the flac file at `path` and adds the front
/// cover. Empty fields are left out.
fn save_comments(path: &Path, tags: &Tags, cover: Option<&[u8]>) -> lofty::error::Result<()> {
    let mut comments = VorbisComments::default();
    comments.set_vendor(VENDOR.to_owned());
    comments.set_title(tags.title.clone());
    comments.set_artist(tags.artist.clone());
    comments.set_album(tags.album.clone());

    if let Some(cover) = cover {
        comments.insert_picture(
            Picture::new_unchecked(
                PictureType::CoverFront,
                Some(MimeType::Jpeg),
                None,
                cover.to_vec(),
            ),
            Some(PictureInformation::default()),
        )?;
    }

    comments.save_to_path(path)
}

pub(super) fn write(
    audio: &[u8],
    path: &Path,
    tags: Option<&Tags>,
    cover: Option<&[u8]>,
    progress: Option<&mut dyn FnMut(f64)>,
) -> Result<()> {
    let Some(tags) = tags else {
        writer::write_file(path, &[audio], progress)?;
        return Ok(());
    };

    let padded = match with_padding(audio) {
        Ok(x) => x,
        Err(e) => {
            warn!("{}: cannot tag flac ({e}), writing untagged audio", path.display());
            writer::write_file(path, &[audio], progress)?;
            return Ok(());
        }
    };

    writer::write_file(path, &[padded.as_ref()], progress)?;

    if let Err(e) = save_comments(path, tags, cover) {
        warn!("{}: cannot save flac tags ({e}), writing untagged audio", path.display());
        writer::write_file(path, &[audio], None)?;
    }

    Ok(())
}
