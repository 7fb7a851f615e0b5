use super::{Tags, writer};
use anyhow::Result;
use lofty::{Accessor, MimeType, Picture, PictureType, Probe, Tag, TagExt, TagType, TaggedFileExt};
use log::warn;
use std::path::Path;

pub(super) fn write(
    audio: &[u8],
    path: &Path,
    tags: Option<&Tags>,
    cover: Option<&[u8]>,
    progress: Option<&mut dyn FnMut(f64)>,
) -> Result<()> {
    writer::write_file(path, &[audio], progress)?;

    if let Some(tags) = tags
        && let Err(e) = write_id3(path, tags, cover)
    {
        warn!("{}: cannot write id3 tag ({e}), keeping untagged audio", path.display());
    }

    Ok(())
}

/// Rewrites title, artist, album and front cover of the ID3v2 tag, keeping
/// whatever else an existing tag carries.
fn write_id3(path: &Path, tags: &Tags, cover: Option<&[u8]>) -> lofty::error::Result<()> {
    let mut tag = Probe::open(path)
        .and_then(|x| x.read())
        .ok()
        .and_then(|x| x.tag(TagType::Id3v2).cloned())
        .unwrap_or_else(|| Tag::new(TagType::Id3v2));

    if !tags.title.is_empty() {
        tag.set_title(tags.title.clone());
    }

    if !tags.artist.is_empty() {
        tag.set_artist(tags.artist.clone());
    }

    if !tags.album.is_empty() {
        tag.set_album(tags.album.clone());
    }

    if let Some(cover) = cover {
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Jpeg),
            None,
            cover.to_vec(),
        ));
    }

    tag.save_to_path(path)
}
