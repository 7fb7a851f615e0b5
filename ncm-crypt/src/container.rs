use crate::{
    Error, Meta, Reader, Result,
    cipher::{self, KeyBox},
};
use base64::Engine;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

/// First eight bytes of every container.
pub const MAGIC: [u8; 8] = *b"CTENFDAM";

const KEY_XOR: u8 = 0x64;
const META_XOR: u8 = 0x63;
const KEY_PREFIX: &[u8] = b"neteasecloudmusic";
const META_PREFIX: &[u8] = b"163 key(Don't modify):";
const FLAC_SIGNATURE: &[u8] = b"fLaC";

/// Audio codec of the decrypted payload.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Flac,
}

impl AudioFormat {
    /// Sniffs the decrypted payload. Anything that is not flac is mp3.
    pub fn detect(audio: &[u8]) -> Self {
        if audio.starts_with(FLAC_SIGNATURE) {
            Self::Flac
        } else {
            Self::Mp3
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What to do when the metadata block decrypts but cannot be decoded.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaPolicy {
    /// Fail the whole file with [`Error::Metadata`].
    Abort,
    /// Decrypt the audio anyway and report the failure in
    /// [`DecryptResult::meta_failure`].
    #[default]
    Skip,
}

/// Everything recovered from one container.
#[derive(Debug)]
pub struct DecryptResult {
    pub meta: Meta,
    pub audio: Vec<u8>,
    pub cover_image: Option<Vec<u8>>,
    pub format: AudioFormat,
    /// Set when metadata could not be decoded under [`MetaPolicy::Skip`].
    /// `meta` is empty in that case.
    pub meta_failure: Option<Error>,
}

struct Header {
    audio_key: Vec<u8>,
    meta: Option<Result<Meta>>,
}

/// Opens and decrypts the container at `path`.
pub fn decrypt_file<P: AsRef<Path>>(path: P, policy: MetaPolicy) -> Result<DecryptResult> {
    let file = File::open(path.as_ref())?;
    decrypt(BufReader::new(file), policy)
}

/// Decrypts a whole container stream.
pub fn decrypt<R: Read>(reader: R, policy: MetaPolicy) -> Result<DecryptResult> {
    let mut reader = Reader::new(reader);
    let header = read_header(&mut reader)?;

    let (mut meta, meta_failure) = match header.meta {
        None => (Meta::default(), None),
        Some(Ok(meta)) => (meta, None),
        Some(Err(e)) if e.is_metadata_err() && policy == MetaPolicy::Skip => {
            debug!("metadata skipped: {e}");
            (Meta::default(), Some(e))
        }
        Some(Err(e)) => return Err(e),
    };

    reader.skip(4, "checksum")?;
    reader.skip(5, "gap")?;

    let cover = reader.read_block("cover image")?;
    let cover_image = if cover.is_empty() { None } else { Some(cover) };

    let key_box = KeyBox::new(&header.audio_key)?;
    let audio_offset = reader.get_position();
    let mut audio = reader.read_to_end()?;
    key_box.apply(&mut audio, 0);

    let format = AudioFormat::detect(&audio);

    if meta_failure.is_none() && meta.format_hint.is_empty() {
        meta.format_hint = format.extension().to_owned();
    }

    debug!(
        "decrypted {} bytes of {} audio at offset {}",
        audio.len(),
        format,
        audio_offset
    );

    Ok(DecryptResult {
        meta,
        audio,
        cover_image,
        format,
        meta_failure,
    })
}

/// Reads only as far as the metadata block and returns the decoded metadata.
pub fn inspect<R: Read>(reader: R) -> Result<Meta> {
    let mut reader = Reader::new(reader);

    match read_header(&mut reader)?.meta {
        Some(meta) => meta,
        None => Ok(Meta::default()),
    }
}

fn read_header<R: Read>(reader: &mut Reader<R>) -> Result<Header> {
    let magic = reader.read_array::<8>("magic header")?;

    if magic != MAGIC {
        return Err(Error::format("magic header mismatch"));
    }

    reader.skip(2, "gap")?;

    let mut key_block = reader.read_block("key block")?;
    xor(&mut key_block, KEY_XOR);
    let key = cipher::ecb_decrypt_unpad(&key_block, &cipher::CORE_KEY)?;
    let audio_key = strip_prefix(key, KEY_PREFIX);
    debug!("audio key is {} bytes", audio_key.len());

    let meta_block = reader.read_block("metadata block")?;
    let meta = if meta_block.is_empty() {
        debug!("no metadata block");
        None
    } else {
        match decode_meta(meta_block) {
            Err(e) if e.is_format_err() => return Err(e),
            x => Some(x),
        }
    };

    Ok(Header { audio_key, meta })
}

fn decode_meta(mut block: Vec<u8>) -> Result<Meta> {
    xor(&mut block, META_XOR);
    let block = strip_prefix(block, META_PREFIX);

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&block)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(&block))
        .map_err(|e| Error::metadata(format!("base64: {e}")))?;

    let plain = cipher::ecb_decrypt_unpad(&decoded, &cipher::META_KEY)?;
    Meta::parse(&plain)
}

fn xor(data: &mut [u8], mask: u8) {
    for x in data.iter_mut() {
        *x ^= mask;
    }
}

fn strip_prefix(mut data: Vec<u8>, prefix: &[u8]) -> Vec<u8> {
    if data.len() > prefix.len() && data.starts_with(prefix) {
        data.drain(..prefix.len());
    }

    data
}
