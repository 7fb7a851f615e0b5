#![cfg_attr(docsrs, feature(doc_cfg))]

//! This crate decrypts NCM music containers back into the mp3 or flac stream
//! they wrap, together with the song metadata embedded alongside it.
//!
//! ```no_run
//! use ncm_crypt::MetaPolicy;
//!
//! let result = ncm_crypt::decrypt_file("song.ncm", MetaPolicy::Skip)?;
//! println!("{} by {}", result.meta.music_name, result.meta.display_artist());
//! std::fs::write(format!("song.{}", result.format.extension()), &result.audio)?;
//! # Ok::<(), ncm_crypt::Error>(())
//! ```
//!
//! The container is a little-endian envelope holding an AES-wrapped key block,
//! an AES-wrapped metadata block, an optional cover image and the audio payload
//! masked with a keystream derived from the key block.

pub mod cipher;

mod container;
mod error;
mod meta;
mod reader;

pub use container::{AudioFormat, DecryptResult, MAGIC, MetaPolicy, decrypt, decrypt_file, inspect};
pub use error::Error;
pub use meta::{Artist, ArtistId, Meta};
pub use reader::Reader;

/// A `Result` alias where the `Err` case is `ncm_crypt::Error`.
pub type Result<T> = std::result::Result<T, Error>;
