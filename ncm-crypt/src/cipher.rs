//! Block cipher unwrapping and the container's audio keystream.

use crate::{Error, Result};
use aes::{
    Aes128,
    cipher::{BlockDecrypt, KeyInit, generic_array::GenericArray},
};

pub const BLOCK_SIZE: usize = 16;

/// Key wrapping the per-file audio key block.
pub const CORE_KEY: [u8; 16] = [
    0x68, 0x7A, 0x48, 0x52, 0x41, 0x6D, 0x73, 0x6F, 0x35, 0x6B, 0x49, 0x6E, 0x62, 0x61, 0x78, 0x57,
];

/// Key wrapping the metadata block.
pub const META_KEY: [u8; 16] = [
    0x23, 0x31, 0x34, 0x6C, 0x6A, 0x6B, 0x5F, 0x21, 0x5C, 0x5D, 0x26, 0x30, 0x55, 0x3C, 0x27, 0x28,
];

/// Decrypts `data` with AES-128-ECB and strips PKCS#7 padding.
pub fn ecb_decrypt_unpad(data: &[u8], key: &[u8; 16]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(Error::format("empty data"));
    }

    if data.len() % BLOCK_SIZE != 0 {
        return Err(Error::format(format!(
            "data length {} not a multiple of block size",
            data.len()
        )));
    }

    let mut buf = data.to_vec();
    ecb_decrypt_in_place(&mut buf, key);
    let len = unpad(&buf)?;
    buf.truncate(len);
    Ok(buf)
}

pub(crate) fn ecb_decrypt_in_place(buf: &mut [u8], key: &[u8; 16]) {
    let cipher = Aes128::new(GenericArray::from_slice(key));

    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
}

/// Returns the unpadded length of `data`.
fn unpad(data: &[u8]) -> Result<usize> {
    let pad = match data.last() {
        Some(&x) => x as usize,
        None => return Err(Error::format("empty data")),
    };

    if pad == 0 || pad > BLOCK_SIZE || pad > data.len() {
        return Err(Error::format(format!("invalid padding length {pad}")));
    }

    Ok(data.len() - pad)
}

/// The 256 byte permutation masking the audio payload.
///
/// Built with the RC4 key schedule, but the mask is not the RC4 output stream:
/// byte `i` of the payload is masked with a value that depends only on
/// `(i + 1) mod 256`, so the mask repeats every 256 bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBox([u8; 256]);

impl KeyBox {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::format("empty audio key"));
        }

        let mut table = [0u8; 256];

        for (i, x) in table.iter_mut().enumerate() {
            *x = i as u8;
        }

        let mut j = 0u8;

        for i in 0..256 {
            j = j.wrapping_add(table[i]).wrapping_add(key[i % key.len()]);
            table.swap(i, j as usize);
        }

        Ok(Self(table))
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }

    /// Unmasks `buf` in place. `offset` is the position of `buf[0]` within
    /// the audio payload, which allows decrypting the payload in chunks.
    pub fn apply(&self, buf: &mut [u8], offset: u64) {
        let table = &self.0;
        let start = (offset % 256) as usize;

        for (i, x) in buf.iter_mut().enumerate() {
            let j = (start + i + 1) & 0xff;
            let k = table[j] as usize;
            *x ^= table[(k + table[(j + k) & 0xff] as usize) & 0xff];
        }
    }
}
