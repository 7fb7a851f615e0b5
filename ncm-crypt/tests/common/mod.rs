#![allow(dead_code)]

use aes::{
    Aes128,
    cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray},
};
use base64::Engine;
use ncm_crypt::{
    MAGIC,
    cipher::{CORE_KEY, KeyBox, META_KEY},
};

pub const SONG_JSON: &str = r#"{"musicId":"1","musicName":"Song","artist":[["Alice",1],["Bob","2"]],"album":"Album","albumPic":"","bitrate":320000,"format":""}"#;

/// Builds synthetic containers for tests.
pub struct Fixture {
    pub audio_key: Vec<u8>,
    pub meta_plain: Option<Vec<u8>>,
    pub cover: Vec<u8>,
    pub audio: Vec<u8>,
}

impl Fixture {
    pub fn new(audio: &[u8]) -> Self {
        Self {
            audio_key: b"123456789012345678901234567890E7fT49x7dof9OKCgg9cdvhEuezy3iZCL1nFvBFd1T4uSktAJKmwZXsijPbijliionVUXXg9plTbXEclAE9Lb".to_vec(),
            meta_plain: Some(format!("music:{SONG_JSON}").into_bytes()),
            cover: Vec::new(),
            audio: audio.to_vec(),
        }
    }

    pub fn meta_json(mut self, json: &str) -> Self {
        self.meta_plain = Some(format!("music:{json}").into_bytes());
        self
    }

    pub fn meta_plain(mut self, plain: &[u8]) -> Self {
        self.meta_plain = Some(plain.to_vec());
        self
    }

    pub fn no_meta(mut self) -> Self {
        self.meta_plain = None;
        self
    }

    pub fn cover(mut self, cover: &[u8]) -> Self {
        self.cover = cover.to_vec();
        self
    }

    pub fn key_block(&self) -> Vec<u8> {
        let mut plain = b"neteasecloudmusic".to_vec();
        plain.extend_from_slice(&self.audio_key);
        let mut block = ecb_encrypt_pad(&plain, &CORE_KEY);
        xor(&mut block, 0x64);
        block
    }

    pub fn meta_block(&self) -> Vec<u8> {
        let Some(plain) = &self.meta_plain else {
            return Vec::new();
        };

        let encoded =
            base64::engine::general_purpose::STANDARD.encode(ecb_encrypt_pad(plain, &META_KEY));
        let mut block = format!("163 key(Don't modify):{encoded}").into_bytes();
        xor(&mut block, 0x63);
        block
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with_blocks(&self.key_block(), &self.meta_block())
    }

    pub fn build_with_blocks(&self, key_block: &[u8], meta_block: &[u8]) -> Vec<u8> {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(&[0x01, 0x70]);
        push_block(&mut data, key_block);
        push_block(&mut data, meta_block);
        data.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        data.extend_from_slice(&[0; 5]);
        push_block(&mut data, &self.cover);

        let mut audio = self.audio.clone();
        KeyBox::new(&self.audio_key).unwrap().apply(&mut audio, 0);
        data.extend_from_slice(&audio);
        data
    }
}

pub fn ecb_encrypt_pad(data: &[u8], key: &[u8; 16]) -> Vec<u8> {
    let pad = 16 - data.len() % 16;
    let mut buf = data.to_vec();
    buf.extend(std::iter::repeat_n(pad as u8, pad));
    let cipher = Aes128::new(GenericArray::from_slice(key));

    for block in buf.chunks_exact_mut(16) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }

    buf
}

pub fn xor(data: &mut [u8], mask: u8) {
    for x in data.iter_mut() {
        *x ^= mask;
    }
}

fn push_block(data: &mut Vec<u8>, block: &[u8]) {
    data.extend_from_slice(&(block.len() as u32).to_le_bytes());
    data.extend_from_slice(block);
}

/// A minimal flac stream: STREAMINFO followed by fake frame bytes.
pub fn flac_audio(frames: &[u8]) -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    data.push(0x80);
    data.extend_from_slice(&[0, 0, 34]);
    data.extend_from_slice(&[0x11; 34]);
    data.extend_from_slice(frames);
    data
}
