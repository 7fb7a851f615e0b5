use crate::progress::ByteSize;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use ncm_crypt::MetaPolicy;
use std::{fs::File, io::BufReader, path::PathBuf};

/// Print the metadata of an NCM file without writing any output.
#[derive(Debug, Clone, Args)]
pub struct Inspect {
    /// NCM file to inspect.
    #[arg(required = true)]
    input: PathBuf,

    /// Print only the embedded metadata as json.
    #[arg(long)]
    json: bool,
}

impl Inspect {
    pub fn execute(self) -> Result<()> {
        if self.json {
            let file = File::open(&self.input)
                .with_context(|| format!("cannot open {}", self.input.display()))?;
            let meta = ncm_crypt::inspect(BufReader::new(file))?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
            return Ok(());
        }

        let result = ncm_crypt::decrypt_file(&self.input, MetaPolicy::Skip)
            .with_context(|| format!("cannot decrypt {}", self.input.display()))?;
        let meta = &result.meta;

        if let Some(e) = &result.meta_failure {
            println!("{:>9} {}", "Warning".bold().yellow(), e);
        }

        println!("{:>9} {}", "Format".bold().green(), result.format);
        println!("{:>9} {}", "Title".bold().green(), meta.music_name);
        println!("{:>9} {}", "Artist".bold().green(), meta.display_artist());
        println!("{:>9} {}", "Album".bold().green(), meta.album);
        println!("{:>9} {}", "Cover".bold().green(), meta.album_pic_url);
        println!("{:>9} {}", "Bitrate".bold().green(), meta.bitrate_hint);
        println!(
            "{:>9} {}",
            "Audio".bold().green(),
            ByteSize(result.audio.len() as u64)
        );
        println!(
            "{:>9} {}",
            "Image".bold().green(),
            ByteSize(result.cover_image.as_ref().map_or(0, |x| x.len() as u64))
        );
        Ok(())
    }
}
