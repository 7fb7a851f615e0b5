use anyhow::{Result, bail};
use reqwest::blocking::Client;
use std::time::Duration;

/// Upper bound for a whole cover download.
pub const COVER_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn client() -> Result<Client> {
    Ok(Client::builder().timeout(COVER_TIMEOUT).build()?)
}

/// Downloads cover art. An empty body counts as no cover.
pub(crate) fn fetch(client: &Client, url: &str) -> Result<Option<Vec<u8>>> {
    let response = client.get(url).send()?;
    let status = response.status();

    if !status.is_success() {
        bail!("HTTP {} from {}", status, url);
    }

    let bytes = response.bytes()?;
    Ok(if bytes.is_empty() {
        None
    } else {
        Some(bytes.to_vec())
    })
}
