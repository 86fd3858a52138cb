use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::prelude::*;

/// Give up once we have tried this many times.
const MAX_RETRIES: u32 = 5;

/// Build a default client.
pub fn try_new() -> Result<Client> {
    Ok(Client::builder().timeout(Duration::from_secs(10)).build()?)
}

/// GET a JSON payload with exponential backoff.
///
/// The APIs misbehave rarely but they do: transient errors are retried after
/// `2^n` seconds, anything still failing after [`MAX_RETRIES`] attempts
/// propagates.
#[instrument(skip(client))]
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    let mut attempt = 0;
    loop {
        match try_get_json(client, url).await {
            Ok(payload) => return Ok(payload),
            Err(error) if attempt + 1 < MAX_RETRIES => {
                let backoff = Duration::from_secs(1 << attempt);
                warn!(attempt, backoff = ?backoff, "request failed, retrying: {error:#}");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(error) => {
                return Err(error.context("API retry limit exceeded"));
            }
        }
    }
}

async fn try_get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    client
        .get(url)
        .send()
        .await
        .context("failed to call")?
        .error_for_status()
        .context("request failed")?
        .json()
        .await
        .context("failed to deserialize the response")
}
