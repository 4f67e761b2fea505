use bytes::Bytes;
use reqwest::Client;

use super::error::FetchError;

pub async fn fetch_sitemap(client: &Client, url: &str) -> Result<Bytes, FetchError> {
    let resp = client.get(url).send().await.map_err(FetchError::from_reqwest)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status { url: url.to_string(), status });
    }
    resp.bytes().await.map_err(FetchError::from_reqwest)
}
