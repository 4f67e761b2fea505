use serde::Serialize;
use url::Url;

use super::error::ValidationError;

/// The `siteUrl` sent with every inspection: a URL-prefix property such as
/// `https://example.com/` or a domain property such as `sc-domain:example.com`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SiteRoot(String);

impl SiteRoot {
    /// `scheme://host[:port]/` of the sitemap. Only correct for URL-prefix
    /// properties; domain properties must be passed with [`SiteRoot::explicit`].
    pub fn from_sitemap_url(sitemap_url: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidSitemapUrl(sitemap_url.to_string());
        let url = Url::parse(sitemap_url.trim()).map_err(|_| invalid())?;
        let host = url.host_str().ok_or_else(invalid)?;
        let root = match url.port() {
            Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
            None => format!("{}://{}/", url.scheme(), host),
        };
        Ok(SiteRoot(root))
    }

    pub fn explicit(property: impl Into<String>) -> Self { SiteRoot(property.into().trim().to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for SiteRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}
