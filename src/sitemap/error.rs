use reqwest::StatusCode;

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Timeout,
    Status { url: String, status: StatusCode },
    Xml(String),
    NotASitemap(String),
    SitemapIndex,
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Http(err) }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "could not download sitemap: {err}"),
            FetchError::Timeout => write!(f, "sitemap download timed out"),
            FetchError::Status { url, status } => write!(f, "sitemap {url} answered {status}"),
            FetchError::Xml(msg) => write!(f, "sitemap is not valid XML: {msg}"),
            FetchError::NotASitemap(root) => write!(f, "expected a <urlset> document, found <{root}>"),
            FetchError::SitemapIndex => {
                write!(f, "sitemap index documents are not supported; pass one of the child sitemaps")
            }
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err),
            _ => None,
        }
    }
}
