use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

/// The absolute base URL a site is published at.
///
/// Parsed once from configuration and immutable afterwards. Everything that
/// needs an absolute URL (permalinks, the sitemap, robots.txt) resolves
/// against this.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct SiteOrigin(Url);

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("invalid site origin: {0}")]
    InvalidOrigin(#[from] url::ParseError),

    #[error("site origin cannot be used as a base URL: {0}")]
    NotABase(String),
}

impl FromStr for SiteOrigin {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        if url.cannot_be_a_base() {
            return Err(ConfigurationError::NotABase(s.to_string()));
        }

        Ok(Self(url))
    }
}

impl fmt::Display for SiteOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SiteOrigin {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Resolves a relative reference against this origin.
    pub fn join(&self, reference: &str) -> Url {
        self.0
            .join(reference)
            .expect("origin was validated as a base URL")
    }

    /// The absolute URL of the `sitemap.xml` published for this origin.
    pub fn sitemap_url(&self) -> Url {
        self.join("sitemap.xml")
    }
}
