use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::origin::{ConfigurationError, SiteOrigin};

/// Site-wide configuration, read from `site.toml` at the site root.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_posts_on_homepage")]
    pub posts_on_homepage: usize,
    #[serde(default)]
    pub socials: Vec<Social>,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

fn default_posts_on_homepage() -> usize {
    5
}

/// A link to an external profile, rendered in the site chrome.
#[derive(Debug, Clone, Deserialize)]
pub struct Social {
    pub name: String,
    pub href: String,
}

/// Build-time capabilities that can be switched off per site.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub sitemap: bool,
    pub robots: bool,
    pub search: bool,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            sitemap: true,
            robots: true,
            search: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitemapConfig {
    /// Path prefixes excluded from the published sitemap.
    #[serde(default)]
    pub exclude_prefixes: Vec<String>,
}

#[derive(Error, Debug)]
pub enum LoadConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SiteConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadConfigError> {
        let contents = fs::read_to_string(path)?;

        Ok(toml::from_str(&contents)?)
    }

    /// Parses the configured `base_url` into a [`SiteOrigin`].
    ///
    /// A malformed base URL surfaces here, at site build time, rather than on
    /// any per-request path.
    pub fn origin(&self) -> Result<SiteOrigin, ConfigurationError> {
        self.base_url.parse()
    }
}
