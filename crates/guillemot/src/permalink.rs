use url::Url;

use crate::origin::SiteOrigin;

/// An absolute URL for a piece of content, resolved against the site origin.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct Permalink(Url);

impl Permalink {
    pub fn from_path(origin: &SiteOrigin, path: &str) -> Self {
        let path = path.trim_start_matches('/');

        let reference = if path.is_empty() || path.ends_with('/') {
            path.to_string()
        } else {
            format!("{path}/")
        };

        Self(origin.join(&reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0.as_str()
    }

    pub fn path(&self) -> &str {
        &self.0.path()
    }
}
