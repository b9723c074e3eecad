use std::path::{Path, PathBuf};
use std::{fmt, fs};

use serde::Deserialize;
use thiserror::Error;

use crate::content::{from_toml_datetime, parse_front_matter};
use crate::origin::SiteOrigin;
use crate::permalink::Permalink;

/// A single piece of content: a Markdown file with TOML front matter.
#[derive(Debug)]
pub struct Page {
    pub meta: PageFrontMatter,
    pub file_path: PathBuf,
    pub path: PagePath,
    pub slug: String,
    pub permalink: Permalink,
    pub raw_content: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PagePath(pub(crate) String);

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PagePath {
    pub fn new(parent: &str, slug: &str) -> Self {
        if parent.is_empty() {
            Self(format!("/{slug}"))
        } else {
            Self(format!("/{parent}/{slug}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
pub struct PageFrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "from_toml_datetime")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "from_toml_datetime")]
    pub updated: Option<String>,
    #[serde(default)]
    pub draft: bool,
    pub template: Option<String>,
}

#[derive(Error, Debug)]
pub enum ParsePageError {
    #[error("failed to read page: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing front matter in '{filepath}'")]
    MissingFrontMatter { filepath: PathBuf },

    #[error("invalid front matter in '{filepath}': {source}")]
    InvalidFrontMatter {
        filepath: PathBuf,
        source: toml::de::Error,
    },
}

impl Page {
    pub fn from_path(
        origin: &SiteOrigin,
        root_path: impl AsRef<Path>,
        path: impl AsRef<Path>,
    ) -> Result<Self, ParsePageError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        Self::parse(origin, &contents, root_path, path)
    }

    pub fn parse(
        origin: &SiteOrigin,
        text: &str,
        root_path: impl AsRef<Path>,
        filepath: &Path,
    ) -> Result<Self, ParsePageError> {
        let (front_matter, content) = parse_front_matter::<PageFrontMatter>(text)
            .map_err(|source| ParsePageError::InvalidFrontMatter {
                filepath: filepath.to_owned(),
                source,
            })?
            .ok_or_else(|| ParsePageError::MissingFrontMatter {
                filepath: filepath.to_owned(),
            })?;

        let slug = front_matter
            .slug
            .clone()
            .unwrap_or_else(|| filepath.file_stem().unwrap().to_string_lossy().to_string());

        let relative_path = filepath.strip_prefix(root_path).unwrap_or(filepath);
        let parent = relative_path
            .parent()
            .map(|parent| parent.to_string_lossy().to_string())
            .unwrap_or_default();

        let path = PagePath::new(&parent, &slug);
        let permalink = Permalink::from_path(origin, path.as_str());

        Ok(Self {
            meta: front_matter,
            file_path: filepath.to_owned(),
            path,
            slug,
            permalink,
            raw_content: content.to_string(),
        })
    }
}
