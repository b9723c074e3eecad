use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::content::Page;

/// Where a build's output lands: the `public/` directory for real builds, an
/// in-memory map when serving.
pub trait Store {
    type Error: std::error::Error;

    fn store_rendered_page(&self, page: &Page, rendered_html: String) -> Result<(), Self::Error>;

    fn store_static_file(&self, path: &Path, contents: String) -> Result<(), Self::Error>;

    fn store_css(&self, path: &Path, css: String) -> Result<(), Self::Error>;
}

pub struct DiskStorage {
    output_path: PathBuf,
}

impl DiskStorage {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    fn write_file(&self, path: &Path, contents: String) -> Result<(), io::Error> {
        let output_path = self.output_path.join(path);

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut output_file = File::create(&output_path)?;
        output_file.write_all(contents.as_bytes())?;

        Ok(())
    }
}

impl Store for DiskStorage {
    type Error = io::Error;

    fn store_rendered_page(&self, page: &Page, rendered_html: String) -> Result<(), Self::Error> {
        let page_dir = PathBuf::from(page.path.as_str().trim_start_matches('/'));

        self.write_file(&page_dir.join("index.html"), rendered_html)
    }

    fn store_static_file(&self, path: &Path, contents: String) -> Result<(), Self::Error> {
        self.write_file(path, contents)
    }

    fn store_css(&self, path: &Path, css: String) -> Result<(), Self::Error> {
        self.write_file(path, css)
    }
}

pub struct InMemoryStorage {
    storage: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStorage {
    pub fn new(storage: Arc<RwLock<HashMap<String, String>>>) -> Self {
        Self { storage }
    }

    fn insert(&self, key: String, contents: String) -> Result<(), InMemoryStorageError> {
        self.storage
            .write()
            .map_err(|_| InMemoryStorageError::Poisoned)?
            .insert(key, contents);

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum InMemoryStorageError {
    #[error("poisoned")]
    Poisoned,
}

impl Store for InMemoryStorage {
    type Error = InMemoryStorageError;

    fn store_rendered_page(&self, page: &Page, rendered_html: String) -> Result<(), Self::Error> {
        self.insert(format!("{}/", page.path), rendered_html)
    }

    fn store_static_file(&self, path: &Path, contents: String) -> Result<(), Self::Error> {
        self.insert(format!("/{}", path.to_string_lossy()), contents)
    }

    fn store_css(&self, path: &Path, css: String) -> Result<(), Self::Error> {
        self.insert(format!("/{}", path.to_string_lossy()), css)
    }
}
