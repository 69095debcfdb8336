//! Indirection over reading a resolved import path's contents, so the
//! precompiler's dependency resolution can be exercised in tests without
//! touching the filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait PackageSource {
    fn read(&self, path: &Path) -> std::io::Result<String>;
}

pub struct FsPackageSource;

impl PackageSource for FsPackageSource {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct InMemoryPackageSource {
    files: HashMap<PathBuf, String>,
}

#[cfg(test)]
impl InMemoryPackageSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> &mut Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

#[cfg(test)]
impl PackageSource for InMemoryPackageSource {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string()))
    }
}
