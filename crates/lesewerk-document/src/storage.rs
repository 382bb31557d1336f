// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Object storage read capability.
//
// The pipeline only ever downloads: when a request carries a locator but no
// bytes, the original document body is fetched once up front.

use std::path::{Component, Path, PathBuf};

use lesewerk_core::StorageLocator;
use lesewerk_core::error::{LesewerkError, Result};
use tracing::{debug, instrument};

/// Read-only access to stored document bodies.
pub trait ObjectStore {
    /// Fetch the full body stored under `locator`.
    fn download(&self, locator: &StorageLocator) -> Result<Vec<u8>>;
}

/// Directory-backed store: `<root>/<container>/<key>`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a locator to a path under the root. Absolute paths and `..`
    /// segments are rejected so a key cannot escape its container.
    fn resolve(&self, locator: &StorageLocator) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for part in [&locator.container, &locator.key] {
            if part.is_empty() {
                return Err(LesewerkError::Storage(format!("empty path segment in {locator}")));
            }
            for component in Path::new(part).components() {
                match component {
                    Component::Normal(segment) => path.push(segment),
                    Component::CurDir => {}
                    Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                        return Err(LesewerkError::Storage(format!(
                            "locator {locator} escapes the store root"
                        )));
                    }
                }
            }
        }
        Ok(path)
    }
}

impl ObjectStore for FsObjectStore {
    #[instrument(skip_all, fields(locator = %locator))]
    fn download(&self, locator: &StorageLocator) -> Result<Vec<u8>> {
        let path = self.resolve(locator)?;
        let bytes = std::fs::read(&path).map_err(|err| {
            LesewerkError::Storage(format!("failed to read {}: {err}", path.display()))
        })?;
        debug!(bytes = bytes.len(), "Object downloaded");
        Ok(bytes)
    }
}
