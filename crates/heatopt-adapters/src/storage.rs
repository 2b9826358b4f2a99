// Copyright (c) 2026 Heatopt Contributors
//
// This file is part of heatopt-core.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.

//! File-backed [`KeyValueStore`]: one file per reserved key, written
//! via write-to-temp-then-rename so a crash mid-write never corrupts an
//! existing blob.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use heatopt_core::storage::KeyValueStore;
use heatopt_types::error::CoreError;
use tracing::warn;

pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.bin"))
    }

    fn tmp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.bin.tmp"))
    }
}

fn io_err(context: &str, err: std::io::Error) -> CoreError {
    CoreError::TransientExternal(format!("{context}: {err}"))
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err("reading key-value blob", e)),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_err("creating storage directory", e))?;
        let tmp = self.tmp_path_for(key);
        tokio::fs::write(&tmp, &value)
            .await
            .map_err(|e| io_err("writing temp blob", e))?;
        tokio::fs::rename(&tmp, self.path_for(key))
            .await
            .map_err(|e| io_err("renaming temp blob into place", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(key, %e, "failed to delete key-value blob");
                Err(io_err("deleting key-value blob", e))
            }
        }
    }
}

impl FileKeyValueStore {
    pub fn data_dir(&self) -> &Path {
        &self.dir
    }
}
