//! LMDB-backed [`StorageArea`].
//!
//! The whole store is one LMDB environment at `{name}.lmdb` with a single
//! named database. Keys and values are UTF-8 strings; every call runs in its
//! own transaction, so a write is durable once the call returns.

use std::path::{Path, PathBuf};

use lmdb::{Cursor, Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info};

use crate::app_response::AppResponse;
use crate::storage_area::StorageArea;

/// Default LMDB map size (10 MiB). Writes beyond it fail with a quota error.
pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;

const DATABASE_NAME: &str = "local_storage";

pub struct LmdbStorage {
    env: Environment,
    db: Database,
    path: PathBuf,
}

impl LmdbStorage {
    /// Opens (or creates) the store at `{name}.lmdb` with the default map size.
    pub fn init(name: String) -> Result<Self, AppResponse> {
        Self::init_with_map_size(name, DEFAULT_MAP_SIZE)
    }

    pub fn init_with_map_size(name: String, map_size: usize) -> Result<Self, AppResponse> {
        if name.trim().is_empty() {
            return Err(AppResponse::BadRequest("Database name cannot be empty".to_string()));
        }

        let path = PathBuf::from(format!("{name}.lmdb"));
        std::fs::create_dir_all(&path)?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(&path)?;
        let db = env.create_db(Some(DATABASE_NAME), DatabaseFlags::empty())?;

        info!("LMDB storage opened at {}", path.display());
        Ok(Self { env, db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Forces buffered data to disk.
    pub fn flush(&self) -> Result<(), AppResponse> {
        self.env.sync(true)?;
        Ok(())
    }
}

impl StorageArea for LmdbStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                AppResponse::SerializationError(format!(
                    "Stored value for '{key}' is not UTF-8: {e}"
                ))
            })?),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.abort();
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        if key.is_empty() {
            return Err(AppResponse::BadRequest("Storage key cannot be empty".to_string()));
        }
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        debug!("Stored key '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) | Err(lmdb::Error::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        txn.commit()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AppResponse> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()?;
        info!("LMDB storage at {} cleared", self.path.display());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, AppResponse> {
        let txn = self.env.begin_ro_txn()?;
        let keys = {
            let mut cursor = txn.open_ro_cursor(self.db)?;
            cursor
                .iter_start()
                .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
                .collect::<Vec<_>>()
        };
        txn.abort();
        Ok(keys)
    }
}
