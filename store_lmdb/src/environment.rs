//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Names of every database in the environment.
pub const DATABASE_NAMES: &[&str] = &[
    "meta",
    "whitelist",
    "students",
    "flags",
    "certificates",
    "pending",
    "completed",
    "events",
];

/// Wraps the LMDB environment and all database handles.
///
/// Key layout:
/// - `whitelist`: wallet → seq (u64 BE)
/// - `students`, `pending`, `completed`: wallet → bincode `(seq, record)`
/// - `flags`: wallet → bincode flag
/// - `certificates`: token id (u64 BE) → bincode token
/// - `events`: seq (u64 BE) → encoded event
/// - `meta`: utf-8 key → raw bytes
pub struct LmdbEnvironment {
    path: PathBuf,
    pub(crate) env: Env,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    pub(crate) whitelist_db: Database<Bytes, Bytes>,
    pub(crate) students_db: Database<Bytes, Bytes>,
    pub(crate) flags_db: Database<Bytes, Bytes>,
    pub(crate) certificates_db: Database<Bytes, Bytes>,
    pub(crate) pending_db: Database<Bytes, Bytes>,
    pub(crate) completed_db: Database<Bytes, Bytes>,
    pub(crate) events_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at `path` with a map of `map_size` bytes.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        let mut options = EnvOpenOptions::new();
        options
            .map_size(map_size)
            .max_dbs(DATABASE_NAMES.len() as u32);
        // SAFETY: the environment is opened once per process per path; the
        // node never opens the same directory twice concurrently.
        let env = unsafe { options.open(path)? };

        let mut wtxn = env.write_txn()?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        let whitelist_db = env.create_database(&mut wtxn, Some("whitelist"))?;
        let students_db = env.create_database(&mut wtxn, Some("students"))?;
        let flags_db = env.create_database(&mut wtxn, Some("flags"))?;
        let certificates_db = env.create_database(&mut wtxn, Some("certificates"))?;
        let pending_db = env.create_database(&mut wtxn, Some("pending"))?;
        let completed_db = env.create_database(&mut wtxn, Some("completed"))?;
        let events_db = env.create_database(&mut wtxn, Some("events"))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            path: path.to_path_buf(),
            env,
            meta_db,
            whitelist_db,
            students_db,
            flags_db,
            certificates_db,
            pending_db,
            completed_db,
            events_db,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Begin a write batch covering every database.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, LmdbError> {
        WriteBatch::new(self)
    }

    /// Read every value of `db` as bincode `(seq, T)` and sort by `seq`.
    pub(crate) fn read_sequenced<T: serde::de::DeserializeOwned>(
        &self,
        db: &Database<Bytes, Bytes>,
    ) -> Result<Vec<(u64, T)>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for item in db.iter(&rtxn)? {
            let (_, value) = item?;
            out.push(bincode::deserialize::<(u64, T)>(value)?);
        }
        out.sort_by_key(|(seq, _)| *seq);
        Ok(out)
    }

    /// Read every value of `db` as bincode `T`, in key order.
    pub(crate) fn read_all<T: serde::de::DeserializeOwned>(
        &self,
        db: &Database<Bytes, Bytes>,
    ) -> Result<Vec<T>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for item in db.iter(&rtxn)? {
            let (_, value) = item?;
            out.push(bincode::deserialize(value)?);
        }
        Ok(out)
    }

    pub(crate) fn count(&self, db: &Database<Bytes, Bytes>) -> Result<u64, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(db.len(&rtxn)?)
    }
}

/// Decode a big-endian u64 key or value.
pub(crate) fn decode_u64(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}
