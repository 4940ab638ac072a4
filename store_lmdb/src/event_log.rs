//! LMDB implementation of EventLogStore.

use examcert_store::{EventLogStore, StoreError};

use crate::environment::decode_u64;
use crate::{LmdbEnvironment, LmdbError};

impl EventLogStore for LmdbEnvironment {
    fn append_event(&self, seq: u64, event: &[u8]) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.append_event(seq, event)?;
        batch.commit()?;
        Ok(())
    }

    fn iter_events(&self, from: u64) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for item in self.events_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = item.map_err(LmdbError::from)?;
            let seq = decode_u64(key)?;
            if seq >= from {
                out.push((seq, value.to_vec()));
            }
        }
        Ok(out)
    }

    fn event_count(&self) -> Result<u64, StoreError> {
        Ok(self.count(&self.events_db)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_read_back_from_offset() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).unwrap();
        for seq in 0..5u64 {
            env.append_event(seq, format!("e{seq}").as_bytes()).unwrap();
        }
        assert_eq!(env.event_count().unwrap(), 5);
        let tail = env.iter_events(3).unwrap();
        assert_eq!(tail, vec![(3, b"e3".to_vec()), (4, b"e4".to_vec())]);
    }
}
