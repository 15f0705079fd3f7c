//! A JSON file-backed implementation of the [`LeaseStore`][super::LeaseStore] trait.
//!
//! Wraps a [`InMemoryLeaseStore`][super::memory::InMemoryLeaseStore] instance, persisting
//! updates to a JSON file on disk that can be reloaded across restarts.
use crate::dhcp::Lease;
use crate::error::Error;
use crate::lease_store::memory::InMemoryLeaseStore;
use crate::lease_store::LeaseStore;
use std::io::ErrorKind;
use tokio::fs::File;
use tokio::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A file-backed lease store. After each update a JSON file on disk is rewritten with the new
/// data. This file is reloaded across restarts to avoid losing leases.
///
/// Wraps a [`InMemoryLeaseStore`][super::memory::InMemoryLeaseStore], operating the same way
/// except for maintaining state beyond in-memory.
#[derive(Default, Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct FileLeaseStore {
    lease_store: InMemoryLeaseStore,
    path: String,
}

impl FileLeaseStore {
    /// Save the state of the lease store as JSON to the store's configured path, or return an
    /// Error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if a lease in the store can't be serialized to JSON.
    ///
    /// Returns [`Error::IO`] if the serialized state can't be written to the backing file path.
    pub async fn save(&self) -> Result<(), Error> {
        Self::write_state(&self.path, &self.lease_store).await
    }

    async fn write_state(path: &str, state: &InMemoryLeaseStore) -> Result<(), Error> {
        let data = serde_json::to_string_pretty(state)?;
        let mut output_file = File::create(path).await?;
        output_file.write_all(data.as_bytes()).await?;
        output_file.flush().await?;
        Ok(())
    }

    /// Load a [`FileLeaseStore`] from the JSON lease state located at the given path, creating
    /// an empty state file if there is none, or return an Error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJSON`] if the JSON state file is invalid.
    ///
    /// Returns [`Error::IO`] if the path can't be opened or read.
    pub async fn try_from_file(p: &str) -> Result<Self, Error> {
        let contents = match File::open(p).await {
            Ok(mut f) => {
                let mut buf = vec![];
                f.read_to_end(&mut buf).await?;
                buf
            }
            Err(err) => match err.kind() {
                ErrorKind::NotFound => Self::write_empty_state(File::create(&p).await?).await?,
                _ => return Err(Error::IO(err)),
            },
        };

        let lease_store: InMemoryLeaseStore = serde_json::from_slice(&contents)?;
        Ok(Self {
            path: p.to_string(),
            lease_store,
        })
    }

    async fn write_empty_state(mut f: File) -> io::Result<Vec<u8>> {
        let default_data = serde_json::to_string_pretty(&InMemoryLeaseStore::default())?;
        let default_bytes = default_data.as_bytes();
        f.write_all(default_bytes).await?;
        f.flush().await?;
        Ok(default_bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl LeaseStore for FileLeaseStore {
    async fn leases(&self) -> Vec<Lease> {
        self.lease_store.leases().await
    }

    // The in-memory table only changes once the new state is on disk.
    async fn set_leases(&mut self, leases: Vec<Lease>) -> Result<(), Error> {
        let mut next = self.lease_store.clone();
        next.set_leases(leases).await?;
        Self::write_state(&self.path, &next).await?;
        self.lease_store = next;
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(Error::IO(err)),
        }
        self.lease_store.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lease(ip: &str) -> Lease {
        serde_json::from_value(serde_json::json!({
            "mac": "aa:bb:cc:dd:ee:01",
            "ip": ip,
            "hostname": "nas",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn creates_empty_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.json");
        let path = path.to_str().unwrap();

        let store = FileLeaseStore::try_from_file(path).await.unwrap();
        assert!(store.leases().await.is_empty());
        assert!(std::path::Path::new(path).exists());
    }

    #[tokio::test]
    async fn leases_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.json");
        let path = path.to_str().unwrap();

        let mut store = FileLeaseStore::try_from_file(path).await.unwrap();
        store.set_leases(vec![lease("192.168.1.10")]).await.unwrap();

        let reloaded = FileLeaseStore::try_from_file(path).await.unwrap();
        assert_eq!(reloaded.leases().await, vec![lease("192.168.1.10")]);
    }

    #[tokio::test]
    async fn reset_removes_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.json");
        let path = path.to_str().unwrap();

        let mut store = FileLeaseStore::try_from_file(path).await.unwrap();
        store.set_leases(vec![lease("192.168.1.10")]).await.unwrap();
        store.reset().await.unwrap();

        assert!(store.leases().await.is_empty());
        assert!(!std::path::Path::new(path).exists());
        // A second reset with the file already gone is fine.
        store.reset().await.unwrap();
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_leases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.json");
        let path = path.to_str().unwrap();

        let mut store = FileLeaseStore::try_from_file(path).await.unwrap();
        store.set_leases(vec![lease("192.168.1.10")]).await.unwrap();

        // Swap the state file for a directory so neither writing nor removing it works.
        std::fs::remove_file(path).unwrap();
        std::fs::create_dir(path).unwrap();

        let err = store
            .set_leases(vec![lease("192.168.1.10"), lease("192.168.1.11")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IO(_)));
        assert_eq!(store.leases().await, vec![lease("192.168.1.10")]);

        assert!(matches!(store.reset().await, Err(Error::IO(_))));
        assert_eq!(store.leases().await, vec![lease("192.168.1.10")]);
    }

    #[tokio::test]
    async fn rejects_corrupt_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileLeaseStore::try_from_file(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidJSON(_)));
    }
}
