use crate::domain::Snapshot;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A durable slot per key.
pub trait KeyValueStore: std::fmt::Debug {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.slots.remove(key);
        Ok(())
    }
}

/// Saves and restores wizard snapshots under a single storage key.
#[derive(Debug)]
pub struct StateRepository {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl StateRepository {
    pub fn new(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        self.store.write(&self.key, &json)?;
        debug!("snapshot written to '{}'", self.key);
        Ok(())
    }

    /// Reads the stored snapshot. A missing, unreadable or malformed slot
    /// yields `None`.
    pub fn load(&self) -> Option<Snapshot> {
        let content = match self.store.read(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                warn!("could not read snapshot '{}': {e}", self.key);
                return None;
            }
        };
        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("ignoring malformed snapshot '{}': {e}", self.key);
                None
            }
        }
    }

    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EndDate, Experience, PersonalData};
    use chrono::NaiveDate;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn snapshot() -> Snapshot {
        Snapshot {
            current_step: 1,
            personal_data: PersonalData {
                full_name: "Ana Souza".to_string(),
                ..PersonalData::default()
            },
            experiences: vec![Experience {
                id: Uuid::new_v4(),
                company_name: "Acme".to_string(),
                job_title: "Engineer".to_string(),
                start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end_date: Some(EndDate::Ongoing),
                description: "Kept the lights on".to_string(),
                is_current_job: true,
            }],
            scholarships: Vec::new(),
            personal_draft: Vec::new(),
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut repository = StateRepository::new(Box::new(FileStore::new(dir.path().join("nested"))), "wizard");

        assert_eq!(repository.load(), None);
        let saved = snapshot();
        repository.save(&saved).unwrap();
        assert!(dir.path().join("nested").join("wizard.json").exists());
        assert_eq!(repository.load(), Some(saved));

        repository.clear().unwrap();
        assert_eq!(repository.load(), None);
        repository.clear().unwrap();
    }

    #[test]
    fn test_snapshot_layout_uses_camel_case_keys() {
        let dir = tempdir().unwrap();
        let mut repository = StateRepository::new(Box::new(FileStore::new(dir.path())), "wizard");
        repository.save(&snapshot()).unwrap();

        let raw = fs::read_to_string(dir.path().join("wizard.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["currentStep"], 1);
        assert_eq!(value["personalData"]["fullName"], "Ana Souza");
        assert_eq!(value["experiences"][0]["endDate"], "present");
        assert!(value.get("scholarships").is_some());
    }

    #[test]
    fn test_malformed_snapshot_is_treated_as_absent() {
        let mut store = MemoryStore::default();
        store.write("wizard", "{ not json").unwrap();
        let repository = StateRepository::new(Box::new(store), "wizard");
        assert_eq!(repository.load(), None);
    }

    #[test]
    fn test_partial_snapshot_fills_defaults() {
        let mut store = MemoryStore::default();
        store.write("wizard", r#"{"currentStep": 0}"#).unwrap();
        let repository = StateRepository::new(Box::new(store), "wizard");
        assert_eq!(repository.load(), Some(Snapshot::default()));
    }
}
