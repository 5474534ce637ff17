//! Flat key-value store persisting service state to disk
//!
//! Provides a `StateStore` that keeps one JSON file per key in a
//! platform-appropriate data directory. This is the only persistence the
//! service uses: last-used location, preferred units, refresh interval, the
//! forecast cache slot, and the last-known-good display value all live here.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;

/// Persists flat key-value state as JSON files
///
/// Keys map to `<dir>/<key>.json`. Reads that fail for any reason (missing
/// file, unparsable content) return `None`; writes overwrite whatever was
/// there. There is no locking: concurrent writers race and the last write
/// wins.
#[derive(Debug, Clone)]
pub struct StateStore {
    /// Directory where state files are stored
    dir: PathBuf,
}

impl StateStore {
    /// Creates a new StateStore in the platform data directory
    ///
    /// Uses `~/.local/share/skycast/` on Linux, or the equivalent path on
    /// other platforms. Returns `None` if no home directory can be found.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "skycast")?;
        let dir = project_dirs.data_dir().to_path_buf();
        Some(Self { dir })
    }

    /// Creates a new StateStore with a custom directory
    ///
    /// Useful for testing or when a specific location is needed.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the path of the file backing the given key
    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Ensures the state directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Writes a value under the given key, overwriting any previous value
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> std::io::Result<()> {
        self.ensure_dir()?;

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.key_path(key), json)
    }

    /// Reads the value stored under the given key
    ///
    /// Returns `None` if the key has never been written or the stored file
    /// cannot be parsed as the requested type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = fs::read_to_string(self.key_path(key)).ok()?;
        serde_json::from_str(&content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_store() -> (StateStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = StateStore::with_dir(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[test]
    fn test_set_creates_file_in_state_directory() {
        let (store, temp_dir) = create_test_store();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        store.set("test_key", &data).expect("Write should succeed");

        let expected_path = temp_dir.path().join("test_key.json");
        assert!(expected_path.exists(), "State file should exist");

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"name\""));
        assert!(content.contains("\"test\""));
        assert!(content.contains("42"));
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();

        let result: Option<TestData> = store.get("nonexistent_key");

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[test]
    fn test_get_returns_none_for_unparsable_content() {
        let (store, temp_dir) = create_test_store();
        fs::create_dir_all(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();

        let result: Option<TestData> = store.get("broken");

        assert!(result.is_none(), "Should return None for unparsable content");
    }

    #[test]
    fn test_value_survives_roundtrip() {
        let (store, _temp_dir) = create_test_store();
        let original = TestData {
            name: "roundtrip".to_string(),
            value: 12345,
        };

        store.set("roundtrip_key", &original).expect("Write should succeed");

        let result: TestData = store.get("roundtrip_key").expect("Should read value");

        assert_eq!(result, original, "Data should survive roundtrip");
    }

    #[test]
    fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("state").join("dir");
        let store = StateStore::with_dir(nested_path.clone());

        let data = TestData {
            name: "nested".to_string(),
            value: 1,
        };

        store.set("nested_key", &data).expect("Write should succeed");

        assert!(nested_path.exists(), "Nested directory should be created");
        assert!(
            nested_path.join("nested_key.json").exists(),
            "State file should exist"
        );
    }

    #[test]
    fn test_overwrite_existing_value() {
        let (store, _temp_dir) = create_test_store();
        let data1 = TestData {
            name: "first".to_string(),
            value: 1,
        };
        let data2 = TestData {
            name: "second".to_string(),
            value: 2,
        };

        store.set("overwrite_key", &data1).expect("First write should succeed");
        store.set("overwrite_key", &data2).expect("Second write should succeed");

        let result: TestData = store.get("overwrite_key").expect("Should read value");

        assert_eq!(result, data2, "Store should contain latest value");
    }

    #[test]
    fn test_new_uses_project_data_path() {
        if let Some(store) = StateStore::new() {
            let path_str = store.dir.to_string_lossy();
            assert!(
                path_str.contains("skycast"),
                "State path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }

    #[test]
    fn test_keys_are_independent_files() {
        let (store, _temp_dir) = create_test_store();

        store.set("units", &"metric").expect("Write should succeed");
        store.set("refresh_interval", &30u64).expect("Write should succeed");

        assert_eq!(store.get::<String>("units").as_deref(), Some("metric"));
        assert_eq!(store.get::<u64>("refresh_interval"), Some(30));
    }
}
