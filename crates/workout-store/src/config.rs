//! Configuration file handling.
//!
//! Reads `workout-log.toml` from the app config directory. Credentials can
//! also come from the environment so they never have to live in the binary:
//!
//! - `WORKOUT_LOG_BACKEND` (`sqlite` or `firestore`)
//! - `WORKOUT_LOG_SQLITE_PATH`
//! - `WORKOUT_LOG_FIRESTORE_PROJECT`
//! - `WORKOUT_LOG_FIRESTORE_API_KEY`
//! - `WORKOUT_LOG_FIRESTORE_ENDPOINT`

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::DomainResult;
use crate::repository::{
    DocumentRef, DocumentStore, EntryStore, FirestoreDocumentStore, SqliteDocumentStore,
    DEFAULT_MAX_CONFLICT_RETRIES,
};

pub const CONFIG_FILE_NAME: &str = "workout-log.toml";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Retries after a concurrent write invalidated a commit.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// Where the entry list lives.
    #[serde(default)]
    pub document: DocumentConfig,
    /// Which database holds the document.
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_document")]
    pub document: String,
    /// Array field holding the entries.
    #[serde(default = "default_field")]
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Local SQLite file. Relative paths are resolved against the config directory.
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
    /// Hosted Firestore database.
    Firestore(FirestoreSettings),
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct FirestoreSettings {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

// Keep the API key out of logs
impl fmt::Debug for FirestoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreSettings")
            .field("project_id", &self.project_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn default_max_conflict_retries() -> u32 {
    DEFAULT_MAX_CONFLICT_RETRIES
}

fn default_collection() -> String {
    "workouts".to_string()
}

fn default_document() -> String {
    "log".to_string()
}

fn default_field() -> String {
    "entries".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("workouts.db")
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_endpoint() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            document: default_document(),
            field: default_field(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_max_conflict_retries(),
            document: DocumentConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from `path`.
    ///
    /// Creates a default config file if it doesn't exist.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = StoreConfig::default();
            config.save(path)?;
            tracing::info!("Created default config at {}: {:?}", path.display(), config);
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: StoreConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load_or_create(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Apply `WORKOUT_LOG_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(kind) = get("WORKOUT_LOG_BACKEND") {
            match kind.trim().to_ascii_lowercase().as_str() {
                "sqlite" => {
                    if !matches!(self.backend, BackendConfig::Sqlite { .. }) {
                        self.backend = BackendConfig::default();
                    }
                }
                "firestore" => {
                    if !matches!(self.backend, BackendConfig::Firestore(_)) {
                        let project_id = get("WORKOUT_LOG_FIRESTORE_PROJECT")
                            .context("WORKOUT_LOG_BACKEND=firestore needs WORKOUT_LOG_FIRESTORE_PROJECT")?;
                        self.backend = BackendConfig::Firestore(FirestoreSettings {
                            project_id,
                            api_key: None,
                            database: default_database(),
                            endpoint: default_endpoint(),
                        });
                    }
                }
                other => bail!("Unknown WORKOUT_LOG_BACKEND `{}` (expected sqlite or firestore)", other),
            }
        }

        match &mut self.backend {
            BackendConfig::Sqlite { path } => {
                if let Some(value) = get("WORKOUT_LOG_SQLITE_PATH") {
                    *path = PathBuf::from(value);
                }
            }
            BackendConfig::Firestore(settings) => {
                if let Some(value) = get("WORKOUT_LOG_FIRESTORE_PROJECT") {
                    settings.project_id = value;
                }
                if let Some(value) = get("WORKOUT_LOG_FIRESTORE_API_KEY") {
                    settings.api_key = Some(value);
                }
                if let Some(value) = get("WORKOUT_LOG_FIRESTORE_ENDPOINT") {
                    settings.endpoint = value;
                }
            }
        }
        Ok(())
    }

    pub fn document_ref(&self) -> DocumentRef {
        DocumentRef::new(&self.document.collection, &self.document.document)
    }

    /// Open the configured backend and wrap it in an entry store.
    ///
    /// `base_dir` anchors relative SQLite paths.
    pub fn build_store(&self, base_dir: &Path) -> DomainResult<EntryStore> {
        let docs: Arc<dyn DocumentStore> = match &self.backend {
            BackendConfig::Sqlite { path } => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                };
                Arc::new(SqliteDocumentStore::open(&path)?)
            }
            BackendConfig::Firestore(settings) => {
                if settings.api_key.is_none() {
                    tracing::warn!("No Firestore API key configured, requests are unauthenticated");
                }
                Arc::new(FirestoreDocumentStore::new(settings)?)
            }
        };

        Ok(EntryStore::new(docs, self.document_ref(), &self.document.field)
            .with_max_conflict_retries(self.max_conflict_retries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.document_ref().to_string(), "workouts/log");
        assert_eq!(config.document.field, "entries");
        assert_eq!(config.max_conflict_retries, 3);
        assert_eq!(
            config.backend,
            BackendConfig::Sqlite {
                path: PathBuf::from("workouts.db")
            }
        );
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join(CONFIG_FILE_NAME);

        let config = StoreConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, StoreConfig::default());
        assert_eq!(StoreConfig::load_or_create(&path).unwrap(), config);
    }

    #[test]
    fn test_parse_firestore_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
max_conflict_retries = 5

[document]
collection = "lifts"

[backend]
kind = "firestore"
project_id = "progress-cal"
"#,
        )
        .unwrap();

        let config = StoreConfig::load_or_create(&path).unwrap();
        assert_eq!(config.max_conflict_retries, 5);
        assert_eq!(config.document_ref(), DocumentRef::new("lifts", "log"));
        match &config.backend {
            BackendConfig::Firestore(settings) => {
                assert_eq!(settings.project_id, "progress-cal");
                assert_eq!(settings.database, "(default)");
                assert!(settings.api_key.is_none());
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[backend]\nkind = \"carrier-pigeon\"\n").unwrap();
        assert!(StoreConfig::load_or_create(&path).is_err());
    }

    #[test]
    fn test_env_switches_to_firestore() {
        let mut config = StoreConfig::default();
        config
            .apply_overrides(env(&[
                ("WORKOUT_LOG_BACKEND", "firestore"),
                ("WORKOUT_LOG_FIRESTORE_PROJECT", "progress-cal"),
                ("WORKOUT_LOG_FIRESTORE_API_KEY", "secret"),
            ]))
            .unwrap();

        match &config.backend {
            BackendConfig::Firestore(settings) => {
                assert_eq!(settings.project_id, "progress-cal");
                assert_eq!(settings.api_key.as_deref(), Some("secret"));
                assert!(!format!("{:?}", settings).contains("secret"));
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_env_firestore_needs_project() {
        let mut config = StoreConfig::default();
        assert!(config
            .apply_overrides(env(&[("WORKOUT_LOG_BACKEND", "firestore")]))
            .is_err());
        assert!(config
            .apply_overrides(env(&[("WORKOUT_LOG_BACKEND", "mongo")]))
            .is_err());
    }

    #[test]
    fn test_env_sqlite_path_and_blank_values() {
        let mut config = StoreConfig::default();
        config
            .apply_overrides(env(&[
                ("WORKOUT_LOG_SQLITE_PATH", "/tmp/lifts.db"),
                ("WORKOUT_LOG_BACKEND", "  "),
            ]))
            .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Sqlite {
                path: PathBuf::from("/tmp/lifts.db")
            }
        );
    }

    #[tokio::test]
    async fn test_build_sqlite_store_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default();

        let store = config.build_store(dir.path()).unwrap();
        assert_eq!(store.backend_kind(), "sqlite");
        assert!(store.fetch_all().await.unwrap().is_empty());
        assert!(dir.path().join("workouts.db").exists());
    }
}
