use crate::auth::{AuthService, PasswordHashing, UserStore};
use crate::config::AppConfig;
use crate::storage::{FileStorage, StorageClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// File-backed state rooted at `config.data_dir`.
    pub async fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let storage = Arc::new(FileStorage::new(&config.data_dir)) as Arc<dyn StorageClient>;
        Self::from_parts(config, storage).await
    }

    pub async fn from_parts(
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
    ) -> anyhow::Result<Self> {
        let hashing = PasswordHashing::new(&config.hash)?;
        let store = UserStore::new(storage, &config.key_prefix);
        let auth = Arc::new(AuthService::init(store, hashing).await);
        Ok(Self { config, auth })
    }

    #[cfg(test)]
    pub async fn fake() -> Self {
        use crate::config::HashConfig;
        use crate::storage::MemoryStorage;

        let config = Arc::new(AppConfig {
            data_dir: "unused".into(),
            key_prefix: "com.test".into(),
            hash: HashConfig {
                memory_kib: 256,
                iterations: 1,
                parallelism: 1,
            },
        });
        let storage = Arc::new(MemoryStorage::new()) as Arc<dyn StorageClient>;
        Self::from_parts(config, storage)
            .await
            .expect("fake state builds")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn from_config_persists_under_data_dir() {
        let tmp = TempDir::new().unwrap();
        let config = Arc::new(AppConfig {
            data_dir: tmp.path().join("data"),
            key_prefix: "org.example".into(),
            hash: HashConfig {
                memory_kib: 256,
                iterations: 1,
                parallelism: 1,
            },
        });
        let state = AppState::from_config(config.clone()).await.unwrap();
        assert!(Arc::ptr_eq(&state.config, &config));
        state
            .auth
            .signup("Ann", "ann@example.com", "secret1")
            .await
            .unwrap();

        let users_file = state
            .config
            .data_dir
            .join(format!("{}.users.json", state.config.key_prefix));
        assert_eq!(users_file, tmp.path().join("data/org.example.users.json"));
        assert!(users_file.exists());
        assert!(tmp.path().join("data/org.example.currentUser.json").exists());

        let reopened = AppState::from_config(config).await.unwrap();
        assert!(reopened.auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn rejects_invalid_hash_config() {
        let config = Arc::new(AppConfig {
            data_dir: "unused".into(),
            key_prefix: "com.test".into(),
            hash: HashConfig {
                memory_kib: 1,
                iterations: 0,
                parallelism: 1,
            },
        });
        let storage = Arc::new(crate::storage::MemoryStorage::new()) as Arc<dyn StorageClient>;
        assert!(AppState::from_parts(config, storage).await.is_err());
    }
}
