use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_KEY_PREFIX: &str = "com.authapp";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub key_prefix: String,
    pub hash: HashConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("AUTHAPP_DATA_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let key_prefix = lookup("AUTHAPP_KEY_PREFIX")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.into());

        let defaults = HashConfig::default();
        let hash = HashConfig {
            memory_kib: lookup("ARGON2_MEMORY_KIB")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.memory_kib),
            iterations: lookup("ARGON2_ITERATIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.iterations),
            parallelism: lookup("ARGON2_PARALLELISM")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.parallelism),
        };

        Ok(Self {
            data_dir,
            key_prefix,
            hash,
        })
    }
}

fn default_data_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join("authapp"),
        None => PathBuf::from(".authapp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).expect("config");
        assert_eq!(cfg.key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(cfg.hash, HashConfig::default());
        assert!(cfg.data_dir.ends_with("authapp") || cfg.data_dir.ends_with(".authapp"));
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("AUTHAPP_DATA_DIR", "/tmp/authapp-test"),
            ("AUTHAPP_KEY_PREFIX", "org.example"),
            ("ARGON2_MEMORY_KIB", "1024"),
            ("ARGON2_ITERATIONS", "3"),
            ("ARGON2_PARALLELISM", "2"),
        ]))
        .expect("config");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/authapp-test"));
        assert_eq!(cfg.key_prefix, "org.example");
        assert_eq!(
            cfg.hash,
            HashConfig {
                memory_kib: 1024,
                iterations: 3,
                parallelism: 2,
            }
        );
    }

    #[test]
    fn unparsable_cost_falls_back_to_default() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("ARGON2_ITERATIONS", "lots")]))
            .expect("config");
        assert_eq!(cfg.hash.iterations, HashConfig::default().iterations);
    }
}
