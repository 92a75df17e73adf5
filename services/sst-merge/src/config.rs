//! Configuration loading for the binaries.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use grid_merge::MergeConfig;

/// Names a YAML configuration file; when unset, `SST_MERGE_*` variables are
/// read instead.
pub const CONFIG_PATH_VAR: &str = "SST_MERGE_CONFIG";

/// Load and validate the merge configuration from the process environment.
pub fn load_config() -> Result<MergeConfig> {
    load_config_with(|key| std::env::var(key).ok())
}

/// Like [`load_config`], with an explicit variable lookup.
pub fn load_config_with<F>(lookup: F) -> Result<MergeConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let config = match lookup(CONFIG_PATH_VAR).filter(|p| !p.trim().is_empty()) {
        Some(path) => MergeConfig::from_yaml_file(Path::new(&path))
            .with_context(|| format!("failed to load {} from {}", CONFIG_PATH_VAR, path))?,
        None => MergeConfig::from_lookup(lookup),
    };

    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {}", e))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_config() {
        let config = load_config_with(lookup(&[("SST_MERGE_WORKERS", "3")])).unwrap();
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_yaml_config_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.yaml");
        std::fs::write(&path, "workers: 5\nchunk_policy:\n  time: 10\n").unwrap();
        let path_str = path.to_string_lossy().into_owned();

        let config = load_config_with(lookup(&[
            (CONFIG_PATH_VAR, path_str.as_str()),
            ("SST_MERGE_WORKERS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.workers, 5);
        assert_eq!(config.chunk_policy.time, 10);
        assert_eq!(config.chunk_policy.rows, 200);
    }

    #[test]
    fn test_missing_yaml_file() {
        let err = load_config_with(lookup(&[(CONFIG_PATH_VAR, "/nonexistent/merge.yaml")]))
            .unwrap_err();
        assert!(format!("{:#}", err).contains(CONFIG_PATH_VAR));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = load_config_with(lookup(&[("SST_MERGE_COMPRESSION_LEVEL", "12")])).unwrap_err();
        assert!(err.to_string().contains("compression_level"));
    }
}
