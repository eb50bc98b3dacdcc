use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Target;

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub catalog_file: Option<String>,
    pub request_timeout_secs: u64,
    pub log_level: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            catalog_file: None,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            targets: Vec::new(),
        }
    }
}

/// Values given on the command line; they win over every file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub catalog_file: Option<String>,
    pub log_level: Option<String>,
    pub extra_file: Option<PathBuf>,
}

impl Settings {
    pub fn new(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::load(Some(get_user_config_path()), Path::new("checkcat.toml"), overrides)
    }

    fn load(user_config: Option<PathBuf>, local_config: &Path, overrides: Overrides) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("log_level", defaults.log_level)?;

        // 1. Global user config, 2. local checkcat.toml in CWD. Both optional.
        if let Some(user_config) = user_config {
            builder = builder.add_source(File::from(user_config).required(false));
        }
        builder = builder.add_source(File::from(local_config).required(false));
        // 3. Explicit --config file. Required when given.
        if let Some(extra) = overrides.extra_file {
            builder = builder.add_source(File::from(extra).required(true));
        }

        let s = builder
            .add_source(Environment::with_prefix("CHECKCAT"))
            .set_override_option("api_url", overrides.api_url)?
            .set_override_option("catalog_file", overrides.catalog_file)?
            .set_override_option("log_level", overrides.log_level)?
            .build()?;

        s.try_deserialize()
    }

    /// Catalog file with `~` and env vars expanded.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog_file
            .as_deref()
            .map(|raw| PathBuf::from(shellexpand::full(raw).map(|p| p.into_owned()).unwrap_or_else(|_| raw.to_string())))
    }
}

pub fn get_user_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
    path.push("checkcat");
    path.push("checkcat.toml");
    path
}

/// Writes a starter config to `path`, never overwriting an existing file.
pub fn write_starter_config(path: &Path) -> Result<(), anyhow::Error> {
    if path.exists() {
        anyhow::bail!("{} already exists, not overwriting", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut starter = Settings::default();
    starter.catalog_file = Some("~/.config/checkcat/catalog.json".to_string());
    let mut doc: toml::Table = toml::from_str(&toml::to_string(&starter)?)?;
    doc.insert(
        "api_url".to_string(),
        toml::Value::String("http://localhost:4000".to_string()),
    );

    fs::write(path, doc.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClusterType, Provider, TargetKind};

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_apply_without_any_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(None, &dir.path().join("missing.toml"), Overrides::default()).unwrap();
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.log_level, "info");
        assert!(settings.api_url.is_none());
        assert!(settings.targets.is_empty());
    }

    #[test]
    fn local_file_overrides_user_file_and_cli_wins() {
        let dir = tempfile::tempdir().unwrap();
        let user = write(
            dir.path(),
            "user.toml",
            r#"
api_url = "http://user"
request_timeout_secs = 5

[[targets]]
id = "0a055c90"
name = "vmhana01"
kind = "host"
provider = "azure"

[[targets]]
id = "469e7be5"
name = "hana_cluster_1"
kind = "cluster"
provider = "aws"
cluster_type = "hana_scale_up"
"#,
        );
        let local = write(dir.path(), "local.toml", "request_timeout_secs = 10\n");

        let overrides = Overrides {
            catalog_file: Some("/tmp/catalog.json".into()),
            ..Overrides::default()
        };
        let settings = Settings::load(Some(user), &local, overrides).unwrap();
        assert_eq!(settings.api_url.as_deref(), Some("http://user"));
        assert_eq!(settings.request_timeout_secs, 10);
        assert_eq!(settings.catalog_path(), Some(PathBuf::from("/tmp/catalog.json")));

        assert_eq!(settings.targets.len(), 2);
        assert_eq!(settings.targets[0].kind, TargetKind::Host);
        assert_eq!(settings.targets[0].provider, Provider::Azure);
        assert_eq!(settings.targets[1].cluster_type, ClusterType::HanaScaleUp);
    }

    #[test]
    fn missing_extra_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            extra_file: Some(dir.path().join("nope.toml")),
            ..Overrides::default()
        };
        assert!(Settings::load(None, &dir.path().join("missing.toml"), overrides).is_err());
    }

    #[test]
    fn starter_config_round_trips_and_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("checkcat.toml");
        write_starter_config(&path).unwrap();

        let settings = Settings::load(None, &path, Overrides::default()).unwrap();
        assert_eq!(settings.api_url.as_deref(), Some("http://localhost:4000"));
        assert!(write_starter_config(&path).is_err());
    }
}
