use crate::error::{ErrorKind, Result};
use crate::models::{Config, project_dirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment variables that override file configuration. Nested
/// keys are separated by a double underscore: `FAVR_FETCH__TIMEOUT_MS`.
pub const ENV_PREFIX: &str = "FAVR_";

const DEFAULT_FILE_NAMES: [&str; 4] = ["config.toml", "config.yaml", "config.yml", "config.json"];

/// The first config file present in the platform config directory.
pub fn default_config_file() -> Option<PathBuf> {
    let dirs = project_dirs()?;
    DEFAULT_FILE_NAMES.iter().map(|name| dirs.config_dir().join(name)).find(|path| path.is_file())
}

fn file_provider(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

impl Config {
    /// Layer defaults, then the config file, then `FAVR_` environment
    /// variables.
    ///
    /// An explicit `path` must exist. Without one, the platform config
    /// directory is searched and a missing file is not an error.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::MissingFile(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_config_file(),
        };
        if let Some(file) = file {
            debug!(path = %file.display(), "Loading config file");
            figment = file_provider(figment, &file)?;
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Secret, StorageConfig};
    use figment::Jail;

    #[test]
    fn test_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "favr.toml",
                r#"
                    public_url = "https://icons.example.net/"

                    [fetch]
                    timeout_ms = 1500
                    max_redirects = 3

                    [cache]
                    ignore = true
                "#,
            )?;
            let config = Config::load(Some(Path::new("favr.toml"))).unwrap();
            assert_eq!(config.fetch.timeout_ms, 1500);
            assert_eq!(config.fetch.max_redirects, 3);
            assert_eq!(config.fetch.image_limit, 1024 * 1024);
            assert!(config.cache.ignore);
            assert_eq!(config.public_url.unwrap().as_str(), "https://icons.example.net/");
            Ok(())
        });
    }

    #[test]
    fn test_yaml_s3_storage() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "favr.yaml",
                r#"
                storage:
                  type: s3
                  bucket: icons
                  region: us-west-004
                  endpoint: https://s3.us-west-004.backblazeb2.com
                  key_id: id
                  key_secret: secret
                "#,
            )?;
            let config = Config::load(Some(Path::new("favr.yaml"))).unwrap();
            assert_eq!(
                config.storage,
                StorageConfig::S3 {
                    bucket: "icons".to_string(),
                    prefix: None,
                    region: "us-west-004".to_string(),
                    endpoint: Some("https://s3.us-west-004.backblazeb2.com".to_string()),
                    key_id: "id".to_string(),
                    key_secret: Secret::new("secret"),
                }
            );
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("favr.json", r#"{"fetch": {"timeout_ms": 1500, "image_limit": 2048}}"#)?;
            jail.set_env("FAVR_FETCH__TIMEOUT_MS", "250");
            jail.set_env("FAVR_CACHE__IGNORE", "true");
            let config = Config::load(Some(Path::new("favr.json"))).unwrap();
            assert_eq!(config.fetch.timeout_ms, 250);
            assert_eq!(config.fetch.image_limit, 2048);
            assert!(config.cache.ignore);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("favr.toml", "[fetch]\ntimeout_ms = 0\n")?;
            let err = Config::load(Some(Path::new("favr.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            jail.create_file("broken.toml", "[fetch]\ntimeout_ms = \"soon\"\n")?;
            let err = Config::load(Some(Path::new("broken.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::Load);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        Jail::expect_with(|jail| {
            let err = Config::load(Some(Path::new("missing.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::MissingFile(_)));
            jail.create_file("favr.ini", "")?;
            let err = Config::load(Some(Path::new("favr.ini"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
            Ok(())
        });
    }
}
