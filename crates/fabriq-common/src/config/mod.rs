//! Configuration loading shared by all Fabriq binaries.
//!
//! Precedence, lowest to highest: built-in defaults, an optional TOML
//! file, then environment variables with the service's prefix.

use crate::error::ConfigurationError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Figment-backed loader implemented by each service's config struct.
pub trait ConfigLoader<T>
where
    T: DeserializeOwned + Serialize + Default,
{
    /// Environment variable prefix, e.g. `FABRIQ_BILLING_`.
    fn env_prefix() -> &'static str;

    /// Load from defaults and the environment, with an optional TOML file
    /// layered in between.
    fn load(config_path: Option<&Path>) -> Result<T, ConfigurationError> {
        let mut figment = Figment::from(Serialized::defaults(T::default()));

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigurationError::FileError {
                    path: path.display().to_string(),
                    details: "file not found".to_string(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed(Self::env_prefix()).split("__"))
            .extract()
            .map_err(|e| ConfigurationError::ParseError {
                details: e.to_string(),
            })
    }

    /// Load from an explicit TOML file plus the environment.
    fn load_from_file(path: &Path) -> Result<T, ConfigurationError> {
        Self::load(Some(path))
    }

    /// Render the default configuration as a TOML example.
    fn generate_example() -> Result<String, ConfigurationError> {
        toml::to_string_pretty(&T::default()).map_err(|e| ConfigurationError::ParseError {
            details: format!("Failed to serialize config: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct TestConfig {
        name: String,
        port: u16,
    }

    impl ConfigLoader<TestConfig> for TestConfig {
        fn env_prefix() -> &'static str {
            "FABRIQ_TEST_"
        }
    }

    #[test]
    fn defaults_when_no_file_given() {
        let config = TestConfig::load(None).unwrap();
        assert_eq!(config, TestConfig::default());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"laser-lab\"\nport = 9090").unwrap();

        let config = TestConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.name, "laser-lab");
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = TestConfig::load_from_file(Path::new("/nonexistent/fabriq.toml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::FileError { .. }));
    }
}
