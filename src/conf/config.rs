use config::Config as CConfig;
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::conf::{BenchConfig, MongoConfig, PostgresConfig, QueryConfig, ServerConfig};
use crate::core::ReelError::{self, ConfigParsingError};

const ENV_PREFIX: &str = "REELBENCH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub mongo: MongoConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub bench: BenchConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, ReelError> {
        let config = CConfig::builder()
            .add_source(File::from_str(toml_str, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        Ok(config)
    }

    /// Loads an optional TOML file, then applies `REELBENCH_SECTION__KEY`
    /// environment overrides on top.
    pub fn load(path: Option<&str>) -> Result<Config, ReelError> {
        let mut builder = CConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::conf::ExecutionOrder;

    #[test]
    fn load_correct_toml() {
        let toml = r#"
        [server]
        host = "127.0.0.1"
        port = 3000

        [query]
        timeout = "250ms"
        min_support = 3

        [bench]
        max_iterations = 50
        order = "nosql_first"
        "#;
        let conf = Config::from_str(toml).unwrap();
        assert_eq!(
            conf.server,
            ServerConfig {
                host: String::from("127.0.0.1"),
                port: 3000
            }
        );
        assert_eq!(conf.query.timeout, Duration::from_millis(250));
        assert_eq!(conf.query.min_support, 3);
        assert_eq!(conf.query.trending_decay, 0.1);
        assert_eq!(conf.bench.max_iterations, 50);
        assert_eq!(conf.bench.order, ExecutionOrder::NosqlFirst);
        assert_eq!(conf.bench.epsilon_ms, 0.01);
        assert_eq!(conf.postgres, PostgresConfig::default());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let conf = Config::from_str("").unwrap();
        assert_eq!(conf, Config::default());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let toml = r#"
        [query]
        timeuot = "1s"
        "#;
        let err = Config::from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigParsingError(_)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load(Some("/nonexistent/reelbench.toml")).unwrap_err();
        assert!(matches!(err, ConfigParsingError(_)));
    }
}
