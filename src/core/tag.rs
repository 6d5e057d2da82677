use std::fmt;
use std::str::FromStr;

use log::kv::{ToValue, Value};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// The two stores a logical query can be answered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendTag {
    /// Relational store (PostgreSQL).
    Sql,
    /// Document store (MongoDB).
    Nosql,
}

impl BackendTag {
    pub const ALL: [BackendTag; 2] = [BackendTag::Sql, BackendTag::Nosql];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendTag::Sql => "sql",
            BackendTag::Nosql => "nosql",
        }
    }
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" | "postgres" | "postgresql" => Ok(BackendTag::Sql),
            "nosql" | "mongo" | "mongodb" => Ok(BackendTag::Nosql),
            _ => Err(ValidationError::UnknownBackend(s.to_string())),
        }
    }
}

impl ToValue for BackendTag {
    fn to_value(&self) -> Value<'_> {
        Value::from(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("sql".parse::<BackendTag>(), Ok(BackendTag::Sql));
        assert_eq!("Postgres".parse::<BackendTag>(), Ok(BackendTag::Sql));
        assert_eq!("mongo".parse::<BackendTag>(), Ok(BackendTag::Nosql));
        assert_eq!(
            "redis".parse::<BackendTag>(),
            Err(ValidationError::UnknownBackend("redis".to_string()))
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&BackendTag::Nosql).unwrap(), "\"nosql\"");
    }
}
