use std::env;

/// Which backing store to run against, with the settings only that store
/// needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// Tags are seeded from `GOODS_SEED_TAGS` and get ids from 1 in order.
    Memory { seed_tags: Vec<String> },
}

impl StoreConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StoreConfig::Postgres { .. } => "postgres",
            StoreConfig::Memory { .. } => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
}

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let host = lookup("GOODS_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("GOODS_PORT") {
            Some(port) => port.parse().map_err(|e| format!("Invalid GOODS_PORT: {}", e))?,
            None => 8000,
        };

        let kind = lookup("GOODS_STORE").unwrap_or_else(|| "postgres".to_string());
        let store = match kind.to_ascii_lowercase().as_str() {
            "postgres" => {
                let database_url =
                    lookup("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;
                let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                    Some(max) => max
                        .parse()
                        .map_err(|e| format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e))?,
                    None => DEFAULT_MAX_CONNECTIONS,
                };
                StoreConfig::Postgres {
                    database_url,
                    max_connections,
                }
            }
            "memory" => StoreConfig::Memory {
                seed_tags: lookup("GOODS_SEED_TAGS")
                    .map(|names| parse_tag_names(&names))
                    .unwrap_or_default(),
            },
            other => return Err(format!("Invalid GOODS_STORE: {}", other)),
        };

        Ok(Config { host, port, store })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

/// Comma separated, blanks and repeats dropped.
fn parse_tag_names(names: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for name in names.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        if !tags.iter().any(|tag| tag == name) {
            tags.push(name.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert_eq!(load(&[]).unwrap_err(), "DATABASE_URL must be set");

        let config = load(&[("DATABASE_URL", "postgres://localhost/goods")]).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Postgres {
                database_url: "postgres://localhost/goods".to_string(),
                max_connections: 5,
            }
        );
        assert_eq!(config.store.name(), "postgres");
        assert_eq!(config.bind_addr(), ("0.0.0.0".to_string(), 8000));
    }

    #[test]
    fn test_memory_store_overrides() {
        let config = load(&[
            ("GOODS_STORE", "Memory"),
            ("GOODS_HOST", "127.0.0.1"),
            ("GOODS_PORT", "9000"),
        ])
        .unwrap();

        assert_eq!(config.store, StoreConfig::Memory { seed_tags: vec![] });
        assert_eq!(config.bind_addr(), ("127.0.0.1".to_string(), 9000));
    }

    #[test]
    fn test_memory_store_seed_tags() {
        let config = load(&[
            ("GOODS_STORE", "memory"),
            ("GOODS_SEED_TAGS", " sport, home,,sport ,garden "),
        ])
        .unwrap();

        assert_eq!(
            config.store,
            StoreConfig::Memory {
                seed_tags: vec!["sport".to_string(), "home".to_string(), "garden".to_string()],
            }
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("GOODS_STORE", "redis")]).is_err());
        assert!(load(&[("GOODS_STORE", "memory"), ("GOODS_PORT", "http")]).is_err());
        assert!(load(&[
            ("DATABASE_URL", "postgres://localhost/goods"),
            ("DATABASE_MAX_CONNECTIONS", "-1"),
        ])
        .is_err());
    }
}
