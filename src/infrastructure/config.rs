use anyhow::{Context, Result};

const DEFAULT_DATABASE: &str = "user_api";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `None` selects the in-memory store.
    pub mongo_uri: Option<String>,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Read configuration from the process environment, after loading `.env`
    /// if one is present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            mongo_uri: non_empty("MONGO_URI"),
            database: non_empty("MONGO_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.mongo_uri, None);
        assert_eq!(cfg.database, "user_api");
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 5000);
    }

    #[test]
    fn test_reads_overrides() {
        let cfg = config(&[
            ("MONGO_URI", "mongodb://localhost:27017"),
            ("MONGO_DB", "library"),
            ("PORT", "8081"),
        ])
        .unwrap();
        assert_eq!(cfg.mongo_uri.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(cfg.database, "library");
        assert_eq!(cfg.bind_address(), ("0.0.0.0".to_string(), 8081));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let cfg = config(&[("MONGO_URI", "  "), ("PORT", "")]).unwrap();
        assert_eq!(cfg.mongo_uri, None);
        assert_eq!(cfg.port, 5000);
    }

    #[test]
    fn test_rejects_non_numeric_port() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
