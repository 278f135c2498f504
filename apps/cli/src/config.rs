#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

pub struct Config {
    pub data_dir: String,
    pub user_id: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            data_dir: non_empty("BILLBOOK_DATA_DIR").unwrap_or_else(|| "./data".into()),
            user_id: non_empty("BILLBOOK_USER").unwrap_or_else(|| "default".into()),
            log_format: non_empty("BILLBOOK_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.data_dir, "./data");
        assert_eq!(config.user_id, "default");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BILLBOOK_DATA_DIR", "/var/lib/billbook"),
            ("BILLBOOK_USER", "alice"),
            ("BILLBOOK_LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(config.data_dir, "/var/lib/billbook");
        assert_eq!(config.user_id, "alice");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = config_from(&[("BILLBOOK_USER", "  "), ("BILLBOOK_LOG_FORMAT", "xml")]);
        assert_eq!(config.user_id, "default");
        assert_eq!(config.log_format, LogFormat::Text);
    }
}
