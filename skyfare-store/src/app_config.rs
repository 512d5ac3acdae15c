use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Fixed UTC offset, in hours, of the timezone the cancellation penalty
    /// day count is evaluated in.
    #[serde(default = "default_tz_offset")]
    pub timezone_offset_hours: i32,
}

fn default_tz_offset() -> i32 {
    9
}

impl BusinessRules {
    pub fn reference_offset(&self) -> Result<chrono::FixedOffset, config::ConfigError> {
        chrono::FixedOffset::east_opt(self.timezone_offset_hours * 3600).ok_or_else(|| {
            config::ConfigError::Message(format!(
                "timezone offset out of range: {}",
                self.timezone_offset_hours
            ))
        })
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Settings from the environment (with a prefix of SKYFARE)
            .add_source(config::Environment::with_prefix("SKYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_omitted() {
        let raw = r#"
            [server]
            port = 9000

            [database]
            url = "postgres://localhost/test"

            [business_rules]
        "#;
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.database.acquire_timeout_secs, 3);
        assert_eq!(cfg.business_rules.timezone_offset_hours, 9);
    }

    #[test]
    fn reference_offset_validates_range() {
        let rules = BusinessRules {
            timezone_offset_hours: 9,
        };
        assert_eq!(rules.reference_offset().unwrap().local_minus_utc(), 9 * 3600);

        let bad = BusinessRules {
            timezone_offset_hours: 30,
        };
        assert!(bad.reference_offset().is_err());
    }
}
