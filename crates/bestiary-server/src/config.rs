//! Server configuration loaded from environment variables.
//!
//! All settings have production-safe defaults. Override any variable at
//! container / process startup — no config file required.
//!
//! | Variable             | Default                      | Description                                 |
//! |----------------------|------------------------------|---------------------------------------------|
//! | `BESTIARY_DB_PATH`   | `/data/bestiary/bestiary.db` | SQLite database file                        |
//! | `BESTIARY_PORT`      | `8080`                       | HTTP listen port                            |
//! | `BESTIARY_LOG_LEVEL` | `info`                       | tracing filter (trace/debug/info/warn/error) |

/// Runtime configuration for the bestiary server process.
#[derive(Debug)]
pub struct Config {
    /// SQLite database file path. Parent directories are created at startup.
    pub db_path: String,

    /// HTTP listen port.
    pub port: u16,

    /// Tracing filter string, e.g. `"bestiary_store=debug,info"`.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables, applying defaults where
    /// a variable is absent or unparseable.
    pub fn from_env() -> Self {
        Self {
            db_path:   env_str("BESTIARY_DB_PATH", "/data/bestiary/bestiary.db"),
            port:      env_parse("BESTIARY_PORT", 8080),
            log_level: env_str("BESTIARY_LOG_LEVEL", "info"),
        }
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::from_env();
        assert!(!cfg.db_path.is_empty());
        assert!(cfg.port > 0);
        assert!(!cfg.log_level.is_empty());
    }

    #[test]
    fn env_override_applied() {
        std::env::set_var("BESTIARY_PORT", "9090");
        let cfg = Config::from_env();
        assert_eq!(cfg.port, 9090);
        std::env::remove_var("BESTIARY_PORT");
    }

    #[test]
    fn unparseable_value_falls_back_to_default() {
        std::env::set_var("BESTIARY_PORT", "not-a-port");
        let cfg = Config::from_env();
        assert_eq!(cfg.port, 8080);
        std::env::remove_var("BESTIARY_PORT");
    }
}
