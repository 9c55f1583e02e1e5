//! Server configuration

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 5001;

/// Where session records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionBackend {
    /// Process-local map; sessions are lost on restart
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub session_backend: SessionBackend,
    /// Grade every turn with the evaluator model
    pub evaluate: bool,
    /// Enables the EPA WATERS tool for the water specialist
    pub epa_api_key: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = non_empty("ECOBOT_PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let db_path = non_empty("ECOBOT_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.ecobot/ecobot.db"))
            },
            PathBuf::from,
        );

        let session_backend = match non_empty("ECOBOT_SESSION_STORE").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("sqlite") => SessionBackend::Sqlite,
            Some(v) if !v.eq_ignore_ascii_case("memory") => {
                tracing::warn!(value = %v, "Unknown ECOBOT_SESSION_STORE, using memory");
                SessionBackend::Memory
            }
            _ => SessionBackend::Memory,
        };

        let evaluate = non_empty("ECOBOT_EVALUATE").map_or(true, |v| {
            !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
        });

        Self {
            port,
            db_path,
            session_backend,
            evaluate,
            epa_api_key: non_empty("EPA_API_KEY"),
        }
    }
}
