// rest_api/src/config.rs

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};

pub const DEFAULT_PORT: u16 = 8082;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24;

/// Server configuration, read from the environment with hardcoded
/// defaults for local development. `SESSION_SECRET` has no default:
/// session cookies are worthless if the signing key is guessable.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub relational_data_dir: PathBuf,
    pub documents_data_dir: PathBuf,
    pub session_secret: String,
    pub session_ttl_secs: u64,
    pub admin_employee_id: String,
    pub admin_email: String,
    pub admin_password: String,
    pub employee_roster: Option<PathBuf>,
}

pub fn load_config() -> Result<ServerConfig> {
    let session_secret = match env::var("SESSION_SECRET") {
        Ok(secret) if secret.len() >= 32 => secret,
        Ok(_) => bail!("SESSION_SECRET must be at least 32 bytes"),
        Err(_) => bail!("SESSION_SECRET is not set"),
    };

    let port = match env::var("BIND_PORT") {
        Ok(raw) => raw.parse().map_err(|_| anyhow::anyhow!("invalid BIND_PORT: {raw}"))?,
        Err(_) => DEFAULT_PORT,
    };

    let session_ttl_secs = match env::var("SESSION_TTL_SECS") {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid SESSION_TTL_SECS: {raw}"))?,
        Err(_) => DEFAULT_SESSION_TTL_SECS,
    };

    Ok(ServerConfig {
        host: env::var("BIND_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
        port,
        relational_data_dir: env::var("RELATIONAL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/relational")),
        documents_data_dir: env::var("DOCUMENTS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/documents")),
        session_secret,
        session_ttl_secs,
        admin_employee_id: env::var("ADMIN_EMPLOYEE_ID").unwrap_or_else(|_| "SA0001".to_string()),
        admin_email: env::var("ADMIN_EMAIL")
            .unwrap_or_else(|_| "superadmin@example.com".to_string()),
        admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "@Admin123".to_string()),
        employee_roster: env::var("EMPLOYEE_ROSTER").ok().map(PathBuf::from),
    })
}
