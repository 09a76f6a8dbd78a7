use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use crate::error::ConfigError;

pub const ADDR_VAR: &str = "WOLFRELAY_ADDR";
pub const STATIC_DIR_VAR: &str = "WOLFRELAY_STATIC_DIR";
pub const CORS_ANY_VAR: &str = "WOLFRELAY_CORS_ANY";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub cors_any: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            static_dir: PathBuf::from("public"),
            cors_any: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup(ADDR_VAR) {
            config.addr = value.parse().map_err(|source| ConfigError::InvalidAddr {
                var: ADDR_VAR,
                value: value.clone(),
                source,
            })?;
        }
        if let Some(dir) = lookup(STATIC_DIR_VAR) {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(CORS_ANY_VAR) {
            config.cors_any = parse_flag(CORS_ANY_VAR, &value)?;
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}
