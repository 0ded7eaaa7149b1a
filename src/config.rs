use std::{env, str::FromStr};

use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GAME_POINTS: u32 = 10;
const DEFAULT_GAMES_PAGE_SIZE: u32 = 50;
const DEFAULT_TRUE_LABEL: &str = "Doğru";
const DEFAULT_FALSE_LABEL: &str = "Yanlış";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set, e.g. in a .env file")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// REST base url, e.g. `https://admin.example.com/api`
    pub api_url: String,

    /// bearer token forwarded on every request
    pub api_token: Option<String>,

    pub timeout_secs: u64,

    /// score weight used when a question is attached to a game
    pub game_points: u32,

    pub games_page_size: u32,

    pub true_label: String,
    pub false_label: String,
}

impl Config {
    /// Loads `.env` if present, then reads `EDUGAME_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("EDUGAME_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("EDUGAME_API_URL"))?;
        let api_token = lookup("EDUGAME_API_TOKEN").filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_url,
            api_token,
            timeout_secs: parse_or(&lookup, "EDUGAME_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            game_points: parse_or(&lookup, "EDUGAME_GAME_POINTS", DEFAULT_GAME_POINTS)?,
            games_page_size: parse_or(&lookup, "EDUGAME_GAMES_PAGE_SIZE", DEFAULT_GAMES_PAGE_SIZE)?,
            true_label: lookup("EDUGAME_TRUE_LABEL").unwrap_or_else(|| DEFAULT_TRUE_LABEL.to_string()),
            false_label: lookup("EDUGAME_FALSE_LABEL")
                .unwrap_or_else(|| DEFAULT_FALSE_LABEL.to_string()),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
