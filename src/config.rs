use std::env;

/// Editor used when `$EDITOR` is unset.
pub const DEFAULT_EDITOR: &str = "vi";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("NOTION_TOKEN environment variable is required")]
    MissingToken,
    #[error("NOTION_DATABASE_ID environment variable is required")]
    MissingDatabase,
}

/// Runtime configuration, resolved from the environment before the board
/// exists. Missing credentials are the one fatal error class in nokan.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub database_id: String,
    pub editor: String,
}

impl Config {
    pub fn from_env(database_override: Option<String>) -> Result<Self, ConfigError> {
        let token = non_empty(env::var("NOTION_TOKEN").ok()).ok_or(ConfigError::MissingToken)?;
        let database_id = database_override
            .or_else(|| non_empty(env::var("NOTION_DATABASE_ID").ok()))
            .ok_or(ConfigError::MissingDatabase)?;
        let editor =
            non_empty(env::var("EDITOR").ok()).unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Ok(Self {
            token,
            database_id,
            editor,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
