use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};

use crate::executor::DbSettings;
use crate::llm::DEFAULT_OPENAI_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Show every fetched row as a table.
    Basic,
    /// Limit displayed rows and draw a bar chart of the result.
    Charted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Openai,
    Ollama,
}

/// Chat with an LLM about the contents of a MySQL database.
#[derive(Debug, Clone, Parser)]
#[command(name = "sql_chat_bot", version)]
pub struct Config {
    #[arg(long, value_enum, env = "SQL_BOT_VARIANT", default_value = "charted")]
    pub variant: Variant,

    #[arg(long, value_enum, env = "LLM_BACKEND", default_value = "openai")]
    pub backend: Backend,

    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// DDL file inlined into every prompt.
    #[arg(long, env = "SCHEMA_FILE", default_value = "employees_structure.sql")]
    pub schema: PathBuf,

    /// Rows shown by the charted variant.
    #[arg(long, default_value_t = 100, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub row_limit: usize,

    #[arg(long, default_value_t = 40)]
    pub chart_width: usize,

    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub openai_api_key: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost")]
    pub ollama_host: String,

    #[arg(long, env = "OLLAMA_PORT", default_value_t = 11434)]
    pub ollama_port: u16,

    #[arg(long, env = "HOST", default_value = "localhost")]
    pub host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    pub port: u16,

    #[arg(long, env = "USERNAME", default_value = "root")]
    pub username: String,

    #[arg(long, env = "PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    #[arg(long, env = "DATABASE", default_value = "employees")]
    pub database: String,
}

impl Config {
    pub fn db_settings(&self) -> DbSettings {
        DbSettings {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }

    /// `None` means every row is displayed.
    pub fn row_limit(&self) -> Option<usize> {
        match self.variant {
            Variant::Basic => None,
            Variant::Charted => Some(self.row_limit),
        }
    }

    pub fn charts_enabled(&self) -> bool {
        self.variant == Variant::Charted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "sql_chat_bot",
            "--variant",
            "basic",
            "--backend",
            "ollama",
            "--model",
            "llama3.2:latest",
            "--database",
            "hr",
        ]);

        assert_eq!(config.variant, Variant::Basic);
        assert_eq!(config.backend, Backend::Ollama);
        assert_eq!(config.model, "llama3.2:latest");
        assert_eq!(config.db_settings().database, "hr");
        assert_eq!(config.row_limit(), None);
        assert!(!config.charts_enabled());
    }

    #[test]
    fn charted_variant_limits_rows() {
        let config = Config::parse_from(["sql_chat_bot", "--variant", "charted", "--row-limit", "5"]);
        assert_eq!(config.row_limit(), Some(5));
        assert!(config.charts_enabled());
    }

    #[test]
    fn zero_row_limit_is_rejected() {
        let err = Config::try_parse_from(["sql_chat_bot", "--row-limit", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let config = Config::try_parse_from(["sql_chat_bot", "--row-limit", "1"]).unwrap();
        assert_eq!(config.row_limit, 1);
    }
}
