use async_trait::async_trait;
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Executor, Row};
use tracing::{debug, warn};

use crate::error::ExecError;

/// Rows fetched for one statement, every value as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Labels read off the first row; empty when no rows came back.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Field count reported by the server, known even without rows.
    pub field_count: usize,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let field_count = columns.len();
        Self {
            columns,
            rows,
            field_count,
        }
    }

    pub fn empty(field_count: usize) -> Self {
        Self {
            field_count,
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.field_count.max(self.columns.len())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps at most `limit` rows. Returns true when rows were dropped.
    pub fn truncate(&mut self, limit: usize) -> bool {
        if self.rows.len() > limit {
            self.rows.truncate(limit);
            true
        } else {
            false
        }
    }
}

#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<ResultSet, ExecError>;
}

#[derive(Debug, Clone)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

/// Opens a fresh connection for every statement.
pub struct MySqlExecutor {
    options: MySqlConnectOptions,
}

impl MySqlExecutor {
    pub fn new(settings: &DbSettings) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database);

        Self { options }
    }
}

#[async_trait]
impl SqlExecutor for MySqlExecutor {
    async fn execute(&self, sql: &str) -> Result<ResultSet, ExecError> {
        // The text protocol runs every `;`-separated statement it is handed.
        ensure_single_statement(sql)?;

        let mut conn = MySqlConnection::connect_with(&self.options).await?;

        // raw_sql goes over the text protocol, so every value arrives as text
        // regardless of its column type.
        let rows = conn.fetch_all(sqlx::raw_sql(sql)).await?;

        let mut result = ResultSet::default();
        for (i, row) in rows.iter().enumerate() {
            if i == 0 {
                result.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                result.field_count = row.len();
            }
            let values: Vec<String> = (0..row.len()).map(|index| cell_text(row, index)).collect();
            debug!(?values, "fetched row");
            result.rows.push(values);
        }

        if result.is_empty() {
            match (&mut conn).describe(sql).await {
                Ok(described) => result.field_count = described.columns().len(),
                Err(e) => warn!(error = %e, "cannot describe statement, column count unknown"),
            }
        }

        conn.close().await?;

        Ok(result)
    }
}

/// Rejects text that holds more than one statement. Comments and quoted
/// semicolons do not count as separators.
pub fn ensure_single_statement(sql: &str) -> Result<(), ExecError> {
    let tokens = Tokenizer::new(&MySqlDialect {}, sql)
        .tokenize()
        .map_err(|e| ExecError::Unparseable(e.to_string()))?;

    let statements = tokens
        .split(|token| *token == Token::SemiColon)
        .filter(|part| {
            part.iter()
                .any(|token| !matches!(token, Token::Whitespace(_) | Token::EOF))
        })
        .count();

    if statements > 1 {
        return Err(ExecError::MultipleStatements(statements));
    }
    Ok(())
}

fn cell_text(row: &MySqlRow, index: usize) -> String {
    match row.try_get_unchecked::<Option<String>, _>(index) {
        Ok(Some(text)) => text,
        Ok(None) => "NULL".to_string(),
        Err(_) => match row.try_get_unchecked::<Option<Vec<u8>>, _>(index) {
            Ok(Some(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            _ => "NULL".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rows: usize) -> ResultSet {
        ResultSet::new(
            vec!["emp_no".to_string()],
            (0..rows).map(|i| vec![i.to_string()]).collect(),
        )
    }

    #[test]
    fn truncate_drops_extra_rows() {
        let mut set = result(150);
        assert!(set.truncate(100));
        assert_eq!(set.row_count(), 100);
        assert_eq!(set.rows[99], vec!["99".to_string()]);
    }

    #[test]
    fn truncate_keeps_small_results() {
        let mut set = result(100);
        assert!(!set.truncate(100));
        assert_eq!(set.row_count(), 100);
    }

    #[test]
    fn counts() {
        let set = result(3);
        assert_eq!(set.column_count(), 1);
        assert!(!set.is_empty());
        assert!(ResultSet::default().is_empty());
    }

    #[test]
    fn empty_result_keeps_field_count() {
        let set = ResultSet::empty(4);
        assert!(set.is_empty());
        assert!(set.columns.is_empty());
        assert_eq!(set.column_count(), 4);
    }

    #[test]
    fn single_statements_pass() {
        assert!(ensure_single_statement("SELECT * FROM employees").is_ok());
        assert!(ensure_single_statement("SELECT * FROM employees;").is_ok());
        assert!(ensure_single_statement("SELECT * FROM employees; -- trailing note").is_ok());
        assert!(ensure_single_statement("SELECT 'a;b' AS s;").is_ok());
    }

    #[test]
    fn chained_statements_are_rejected() {
        let err = ensure_single_statement("SELECT 1; DELETE FROM salaries").unwrap_err();
        assert!(matches!(err, ExecError::MultipleStatements(2)));

        let err = ensure_single_statement("SELECT 1;\nSELECT 2;").unwrap_err();
        assert!(matches!(err, ExecError::MultipleStatements(2)));
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        let err = ensure_single_statement("SELECT 'oops").unwrap_err();
        assert!(matches!(err, ExecError::Unparseable(_)));
    }
}
