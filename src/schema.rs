use std::path::Path;

use tokio::fs;

use crate::error::ChainError;

/// Reads the DDL file and joins it onto a single line so it can be inlined in a prompt.
pub async fn load_ddl(path: &Path) -> Result<String, ChainError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|source| ChainError::Schema {
            path: path.display().to_string(),
            source,
        })?;

    Ok(strip_newlines(&text))
}

fn strip_newlines(text: &str) -> String {
    text.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_and_flattens_ddl() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "CREATE TABLE t (\n  id INT\n);\r\n").unwrap();

        let ddl = load_ddl(file.path()).await.unwrap();
        assert_eq!(ddl, "CREATE TABLE t (  id INT);");
    }

    #[tokio::test]
    async fn missing_file_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_ddl(&dir.path().join("nope.sql")).await.unwrap_err();
        assert!(matches!(err, ChainError::Schema { .. }));
    }
}
