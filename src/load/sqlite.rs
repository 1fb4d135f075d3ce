use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::info;

use crate::error::LoadError;
use crate::load::{ensure_not_empty, require, Sink};
use crate::types::CleanRecord;

/// Replaces a relational table with the dataset on every save.
pub struct SqliteSink {
    path: PathBuf,
    table: String,
}

impl SqliteSink {
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
        }
    }

    fn validated_table(&self) -> Result<&str, LoadError> {
        require(&self.table, "Table name")?;
        let valid = self
            .table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.table.starts_with(|c: char| c.is_ascii_digit());
        if !valid {
            return Err(LoadError::InvalidArgument(format!(
                "Table name '{}' must be alphanumeric or '_'",
                self.table
            )));
        }
        Ok(&self.table)
    }
}

#[async_trait]
impl Sink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn save(&self, records: &[CleanRecord]) -> Result<String, LoadError> {
        ensure_not_empty(records)?;
        require(&self.path.to_string_lossy(), "Database path")?;
        let table = self.validated_table()?.to_string();

        let path = self.path.clone();
        let rows = records.to_vec();
        let table_for_write = table.clone();
        tokio::task::spawn_blocking(move || replace_table(&path, &table_for_write, &rows)).await??;

        let location = format!("{}#{}", self.path.to_string_lossy(), table);
        info!("Successfully saved {} rows to table: {}", records.len(), location);
        Ok(location)
    }
}

/// Drops and recreates `table`, then inserts every record, all in one transaction.
fn replace_table(path: &Path, table: &str, records: &[CleanRecord]) -> Result<(), LoadError> {
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             Title TEXT NOT NULL,
             Price REAL NOT NULL,
             Rating INTEGER NOT NULL,
             Colors REAL NOT NULL,
             Size TEXT NOT NULL,
             Gender TEXT NOT NULL,
             Timestamp TEXT NOT NULL
         );"
    ))?;
    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {table} (Title, Price, Rating, Colors, Size, Gender, Timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        ))?;
        for r in records {
            insert.execute(params![
                r.title,
                r.price,
                r.rating,
                r.colors,
                r.size,
                r.gender,
                r.timestamp.to_rfc3339(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}
