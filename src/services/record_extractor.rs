use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::config::ImportLimits;
use crate::models::UserRecord;

pub const REQUIRED_COLUMNS: [&str; 3] = ["email", "full_name", "password"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing required column '{column}'")]
    MissingColumn {
        column: &'static str,
        /// Line of the offending row; `None` when the header itself lacks the column.
        line: Option<u64>,
    },
    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Pulls `UserRecord`s out of a CSV whose header names at least the required columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordExtractor {
    max_rows: Option<usize>,
    skip_malformed_rows: bool,
}

impl RecordExtractor {
    pub fn new(limits: ImportLimits) -> Self {
        Self {
            max_rows: limits.max_rows,
            skip_malformed_rows: limits.skip_malformed_rows,
        }
    }

    /// Same extractor with the row cap lowered to `limit` if that is smaller.
    pub fn capped(self, limit: Option<usize>) -> Self {
        let max_rows = match (self.max_rows, limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self { max_rows, ..self }
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.max_rows
    }

    pub fn extract_path(&self, path: &Path) -> Result<Vec<UserRecord>, ExtractError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        self.collect(reader)
    }

    pub fn extract<R: Read>(&self, input: R) -> Result<Vec<UserRecord>, ExtractError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        self.collect(reader)
    }

    fn collect<R: Read>(
        &self,
        mut reader: csv::Reader<R>,
    ) -> Result<Vec<UserRecord>, ExtractError> {
        let columns = Columns::locate(reader.headers()?)?;
        let mut records = Vec::new();

        for row in reader.records() {
            if self.max_rows.is_some_and(|max| records.len() >= max) {
                break;
            }

            let row = row?;
            match columns.read(&row) {
                Ok(record) => records.push(record),
                Err(e) if self.skip_malformed_rows => {
                    log::warn!("⚠️  Skipping malformed row: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }
}

/// Header positions of the required columns.
struct Columns {
    email: usize,
    full_name: usize,
    password: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, ExtractError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
                .ok_or(ExtractError::MissingColumn { column, line: None })
        };

        Ok(Self {
            email: find(REQUIRED_COLUMNS[0])?,
            full_name: find(REQUIRED_COLUMNS[1])?,
            password: find(REQUIRED_COLUMNS[2])?,
        })
    }

    fn read(&self, row: &csv::StringRecord) -> Result<UserRecord, ExtractError> {
        let field = |idx: usize, column: &'static str| {
            row.get(idx).ok_or_else(|| ExtractError::MissingColumn {
                column,
                line: row.position().map(|p| p.line()),
            })
        };

        Ok(UserRecord {
            email: field(self.email, "email")?.to_lowercase(),
            full_name: field(self.full_name, "full_name")?.to_string(),
            password: field(self.password, "password")?.to_string(),
        })
    }
}
