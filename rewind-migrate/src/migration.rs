//! Migration records and the migration file parser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MigrateResult, MigrationError};
use crate::sql::compact_sql;

/// Marker line introducing the forward batch.
pub const UP_MARKER: &str = "-- migrate: up";

/// Marker line introducing the reverse batch.
pub const DOWN_MARKER: &str = "-- migrate: down";

/// A single reversible migration.
///
/// Records parsed from disk carry no `applied_at`; records read back from the
/// tracking table do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Identity and ordering key, taken from the file name.
    pub id: u64,
    /// Description from the file name.
    pub name: String,
    /// Source file name.
    pub filename: String,
    /// Forward batch.
    pub up: String,
    /// Reverse batch.
    pub down: String,
    /// When the migration was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationRecord {
    /// Create a record that has not been applied.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        filename: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            filename: filename.into(),
            up: up.into(),
            down: down.into(),
            applied_at: None,
        }
    }

    /// Set the application timestamp.
    pub fn with_applied_at(mut self, applied_at: DateTime<Utc>) -> Self {
        self.applied_at = Some(applied_at);
        self
    }

    /// Parse a migration file.
    ///
    /// Both batches are compacted with [`compact_sql`] before being stored.
    /// A batch that holds only comments is rejected like an empty one.
    pub fn parse(file_name: &str, content: &str) -> MigrateResult<Self> {
        let (id, name) = parse_file_name(file_name)?;
        let (up, down) = parse_content(file_name, content)?;

        let up = compact_sql(&up);
        if up.is_empty() {
            return Err(MigrationError::format(file_name, "up section is empty"));
        }
        let down = compact_sql(&down);
        if down.is_empty() {
            return Err(MigrationError::format(file_name, "down section is empty"));
        }

        Ok(Self::new(id, name, file_name, up, down))
    }

    /// Pretty JSON rendering used in error diagnostics.
    pub fn snapshot(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| format!("{{ \"id\": {}, \"filename\": {:?} }}", self.id, self.filename))
    }
}

/// Split a migration file name into `(id, name)`.
///
/// Expected format: `<digits>_<description>.<ext>`.
pub fn parse_file_name(file_name: &str) -> MigrateResult<(u64, String)> {
    let (raw_id, rest) = file_name
        .split_once('_')
        .ok_or_else(|| MigrationError::format(file_name, "missing '_' between id and description"))?;

    if raw_id.is_empty() || !raw_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MigrationError::format(
            file_name,
            format!("id '{}' is not an unsigned integer", raw_id),
        ));
    }

    let id = raw_id.parse::<u64>().map_err(|e| {
        MigrationError::format(file_name, format!("id '{}' is out of range: {}", raw_id, e))
    })?;

    let (name, _ext) = rest
        .rsplit_once('.')
        .ok_or_else(|| MigrationError::format(file_name, "missing file extension"))?;

    Ok((id, name.to_string()))
}

/// Split migration file content into trimmed `(up, down)` batches.
pub fn parse_content(file_name: &str, content: &str) -> MigrateResult<(String, String)> {
    let mut up_line = None;
    let mut down_line = None;

    let lines: Vec<&str> = content.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed == UP_MARKER {
            if up_line.replace(idx).is_some() {
                return Err(MigrationError::format(
                    file_name,
                    format!("'{}' appears more than once", UP_MARKER),
                ));
            }
        } else if trimmed == DOWN_MARKER && down_line.replace(idx).is_some() {
            return Err(MigrationError::format(
                file_name,
                format!("'{}' appears more than once", DOWN_MARKER),
            ));
        }
    }

    let up_idx = up_line
        .ok_or_else(|| MigrationError::format(file_name, format!("'{}' not found", UP_MARKER)))?;
    let down_idx = down_line
        .ok_or_else(|| MigrationError::format(file_name, format!("'{}' not found", DOWN_MARKER)))?;

    if down_idx < up_idx {
        return Err(MigrationError::format(
            file_name,
            format!("'{}' must come before '{}'", UP_MARKER, DOWN_MARKER),
        ));
    }

    let preamble_has_sql = lines[..up_idx].iter().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with("--")
    });
    if preamble_has_sql {
        return Err(MigrationError::format(
            file_name,
            format!("statements found before '{}'", UP_MARKER),
        ));
    }

    let up = lines[up_idx + 1..down_idx].join("\n").trim().to_string();
    let down = lines[down_idx + 1..].join("\n").trim().to_string();

    if up.is_empty() {
        return Err(MigrationError::format(file_name, "up section is empty"));
    }
    if down.is_empty() {
        return Err(MigrationError::format(file_name, "down section is empty"));
    }

    Ok((up, down))
}
