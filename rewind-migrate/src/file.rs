//! Migration file management.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, trace};

use crate::error::{MigrateResult, MigrationError};
use crate::migration::{DOWN_MARKER, MigrationRecord, UP_MARKER, parse_file_name};

/// How `create` picks the id of a new migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Highest existing id plus one.
    #[default]
    Sequential,
    /// Current UTC time as `YYYYMMDDHHMMSS`.
    Timestamp,
}

/// Migration file reader/writer.
#[derive(Debug, Clone)]
pub struct MigrationFileManager {
    /// Directory where migrations are stored.
    migrations_dir: PathBuf,
}

impl MigrationFileManager {
    /// Create a new file manager.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Load and parse every migration file, ascending by id.
    ///
    /// Subdirectories and hidden files are skipped. Any unreadable or
    /// malformed file, or two files sharing an id, fails the whole load.
    pub fn load_all(&self) -> MigrateResult<Vec<MigrationRecord>> {
        let entries =
            fs::read_dir(&self.migrations_dir).map_err(|e| MigrationError::io(&self.migrations_dir, e))?;

        let mut by_id: BTreeMap<u64, MigrationRecord> = BTreeMap::new();

        for entry in entries {
            let entry = entry.map_err(|e| MigrationError::io(&self.migrations_dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| MigrationError::io(&path, e))?;

            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                return Err(MigrationError::format(
                    file_name.to_string_lossy(),
                    "file name is not valid UTF-8",
                ));
            };

            if file_name.starts_with('.') {
                trace!(file = file_name, "Skipping hidden file");
                continue;
            }
            if !is_regular_file(&path, file_type) {
                trace!(file = file_name, "Skipping non-file entry");
                continue;
            }

            let bytes = fs::read(&path).map_err(|e| MigrationError::io(&path, e))?;
            let content = String::from_utf8(bytes)
                .map_err(|_| MigrationError::format(file_name, "file content is not valid UTF-8"))?;
            let record = MigrationRecord::parse(file_name, &content)?;

            if let Some(existing) = by_id.get(&record.id) {
                // Report in name order so the message does not depend on readdir order.
                let (first, second) = if existing.filename <= record.filename {
                    (existing.filename.clone(), record.filename)
                } else {
                    (record.filename, existing.filename.clone())
                };
                return Err(MigrationError::Conflict {
                    id: record.id,
                    first,
                    second,
                });
            }

            debug!(id = record.id, file = file_name, "Loaded migration");
            by_id.insert(record.id, record);
        }

        Ok(by_id.into_values().collect())
    }

    /// Write a new, empty migration file and return its path.
    pub fn create(&self, description: &str, strategy: IdStrategy) -> MigrateResult<PathBuf> {
        let description = normalize_description(description)?;

        fs::create_dir_all(&self.migrations_dir)
            .map_err(|e| MigrationError::io(&self.migrations_dir, e))?;

        let id = match strategy {
            IdStrategy::Sequential => {
                let next = self.max_id()?.map_or(1, |id| id.saturating_add(1));
                format!("{:03}", next)
            }
            IdStrategy::Timestamp => self.generate_id(),
        };

        let path = self
            .migrations_dir
            .join(format!("{}_{}.sql", id, description));
        if path.exists() {
            return Err(MigrationError::AlreadyExists(path));
        }

        let template = format!("{}\n\n\n{}\n\n", UP_MARKER, DOWN_MARKER);
        fs::write(&path, template).map_err(|e| MigrationError::io(&path, e))?;

        debug!(path = %path.display(), "Created migration file");
        Ok(path)
    }

    /// Highest id among file names in the directory.
    ///
    /// Only names are inspected, so freshly created templates with empty
    /// sections still count.
    fn max_id(&self) -> MigrateResult<Option<u64>> {
        let entries =
            fs::read_dir(&self.migrations_dir).map_err(|e| MigrationError::io(&self.migrations_dir, e))?;

        let mut max = None;
        for entry in entries {
            let entry = entry.map_err(|e| MigrationError::io(&self.migrations_dir, e))?;
            if let Some((id, _)) = entry.file_name().to_str().and_then(|n| parse_file_name(n).ok()) {
                max = max.max(Some(id));
            }
        }
        Ok(max)
    }

    /// Generate a timestamp migration id.
    pub fn generate_id(&self) -> String {
        Utc::now().format("%Y%m%d%H%M%S").to_string()
    }
}

/// Follow symlinks so a linked migration file still counts as a file.
fn is_regular_file(path: &Path, file_type: fs::FileType) -> bool {
    if file_type.is_symlink() {
        return path.is_file();
    }
    file_type.is_file()
}

/// Turn a free-form description into a file-name segment.
fn normalize_description(description: &str) -> MigrateResult<String> {
    let normalized = description.trim().split_whitespace().collect::<Vec<_>>().join("_");

    if normalized.is_empty()
        || !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(MigrationError::InvalidDescription(description.to_string()));
    }
    Ok(normalized)
}
