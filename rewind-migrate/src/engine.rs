//! Migration engine implementation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{Direction, MigrateResult, MigrationError};
use crate::executor::{Database, Transaction};
use crate::file::MigrationFileManager;
use crate::history::{DEFAULT_TABLE_NAME, HistoryStore, TableName};
use crate::migration::MigrationRecord;

/// Configuration for the migration engine.
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Path to the migrations directory.
    pub migrations_dir: PathBuf,
    /// Name of the tracking table.
    pub table_name: String,
    /// Compute and report the plan, but execute nothing.
    pub dry_run: bool,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("./migrations"),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            dry_run: false,
        }
    }
}

impl MigratorConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the migrations directory.
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    /// Set the tracking table name.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Enable dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Something worth telling the operator about that does not stop a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    /// An applied migration has no file, but a later applied migration
    /// still does, so it is left in place.
    Hole {
        /// Migration id.
        id: u64,
        /// File name recorded when it was applied.
        filename: String,
    },
    /// A migration file sits at or below the highest retained id without
    /// having been applied, so it will never run.
    Skipped {
        /// Migration id.
        id: u64,
        /// File name.
        filename: String,
        /// Highest retained applied id.
        head: u64,
    },
    /// The forward batch on disk differs from the one that was applied.
    Drift {
        /// Migration id.
        id: u64,
        /// File name.
        filename: String,
    },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hole { id, filename } => write!(
                f,
                "migration {} ({}) is applied but its file is gone; only trailing removals are rolled back",
                id, filename
            ),
            Self::Skipped { id, filename, head } => write!(
                f,
                "migration {} ({}) is older than applied migration {} and will not be applied",
                id, filename, head
            ),
            Self::Drift { id, filename } => write!(
                f,
                "migration {} ({}) was modified after it was applied",
                id, filename
            ),
        }
    }
}

/// The divergence between the applied set and the file set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Orphaned applied migrations, highest id first.
    pub revert: Vec<MigrationRecord>,
    /// File migrations to apply, lowest id first.
    pub apply: Vec<MigrationRecord>,
    /// Highest applied id that survives the reverts (0 if none).
    pub head: u64,
    /// Non-fatal findings.
    pub warnings: Vec<PlanWarning>,
}

impl MigrationPlan {
    /// Compute the plan.
    ///
    /// Both inputs must be ascending by id. Applied migrations are walked from
    /// the top down; the run of ids missing from `files` is the orphaned
    /// suffix, and the walk stops at the first id still on disk. Every file
    /// above the surviving head is then pending.
    pub fn compute(applied: &[MigrationRecord], files: &[MigrationRecord]) -> Self {
        debug_assert!(applied.windows(2).all(|w| w[0].id < w[1].id));
        debug_assert!(files.windows(2).all(|w| w[0].id < w[1].id));

        let on_disk: HashMap<u64, &MigrationRecord> = files.iter().map(|f| (f.id, f)).collect();

        let split = applied
            .iter()
            .rposition(|m| on_disk.contains_key(&m.id))
            .map_or(0, |idx| idx + 1);
        let (retained, orphaned) = applied.split_at(split);

        let head = retained.last().map_or(0, |m| m.id);
        let revert: Vec<_> = orphaned.iter().rev().cloned().collect();
        let apply: Vec<_> = files.iter().filter(|f| f.id > head).cloned().collect();

        let mut warnings = Vec::new();
        let applied_ids: HashSet<u64> = retained.iter().map(|m| m.id).collect();

        for m in retained {
            match on_disk.get(&m.id) {
                None => warnings.push(PlanWarning::Hole {
                    id: m.id,
                    filename: m.filename.clone(),
                }),
                Some(file) if file.up != m.up => warnings.push(PlanWarning::Drift {
                    id: m.id,
                    filename: file.filename.clone(),
                }),
                Some(_) => {}
            }
        }
        for f in files.iter().filter(|f| f.id <= head && !applied_ids.contains(&f.id)) {
            warnings.push(PlanWarning::Skipped {
                id: f.id,
                filename: f.filename.clone(),
                head,
            });
        }

        Self {
            revert,
            apply,
            head,
            warnings,
        }
    }

    /// Check if there's anything to do.
    pub fn is_empty(&self) -> bool {
        self.revert.is_empty() && self.apply.is_empty()
    }

    /// Get a summary of the plan.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.revert.is_empty() {
            parts.push(format!("{} to roll back", self.revert.len()));
        }
        if !self.apply.is_empty() {
            parts.push(format!("{} to apply", self.apply.len()));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("{} warnings", self.warnings.len()));
        }

        if parts.is_empty() {
            "Database is up to date".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Ids rolled back, in execution order.
    pub reverted: Vec<u64>,
    /// Ids applied, in execution order.
    pub applied: Vec<u64>,
    /// Warnings from the plan.
    pub warnings: Vec<PlanWarning>,
    /// Whether this was a dry run (nothing executed).
    pub dry_run: bool,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl MigrationReport {
    /// Check if any migrations were applied or rolled back.
    pub fn has_changes(&self) -> bool {
        !self.reverted.is_empty() || !self.applied.is_empty()
    }

    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.reverted.is_empty() {
            parts.push(format!("{} rolled back", self.reverted.len()));
        }
        if !self.applied.is_empty() {
            parts.push(format!("{} applied", self.applied.len()));
        }

        let prefix = if self.dry_run { "[DRY RUN] " } else { "" };
        if parts.is_empty() {
            format!("{}No migrations to run", prefix)
        } else {
            format!("{}{} in {}ms", prefix, parts.join(", "), self.duration_ms)
        }
    }
}

/// Migration status information.
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Applied migrations, ascending.
    pub applied: Vec<MigrationRecord>,
    /// Migrations the next run would apply.
    pub pending: Vec<MigrationRecord>,
    /// Migrations the next run would roll back.
    pub orphaned: Vec<MigrationRecord>,
    /// Plan warnings.
    pub warnings: Vec<PlanWarning>,
}

impl MigrationStatus {
    /// Whether the next run would do nothing.
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty() && self.orphaned.is_empty()
    }
}

/// The reconciliation engine.
///
/// Holds configuration only; the database is passed to each call.
#[derive(Debug, Clone)]
pub struct Migrator {
    config: MigratorConfig,
    files: MigrationFileManager,
    history: HistoryStore,
}

impl Migrator {
    /// Create a new migrator, validating the tracking table name.
    pub fn new(config: MigratorConfig) -> MigrateResult<Self> {
        let table = TableName::new(config.table_name.clone())?;
        Ok(Self {
            files: MigrationFileManager::new(&config.migrations_dir),
            history: HistoryStore::new(table),
            config,
        })
    }

    /// The configuration.
    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// The applied-state store.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// The file manager for the migrations directory.
    pub fn files(&self) -> &MigrationFileManager {
        &self.files
    }

    /// Load the migration files from the configured directory.
    pub fn load(&self) -> MigrateResult<Vec<MigrationRecord>> {
        self.files.load_all()
    }

    /// Load the configured directory and reconcile the database with it.
    pub fn migrate<D: Database>(&self, db: &mut D) -> MigrateResult<MigrationReport> {
        let files = self.load()?;
        self.reconcile(db, &files)
    }

    /// Reconcile the database with an already-loaded set of migrations.
    ///
    /// Everything runs in one transaction: either every revert and apply
    /// lands, or none does.
    pub fn reconcile<D: Database>(
        &self,
        db: &mut D,
        files: &[MigrationRecord],
    ) -> MigrateResult<MigrationReport> {
        let files = validate_files(files)?;
        let start = Instant::now();

        let mut tx = db
            .begin()
            .map_err(|e| MigrationError::database("beginning a transaction", e))?;

        let mut report = match self.run(&mut tx, &files) {
            Ok(report) => report,
            Err(err) => {
                warn!(error = &err as &dyn std::error::Error, "Reconciliation failed, rolling back");
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = &rollback_err as &dyn std::error::Error, "Rollback failed");
                }
                return Err(err);
            }
        };

        if self.config.dry_run {
            tx.rollback()
                .map_err(|e| MigrationError::database("ending a dry run", e))?;
        } else {
            tx.commit()
                .map_err(|e| MigrationError::database("committing", e))?;
        }

        report.duration_ms = start.elapsed().as_millis() as i64;
        info!(summary = %report.summary(), "Reconciliation finished");
        Ok(report)
    }

    fn run<T: Transaction>(
        &self,
        tx: &mut T,
        files: &[MigrationRecord],
    ) -> MigrateResult<MigrationReport> {
        self.history.ensure_table(tx)?;
        let applied = self.history.list(tx)?;
        let plan = MigrationPlan::compute(&applied, files);

        for warning in &plan.warnings {
            warn!("{}", warning);
        }
        debug!(
            head = plan.head,
            revert = plan.revert.len(),
            apply = plan.apply.len(),
            "Computed migration plan"
        );

        let mut report = MigrationReport {
            warnings: plan.warnings.clone(),
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        if self.config.dry_run {
            report.reverted = plan.revert.iter().map(|m| m.id).collect();
            report.applied = plan.apply.iter().map(|m| m.id).collect();
            return Ok(report);
        }

        for migration in &plan.revert {
            tx.execute_batch(&migration.down)
                .map_err(|e| MigrationError::execution(Direction::Down, migration, e))?;
            self.history.delete(tx, migration)?;

            info!(id = migration.id, name = %migration.name, "Rolled back migration");
            report.reverted.push(migration.id);
        }

        for migration in &plan.apply {
            self.history.check_id(migration)?;
            tx.execute_batch(&migration.up)
                .map_err(|e| MigrationError::execution(Direction::Up, migration, e))?;
            self.history.insert(tx, migration)?;

            info!(id = migration.id, name = %migration.name, "Applied migration");
            report.applied.push(migration.id);
        }

        Ok(report)
    }

    /// Compute what the next run would do, without changing anything.
    pub fn plan<D: Database>(&self, db: &mut D) -> MigrateResult<MigrationPlan> {
        let files = self.load()?;
        let applied = self.read_applied(db)?;
        Ok(MigrationPlan::compute(&applied, &files))
    }

    /// Get migration status.
    pub fn status<D: Database>(&self, db: &mut D) -> MigrateResult<MigrationStatus> {
        let files = self.load()?;
        let applied = self.read_applied(db)?;
        let plan = MigrationPlan::compute(&applied, &files);

        Ok(MigrationStatus {
            applied,
            pending: plan.apply,
            orphaned: plan.revert,
            warnings: plan.warnings,
        })
    }

    /// Read the applied set in a transaction that is always rolled back,
    /// so a missing tracking table is never left behind.
    fn read_applied<D: Database>(&self, db: &mut D) -> MigrateResult<Vec<MigrationRecord>> {
        let mut tx = db
            .begin()
            .map_err(|e| MigrationError::database("beginning a transaction", e))?;

        let applied = self
            .history
            .ensure_table(&mut tx)
            .and_then(|()| self.history.list(&mut tx));

        tx.rollback()
            .map_err(|e| MigrationError::database("rolling back a read-only transaction", e))?;
        applied
    }
}

/// Sort file migrations and re-check the invariants the loader enforces.
fn validate_files(files: &[MigrationRecord]) -> MigrateResult<Vec<MigrationRecord>> {
    let mut sorted = files.to_vec();
    sorted.sort_by_key(|m| m.id);

    for pair in sorted.windows(2) {
        if pair[0].id == pair[1].id {
            return Err(MigrationError::Conflict {
                id: pair[0].id,
                first: pair[0].filename.clone(),
                second: pair[1].filename.clone(),
            });
        }
    }
    for m in &sorted {
        if m.up.trim().is_empty() || m.down.trim().is_empty() {
            return Err(MigrationError::format(&m.filename, "up and down sections must both be non-empty"));
        }
    }

    Ok(sorted)
}
