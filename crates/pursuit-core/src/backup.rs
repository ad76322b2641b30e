//! Point-in-time snapshots of the store file, with tiered retention.
//!
//! Snapshots live under a root backup directory with one subdirectory per
//! scheduled tier; manual snapshots and pre-restore safety copies sit at
//! the root. A JSON metadata file records every snapshot created and is
//! capped at the most recent [`LEDGER_CAP`] records. Rotation works from
//! the files actually on disk, not the metadata, so the two can diverge:
//! a very old snapshot whose record was already dropped still rotates
//! correctly, it just no longer shows up in listings.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use chrono::{DateTime, Duration, Local, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Result, StoreError};

/// Maximum number of records kept in the metadata file. Oldest records are
/// silently dropped; the snapshot files themselves are only ever deleted
/// by rotation.
pub const LEDGER_CAP: usize = 1000;

const METADATA_FILE: &str = "backup_metadata.json";
const SNAPSHOT_PREFIX: &str = "pursuit";

/// Retention tier of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupTier {
    Manual,
    Daily,
    Weekly,
    Monthly,
}

impl BackupTier {
    /// Scheduled tiers in evaluation order.
    pub const SCHEDULED: [BackupTier; 3] =
        [BackupTier::Daily, BackupTier::Weekly, BackupTier::Monthly];

    pub fn as_str(self) -> &'static str {
        match self {
            BackupTier::Manual => "manual",
            BackupTier::Daily => "daily",
            BackupTier::Weekly => "weekly",
            BackupTier::Monthly => "monthly",
        }
    }

    /// How many snapshots rotation keeps. Manual snapshots are never
    /// rotated.
    pub fn keep_count(self) -> Option<usize> {
        match self {
            BackupTier::Manual => None,
            BackupTier::Daily => Some(7),
            BackupTier::Weekly => Some(4),
            BackupTier::Monthly => Some(12),
        }
    }

    /// Minimum age of the latest snapshot before the tier is due again.
    /// Manual snapshots are never auto-scheduled.
    pub fn interval(self) -> Option<Duration> {
        match self {
            BackupTier::Manual => None,
            BackupTier::Daily => Some(Duration::days(1)),
            BackupTier::Weekly => Some(Duration::days(7)),
            BackupTier::Monthly => Some(Duration::days(30)),
        }
    }

    /// Subdirectory under the backup root, if the tier has one.
    fn dir_name(self) -> Option<&'static str> {
        match self {
            BackupTier::Manual => None,
            tier => Some(tier.as_str()),
        }
    }
}

impl fmt::Display for BackupTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackupTier {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "manual" => Ok(BackupTier::Manual),
            "daily" => Ok(BackupTier::Daily),
            "weekly" => Ok(BackupTier::Weekly),
            "monthly" => Ok(BackupTier::Monthly),
            other => Err(format!("unknown backup tier: {}", other)),
        }
    }
}

/// One record per snapshot ever created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub tier: BackupTier,
    pub timestamp: DateTime<Utc>,
    pub size_bytes: u64,
}

/// On-disk shape of `backup_metadata.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupMetadata {
    #[serde(default)]
    pub backups: Vec<BackupRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_backup: Option<DateTime<Utc>>,
}

impl BackupMetadata {
    /// Append a record, dropping the oldest entries beyond [`LEDGER_CAP`].
    fn push_capped(&mut self, record: BackupRecord) {
        self.backups.push(record);
        if self.backups.len() > LEDGER_CAP {
            let excess = self.backups.len() - LEDGER_CAP;
            self.backups.drain(..excess);
        }
    }
}

/// Aggregate statistics over the metadata file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackupInfo {
    pub total_backups: usize,
    pub last_backup: Option<DateTime<Utc>>,
    pub total_size_bytes: u64,
    pub daily_backups: usize,
    pub weekly_backups: usize,
    pub monthly_backups: usize,
}

/// Creates, rotates, and restores snapshots of a single store file.
///
/// `create_backup`, `rotate`, and `restore` are serialized against each
/// other: restore rewrites the live file that backup creation reads from.
pub struct BackupManager {
    source: PathBuf,
    root: PathBuf,
    metadata_path: PathBuf,
    ops: Mutex<()>,
}

impl BackupManager {
    /// Prepare the backup directory layout for `source`.
    pub fn new(source: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let root = root.into();

        fs::create_dir_all(&root).map_err(|e| backup_io(&root, e))?;
        for tier in BackupTier::SCHEDULED {
            let dir = root.join(tier.as_str());
            fs::create_dir_all(&dir).map_err(|e| backup_io(&dir, e))?;
        }

        let metadata_path = root.join(METADATA_FILE);
        Ok(Self {
            source,
            root,
            metadata_path,
            ops: Mutex::new(()),
        })
    }

    /// Root backup directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.ops.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn tier_dir(&self, tier: BackupTier) -> PathBuf {
        match tier.dir_name() {
            Some(name) => self.root.join(name),
            None => self.root.clone(),
        }
    }

    /// Create a snapshot of the store file.
    ///
    /// The snapshot is written to a temp file in the destination directory
    /// and renamed into place, so a failed copy leaves nothing behind and
    /// registers no metadata record.
    pub fn create_backup(&self, tier: BackupTier, compress: bool) -> Result<PathBuf> {
        let _guard = self.lock()?;

        if !self.source.exists() {
            return Err(StoreError::SourceMissing(self.source.clone()));
        }

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let mut name = format!("{}_{}_{}.db", SNAPSHOT_PREFIX, tier.as_str(), stamp);
        if compress {
            name.push_str(".gz");
        }

        let dir = self.tier_dir(tier);
        let dest = dir.join(&name);
        let tmp = dir.join(format!(".{}.tmp", name));

        if let Err(e) = self.write_snapshot(&tmp, compress) {
            let _ = fs::remove_file(&tmp);
            return Err(backup_io(&dest, e));
        }
        rename_with_fallback(&tmp, &dest).map_err(|e| backup_io(&dest, e))?;

        let size_bytes = fs::metadata(&dest).map(|m| m.len()).unwrap_or(0);
        self.record_backup(&dest, tier, size_bytes);

        info!(path = %dest.display(), %tier, size_bytes, "backup created");
        Ok(dest)
    }

    fn write_snapshot(&self, tmp: &Path, compress: bool) -> io::Result<()> {
        let mut input = fs::File::open(&self.source)?;
        if compress {
            let output = fs::File::create(tmp)?;
            let mut encoder = GzEncoder::new(output, Compression::default());
            io::copy(&mut input, &mut encoder)?;
            encoder.finish()?;
        } else {
            let mut output = fs::File::create(tmp)?;
            io::copy(&mut input, &mut output)?;
        }
        Ok(())
    }

    /// Append a metadata record for a completed snapshot. Metadata is
    /// informational; failures are logged, never surfaced.
    fn record_backup(&self, path: &Path, tier: BackupTier, size_bytes: u64) {
        let mut metadata = match self.read_metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(error = %err, "backup metadata unreadable, skipping record");
                return;
            }
        };

        let now = Utc::now();
        metadata.push_capped(BackupRecord {
            path: path.to_path_buf(),
            tier,
            timestamp: now,
            size_bytes,
        });
        metadata.last_backup = Some(now);

        if let Err(err) = self.write_metadata(&metadata) {
            warn!(error = %err, "failed to write backup metadata");
        }
    }

    fn read_metadata(&self) -> io::Result<BackupMetadata> {
        if !self.metadata_path.exists() {
            return Ok(BackupMetadata::default());
        }
        let contents = fs::read_to_string(&self.metadata_path)?;
        serde_json::from_str(&contents)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn write_metadata(&self, metadata: &BackupMetadata) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(metadata)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.metadata_path, contents)
    }

    /// Whether a scheduled backup of `tier` is due now.
    pub fn should_create_backup(&self, tier: BackupTier) -> bool {
        self.is_due_at(tier, Utc::now())
    }

    /// Due check against an explicit clock. Manual is never due; a tier
    /// with no prior record is always due; an unreadable metadata file
    /// counts as due (prefer an extra backup over a missed one).
    pub fn is_due_at(&self, tier: BackupTier, now: DateTime<Utc>) -> bool {
        let Some(interval) = tier.interval() else {
            return false;
        };

        let metadata = match self.read_metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(error = %err, %tier, "backup metadata unreadable, assuming due");
                return true;
            }
        };

        let latest = metadata
            .backups
            .iter()
            .filter(|record| record.tier == tier)
            .map(|record| record.timestamp)
            .max();

        match latest {
            None => true,
            Some(timestamp) => now.signed_duration_since(timestamp) >= interval,
        }
    }

    /// Delete snapshots beyond the tier's keep-count, most recently
    /// modified first. Works from the files physically present in the
    /// tier's directory. Per-file deletion failures are logged and do not
    /// abort the rest. Returns the number of files deleted.
    pub fn rotate(&self, tier: BackupTier) -> Result<usize> {
        let _guard = self.lock()?;

        let Some(keep_count) = tier.keep_count() else {
            return Ok(0);
        };

        let dir = self.tier_dir(tier);
        let entries = fs::read_dir(&dir).map_err(|e| backup_io(&dir, e))?;

        let mut snapshots: Vec<(PathBuf, SystemTime)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| backup_io(&dir, e))?;
            let path = entry.path();
            let name = entry.file_name();
            if !is_snapshot_name(&name.to_string_lossy()) {
                continue;
            }
            match entry.metadata().and_then(|m| m.modified()) {
                Ok(mtime) => snapshots.push((path, mtime)),
                Err(err) => warn!(path = %path.display(), error = %err, "cannot stat snapshot"),
            }
        }

        snapshots.sort_by(|a, b| b.1.cmp(&a.1));

        let mut deleted = 0;
        for (path, _) in snapshots.iter().skip(keep_count) {
            match fs::remove_file(path) {
                Ok(()) => {
                    info!(path = %path.display(), "deleted old backup");
                    deleted += 1;
                }
                Err(err) => warn!(path = %path.display(), error = %err, "failed to delete backup"),
            }
        }
        Ok(deleted)
    }

    /// Create every scheduled backup that is due, then rotate all
    /// scheduled tiers. Rotation runs regardless of whether any new
    /// backup was made; one tier's failure does not block the others.
    pub fn perform_scheduled_backups(&self) {
        for tier in BackupTier::SCHEDULED {
            if self.should_create_backup(tier) {
                if let Err(err) = self.create_backup(tier, true) {
                    error!(%tier, error = %err, "scheduled backup failed");
                }
            }
        }
        for tier in BackupTier::SCHEDULED {
            if let Err(err) = self.rotate(tier) {
                error!(%tier, error = %err, "backup rotation failed");
            }
        }
    }

    /// Restore the store file from a snapshot.
    ///
    /// Returns `Ok(false)` without touching anything if the snapshot does
    /// not exist. Otherwise the current store file, if present, is first
    /// copied to a `pre_restore_*` safety snapshot at the backup root;
    /// only once that copy is safely on disk is the live file overwritten
    /// (decompressing `.gz` snapshots). I/O failures in either step are
    /// errors, since the caller must know the store may be inconsistent.
    pub fn restore(&self, snapshot: &Path) -> Result<bool> {
        let _guard = self.lock()?;

        if !snapshot.exists() {
            warn!(path = %snapshot.display(), "snapshot not found, nothing restored");
            return Ok(false);
        }

        if self.source.exists() {
            let safety = self.root.join(format!(
                "pre_restore_{}.db",
                Local::now().format("%Y%m%d_%H%M%S")
            ));
            fs::copy(&self.source, &safety).map_err(|e| backup_io(&safety, e))?;
            info!(path = %safety.display(), "safety snapshot created before restore");
        }

        let tmp = self.source.with_extension("restore.tmp");
        let result = if is_compressed(snapshot) {
            decompress_to(snapshot, &tmp)
        } else {
            fs::copy(snapshot, &tmp).map(|_| ())
        };
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(backup_io(snapshot, e));
        }
        rename_with_fallback(&tmp, &self.source).map_err(|e| backup_io(&self.source, e))?;

        info!(path = %snapshot.display(), "store restored from snapshot");
        Ok(true)
    }

    /// Aggregate statistics from the metadata file. Never fails: a
    /// missing or corrupt file reports zero backups.
    pub fn backup_info(&self) -> BackupInfo {
        let metadata = match self.read_metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(error = %err, "backup metadata unreadable");
                return BackupInfo::default();
            }
        };

        let count_tier = |tier| {
            metadata
                .backups
                .iter()
                .filter(|record| record.tier == tier)
                .count()
        };

        BackupInfo {
            total_backups: metadata.backups.len(),
            last_backup: metadata.last_backup,
            total_size_bytes: metadata.backups.iter().map(|record| record.size_bytes).sum(),
            daily_backups: count_tier(BackupTier::Daily),
            weekly_backups: count_tier(BackupTier::Weekly),
            monthly_backups: count_tier(BackupTier::Monthly),
        }
    }

    /// List recorded snapshots, newest first, optionally filtered by tier.
    /// Never fails: a missing or corrupt metadata file yields an empty
    /// list.
    pub fn list_backups(&self, tier: Option<BackupTier>) -> Vec<BackupRecord> {
        let metadata = match self.read_metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(error = %err, "backup metadata unreadable");
                return Vec::new();
            }
        };

        let mut records: Vec<BackupRecord> = metadata
            .backups
            .into_iter()
            .filter(|record| tier.map_or(true, |t| record.tier == t))
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }
}

/// Move a fully-written temp file over its destination. On platforms
/// where rename refuses to replace an existing file (Windows), remove the
/// destination and retry once; if that also fails, the temp file is
/// removed so no half-named snapshot lingers.
fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry.kind(),
                format!("atomic rename failed ({}): {}", initial, retry),
            )
        })?;
    }
    Ok(())
}

fn backup_io(path: &Path, source: io::Error) -> StoreError {
    StoreError::BackupIo {
        path: path.to_path_buf(),
        source,
    }
}

fn is_snapshot_name(name: &str) -> bool {
    name.ends_with(".db") || name.ends_with(".db.gz")
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn decompress_to(snapshot: &Path, dest: &Path) -> io::Result<()> {
    let input = fs::File::open(snapshot)?;
    let mut decoder = GzDecoder::new(io::BufReader::new(input));
    let mut output = fs::File::create(dest)?;
    io::copy(&mut decoder, &mut output)?;
    Ok(())
}
