//! Transactional source mutation.
//!
//! Appending trampolines is a filesystem-visible side effect on files we
//! do not own. It runs as an explicit transaction: snapshot every unit,
//! append, run the external build, restore every unit from its snapshot.
//! Snapshots are checksummed so restoration can prove the unit is
//! bit-for-bit identical to its pre-mutation state, and so a pre-run
//! check can recover snapshots left behind by an interrupted run.

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::forcelink::errors::ForceLinkError;
use crate::forcelink::trampoline::Trampoline;
use crate::util::hash::{sha256_bytes, sha256_file};

/// Suffix of the on-disk snapshot kept next to each mutated unit.
pub const BACKUP_SUFFIX: &str = ".wharf-orig";

/// The snapshot path for a source unit.
pub fn backup_path(unit: &Path) -> PathBuf {
    let mut name = unit
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    unit.with_file_name(name)
}

#[derive(Debug)]
struct MutationEntry {
    unit: PathBuf,
    backup: PathBuf,
    checksum: String,
}

/// An in-flight mutation of a set of source units.
///
/// The transaction restores its units on `Drop` if `restore` was never
/// called, so panics and early returns cannot leave units mutated while
/// the process is still alive. An interrupted process is handled by
/// [`recover_leftover_backups`] on the next run.
#[derive(Debug)]
pub struct MutationTransaction {
    entries: Vec<MutationEntry>,
    active: bool,
}

impl MutationTransaction {
    /// Snapshot and mutate every unit, all-or-nothing.
    ///
    /// Every unit is validated (exists, writable) before any unit is
    /// touched. If mutation fails partway regardless, the units already
    /// mutated are restored before the error is returned.
    pub fn begin(trampolines: &[Trampoline]) -> Result<Self, ForceLinkError> {
        for trampoline in trampolines {
            let unit = trampoline.unit();
            if !unit.is_file() {
                return Err(ForceLinkError::UnitNotFound {
                    unit: unit.to_path_buf(),
                });
            }
            OpenOptions::new()
                .append(true)
                .open(unit)
                .map_err(|source| ForceLinkError::UnitNotWritable {
                    unit: unit.to_path_buf(),
                    source,
                })?;
        }

        let mut entries: Vec<MutationEntry> = Vec::with_capacity(trampolines.len());

        for trampoline in trampolines {
            let unit = trampoline.unit().to_path_buf();

            if let Err(error) = mutate_unit(trampoline, &mut entries) {
                // Roll back the units already mutated; the original error wins.
                if let Err(restore_error) = restore_entries(&entries) {
                    tracing::error!(
                        "rollback after failed mutation of {} also failed: {}",
                        unit.display(),
                        restore_error
                    );
                }
                return Err(error);
            }
        }

        tracing::debug!("mutated {} source unit(s)", entries.len());

        Ok(MutationTransaction {
            entries,
            active: true,
        })
    }

    /// Number of units under this transaction.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transaction covers no units.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restore every unit from its snapshot and remove the snapshots.
    ///
    /// All units are attempted even if one fails; the first failure is
    /// returned after the sweep completes.
    pub fn restore(mut self) -> Result<(), ForceLinkError> {
        self.active = false;
        let entries = std::mem::take(&mut self.entries);
        restore_entries(&entries)
    }
}

impl Drop for MutationTransaction {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        tracing::warn!("mutation transaction dropped without explicit restore; restoring");
        if let Err(error) = restore_entries(&self.entries) {
            tracing::error!("best-effort restore on drop failed: {}", error);
        }
    }
}

fn mutate_unit(
    trampoline: &Trampoline,
    entries: &mut Vec<MutationEntry>,
) -> Result<(), ForceLinkError> {
    let unit = trampoline.unit().to_path_buf();
    let backup = backup_path(&unit);

    let original = fs::read(&unit).map_err(|source| ForceLinkError::Io {
        action: "read",
        path: unit.clone(),
        source,
    })?;
    let checksum = sha256_bytes(&original);

    fs::write(&backup, &original).map_err(|source| ForceLinkError::Io {
        action: "write snapshot",
        path: backup.clone(),
        source,
    })?;

    // The snapshot exists from here on; record it before appending so a
    // failed append is still rolled back.
    entries.push(MutationEntry {
        unit: unit.clone(),
        backup,
        checksum,
    });

    let mut file = OpenOptions::new()
        .append(true)
        .open(&unit)
        .map_err(|source| ForceLinkError::Io {
            action: "open for append",
            path: unit.clone(),
            source,
        })?;
    file.write_all(trampoline.definition_block().as_bytes())
        .map_err(|source| ForceLinkError::Io {
            action: "append trampoline to",
            path: unit,
            source,
        })?;

    Ok(())
}

fn restore_entries(entries: &[MutationEntry]) -> Result<(), ForceLinkError> {
    let mut first_error = None;

    for entry in entries {
        if let Err(error) = restore_entry(entry) {
            tracing::error!("failed to restore {}: {}", entry.unit.display(), error);
            if first_error.is_none() {
                first_error = Some(error);
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn restore_entry(entry: &MutationEntry) -> Result<(), ForceLinkError> {
    if !entry.backup.is_file() {
        return Err(ForceLinkError::BackupMissing {
            unit: entry.unit.clone(),
        });
    }

    fs::copy(&entry.backup, &entry.unit).map_err(|source| ForceLinkError::Io {
        action: "restore snapshot of",
        path: entry.unit.clone(),
        source,
    })?;

    let restored = sha256_file(&entry.unit).map_err(|source| ForceLinkError::Io {
        action: "hash restored",
        path: entry.unit.clone(),
        source: std::io::Error::other(source),
    })?;
    if restored != entry.checksum {
        // Keep the snapshot around; it is the only recovery path left.
        return Err(ForceLinkError::ChecksumMismatch {
            unit: entry.unit.clone(),
        });
    }

    fs::remove_file(&entry.backup).map_err(|source| ForceLinkError::Io {
        action: "remove snapshot",
        path: entry.backup.clone(),
        source,
    })?;

    Ok(())
}

/// Detect and restore snapshots left behind by an interrupted prior run.
///
/// Returns the number of units recovered. Safe to call when nothing is
/// left over; repeated runs converge to the clean state.
pub fn recover_leftover_backups(units: &[PathBuf]) -> Result<usize, ForceLinkError> {
    let mut recovered = 0;

    for unit in units {
        let backup = backup_path(unit);
        if !backup.is_file() {
            continue;
        }

        tracing::warn!(
            "found leftover snapshot from an interrupted run: {}",
            backup.display()
        );

        fs::copy(&backup, unit).map_err(|source| ForceLinkError::Io {
            action: "restore snapshot of",
            path: unit.clone(),
            source,
        })?;
        fs::remove_file(&backup).map_err(|source| ForceLinkError::Io {
            action: "remove snapshot",
            path: backup.clone(),
            source,
        })?;

        recovered += 1;
    }

    Ok(recovered)
}
