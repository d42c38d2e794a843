//! core::ops::durable
//!
//! Crash-safe whole-file replacement.
//!
//! # Architecture
//!
//! Every durable write in the project goes through [`write_atomic`]:
//!
//! 1. Write the full image to `<target>.tmp`
//! 2. `sync_all` the temporary file
//! 3. `rename` it over the target
//!
//! A failure at any step leaves the previous target untouched. A stale
//! `.tmp` sibling from an interrupted write is simply overwritten next time.
//!
//! # Fault Injection
//!
//! When compiled with `cfg(test)` or the `fault_injection` feature, writes
//! can be made to fail on demand via [`fault_injection::set_crash_after`].

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Path of the temporary sibling used while replacing `target`.
pub fn temp_sibling(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Atomically replace `target` with `bytes`.
///
/// # Errors
///
/// Any I/O error from creating, writing, syncing or renaming. On error the
/// previous contents of `target` are intact.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir)?;
    }

    let tmp = temp_sibling(target);
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(bytes)?;

    #[cfg(any(test, feature = "fault_injection"))]
    if fault_injection::should_crash() {
        return Err(std::io::Error::other(
            "simulated crash for fault injection testing",
        ));
    }

    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, target)?;
    Ok(())
}

/// Fault injection support for testing durability guarantees.
///
/// # Usage
///
/// ```ignore
/// use branchvault::core::ops::durable::fault_injection;
///
/// // The second durable write fails after writing its temp file
/// fault_injection::set_crash_after(2);
/// ...
/// fault_injection::reset();
/// ```
#[cfg(any(test, feature = "fault_injection"))]
pub mod fault_injection {
    use std::cell::Cell;

    // Thread-local so parallel tests do not interfere.
    thread_local! {
        /// Crash on this write attempt. 0 disables.
        static CRASH_AFTER_WRITES: Cell<usize> = const { Cell::new(0) };

        /// Current write count.
        static WRITE_COUNT: Cell<usize> = const { Cell::new(0) };
    }

    /// Fail the `n`th write attempt from now on. Set to 0 to disable.
    pub fn set_crash_after(n: usize) {
        CRASH_AFTER_WRITES.with(|c| c.set(n));
        WRITE_COUNT.with(|c| c.set(0));
    }

    /// Count a write attempt and report whether it should fail.
    pub fn should_crash() -> bool {
        CRASH_AFTER_WRITES.with(|threshold_cell| {
            let threshold = threshold_cell.get();
            if threshold == 0 {
                return false;
            }
            WRITE_COUNT.with(|count_cell| {
                let count = count_cell.get() + 1;
                count_cell.set(count);
                count >= threshold
            })
        })
    }

    /// Reset fault injection state.
    pub fn reset() {
        CRASH_AFTER_WRITES.with(|c| c.set(0));
        WRITE_COUNT.with(|c| c.set(0));
    }

    /// Get the current write count.
    pub fn write_count() -> usize {
        WRITE_COUNT.with(|c| c.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_replaces() {
        let temp = TempDir::new().expect("temp dir");
        let target = temp.path().join("nested").join("file.bin");

        write_atomic(&target, b"first").expect("first write");
        assert_eq!(fs::read(&target).expect("read"), b"first");

        write_atomic(&target, b"second").expect("second write");
        assert_eq!(fs::read(&target).expect("read"), b"second");
        assert!(!temp_sibling(&target).exists());
    }

    #[test]
    fn failed_write_keeps_previous_contents() {
        let temp = TempDir::new().expect("temp dir");
        let target = temp.path().join("file.bin");
        write_atomic(&target, b"stable").expect("write");

        fault_injection::set_crash_after(1);
        let result = write_atomic(&target, b"lost");
        fault_injection::reset();

        assert!(result.is_err());
        assert_eq!(fs::read(&target).expect("read"), b"stable");
    }

    #[test]
    fn crash_threshold_counts_attempts() {
        fault_injection::set_crash_after(3);
        assert!(!fault_injection::should_crash());
        assert!(!fault_injection::should_crash());
        assert!(fault_injection::should_crash());
        assert_eq!(fault_injection::write_count(), 3);
        fault_injection::reset();
        assert!(!fault_injection::should_crash());
    }

    #[test]
    fn temp_sibling_appends_suffix() {
        let p = Path::new("/a/b/c.bva");
        assert_eq!(temp_sibling(p), PathBuf::from("/a/b/c.bva.tmp"));
    }
}
