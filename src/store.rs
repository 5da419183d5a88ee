// src/store.rs
//! JSON record store.
//!
//! A store is a single pretty-printed JSON array of receipts (4-space indent,
//! non-ASCII written literally). It is read once at the start of a run and
//! written once at the end. Writes go to a sibling temp file first and are
//! renamed into place, so a crash never leaves a half-written store.

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::config::consts::{ARCHIVE_DATE_FMT, SNAPSHOT_FILE};
use crate::error::StoreError;
use crate::model::Receipt;
use crate::scrape::resume::KnownIds;

/// Load a store. A missing file is an empty store; anything unreadable is fatal.
pub fn load_records(path: &Path) -> Result<Vec<Receipt>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(StoreError::Read { path: path.to_path_buf(), source }),
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|source| StoreError::Decode { path: path.to_path_buf(), source })
}

/// Overwrite `path` with `records`. On failure the temp file is removed and
/// the previous content of `path` is left as it was.
pub fn save_records(path: &Path, records: &[Receipt]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent).map_err(write_err)?;
        }
    }

    let tmp = temp_sibling(path);
    let outcome = write_json(&tmp, path, records).and_then(|()| fs::rename(&tmp, path).map_err(write_err));
    if outcome.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    outcome
}

/// Serialize `records` into `tmp`. Errors name `path`, the file being saved.
fn write_json(tmp: &Path, path: &Path, records: &[Receipt]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write { path: path.to_path_buf(), source };

    let file = fs::File::create(tmp).map_err(write_err)?;
    let mut out = BufWriter::new(file);

    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    records
        .serialize(&mut ser)
        .map_err(|source| StoreError::Encode { path: path.to_path_buf(), source })?;
    out.write_all(b"\n").map_err(write_err)?;
    out.flush().map_err(write_err)
}

/// Append `fresh` to `existing`, dropping any record whose id is already present.
/// Returns how many were added.
pub fn merge_new(existing: &mut Vec<Receipt>, fresh: Vec<Receipt>) -> usize {
    let mut known = KnownIds::from_records(existing);
    let before = existing.len();
    existing.extend(fresh.into_iter().filter(|r| known.admit(r.check_id)));
    existing.len() - before
}

/// Newest first.
pub fn sort_descending(records: &mut [Receipt]) {
    records.sort_by(|a, b| b.check_id.cmp(&a.check_id));
}

/// `<dir>/<name>_<DD_MM_YYYY>.json`
pub fn archive_path(dir: &Path, name: &str, date: NaiveDate) -> PathBuf {
    let stamp = date.format(ARCHIVE_DATE_FMT).to_string();
    dir.join(join!(name, "_", &stamp, ".json"))
}

pub fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join(SNAPSHOT_FILE)
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("path exists but is not a directory: {}", dir.display()),
        ));
    }
    fs::create_dir_all(dir)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_uses_day_month_year() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(archive_path(Path::new("arch"), "checks", d), Path::new("arch/checks_03_06_2024.json"));
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_records(&dir.path().join("nope.json")).unwrap().is_empty());
    }

    #[test]
    fn corrupt_store_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.json");
        fs::write(&p, "{ not json").unwrap();
        assert!(matches!(load_records(&p), Err(StoreError::Decode { .. })));
    }

    #[test]
    fn save_writes_pretty_utf8_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nested").join("all_items.json");
        let mut r = Receipt::new(5);
        r.user = Some(s!("ООО Ромашка"));
        save_records(&p, &[r.clone()]).unwrap();

        let text = fs::read_to_string(&p).unwrap();
        assert!(text.contains("ООО Ромашка"));
        assert!(text.contains("\n    {\n        \"checkID\": 5"));
        assert!(!p.with_file_name("all_items.json.tmp").exists());
        assert_eq!(load_records(&p).unwrap(), vec![r]);
    }

    #[test]
    fn merge_never_duplicates_ids() {
        let mut existing: Vec<Receipt> = [1, 2, 3].into_iter().map(Receipt::new).collect();
        let fresh: Vec<Receipt> = [3, 4, 4, 5].into_iter().map(Receipt::new).collect();
        assert_eq!(merge_new(&mut existing, fresh), 2);
        let ids: Vec<_> = existing.iter().map(|r| r.check_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn sort_puts_newest_first() {
        let mut v: Vec<Receipt> = [3, 9, 1].into_iter().map(Receipt::new).collect();
        sort_descending(&mut v);
        assert_eq!(v.iter().map(|r| r.check_id).collect::<Vec<_>>(), vec![9, 3, 1]);
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory where the store should go: the rename fails.
        let path = dir.path().join("store.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = save_records(&path, &[Receipt::new(1)]).unwrap_err();

        assert!(matches!(err, StoreError::Write { .. }));
        assert!(!temp_sibling(&path).exists());
        assert!(path.join("keep").exists());
    }
}
