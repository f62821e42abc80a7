//! Test helpers for writing instance files into temporary workspaces.

use camino::{Utf8Path, Utf8PathBuf};
use parcel_match_core::Instance;
use parcel_match_core::test_support::{line_instance, parcel_record};
use tempfile::TempDir;

/// Write `contents` to `path`, panicking on failure.
pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

/// Temporary directory with a UTF-8 root path.
pub(super) fn workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// One driver on the `1-2-3` line and a parcel riding the whole trip.
pub(super) fn sample_instance() -> Instance {
    let mut instance = line_instance();
    instance.parcels.push(parcel_record(1, 1, 3, 40.0, 5));
    instance
}

/// Serialise `instance` as pretty JSON into `path`.
pub(super) fn write_instance(path: &Utf8Path, instance: &Instance) {
    let payload = serde_json::to_string_pretty(instance).expect("serialize instance");
    write_utf8(path, payload.as_bytes());
}
