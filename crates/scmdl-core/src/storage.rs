//! File lifecycle for downloaded data.
//!
//! Bodies are written to a `.part` sibling first and renamed into place, so
//! a crash or error never leaves a truncated file under the final name (which
//! a re-run would otherwise skip as "already present").

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix of in-progress writes.
pub const TEMP_SUFFIX: &str = ".part";

/// `a.brstm` -> `a.brstm.part`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Write `data` to `final_path` via a temp file and rename.
pub fn write_atomic(final_path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = temp_path(final_path);
    let result = write_then_rename(&tmp, final_path, data);
    if result.is_err() {
        remove_if_exists(&tmp);
    }
    result
}

fn write_then_rename(tmp: &Path, final_path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(tmp, final_path)
}

/// Best-effort removal; a missing file is not an error.
pub fn remove_if_exists(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "could not remove: {}", e),
    }
}

/// Set mode 0755 (no-op off Unix).
#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
