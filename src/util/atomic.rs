// ============================================================================
// src/util/atomic.rs – Durable, permissioned, create-new writes (key files)
// ============================================================================

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Return the parent directory path.
fn parent_dir(path: &Path) -> io::Result<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))
}

/// Fsync a directory to persist metadata (like link/unlink).
fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

/// Write `bytes` to `path`, which must not exist yet.
///
/// Data goes to a temp file in the same directory with the exact `mode`,
/// is fsynced, then hard-linked into place. Linking fails with
/// `AlreadyExists` instead of replacing, and an `Err` always means nothing
/// was left behind at `path`. Once the link exists the write is reported as
/// done even if the directory fsync fails.
pub fn atomic_write_new(path: &Path, bytes: &[u8], mode: u32) -> io::Result<()> {
    write_new_with(path, bytes, mode, fsync_dir)
}

fn write_new_with(
    path: &Path,
    bytes: &[u8],
    mode: u32,
    sync_dir: fn(&Path) -> io::Result<()>,
) -> io::Result<()> {
    let dir = parent_dir(path)?;
    if fs::symlink_metadata(path).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        ));
    }

    let base = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let mut tmp_name = OsString::from(".");
    tmp_name.push(base);
    tmp_name.push(format!(".tmp-{}", nanoid::nanoid!(8)));
    let tmp = dir.join(tmp_name);

    let res = (|| {
        let mut f = OpenOptions::new()
            .create_new(true)
            .write(true)
            .mode(mode)
            .open(&tmp)?;
        f.write_all(bytes)?;
        // umask may have narrowed the mode at open.
        f.set_permissions(fs::Permissions::from_mode(mode))?;
        f.sync_all()?;
        fs::hard_link(&tmp, path)
    })();

    let _ = fs::remove_file(&tmp);
    res?;
    if let Err(e) = sync_dir(&dir) {
        warn!(dir = %dir.display(), error = %e, "directory fsync failed after link");
    }
    Ok(())
}
