//! Recursive directory replication for "ship the source" obligations.
//!
//! Symlinks are recreated rather than followed, ownership is carried over when
//! it differs, and permission bits are copied with the owner-write bit forced on
//! so a generated tree can always be removed and regenerated by the next run.
//!
//! Ownership and permission replication only exist on unix; elsewhere both
//! steps are no-ops.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::CopyError;

/// Added to every copied mode so the destination stays removable.
#[cfg(unix)]
const OWNER_WRITABLE: u32 = 0o200;

/// Copy every entry under `src` into the existing directory `dest`.
///
/// The first failing operation aborts the whole copy; nothing is retried.
pub fn copy_directory(src: &Path, dest: &Path) -> Result<(), CopyError> {
    let mut entries = fs::read_dir(src)
        .map_err(|e| CopyError::new("read_dir", src, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CopyError::new("read_dir", src, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let source_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        let meta = fs::symlink_metadata(&source_path)
            .map_err(|e| CopyError::new("lstat", &source_path, e))?;
        let file_type = meta.file_type();

        if file_type.is_dir() {
            clear_conflicting(&dest_path, |t| t.is_dir())?;
            create_if_not_exists(&dest_path)?;
            copy_directory(&source_path, &dest_path)?;
        } else if file_type.is_symlink() {
            clear_conflicting(&dest_path, |_| false)?;
            copy_symlink(&source_path, &dest_path)?;
        } else {
            clear_conflicting(&dest_path, |t| t.is_file())?;
            fs::copy(&source_path, &dest_path)
                .map_err(|e| CopyError::new("copy", &source_path, e))?;
        }

        copy_ownership(&meta, &dest_path)?;
        if !file_type.is_symlink() {
            copy_permissions(&meta, &dest_path)?;
        }
    }
    Ok(())
}

/// Create `dest` (and its parents) unless it already exists, then replicate `src` into it.
pub fn replicate_into(src: &Path, dest: &Path) -> Result<(), CopyError> {
    clear_conflicting(dest, |t| t.is_dir())?;
    create_if_not_exists(dest)?;
    copy_directory(src, dest)
}

fn create_if_not_exists(dir: &Path) -> Result<(), CopyError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| CopyError::new("mkdir", dir, e))
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<(), CopyError> {
    let target = fs::read_link(src).map_err(|e| CopyError::new("readlink", src, e))?;
    std::os::unix::fs::symlink(&target, dest).map_err(|e| CopyError::new("symlink", dest, e))
}

#[cfg(windows)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<(), CopyError> {
    let target = fs::read_link(src).map_err(|e| CopyError::new("readlink", src, e))?;
    let points_at_dir = src.parent().map(|p| p.join(&target).is_dir()).unwrap_or(false);
    let result = if points_at_dir {
        std::os::windows::fs::symlink_dir(&target, dest)
    } else {
        std::os::windows::fs::symlink_file(&target, dest)
    };
    result.map_err(|e| CopyError::new("symlink", dest, e))
}

#[cfg(not(any(unix, windows)))]
fn copy_symlink(src: &Path, _dest: &Path) -> Result<(), CopyError> {
    Err(CopyError::new(
        "symlink",
        src,
        io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported"),
    ))
}

/// Remove whatever a previous copy left at `dest` unless `keep` accepts its type.
///
/// Existing links are never followed: writing through one could land outside
/// the destination tree.
fn clear_conflicting(dest: &Path, keep: impl Fn(fs::FileType) -> bool) -> Result<(), CopyError> {
    let meta = match fs::symlink_metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(CopyError::new("lstat", dest, e)),
    };
    let file_type = meta.file_type();
    if keep(file_type) {
        return Ok(());
    }
    let removed = if file_type.is_dir() {
        fs::remove_dir_all(dest)
    } else {
        remove_link_or_file(dest)
    };
    removed.map_err(|e| CopyError::new("remove", dest, e))
}

#[cfg(windows)]
fn remove_link_or_file(path: &Path) -> io::Result<()> {
    // Directory links can only be removed as directories.
    fs::remove_file(path).or_else(|_| fs::remove_dir(path))
}

#[cfg(not(windows))]
fn remove_link_or_file(path: &Path) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(unix)]
fn copy_ownership(meta: &fs::Metadata, dest: &Path) -> Result<(), CopyError> {
    use std::os::unix::fs::MetadataExt;

    let current = fs::symlink_metadata(dest).map_err(|e| CopyError::new("lstat", dest, e))?;
    if current.uid() == meta.uid() && current.gid() == meta.gid() {
        return Ok(());
    }
    std::os::unix::fs::lchown(dest, Some(meta.uid()), Some(meta.gid()))
        .map_err(|e| CopyError::new("lchown", dest, e))
}

#[cfg(not(unix))]
fn copy_ownership(_meta: &fs::Metadata, _dest: &Path) -> Result<(), CopyError> {
    Ok(())
}

#[cfg(unix)]
fn copy_permissions(meta: &fs::Metadata, dest: &Path) -> Result<(), CopyError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode() | OWNER_WRITABLE;
    fs::set_permissions(dest, fs::Permissions::from_mode(mode))
        .map_err(|e| CopyError::new("chmod", dest, e))
}

#[cfg(not(unix))]
fn copy_permissions(_meta: &fs::Metadata, _dest: &Path) -> Result<(), CopyError> {
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::{symlink, PermissionsExt};
    use tempfile::tempdir;

    fn source_tree(root: &Path) {
        fs::write(root.join("LICENSE"), "Mozilla Public License Version 2.0\n").unwrap();
        fs::create_dir_all(root.join("pkg/inner")).unwrap();
        fs::write(root.join("pkg/inner/lib.go"), "package inner\n").unwrap();
        symlink("pkg/inner/lib.go", root.join("alias.go")).unwrap();
        symlink("../missing", root.join("pkg/dangling")).unwrap();
    }

    #[test]
    fn test_copies_files_and_directories_verbatim() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        source_tree(src.path());

        copy_directory(src.path(), dest.path()).unwrap();

        assert_eq!(
            fs::read(dest.path().join("LICENSE")).unwrap(),
            fs::read(src.path().join("LICENSE")).unwrap()
        );
        assert_eq!(
            fs::read_to_string(dest.path().join("pkg/inner/lib.go")).unwrap(),
            "package inner\n"
        );
    }

    #[test]
    fn test_symlinks_keep_their_target_string() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        source_tree(src.path());

        copy_directory(src.path(), dest.path()).unwrap();

        let alias = dest.path().join("alias.go");
        assert!(fs::symlink_metadata(&alias).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&alias).unwrap(), Path::new("pkg/inner/lib.go"));
        // Dangling links are copied as links, never followed.
        assert_eq!(
            fs::read_link(dest.path().join("pkg/dangling")).unwrap(),
            Path::new("../missing")
        );
    }

    #[test]
    fn test_read_only_files_become_owner_writable() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let file = src.path().join("COPYING");
        fs::write(&file, "text").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();

        copy_directory(src.path(), dest.path()).unwrap();

        let mode = fs::metadata(dest.path().join("COPYING")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_executable_bit_is_preserved() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let script = src.path().join("gen.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        copy_directory(src.path(), dest.path()).unwrap();

        let mode = fs::metadata(dest.path().join("gen.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_second_copy_over_existing_tree_succeeds() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        source_tree(src.path());

        copy_directory(src.path(), dest.path()).unwrap();
        fs::write(src.path().join("LICENSE"), "changed").unwrap();
        copy_directory(src.path(), dest.path()).unwrap();

        assert_eq!(fs::read_to_string(dest.path().join("LICENSE")).unwrap(), "changed");
    }

    #[test]
    fn test_replicate_into_creates_nested_destination() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        source_tree(src.path());
        let dest = out.path().join("thirdparty/github.com/acme/lib");

        replicate_into(src.path(), &dest).unwrap();

        assert!(dest.join("pkg/inner/lib.go").is_file());
    }

    #[test]
    fn test_existing_file_link_is_replaced_not_written_through() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let victim = outside.path().join("victim");
        fs::write(&victim, "untouched").unwrap();
        symlink(&victim, dest.path().join("data")).unwrap();
        fs::write(src.path().join("data"), "from v2").unwrap();

        copy_directory(src.path(), dest.path()).unwrap();

        assert_eq!(fs::read_to_string(&victim).unwrap(), "untouched");
        let copied = dest.path().join("data");
        assert!(fs::symlink_metadata(&copied).unwrap().file_type().is_file());
        assert_eq!(fs::read_to_string(&copied).unwrap(), "from v2");
    }

    #[test]
    fn test_existing_dir_link_is_replaced_not_descended() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let outside = tempdir().unwrap();
        source_tree(src.path());
        symlink(outside.path(), dest.path().join("pkg")).unwrap();

        copy_directory(src.path(), dest.path()).unwrap();

        assert!(fs::read_dir(outside.path()).unwrap().next().is_none());
        assert!(fs::symlink_metadata(dest.path().join("pkg")).unwrap().is_dir());
        assert!(dest.path().join("pkg/inner/lib.go").is_file());
    }

    #[test]
    fn test_link_replaces_regular_file_from_earlier_copy() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        source_tree(src.path());
        fs::write(dest.path().join("alias.go"), "stale").unwrap();

        copy_directory(src.path(), dest.path()).unwrap();

        assert_eq!(
            fs::read_link(dest.path().join("alias.go")).unwrap(),
            Path::new("pkg/inner/lib.go")
        );
    }

    #[test]
    fn test_replicate_into_does_not_follow_linked_destination() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let outside = tempdir().unwrap();
        source_tree(src.path());
        let dest = out.path().join("libY");
        symlink(outside.path(), &dest).unwrap();

        replicate_into(src.path(), &dest).unwrap();

        assert!(fs::read_dir(outside.path()).unwrap().next().is_none());
        assert!(dest.join("LICENSE").is_file());
    }

    #[test]
    fn test_missing_source_aborts() {
        let out = tempdir().unwrap();
        let err = copy_directory(&out.path().join("nope"), out.path()).unwrap_err();
        assert_eq!(err.op, "read_dir");
    }
}
