//! 原子写入
//!
//! 所有落盘操作都先写入同目录下的临时文件，`sync_all` 后再 `rename` 覆盖目标，
//! 写入中途失败不会留下被截断的目标文件。

use crate::data::{DataError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// 目标文件的权限策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePermissions {
    /// 仅当前用户可读写（Unix 0o600），用于保存凭据的文件
    Private,
    /// 沿用已有文件的权限（新文件使用系统默认），用于 shell 启动文件
    Inherit,
}

/// 原子地写入整个文件，自动创建父目录
///
/// 目标是符号链接时写入链接指向的文件，链接本身保持不变。
pub fn write_atomic(path: &Path, contents: &[u8], permissions: FilePermissions) -> Result<()> {
    let resolved = resolve_symlink(path);
    let path = resolved.as_path();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
        }
    }

    let tmp_path = temp_sibling(path);
    let result = write_and_replace(path, &tmp_path, contents, permissions);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_and_replace(
    path: &Path,
    tmp_path: &Path,
    contents: &[u8],
    permissions: FilePermissions,
) -> Result<()> {
    let mut file = File::create(tmp_path).map_err(|e| DataError::io(tmp_path, e))?;
    file.write_all(contents)
        .map_err(|e| DataError::io(tmp_path, e))?;
    file.sync_all().map_err(|e| DataError::io(tmp_path, e))?;
    drop(file);

    match permissions {
        FilePermissions::Private => set_private(tmp_path)?,
        FilePermissions::Inherit => {
            if let Ok(metadata) = fs::metadata(path) {
                fs::set_permissions(tmp_path, metadata.permissions())
                    .map_err(|e| DataError::io(tmp_path, e))?;
            }
        }
    }

    fs::rename(tmp_path, path).map_err(|e| DataError::io(path, e))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "文件已原子写入");
    Ok(())
}

fn resolve_symlink(path: &Path) -> PathBuf {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => match fs::canonicalize(path) {
            Ok(real) => real,
            // 悬空链接：按链接内容定位（相对路径以链接所在目录为基准）
            Err(_) => match (fs::read_link(path), path.parent()) {
                (Ok(target), Some(parent)) => parent.join(target),
                (Ok(target), None) => target,
                (Err(_), _) => path.to_path_buf(),
            },
        },
        _ => path.to_path_buf(),
    }
}

/// 临时文件与目标文件同目录，保证 rename 不跨文件系统
fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "provider-switch".to_string());
    path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()))
}

#[cfg(unix)]
fn set_private(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = fs::metadata(path).map_err(|e| DataError::io(path, e))?;
    let mut perms = metadata.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms).map_err(|e| DataError::io(path, e))
}

#[cfg(not(unix))]
fn set_private(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("file.json");

        write_atomic(&path, b"{}", FilePermissions::Private).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_overwrite_replaces_whole_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.txt");

        write_atomic(&path, b"a much longer first version", FilePermissions::Inherit).unwrap();
        write_atomic(&path, b"short", FilePermissions::Inherit).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.txt");

        write_atomic(&path, b"data", FilePermissions::Private).unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_write_keeps_original() {
        let temp_dir = TempDir::new().unwrap();
        // 目标是一个目录，rename 必然失败
        let path = temp_dir.path().join("occupied");
        fs::create_dir_all(path.join("child")).unwrap();

        let result = write_atomic(&path, b"data", FilePermissions::Private);

        assert!(result.is_err());
        assert!(path.join("child").exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn test_private_permissions_unix() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        write_atomic(&path, b"{}", FilePermissions::Private).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinked_target_is_written_through() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("dotfiles").join("bashrc");
        fs::create_dir_all(real.parent().unwrap()).unwrap();
        fs::write(&real, "alias a=b\n").unwrap();
        let link = temp_dir.path().join(".bashrc");
        symlink(&real, &link).unwrap();

        write_atomic(&link, b"alias a=c\n", FilePermissions::Inherit).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "alias a=c\n");
        assert_eq!(fs::read_to_string(&link).unwrap(), "alias a=c\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_dangling_symlink_creates_target() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let link = temp_dir.path().join(".zshrc");
        symlink("dotfiles/zshrc", &link).unwrap();

        write_atomic(&link, b"x\n", FilePermissions::Inherit).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("dotfiles").join("zshrc")).unwrap(),
            "x\n"
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_inherit_keeps_existing_mode_unix() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".bashrc");
        fs::write(&path, "alias ll='ls -l'\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_atomic(&path, b"alias ll='ls -la'\n", FilePermissions::Inherit).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
