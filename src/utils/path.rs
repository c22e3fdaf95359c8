//! # 路径工具函数
//!
//! 提供与文件路径相关的工具函数，包括：
//! - 获取应用配置目录（设置存储所在位置）
//! - 获取终端和一次性命令的默认工作目录（用户主目录）
//! - 文件名合法性校验（新建/重命名时使用）
//! - 将文件路径转换为归档内的相对条目名

use std::path::{Component, Path, PathBuf};

/// 应用配置子目录名称
const APP_DIR_NAME: &str = "code-editor-shell";

/// 设置文件名称
const SETTINGS_FILE_NAME: &str = "config.json";

/// 获取应用配置目录的绝对路径
///
/// 使用 `dirs` crate 获取跨平台的配置目录：
/// - Windows: `C:\Users\username\AppData\Roaming\code-editor-shell`
/// - macOS: `~/Library/Application Support/code-editor-shell`
/// - Linux: `~/.config/code-editor-shell`
///
/// # 错误
/// 无法确定配置目录时返回错误信息
pub fn get_app_config_dir() -> Result<PathBuf, String> {
    let base = dirs::config_dir().ok_or_else(|| "无法获取系统配置目录".to_string())?;
    Ok(base.join(APP_DIR_NAME))
}

/// 获取设置文件（键值存储）的绝对路径
pub fn get_settings_file_path() -> Result<PathBuf, String> {
    Ok(get_app_config_dir()?.join(SETTINGS_FILE_NAME))
}

/// 获取子进程的默认工作目录
///
/// 优先使用用户主目录；极端情况下（无 HOME 环境变量）退回当前进程目录。
pub fn default_working_dir() -> PathBuf {
    dirs::home_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 校验单段文件名
///
/// 新建文件和重命名时，名称只能是一个路径段：
/// - 去除首尾空白后不能为空
/// - 不能是 `.` 或 `..`
/// - 不能包含 `/` 或 `\`
///
/// # 返回值
/// 去除首尾空白后的名称
pub fn validate_entry_name(name: &str) -> Result<&str, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("文件名不能为空".to_string());
    }
    if trimmed == "." || trimmed == ".." {
        return Err(format!("文件名不合法: {}", trimmed));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(format!("文件名不能包含路径分隔符: {}", trimmed));
    }
    Ok(trimmed)
}

/// 提取文件扩展名（不含点号，保持原始大小写）
///
/// 没有扩展名的文件（如 `Makefile`）返回 `None`。
pub fn file_extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
}

/// 将文件路径转换为归档内的条目名
///
/// 条目名相对于项目根目录，统一使用 `/` 作为分隔符，
/// 保证在不同平台上导出的压缩包结构一致。
///
/// # 参数
/// - `root` - 项目根目录
/// - `path` - 根目录下的文件路径
///
/// # 返回值
/// 相对条目名；`path` 不在 `root` 下时返回 `None`
pub fn archive_entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entry_name_trims() {
        assert_eq!(validate_entry_name("  index.php ").unwrap(), "index.php");
    }

    #[test]
    fn test_validate_entry_name_rejects_separators_and_dots() {
        assert!(validate_entry_name("").is_err());
        assert!(validate_entry_name("   ").is_err());
        assert!(validate_entry_name("..").is_err());
        assert!(validate_entry_name("a/b.php").is_err());
        assert!(validate_entry_name(r"a\b.php").is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("app.JS").as_deref(), Some("JS"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("Makefile"), None);
    }

    #[test]
    fn test_archive_entry_name_uses_forward_slashes() {
        let root = Path::new("project");
        let file = root.join("src").join("lib").join("app.php");
        assert_eq!(
            archive_entry_name(root, &file).as_deref(),
            Some("src/lib/app.php")
        );
    }

    #[test]
    fn test_archive_entry_name_outside_root() {
        let root = Path::new("project");
        assert_eq!(archive_entry_name(root, Path::new("other/a.txt")), None);
        assert_eq!(archive_entry_name(root, root), None);
    }
}
