//! # 文件树服务（File Tree Provider）
//!
//! 提供文件浏览器所需的文件系统操作：
//! - `list` - 单层读取目录（展开目录时按需调用）
//! - `list_recursive` - 递归读取整个目录树（刷新整个项目时使用）
//! - `read_file` / `save_file` - 编辑器读取和保存文件内容
//! - `create_file` / `rename_entry` / `delete_entry` - 新建、重命名、删除
//!
//! ## 错误处理
//! - `read_file` / `save_file` 在服务内记录日志，并以 `None` / `false` 告知调用方
//! - 列表、新建、重命名、删除直接把错误返回给调用方，由界面层提示用户
//!
//! ## 排序规则
//! 同一层级内目录在前、文件在后，各自按名称不区分大小写升序排列。
//!
//! ## 符号链接
//! 条目类型取自目录项本身，不跟随符号链接。链接一律作为文件节点出现，
//! 删除链接只删除链接本身。

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::models::file_tree::{FileNode, NodeType};
use crate::utils::path;

/// 单层读取目录
///
/// 目录节点的 `children` 为空数组，表示「尚未加载」。
///
/// # 参数
/// - `dir` - 要读取的目录路径
///
/// # 错误
/// 目录不存在、不可读或不是目录时返回错误
pub async fn list(dir: &Path) -> Result<Vec<FileNode>, String> {
    let mut entries = read_entries(dir).await?;
    sort_nodes(&mut entries);
    Ok(entries)
}

/// 递归读取整个目录树
///
/// 每个子目录的读取并行执行，结果按与 `list` 相同的规则排序。
/// 返回装箱的 future 以支持递归调用。
pub fn list_recursive(dir: &Path) -> BoxFuture<'static, Result<Vec<FileNode>, String>> {
    let dir = dir.to_path_buf();
    async move {
        let entries = read_entries(&dir).await?;

        let expanded = future::join_all(entries.into_iter().map(|mut node| async move {
            if node.is_dir() {
                let children = list_recursive(Path::new(&node.path)).await?;
                node.children = Some(children);
            }
            Ok::<FileNode, String>(node)
        }))
        .await;

        let mut nodes = expanded.into_iter().collect::<Result<Vec<_>, _>>()?;
        sort_nodes(&mut nodes);
        Ok(nodes)
    }
    .boxed()
}

/// 读取文件文本内容
///
/// # 返回值
/// 成功返回文件内容；读取失败（不存在、权限不足、非 UTF-8）时记录日志并返回 `None`
pub async fn read_file(file_path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(file_path).await {
        Ok(content) => Some(content),
        Err(e) => {
            log::error!("读取文件失败 {}: {}", file_path.display(), e);
            None
        }
    }
}

/// 保存文件内容（覆盖写入）
///
/// # 返回值
/// 写入成功返回 `true`；失败时记录日志并返回 `false`
pub async fn save_file(file_path: &Path, content: &str) -> bool {
    match tokio::fs::write(file_path, content).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("保存文件失败 {}: {}", file_path.display(), e);
            false
        }
    }
}

/// 在指定目录下新建空文件
///
/// # 参数
/// - `dir` - 父目录
/// - `name` - 新文件名（单个路径段）
///
/// # 返回值
/// 新文件的完整路径
///
/// # 错误
/// 文件名不合法、目标已存在或创建失败时返回错误
pub async fn create_file(dir: &Path, name: &str) -> Result<PathBuf, String> {
    let name = path::validate_entry_name(name)?;
    let file_path = dir.join(name);

    if file_path.exists() {
        return Err(format!("目标已存在: {}", file_path.display()));
    }

    tokio::fs::write(&file_path, "")
        .await
        .map_err(|e| format!("创建文件失败: {}", e))?;

    log::info!("已创建文件 {}", file_path.display());
    Ok(file_path)
}

/// 重命名文件或目录（保持在同一父目录下）
///
/// # 参数
/// - `old_path` - 原路径
/// - `new_name` - 新名称（单个路径段）
///
/// # 返回值
/// 重命名后的完整路径；新旧名称相同时直接返回原路径
///
/// # 错误
/// 名称不合法、目标已存在或重命名失败时返回错误
pub async fn rename_entry(old_path: &Path, new_name: &str) -> Result<PathBuf, String> {
    let new_name = path::validate_entry_name(new_name)?;
    let parent = old_path
        .parent()
        .ok_or_else(|| format!("路径没有父目录: {}", old_path.display()))?;
    let new_path = parent.join(new_name);

    if new_path == old_path {
        return Ok(new_path);
    }
    if new_path.exists() {
        return Err(format!("目标已存在: {}", new_path.display()));
    }

    tokio::fs::rename(old_path, &new_path)
        .await
        .map_err(|e| format!("重命名失败: {}", e))?;

    log::info!("已重命名 {} -> {}", old_path.display(), new_path.display());
    Ok(new_path)
}

/// 删除文件或目录（目录递归删除）
///
/// # 错误
/// 路径不存在或删除失败时返回错误
pub async fn delete_entry(target: &Path) -> Result<(), String> {
    let metadata = tokio::fs::symlink_metadata(target)
        .await
        .map_err(|e| format!("读取路径信息失败: {}", e))?;

    if metadata.is_dir() {
        tokio::fs::remove_dir_all(target)
            .await
            .map_err(|e| format!("删除目录失败: {}", e))?;
    } else {
        tokio::fs::remove_file(target)
            .await
            .map_err(|e| format!("删除文件失败: {}", e))?;
    }

    log::info!("已删除 {}", target.display());
    Ok(())
}

/// 读取目录下的直接条目（未排序）
async fn read_entries(dir: &Path) -> Result<Vec<FileNode>, String> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| format!("读取目录失败 {}: {}", dir.display(), e))?;

    let mut nodes = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| format!("遍历目录条目失败: {}", e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| format!("获取条目文件类型失败: {}", e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        let entry_path = entry.path().to_string_lossy().to_string();

        // `file_type` 不跟随符号链接：指向目录的链接按文件列出，递归不会进入链接成环
        nodes.push(if file_type.is_dir() {
            FileNode {
                name,
                path: entry_path,
                node_type: NodeType::Directory,
                extension: None,
                children: Some(Vec::new()),
            }
        } else {
            FileNode {
                extension: path::file_extension(&name),
                name,
                path: entry_path,
                node_type: NodeType::File,
                children: None,
            }
        });
    }

    Ok(nodes)
}

/// 目录在前，同类按名称不区分大小写排序
fn sort_nodes(nodes: &mut [FileNode]) {
    nodes.sort_by(|a, b| match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    });
}
