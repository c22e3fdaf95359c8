//! # 项目归档服务（Archive Bridge）
//!
//! 将整个项目目录导出为单个 ZIP 文件，以及把 ZIP 文件解压到目标目录。
//!
//! ## 导出
//! 递归遍历项目目录，每个文件以「相对项目根目录」的路径（统一 `/` 分隔）
//! 写入归档，使用 deflate 压缩。空目录同样作为目录条目写入。
//! 指向目录的符号链接不展开，避免链接成环时无限递归。
//!
//! ## 导入
//! 解压全部条目到目标目录，已存在的同名文件直接覆盖。
//! 条目名试图逃逸目标目录（绝对路径、`..`）时跳过该条目。
//! 中途失败不会回滚，目标目录可能处于部分写入状态。
//!
//! 两个方向都是同步的阻塞 I/O，对外的 async 入口通过 `spawn_blocking` 执行。

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::utils::path::archive_entry_name;

/// 归档统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSummary {
    /// 写入或解压的文件数量
    pub files: usize,
    /// 跳过的条目数量（仅导入时可能非零）
    pub skipped: usize,
}

/// 将项目目录导出为 ZIP 文件
///
/// # 参数
/// - `project_path` - 项目根目录
/// - `target_file` - 输出的 ZIP 文件路径（已存在时覆盖）
///
/// # 错误
/// 项目目录不可读、目标文件无法创建或压缩失败时返回错误
pub async fn export_project(project_path: &Path, target_file: &Path) -> Result<ArchiveSummary, String> {
    let project_path = project_path.to_path_buf();
    let target_file = target_file.to_path_buf();
    tokio::task::spawn_blocking(move || export_blocking(&project_path, &target_file))
        .await
        .map_err(|e| format!("导出任务异常终止: {}", e))?
}

/// 将 ZIP 文件解压到目标目录
///
/// # 参数
/// - `archive_file` - ZIP 文件路径
/// - `destination` - 解压目标目录（不存在时自动创建）
///
/// # 错误
/// 归档无法打开或解析、写入失败时返回错误
pub async fn import_project(archive_file: &Path, destination: &Path) -> Result<ArchiveSummary, String> {
    let archive_file = archive_file.to_path_buf();
    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || import_blocking(&archive_file, &destination))
        .await
        .map_err(|e| format!("导入任务异常终止: {}", e))?
}

fn export_blocking(project_path: &Path, target_file: &Path) -> Result<ArchiveSummary, String> {
    if !project_path.is_dir() {
        return Err(format!("项目目录不存在: {}", project_path.display()));
    }

    let file = File::create(target_file).map_err(|e| format!("创建归档文件失败: {}", e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut summary = ArchiveSummary { files: 0, skipped: 0 };
    // 导出文件位于项目目录内部时跳过自身，避免把正在写入的归档再写进去
    let skip = target_file.canonicalize().ok();
    add_directory(&mut writer, project_path, project_path, options, skip.as_deref(), &mut summary)?;

    writer
        .finish()
        .map_err(|e| format!("写入归档文件失败: {}", e))?;

    log::info!(
        "已导出项目 {} -> {}（{} 个文件）",
        project_path.display(),
        target_file.display(),
        summary.files
    );
    Ok(summary)
}

/// 递归把目录内容写入归档
fn add_directory(
    writer: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: SimpleFileOptions,
    skip: Option<&Path>,
    summary: &mut ArchiveSummary,
) -> Result<(), String> {
    let mut entries: Vec<(PathBuf, std::fs::FileType)> = std::fs::read_dir(dir)
        .map_err(|e| format!("读取目录失败 {}: {}", dir.display(), e))?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            Some((entry.path(), entry.file_type().ok()?))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (entry_path, file_type) in entries {
        let Some(name) = archive_entry_name(root, &entry_path) else {
            continue;
        };

        // 指向目录的符号链接不展开，指向文件的链接按目标内容写入
        if file_type.is_symlink() && !entry_path.is_file() {
            log::debug!("跳过符号链接 {}", entry_path.display());
            continue;
        }

        if file_type.is_dir() {
            writer
                .add_directory(format!("{}/", name), options)
                .map_err(|e| format!("写入目录条目失败 {}: {}", name, e))?;
            add_directory(writer, root, &entry_path, options, skip, summary)?;
        } else {
            if skip.is_some() && entry_path.canonicalize().ok().as_deref() == skip {
                continue;
            }
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| format!("写入文件条目失败 {}: {}", name, e))?;
            let mut source =
                File::open(&entry_path).map_err(|e| format!("读取文件失败 {}: {}", name, e))?;
            io::copy(&mut source, writer).map_err(|e| format!("压缩文件失败 {}: {}", name, e))?;
            summary.files += 1;
        }
    }

    Ok(())
}

fn import_blocking(archive_file: &Path, destination: &Path) -> Result<ArchiveSummary, String> {
    let file = File::open(archive_file).map_err(|e| format!("打开归档文件失败: {}", e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| format!("解析归档文件失败: {}", e))?;

    std::fs::create_dir_all(destination).map_err(|e| format!("创建目标目录失败: {}", e))?;

    let mut summary = ArchiveSummary { files: 0, skipped: 0 };
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| format!("读取归档条目失败: {}", e))?;

        let Some(relative) = entry.enclosed_name() else {
            log::warn!("跳过不安全的归档条目: {}", entry.name());
            summary.skipped += 1;
            continue;
        };
        let out_path = destination.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| format!("创建目录失败 {}: {}", out_path.display(), e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("创建目录失败 {}: {}", parent.display(), e))?;
        }
        let mut out =
            File::create(&out_path).map_err(|e| format!("写入文件失败 {}: {}", out_path.display(), e))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| format!("解压文件失败 {}: {}", out_path.display(), e))?;
        summary.files += 1;
    }

    log::info!(
        "已导入归档 {} -> {}（{} 个文件）",
        archive_file.display(),
        destination.display(),
        summary.files
    );
    Ok(summary)
}
