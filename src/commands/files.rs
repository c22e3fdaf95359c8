//! # 文件 Tauri Commands
//!
//! 文件浏览器和编辑器使用的文件系统接口：
//! - `read_directory` / `read_directory_recursive` - 读取目录（单层 / 递归）
//! - `read_file` / `save_file` - 读取和保存文件内容
//! - `create_file` - 新建文件，完成后推送 `file-created` 事件
//! - `rename_file` - 重命名，同时更新已打开的标签页，完成后推送 `file-renamed` 事件
//! - `delete_file` - 删除，完成后推送 `file-deleted` 事件
//!
//! `file-created` / `file-renamed` / `file-deleted` 事件携带最近项目（`lastProjectPath`）的完整递归文件树，
//! 前端收到后直接重绘文件浏览器。

use std::path::Path;

use tauri::{AppHandle, Emitter, State};

use crate::commands::{AppState, publish_session};
use crate::models::file_tree::FileNode;
use crate::services::file_tree;
use crate::services::store::ProjectStore;

/// 单层读取目录
///
/// # 错误
/// 目录不存在或不可读时返回错误
#[tauri::command]
pub async fn read_directory(dir_path: String) -> Result<Vec<FileNode>, String> {
    file_tree::list(Path::new(&dir_path)).await
}

/// 递归读取整个目录树
#[tauri::command]
pub async fn read_directory_recursive(dir_path: String) -> Result<Vec<FileNode>, String> {
    file_tree::list_recursive(Path::new(&dir_path)).await
}

/// 读取文件内容，读取失败时返回 `null`
#[tauri::command]
pub async fn read_file(file_path: String) -> Result<Option<String>, String> {
    Ok(file_tree::read_file(Path::new(&file_path)).await)
}

/// 直接把内容写入文件（不经过编辑器缓冲区）
///
/// # 返回值
/// 写入成功返回 `true`
#[tauri::command]
pub async fn save_file(file_path: String, content: String) -> Result<bool, String> {
    Ok(file_tree::save_file(Path::new(&file_path), &content).await)
}

/// 新建空文件
///
/// # 返回值
/// 新文件的完整路径
///
/// # 错误
/// 文件名不合法、目标已存在或创建失败时返回错误
#[tauri::command]
pub async fn create_file(
    app: AppHandle,
    state: State<'_, AppState>,
    dir_path: String,
    file_name: String,
) -> Result<String, String> {
    let created = file_tree::create_file(Path::new(&dir_path), &file_name).await?;
    emit_project_tree(&app, &state, "file-created").await;
    Ok(created.to_string_lossy().to_string())
}

/// 重命名文件或目录
///
/// 通过编辑器会话执行，已打开的标签页、缓冲区和激活路径随之更新。
///
/// # 返回值
/// 新的完整路径
#[tauri::command]
pub async fn rename_file(
    app: AppHandle,
    state: State<'_, AppState>,
    old_path: String,
    new_name: String,
) -> Result<String, String> {
    let new_path = {
        let mut editor = state.editor.lock().await;
        let new_path = editor.rename(&old_path, &new_name).await?;
        publish_session(&app, &editor.snapshot());
        new_path
    };
    emit_project_tree(&app, &state, "file-renamed").await;
    Ok(new_path)
}

/// 删除文件或目录
///
/// 已打开的对应标签页一并关闭。
#[tauri::command]
pub async fn delete_file(
    app: AppHandle,
    state: State<'_, AppState>,
    file_path: String,
) -> Result<bool, String> {
    {
        let mut editor = state.editor.lock().await;
        editor.delete(&file_path).await?;
        publish_session(&app, &editor.snapshot());
    }
    emit_project_tree(&app, &state, "file-deleted").await;
    Ok(true)
}

/// 推送最近项目的完整文件树
async fn emit_project_tree(app: &AppHandle, state: &AppState, event: &str) {
    let Some(tree) = project_tree(&state.store).await else {
        return;
    };
    if let Err(e) = app.emit(event, tree) {
        log::warn!("推送 {} 事件失败: {}", event, e);
    }
}

/// 最近项目的递归文件树；没有最近项目或读取失败时为 `None`
async fn project_tree(store: &ProjectStore) -> Option<Vec<FileNode>> {
    let project = store.last_project_path()?;
    match file_tree::list_recursive(Path::new(&project)).await {
        Ok(tree) => Some(tree),
        Err(e) => {
            log::warn!("刷新项目文件树失败: {}", e);
            None
        }
    }
}
