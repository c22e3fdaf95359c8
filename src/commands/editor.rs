//! # 编辑器会话 Tauri Commands
//!
//! 标签页和编辑器缓冲区的所有结构性操作都在会话锁内完成，
//! 完成后推送 `session-changed` 事件并返回同一份快照。

use tauri::{AppHandle, State};

use crate::commands::{AppState, publish_session};
use crate::models::session::{EditorView, OpenFile, SessionSnapshot};
use crate::services::editor_session::EditorCommand;

/// 执行一个会话操作，推送并返回新的快照
async fn apply(
    app: &AppHandle,
    state: &AppState,
    command: EditorCommand,
) -> Result<SessionSnapshot, String> {
    let mut editor = state.editor.lock().await;
    let snapshot = editor.dispatch(command).await?;
    publish_session(app, &snapshot);
    Ok(snapshot)
}

/// 通用入口：前端直接发送 `EditorCommand`
#[tauri::command]
pub async fn editor_dispatch(
    app: AppHandle,
    state: State<'_, AppState>,
    command: EditorCommand,
) -> Result<SessionSnapshot, String> {
    apply(&app, &state, command).await
}

/// 打开文件（已打开时只切换到该标签页）
///
/// # 参数
/// - `file` - 文件浏览器中的文件节点
/// - `activate` - 是否激活，缺省为 `true`
///
/// # 错误
/// 文件无法读取时返回错误
#[tauri::command]
pub async fn open_file(
    app: AppHandle,
    state: State<'_, AppState>,
    file: OpenFile,
    activate: Option<bool>,
) -> Result<SessionSnapshot, String> {
    let activate = activate.unwrap_or(true);
    apply(&app, &state, EditorCommand::Open { file, activate }).await
}

#[tauri::command]
pub async fn set_active_file(
    app: AppHandle,
    state: State<'_, AppState>,
    index: usize,
) -> Result<SessionSnapshot, String> {
    apply(&app, &state, EditorCommand::SetActive { index }).await
}

#[tauri::command]
pub async fn close_tab(
    app: AppHandle,
    state: State<'_, AppState>,
    index: usize,
) -> Result<SessionSnapshot, String> {
    apply(&app, &state, EditorCommand::Close { index }).await
}

/// 设置当前项目（同时记录为最近项目）
#[tauri::command]
pub async fn set_project(
    app: AppHandle,
    state: State<'_, AppState>,
    project_path: String,
) -> Result<SessionSnapshot, String> {
    apply(&app, &state, EditorCommand::SetProject { path: project_path }).await
}

/// 应用启动时恢复上次的会话
#[tauri::command]
pub async fn restore_session(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<SessionSnapshot, String> {
    apply(&app, &state, EditorCommand::Restore).await
}

#[tauri::command]
pub async fn get_session_snapshot(state: State<'_, AppState>) -> Result<SessionSnapshot, String> {
    Ok(state.editor.lock().await.snapshot())
}

/// 编辑器内容变更（不推送事件）
#[tauri::command]
pub async fn update_buffer(
    state: State<'_, AppState>,
    file_path: String,
    content: String,
) -> Result<(), String> {
    state.editor.lock().await.update_content(&file_path, content)
}

/// 保存激活文件（Ctrl+S / 保存按钮）
#[tauri::command]
pub async fn save_active_file(state: State<'_, AppState>) -> Result<(), String> {
    state.editor.lock().await.save_active().await
}

/// 保存指定路径的缓冲区
#[tauri::command]
pub async fn save_buffer(state: State<'_, AppState>, file_path: String) -> Result<(), String> {
    state.editor.lock().await.save(&file_path).await
}

/// 读取指定路径的编辑器缓冲区，缺省为激活文件
#[tauri::command]
pub async fn get_editor_view(
    state: State<'_, AppState>,
    file_path: Option<String>,
) -> Result<Option<EditorView>, String> {
    let editor = state.editor.lock().await;
    Ok(match file_path {
        Some(path) => editor.editor_view(&path),
        None => editor.active_view(),
    })
}
