//! # 项目与应用 Tauri Commands
//!
//! - `export_project_to_zip` / `import_project_from_zip` - 项目归档导出导入
//! - `get_last_project_path` - 最近一次打开的项目
//! - `get_app_info` - 「关于」对话框信息
//! - `get_app_language` / `set_app_language` / `list_languages` - 界面语言
//!
//! 保存/打开对话框由前端通过 `tauri-plugin-dialog` 弹出，这里只接收选好的路径。

use std::path::Path;

use tauri::{AppHandle, State};

use crate::commands::AppState;
use crate::models::app::{AppInfo, LanguageOption};
use crate::services::archive::{self, ArchiveSummary};
use crate::services::locale;

/// 将项目目录导出为 ZIP 文件
///
/// # 错误
/// 项目目录不存在或写入失败时返回错误
#[tauri::command]
pub async fn export_project_to_zip(
    project_path: String,
    export_path: String,
) -> Result<ArchiveSummary, String> {
    archive::export_project(Path::new(&project_path), Path::new(&export_path)).await
}

/// 将 ZIP 文件解压到目标目录（覆盖同名文件）
#[tauri::command]
pub async fn import_project_from_zip(
    zip_path: String,
    destination_path: String,
) -> Result<ArchiveSummary, String> {
    archive::import_project(Path::new(&zip_path), Path::new(&destination_path)).await
}

#[tauri::command]
pub async fn get_last_project_path(state: State<'_, AppState>) -> Result<Option<String>, String> {
    Ok(state.store.last_project_path())
}

/// 应用名称、版本和运行平台
#[tauri::command]
pub async fn get_app_info(app: AppHandle) -> Result<AppInfo, String> {
    let package = app.package_info();
    Ok(AppInfo {
        name: package.name.clone(),
        version: package.version.to_string(),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    })
}

/// 当前界面语言（未设置时为默认语言）
#[tauri::command]
pub async fn get_app_language(state: State<'_, AppState>) -> Result<String, String> {
    Ok(locale::current(&state.store))
}

/// 切换界面语言
///
/// # 错误
/// 语言代码不受支持时返回错误
#[tauri::command]
pub async fn set_app_language(state: State<'_, AppState>, code: String) -> Result<(), String> {
    locale::set(&state.store, &code).await
}

#[tauri::command]
pub async fn list_languages() -> Result<Vec<LanguageOption>, String> {
    Ok(locale::SUPPORTED.to_vec())
}
