//! # AI 代码辅助 Tauri Commands
//!
//! 四种操作的结果统一为 `AiResponse`：成功时 `{ text, tokens }`，失败时 `{ error }`。
//! 失败不会以 command 错误的形式返回，前端只需检查 `error` 字段。

use tauri::State;

use crate::commands::AppState;
use crate::models::ai::AiResponse;

/// AI 服务是否已配置
#[tauri::command]
pub async fn is_ai_available(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(state.ai.is_available())
}

/// 分析代码（语言由文件扩展名确定）
#[tauri::command]
pub async fn analyze_code(
    state: State<'_, AppState>,
    file_path: String,
    code: String,
) -> Result<AiResponse, String> {
    Ok(state.ai.analyze(&file_path, &code).await)
}

/// 根据描述生成代码，`language` 缺省为 `php`
#[tauri::command]
pub async fn generate_code(
    state: State<'_, AppState>,
    description: String,
    language: Option<String>,
) -> Result<AiResponse, String> {
    Ok(state.ai.generate(&description, language.as_deref()).await)
}

#[tauri::command]
pub async fn document_code(
    state: State<'_, AppState>,
    code: String,
    language: Option<String>,
) -> Result<AiResponse, String> {
    Ok(state.ai.document(&code, language.as_deref()).await)
}

#[tauri::command]
pub async fn explain_code(
    state: State<'_, AppState>,
    code: String,
    language: Option<String>,
) -> Result<AiResponse, String> {
    Ok(state.ai.explain(&code, language.as_deref()).await)
}
