//! # 终端 Tauri Commands
//!
//! 持久终端会话的启动、输入、终止，一次性命令执行，以及命令补全提示。
//!
//! 终端输出不通过 command 返回值传递，而是由 `TauriSink` 以事件形式推送，
//! 负载是带 `kind` 标签的 `TerminalEvent`：
//! - `terminal-output` - `{ kind: "output", stream, data }`
//! - `terminal-exit` - `{ kind: "exit", code }`
//! - `terminal-restarting` - `{ kind: "restarting", attempt, delayMs }`
//! - `terminal-gave-up` - `{ kind: "gaveUp", attempts }`

use std::path::Path;

use tauri::{AppHandle, Emitter, State};

use crate::commands::AppState;
use crate::models::app::CommandHint;
use crate::models::process::{CommandOutput, TerminalEvent};
use crate::services::command_hints;
use crate::services::process_session::{self, TerminalSink};

/// 把终端事件转发为 Tauri 事件
pub struct TauriSink {
    app: AppHandle,
}

impl TauriSink {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl TerminalSink for TauriSink {
    fn emit(&self, event: TerminalEvent) {
        if let Err(e) = self.app.emit(event.event_name(), &event) {
            log::warn!("推送终端事件失败: {}", e);
        }
    }
}

/// 启动（或重启）持久终端
///
/// # 参数
/// - `working_dir` - 工作目录，缺省时使用用户主目录
///
/// # 返回值
/// 启动成功返回 `true`
#[tauri::command]
pub async fn start_terminal(
    state: State<'_, AppState>,
    working_dir: Option<String>,
) -> Result<bool, String> {
    Ok(state.terminal.start(working_dir.as_deref().map(Path::new)).await)
}

/// 向终端写入原始输入（按键数据）
#[tauri::command]
pub async fn send_to_terminal(state: State<'_, AppState>, data: String) -> Result<bool, String> {
    Ok(state.terminal.send(&data).await)
}

/// 向终端发送一行命令
#[tauri::command]
pub async fn send_command(state: State<'_, AppState>, command: String) -> Result<bool, String> {
    Ok(state.terminal.send_line(&command).await)
}

/// 终止终端（不会自动重启）
#[tauri::command]
pub async fn kill_terminal(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(state.terminal.kill().await)
}

/// 查询终端子进程 PID，没有存活进程时为 `null`
#[tauri::command]
pub async fn get_terminal_pid(state: State<'_, AppState>) -> Result<Option<u32>, String> {
    Ok(state.terminal.pid())
}

/// 执行一次性命令，等待结束后返回退出码和完整输出
///
/// # 错误
/// 进程无法启动时返回错误
#[tauri::command]
pub async fn execute_command(
    command: String,
    working_dir: Option<String>,
) -> Result<CommandOutput, String> {
    process_session::run_once(&command, working_dir.as_deref().map(Path::new)).await
}

/// 终端命令补全建议（最多 5 条）
#[tauri::command]
pub async fn suggest_commands(input: String) -> Result<Vec<CommandHint>, String> {
    Ok(command_hints::suggest(&input))
}
