//! # Code Editor Shell - Tauri 应用核心初始化模块
//!
//! 本模块负责 Tauri 应用的完整初始化流程，包括：
//! - 注册 Tauri 官方插件（文件系统、对话框、Shell、Opener、日志）
//! - 创建应用全局状态（设置存储、编辑器会话、终端会话、AI 客户端）
//! - 注册自定义 Tauri commands
//! - 生成应用上下文并启动事件循环
//!
//! ## 架构说明
//! 通过将核心逻辑放在 `lib.rs` 而非 `main.rs` 中，
//! Tauri 可以在桌面端（`main.rs`）和移动端入口之间共享此初始化代码。
//!
//! Tauri 相关代码（`commands/` 和 `run()`）位于默认启用的 `desktop` feature 之后，
//! `services/` 中的业务逻辑不依赖 Tauri，可以在无界面环境下构建和测试。
//!
//! ## 模块结构
//! - `commands/` - Tauri command 处理函数（IPC 接口层）
//! - `models/` - 数据模型（对应前端 TypeScript 类型）
//! - `services/` - 核心业务逻辑（文件树、编辑器会话、终端、归档、AI）
//! - `utils/` - 通用工具函数

#[cfg(feature = "desktop")]
mod commands;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(feature = "desktop")]
use tauri::Manager;

#[cfg(feature = "desktop")]
use commands::AppState;

// 移动端（Android/iOS）编译时将 `run()` 标记为 Tauri 移动端入口点，
// 桌面端由 `main.rs` 直接调用。
#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
/// Tauri 应用启动函数
///
/// 1. 创建 `tauri::Builder` 默认实例并注册插件
/// 2. 注册所有自定义 Tauri commands
/// 3. 在 `setup` 钩子中创建 `AppState`（终端事件需要 `AppHandle`），
///    并按需注册调试专用的日志插件
/// 4. 生成应用上下文并启动主事件循环
///
/// # Panics
/// Tauri 应用启动失败（例如配置文件缺失或窗口创建失败）时 panic。
pub fn run() {
    tauri::Builder::default()
        // === 官方插件注册 ===
        .plugin(tauri_plugin_fs::init())
        // 对话框插件：打开项目、导入导出时的原生文件选择器
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_opener::init())
        // === 自定义 Tauri Commands 注册 ===
        .invoke_handler(tauri::generate_handler![
            // 文件树和文件读写
            commands::files::read_directory,
            commands::files::read_directory_recursive,
            commands::files::read_file,
            commands::files::save_file,
            commands::files::create_file,
            commands::files::rename_file,
            commands::files::delete_file,
            // 编辑器会话
            commands::editor::editor_dispatch,
            commands::editor::open_file,
            commands::editor::set_active_file,
            commands::editor::close_tab,
            commands::editor::set_project,
            commands::editor::restore_session,
            commands::editor::get_session_snapshot,
            commands::editor::update_buffer,
            commands::editor::save_active_file,
            commands::editor::save_buffer,
            commands::editor::get_editor_view,
            // 终端
            commands::terminal::start_terminal,
            commands::terminal::send_to_terminal,
            commands::terminal::send_command,
            commands::terminal::kill_terminal,
            commands::terminal::get_terminal_pid,
            commands::terminal::execute_command,
            commands::terminal::suggest_commands,
            // AI 代码辅助
            commands::ai::is_ai_available,
            commands::ai::analyze_code,
            commands::ai::generate_code,
            commands::ai::document_code,
            commands::ai::explain_code,
            // 项目和应用
            commands::project::export_project_to_zip,
            commands::project::import_project_from_zip,
            commands::project::get_last_project_path,
            commands::project::get_app_info,
            commands::project::get_app_language,
            commands::project::set_app_language,
            commands::project::list_languages,
        ])
        // `setup` 闭包：在应用窗口创建之前执行的初始化钩子
        .setup(|app| {
            // 仅在开发调试模式下启用日志插件
            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .build(),
                )?;
            }

            let state = AppState::new(app.handle().clone())?;
            app.manage(state);
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
