//! # 业务逻辑服务模块
//!
//! 包含核心业务逻辑的实现，与 Tauri command 层解耦，可在无界面环境下测试：
//! - `language` - 扩展名 → 语言映射表（编辑器语言模式和 AI 提示词共用）
//! - `store` - 键值设置存储（会话状态、最近项目、界面语言）
//! - `file_tree` - 文件树读取和文件增删改
//! - `editor_session` - 编辑器会话管理器：标签页、激活文件、缓冲区、持久化
//! - `process_session` - 持久终端 shell 和一次性命令执行
//! - `archive` - 项目 ZIP 导出/导入
//! - `ai_client` - Chat Completions 代码辅助客户端
//! - `locale` - 界面语言选择
//! - `command_hints` - 终端命令补全提示

pub mod ai_client;
pub mod archive;
pub mod command_hints;
pub mod editor_session;
pub mod file_tree;
pub mod language;
pub mod locale;
pub mod process_session;
pub mod store;
