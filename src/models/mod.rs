//! # 数据模型模块
//!
//! 定义了与前端 TypeScript 类型一一对应的 Rust 数据结构，用于 Tauri IPC 传输和设置文件读写。
//! - `file_tree` - 文件树节点
//! - `session` - 打开文件、持久化会话状态和渲染快照
//! - `process` - 终端事件和一次性命令结果
//! - `ai` - AI 操作结果
//! - `app` - 应用信息、界面语言选项、命令提示

pub mod ai;
pub mod app;
pub mod file_tree;
pub mod process;
pub mod session;
