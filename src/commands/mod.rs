//! # Tauri Command 处理模块
//!
//! 本模块包含所有注册到 Tauri 的 command 处理函数，以及它们共享的应用状态。
//! 每个子模块对应一个功能域：
//! - `files` - 文件树读取、文件读写、新建/重命名/删除
//! - `editor` - 编辑器会话（标签页、激活文件、缓冲区、会话恢复）
//! - `terminal` - 持久终端、一次性命令、命令提示
//! - `ai` - AI 代码辅助
//! - `project` - 项目导入导出、应用信息、界面语言

pub mod ai;
pub mod editor;
pub mod files;
pub mod project;
pub mod terminal;

use std::sync::Arc;

use tauri::{AppHandle, Emitter};

use crate::models::session::SessionSnapshot;
use crate::services::ai_client::AiClient;
use crate::services::editor_session::EditorSessionManager;
use crate::services::process_session::ProcessSession;
use crate::services::store::ProjectStore;

/// 会话变更事件
pub const EVENT_SESSION_CHANGED: &str = "session-changed";

/// 应用全局状态
///
/// 在 `setup` 钩子中创建并注册为 Tauri managed state，
/// command 函数通过 `State<'_, AppState>` 参数注入访问。
pub struct AppState {
    pub store: Arc<ProjectStore>,
    /// 编辑器会话：每个 command 在持锁期间完成整个变更
    pub editor: tokio::sync::Mutex<EditorSessionManager>,
    pub terminal: ProcessSession,
    pub ai: AiClient,
}

impl AppState {
    /// 创建应用状态
    ///
    /// 设置存储从默认位置加载，AI 配置从环境变量读取，
    /// 终端事件通过 `app` 推送到前端。
    ///
    /// # 错误
    /// 无法确定配置目录时返回错误
    pub fn new(app: AppHandle) -> Result<Self, String> {
        let store = Arc::new(ProjectStore::open_default()?);
        let ai = AiClient::from_env();
        let editor = EditorSessionManager::new(store.clone(), ai.is_available());
        let terminal = ProcessSession::new(Arc::new(terminal::TauriSink::new(app)));

        log::info!("设置文件: {}", store.file_path().display());
        Ok(Self {
            store,
            editor: tokio::sync::Mutex::new(editor),
            terminal,
            ai,
        })
    }
}

/// 推送会话快照，前端据此重绘标签栏和依赖激活文件的按钮
pub(crate) fn publish_session(app: &AppHandle, snapshot: &SessionSnapshot) {
    if let Err(e) = app.emit(EVENT_SESSION_CHANGED, snapshot) {
        log::warn!("推送会话变更事件失败: {}", e);
    }
}
