//! # 编辑器会话数据模型
//!
//! 定义了打开文件记录（OpenFile）、持久化会话状态（SessionState）
//! 和渲染快照（SessionSnapshot）。
//!
//! - `SessionState` 是写入设置存储 `sessionState` 键的持久化形态
//! - `SessionSnapshot` 是每次会话变更后推送给前端的只读渲染数据

use serde::{Deserialize, Serialize};

use crate::models::file_tree::NodeType;

/// 一个已打开的文件（一个编辑器标签页）
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface OpenFile {
///   path: string;
///   name: string;
///   type: 'file';
///   extension?: string;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFile {
    /// 文件的完整路径，同时作为编辑器实例缓存的 key
    pub path: String,

    /// 标签页上显示的文件名
    pub name: String,

    /// 节点类型，打开的条目总是文件
    #[serde(rename = "type", default = "default_file_type")]
    pub node_type: NodeType,

    /// 文件扩展名（不含点号）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

fn default_file_type() -> NodeType {
    NodeType::File
}

/// 持久化的会话状态
///
/// 存储在设置文件的 `sessionState` 键下，应用启动时据此恢复标签页。
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface SessionState {
///   currentProject: string | null;
///   openFiles: OpenFile[];
///   activeFilePath: string | null;
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// 当前项目根目录
    #[serde(default)]
    pub current_project: Option<String>,

    /// 按标签页顺序排列的打开文件
    #[serde(default)]
    pub open_files: Vec<OpenFile>,

    /// 当前激活文件的路径
    #[serde(default)]
    pub active_file_path: Option<String>,
}

/// 会话渲染快照
///
/// 每次结构性变更后由编辑器会话管理器生成，前端据此一次性重绘
/// 标签栏、编辑区和依赖激活文件的按钮（保存、AI 操作）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub current_project: Option<String>,
    pub open_files: Vec<OpenFile>,
    /// 激活标签页的下标，没有打开的文件时为 `None`
    pub active_index: Option<usize>,
    pub active_file_path: Option<String>,
    /// 保存按钮是否可用（有激活文件时可用）
    pub can_save: bool,
    /// AI 操作按钮是否可用（有激活文件且 AI 服务已配置）
    pub ai_actions_enabled: bool,
}

/// 编辑器缓冲区的只读视图
///
/// 代表绑定到某个路径的一个编辑器组件实例：文本内容 + 语言模式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub path: String,
    /// 编辑器语言模式 ID（如 `php`、`javascript`、`plaintext`）
    pub language: String,
    pub content: String,
    /// 自上次加载或保存后是否被修改
    pub dirty: bool,
}
