//! # 应用信息数据模型
//!
//! 「关于」对话框、语言选择器和终端命令提示所需的数据结构。

use serde::Serialize;

/// 应用基本信息（「关于」对话框）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub arch: String,
}

/// 界面语言选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageOption {
    /// 语言代码（如 `zh-CN`）
    pub code: &'static str,
    /// 语言自身的名称（如 `简体中文`）
    pub name: &'static str,
}

/// 终端命令提示条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandHint {
    pub command: &'static str,
    pub description: &'static str,
}
