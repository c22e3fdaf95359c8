//! # AI 辅助数据模型
//!
//! AI 操作的结果要么是文本 + token 用量，要么是错误描述，二者互斥。
//! 结果由前端立即消费，不做持久化。

use serde::Serialize;

/// AI 操作结果
///
/// 使用 `untagged` 序列化，前端通过是否存在 `error` 字段区分：
/// ```typescript
/// type AiResponse =
///   | { text: string; tokens: number }
///   | { error: string };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AiResponse {
    /// 调用成功：模型返回的文本和本次请求消耗的总 token 数
    Completed { text: String, tokens: u32 },
    /// 调用失败：可读的错误描述
    Failed { error: String },
}

impl AiResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        AiResponse::Failed {
            error: error.into(),
        }
    }
}
