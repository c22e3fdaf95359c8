//! # 终端进程数据模型
//!
//! 定义了持久终端会话推送给前端的事件（TerminalEvent）
//! 和一次性命令的执行结果（CommandOutput）。

use serde::Serialize;

/// 子进程输出通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// 持久终端会话事件
///
/// 由进程会话的转发任务产生，以 `event_name` 为事件名推送到前端终端组件。
/// 序列化为带 `kind` 标签的对象，例如：
/// `{ "kind": "output", "stream": "stdout", "data": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TerminalEvent {
    /// stdout/stderr 的一段文本输出
    Output { stream: OutputStream, data: String },

    /// 子进程退出；被信号终止时 `code` 为 `None`
    Exit { code: Option<i32> },

    /// 即将在 `delay_ms` 毫秒后进行第 `attempt` 次自动重启
    #[serde(rename_all = "camelCase")]
    Restarting { attempt: u32, delay_ms: u64 },

    /// 连续重启次数耗尽，会话保持关闭直到再次调用 start
    GaveUp { attempts: u32 },
}

impl TerminalEvent {
    /// 推送到前端时使用的事件名
    pub fn event_name(&self) -> &'static str {
        match self {
            TerminalEvent::Output { .. } => "terminal-output",
            TerminalEvent::Exit { .. } => "terminal-exit",
            TerminalEvent::Restarting { .. } => "terminal-restarting",
            TerminalEvent::GaveUp { .. } => "terminal-gave-up",
        }
    }
}

/// 一次性命令的执行结果
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface CommandOutput {
///   code: number | null;
///   stdout: string;
///   stderr: string;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// 进程退出码；被信号终止时为 `None`
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_events_serialize_with_kind_tag() {
        let output = TerminalEvent::Output {
            stream: OutputStream::Stderr,
            data: "oops".into(),
        };
        assert_eq!(output.event_name(), "terminal-output");
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({ "kind": "output", "stream": "stderr", "data": "oops" })
        );

        let restarting = TerminalEvent::Restarting { attempt: 2, delay_ms: 2000 };
        assert_eq!(restarting.event_name(), "terminal-restarting");
        assert_eq!(
            serde_json::to_value(&restarting).unwrap(),
            json!({ "kind": "restarting", "attempt": 2, "delayMs": 2000 })
        );

        let gave_up = TerminalEvent::GaveUp { attempts: 5 };
        assert_eq!(gave_up.event_name(), "terminal-gave-up");
        assert_eq!(
            serde_json::to_value(&gave_up).unwrap(),
            json!({ "kind": "gaveUp", "attempts": 5 })
        );
        assert_eq!(
            serde_json::to_value(TerminalEvent::Exit { code: None }).unwrap(),
            json!({ "kind": "exit", "code": null })
        );
    }
}
