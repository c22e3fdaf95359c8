//! # AI 辅助客户端
//!
//! 调用托管的 Chat Completions API，为编辑器提供四种代码辅助操作：
//! - `analyze` - 代码审查（总体概述、潜在缺陷、安全漏洞、改进建议、最佳实践）
//! - `generate` - 根据描述生成代码
//! - `document` - 为代码补充文档注释
//! - `explain` - 逐段讲解代码
//!
//! ## 配置
//! 启动时从环境变量读取一次：
//! - `OPENAI_API_KEY` - API 密钥，缺失时所有操作直接返回错误，不发起任何网络请求
//! - `AI_MODEL` - 模型名称，默认 `gpt-4`
//! - `OPENAI_BASE_URL` - API 根地址，默认 `https://api.openai.com/v1`
//!
//! ## 错误处理
//! 内部使用 `AiError` 枚举，对外统一折叠为 `AiResponse::Failed`，
//! 前端只需要展示其中的错误描述。

use serde::{Deserialize, Serialize};

use crate::models::ai::AiResponse;
use crate::services::language;

const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// 未指定语言时生成、文档、讲解操作使用的语言
const DEFAULT_LANGUAGE: &str = "php";
const MAX_TOKENS: u32 = 2048;

// ============ 配置 ============

/// AI 服务配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl AiConfig {
    /// 由显式参数构造配置，空字符串视为未设置
    pub fn new(api_key: Option<String>, model: Option<String>, base_url: Option<String>) -> Self {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            api_key: non_empty(api_key),
            model: non_empty(model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty(base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// 从环境变量读取配置
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("OPENAI_API_KEY").ok(),
            std::env::var("AI_MODEL").ok(),
            std::env::var("OPENAI_BASE_URL").ok(),
        )
    }
}

// ============ 错误类型 ============

/// AI 调用错误
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI 服务不可用，请检查 API 密钥配置")]
    Unavailable,

    #[error("请求 AI 服务失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI 服务返回错误 {status}: {message}")]
    Api { status: u16, message: String },

    #[error("AI 服务返回了空结果")]
    EmptyResponse,
}

// ============ 操作类型 ============

/// 四种 AI 操作，各自固定系统提示词和采样温度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiTask {
    Analyze,
    Generate,
    Document,
    Explain,
}

impl AiTask {
    pub fn temperature(self) -> f64 {
        match self {
            AiTask::Analyze | AiTask::Generate => 0.3,
            AiTask::Document => 0.2,
            AiTask::Explain => 0.4,
        }
    }

    fn system_prompt(self, language: &str) -> String {
        match self {
            AiTask::Analyze => {
                "你是一名专注于代码分析与审查的助手，关注最佳实践、安全性和性能。".to_string()
            }
            AiTask::Generate => {
                format!("你是一名精通 {} 编程的助手，擅长编写整洁、安全、文档完善的代码。", language)
            }
            AiTask::Document => format!("你是一名专注于 {} 代码文档编写的助手。", language),
            AiTask::Explain => format!(
                "你是一名经验丰富的 {} 编程讲师，擅长清晰、循序渐进地讲解代码。",
                language
            ),
        }
    }

    /// 错误信息中的操作名称
    fn label(self) -> &'static str {
        match self {
            AiTask::Analyze => "分析代码",
            AiTask::Generate => "生成代码",
            AiTask::Document => "生成文档",
            AiTask::Explain => "讲解代码",
        }
    }
}

// ============ 请求/响应结构 ============

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

/// API 错误响应体：`{ "error": { "message": "..." } }`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============ 客户端 ============

/// Chat Completions 客户端
pub struct AiClient {
    config: AiConfig,
    http: reqwest::Client,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Self {
        if config.api_key.is_none() {
            log::info!("未配置 OPENAI_API_KEY，AI 功能不可用");
        }
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(AiConfig::from_env())
    }

    /// 是否已配置 API 密钥
    pub fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// 分析代码
    ///
    /// 语言由文件扩展名经语言映射表确定，未识别时按通用「代码」处理。
    pub async fn analyze(&self, file_path: &str, code: &str) -> AiResponse {
        let language = language::from_path(file_path).display_name;
        let prompt = format!(
            "请从最佳实践、潜在缺陷、性能和安全性几个方面分析以下 {lang} 代码：\n\n\
             ```{lang}\n{code}\n```\n\n\
             请按以下结构给出分析：\n\
             1. 代码总体概述\n\
             2. 潜在的缺陷或问题\n\
             3. 安全漏洞\n\
             4. 可改进之处\n\
             5. 已遵循和未遵循的最佳实践\n",
            lang = language,
            code = code
        );
        self.run(AiTask::Analyze, language, &prompt).await
    }

    /// 根据描述生成代码
    pub async fn generate(&self, description: &str, language: Option<&str>) -> AiResponse {
        let language = language.unwrap_or(DEFAULT_LANGUAGE);
        let prompt = format!(
            "请根据以下描述编写 {} 代码：\n\n{}\n\n只返回代码，并在合适的位置添加说明性注释。\n",
            language, description
        );
        self.run(AiTask::Generate, language, &prompt).await
    }

    /// 为代码补充文档
    pub async fn document(&self, code: &str, language: Option<&str>) -> AiResponse {
        let language = language.unwrap_or(DEFAULT_LANGUAGE);
        let prompt = format!(
            "请为以下 {lang} 代码补充完整的文档：\n\n\
             ```{lang}\n{code}\n```\n\n\
             返回附带文档的原始代码，包括：\n\
             1. 类和函数的头部注释\n\
             2. 参数和返回值说明\n\
             3. 复杂片段的解释\n\
             4. 符合该语言习惯的文档块风格\n\n\
             只返回加好文档的代码。\n",
            lang = language,
            code = code
        );
        self.run(AiTask::Document, language, &prompt).await
    }

    /// 讲解代码
    pub async fn explain(&self, code: &str, language: Option<&str>) -> AiResponse {
        let language = language.unwrap_or(DEFAULT_LANGUAGE);
        let prompt = format!(
            "请详细、循序渐进地讲解以下 {lang} 代码：\n\n\
             ```{lang}\n{code}\n```\n\n\
             按行或按逻辑块讲解，重点说明：\n\
             1. 每一部分代码做了什么\n\
             2. 各组件之间如何协作\n\
             3. 用到的重要概念\n\
             4. 实现方式背后的思路\n",
            lang = language,
            code = code
        );
        self.run(AiTask::Explain, language, &prompt).await
    }

    /// 执行一次操作并折叠为 `AiResponse`
    async fn run(&self, task: AiTask, language: &str, prompt: &str) -> AiResponse {
        match self.complete(task, language, prompt).await {
            Ok((text, tokens)) => AiResponse::Completed { text, tokens },
            Err(AiError::Unavailable) => AiResponse::failed(AiError::Unavailable.to_string()),
            Err(e) => {
                log::error!("{}失败: {}", task.label(), e);
                AiResponse::failed(format!("{}失败: {}", task.label(), e))
            }
        }
    }

    /// 发送一次 Chat Completions 请求
    ///
    /// # 返回值
    /// 第一个候选的文本内容和本次请求的总 token 数
    async fn complete(&self, task: AiTask, language: &str, prompt: &str) -> Result<(String, u32), AiError> {
        let api_key = self.config.api_key.as_deref().ok_or(AiError::Unavailable)?;

        let system = task.system_prompt(language);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: task.temperature(),
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AiError::EmptyResponse)?;
        let tokens = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);
        Ok((text, tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Incoming;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use serde_json::Value;

    /// 失败结果的错误描述，成功时测试失败
    fn error_of(response: &AiResponse) -> &str {
        match response {
            AiResponse::Failed { error } => error,
            other => panic!("期望失败结果，实际为 {:?}", other),
        }
    }

    const COMPLETION_OK: &str =
        r#"{"choices":[{"message":{"role":"assistant","content":"看起来不错"}}],"usage":{"total_tokens":42}}"#;

    /// 模拟服务器收到的一次请求
    #[derive(Debug, Clone)]
    struct Captured {
        path: String,
        authorization: Option<String>,
        body: Value,
    }

    /// 启动一个本地 HTTP 服务器，对每个请求都返回固定的状态码和响应体
    async fn spawn_mock(status: StatusCode, reply: &'static str) -> (String, Arc<Mutex<Vec<Captured>>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let sink = sink.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let sink = sink.clone();
                        async move {
                            let path = req.uri().path().to_string();
                            let authorization = req
                                .headers()
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            let bytes = req.into_body().collect().await?.to_bytes();
                            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
                            sink.lock().unwrap().push(Captured {
                                path,
                                authorization,
                                body,
                            });

                            let response = Response::builder()
                                .status(status)
                                .header("content-type", "application/json")
                                .body(Full::new(Bytes::from_static(reply.as_bytes())))
                                .unwrap();
                            Ok::<_, hyper::Error>(response)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        (format!("http://{}/v1", addr), captured)
    }

    fn client(base_url: &str, api_key: Option<&str>) -> AiClient {
        AiClient::new(AiConfig::new(
            api_key.map(str::to_string),
            None,
            Some(base_url.to_string()),
        ))
    }

    #[test]
    fn config_defaults_and_blank_values() {
        let config = AiConfig::new(Some("  ".into()), Some(String::new()), Some("http://x/v1/".into()));
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.base_url, "http://x/v1");

        let defaults = AiConfig::new(Some("k".into()), None, None);
        assert_eq!(defaults.base_url, "https://api.openai.com/v1");
    }

    #[tokio::test]
    async fn without_credential_every_call_fails_offline() {
        let (base_url, captured) = spawn_mock(StatusCode::OK, COMPLETION_OK).await;
        let ai = client(&base_url, None);
        assert!(!ai.is_available());

        let results = [
            ai.analyze("index.php", "<?php echo 1;").await,
            ai.generate("登录表单", None).await,
            ai.document("function a() {}", Some("javascript")).await,
            ai.explain("SELECT 1", Some("sql")).await,
        ];
        for result in &results {
            assert!(matches!(result, AiResponse::Failed { .. }));
            assert!(error_of(&result).contains("API 密钥"));
        }
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn analyze_sends_expected_request() {
        let (base_url, captured) = spawn_mock(StatusCode::OK, COMPLETION_OK).await;
        let ai = client(&base_url, Some("test-key"));

        let result = ai.analyze("/site/index.php", "<?php echo 1;").await;
        assert_eq!(
            result,
            AiResponse::Completed {
                text: "看起来不错".into(),
                tokens: 42
            }
        );

        let requests = captured.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.path, "/v1/chat/completions");
        assert_eq!(request.authorization.as_deref(), Some("Bearer test-key"));
        assert_eq!(request.body["model"], "gpt-4");
        assert_eq!(request.body["max_tokens"], 2048);
        assert_eq!(request.body["temperature"], 0.3);
        assert_eq!(request.body["messages"][0]["role"], "system");
        let user = request.body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("PHP"));
        assert!(user.contains("<?php echo 1;"));
    }

    #[tokio::test]
    async fn analyze_unknown_extension_uses_generic_label() {
        let (base_url, captured) = spawn_mock(StatusCode::OK, COMPLETION_OK).await;
        let ai = client(&base_url, Some("test-key"));

        ai.analyze("notes.txt", "hello").await;
        let requests = captured.lock().unwrap().clone();
        let user = requests[0].body["messages"][1]["content"].as_str().unwrap().to_string();
        assert!(user.contains("```代码"));
    }

    #[tokio::test]
    async fn each_task_uses_its_temperature_and_default_language() {
        let (base_url, captured) = spawn_mock(StatusCode::OK, COMPLETION_OK).await;
        let ai = client(&base_url, Some("test-key"));

        ai.generate("计算阶乘", None).await;
        ai.document("function a() {}", None).await;
        ai.explain("console.log(1)", Some("javascript")).await;

        let requests = captured.lock().unwrap().clone();
        let temperatures: Vec<f64> = requests
            .iter()
            .map(|r| r.body["temperature"].as_f64().unwrap())
            .collect();
        assert_eq!(temperatures, vec![0.3, 0.2, 0.4]);

        let generate_system = requests[0].body["messages"][0]["content"].as_str().unwrap();
        assert!(generate_system.contains("php"));
        let explain_user = requests[2].body["messages"][1]["content"].as_str().unwrap();
        assert!(explain_user.contains("```javascript"));
    }

    #[tokio::test]
    async fn api_error_body_becomes_error_text() {
        let (base_url, _captured) = spawn_mock(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
        )
        .await;
        let ai = client(&base_url, Some("bad-key"));

        let result = ai.explain("x = 1", Some("python")).await;
        let error = error_of(&result);
        assert!(error.contains("401"));
        assert!(error.contains("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn empty_choices_is_error() {
        let (base_url, _captured) =
            spawn_mock(StatusCode::OK, r#"{"choices":[],"usage":{"total_tokens":3}}"#).await;
        let ai = client(&base_url, Some("test-key"));

        let result = ai.generate("空结果", None).await;
        assert!(matches!(result, AiResponse::Failed { .. }));
        assert!(error_of(&result).contains("空结果"));
    }

    #[tokio::test]
    async fn malformed_body_is_error() {
        let (base_url, _captured) = spawn_mock(StatusCode::OK, "not json").await;
        let ai = client(&base_url, Some("test-key"));
        assert!(matches!(
            ai.document("a", None).await,
            AiResponse::Failed { .. }
        ));
    }
}
