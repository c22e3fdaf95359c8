//! # 设置存储服务（Project Store）
//!
//! 扁平的键值设置存储，整体以 JSON 对象的形式保存在
//! `<配置目录>/code-editor-shell/config.json` 中。
//!
//! ## 已使用的键
//! - `sessionState` - 打开的标签页和激活文件（见 `models::session::SessionState`）
//! - `lastProjectPath` - 最近一次打开的项目根目录
//! - `appLanguage` - 界面语言代码
//!
//! 没有版本号和迁移逻辑：文件缺失、无法读取或无法解析时视为空存储。
//!
//! ## 线程安全
//! 内存中的键值表使用 `std::sync::RwLock` 保护；写盘操作通过
//! `tokio::sync::Mutex` 串行化，每次写盘都序列化当时最新的完整键值表，
//! 因此并发写入时最终落盘的总是最后一次修改后的状态。

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::models::session::SessionState;
use crate::utils::path;

pub const KEY_SESSION_STATE: &str = "sessionState";
pub const KEY_LAST_PROJECT_PATH: &str = "lastProjectPath";
pub const KEY_APP_LANGUAGE: &str = "appLanguage";

/// 键值设置存储
pub struct ProjectStore {
    /// 设置文件的绝对路径
    file_path: PathBuf,
    /// 内存中的完整键值表
    values: RwLock<Map<String, Value>>,
    /// 写盘互斥锁：保证同一时刻只有一个写盘操作
    flush_lock: tokio::sync::Mutex<()>,
}

impl ProjectStore {
    /// 从指定文件加载存储
    ///
    /// 文件不存在时返回空存储；文件损坏时记录警告并返回空存储，
    /// 下一次写入会覆盖损坏的文件。
    pub fn open(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let values = load_values(&file_path);
        Self {
            file_path,
            values: RwLock::new(values),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// 从默认位置加载存储
    ///
    /// # 错误
    /// 无法确定系统配置目录时返回错误
    pub fn open_default() -> Result<Self, String> {
        Ok(Self::open(path::get_settings_file_path()?))
    }

    /// 设置文件路径
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// 读取原始 JSON 值
    pub fn get(&self, key: &str) -> Option<Value> {
        let values = self.values.read().ok()?;
        values.get(key).cloned()
    }

    /// 读取并反序列化为指定类型
    ///
    /// 值存在但类型不匹配时记录警告并返回 `None`，按「没有历史状态」处理。
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("设置项 {} 格式无效，已忽略: {}", key, e);
                None
            }
        }
    }

    /// 写入原始 JSON 值并立即落盘
    ///
    /// # 错误
    /// 配置目录创建失败、序列化失败或文件写入失败时返回错误；
    /// 此时内存中的值已经更新。
    pub async fn set(&self, key: &str, value: Value) -> Result<(), String> {
        {
            let mut values = self
                .values
                .write()
                .map_err(|_| "设置存储已损坏（锁中毒）".to_string())?;
            values.insert(key.to_string(), value);
        }
        self.flush().await
    }

    /// 序列化任意值后写入
    pub async fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), String> {
        let value =
            serde_json::to_value(value).map_err(|e| format!("序列化设置项 {} 失败: {}", key, e))?;
        self.set(key, value).await
    }

    // ======== 类型化访问方法 ========

    /// 读取持久化的会话状态
    pub fn session_state(&self) -> Option<SessionState> {
        self.get_as(KEY_SESSION_STATE)
    }

    /// 保存会话状态
    pub async fn save_session_state(&self, state: &SessionState) -> Result<(), String> {
        self.set_as(KEY_SESSION_STATE, state).await
    }

    /// 读取最近一次打开的项目路径
    pub fn last_project_path(&self) -> Option<String> {
        self.get_as(KEY_LAST_PROJECT_PATH)
    }

    /// 记录最近一次打开的项目路径
    pub async fn set_last_project_path(&self, project_path: &str) -> Result<(), String> {
        self.set(KEY_LAST_PROJECT_PATH, Value::String(project_path.to_string()))
            .await
    }

    /// 读取界面语言代码
    pub fn app_language(&self) -> Option<String> {
        self.get_as(KEY_APP_LANGUAGE)
    }

    /// 保存界面语言代码
    pub async fn set_app_language(&self, code: &str) -> Result<(), String> {
        self.set(KEY_APP_LANGUAGE, Value::String(code.to_string()))
            .await
    }

    /// 将当前完整键值表写入设置文件
    async fn flush(&self) -> Result<(), String> {
        let _guard = self.flush_lock.lock().await;

        let content = {
            let values = self
                .values
                .read()
                .map_err(|_| "设置存储已损坏（锁中毒）".to_string())?;
            serde_json::to_string_pretty(&*values).map_err(|e| format!("序列化设置失败: {}", e))?
        };

        if let Some(parent) = self.file_path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| format!("创建配置目录失败: {}", e))?;
            }
        }

        tokio::fs::write(&self.file_path, content)
            .await
            .map_err(|e| format!("写入设置文件失败: {}", e))
    }
}

/// 同步读取设置文件内容
fn load_values(file_path: &Path) -> Map<String, Value> {
    if !file_path.exists() {
        return Map::new();
    }

    let content = match std::fs::read_to_string(file_path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("读取设置文件失败，使用空设置: {}", e);
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            log::warn!("设置文件根节点不是 JSON 对象，使用空设置");
            Map::new()
        }
        Err(e) => {
            log::warn!("解析设置文件失败，使用空设置: {}", e);
            Map::new()
        }
    }
}
