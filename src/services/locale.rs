//! # 界面语言
//!
//! 支持的界面语言列表，以及持久化在设置存储 `appLanguage` 键下的当前选择。
//! 翻译文本本身由前端加载，后端只负责校验和保存语言代码。

use crate::models::app::LanguageOption;
use crate::services::store::ProjectStore;

/// 默认界面语言
pub const DEFAULT_LANGUAGE: &str = "zh-CN";

/// 支持的界面语言
pub const SUPPORTED: &[LanguageOption] = &[
    LanguageOption {
        code: "zh-CN",
        name: "简体中文",
    },
    LanguageOption {
        code: "en-US",
        name: "English",
    },
    LanguageOption {
        code: "pt-BR",
        name: "Português",
    },
    LanguageOption {
        code: "es-ES",
        name: "Español",
    },
];

pub fn is_supported(code: &str) -> bool {
    SUPPORTED.iter().any(|option| option.code == code)
}

/// 读取当前界面语言
///
/// 未保存或保存的代码不受支持时返回默认语言。
pub fn current(store: &ProjectStore) -> String {
    match store.app_language() {
        Some(code) if is_supported(&code) => code,
        Some(code) => {
            log::warn!("不支持的界面语言 {}，使用默认语言", code);
            DEFAULT_LANGUAGE.to_string()
        }
        None => DEFAULT_LANGUAGE.to_string(),
    }
}

/// 切换界面语言
///
/// # 错误
/// 语言代码不受支持或写入设置失败时返回错误
pub async fn set(store: &ProjectStore, code: &str) -> Result<(), String> {
    if !is_supported(code) {
        return Err(format!("不支持的界面语言: {}", code));
    }
    store.set_app_language(code).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn language_choice_is_validated_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.json");
        let store = ProjectStore::open(&file);
        assert_eq!(current(&store), DEFAULT_LANGUAGE);

        set(&store, "pt-BR").await.unwrap();
        assert!(set(&store, "fr-FR").await.is_err());
        assert_eq!(current(&ProjectStore::open(&file)), "pt-BR");
    }

    #[tokio::test]
    async fn unsupported_stored_code_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path().join("config.json"));
        store.set_app_language("xx-XX").await.unwrap();
        assert_eq!(current(&store), DEFAULT_LANGUAGE);
    }
}
