//! # 语言映射表
//!
//! 扩展名 → 语言的静态映射表，编辑器绑定语言模式和 AI 提示词构建
//! 共同查询此表，保证同一个文件在两处得到同一种语言。
//!
//! 扩展名比较不区分大小写；未收录的扩展名映射为纯文本。

use std::path::Path;

/// 一种可识别的源码语言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// 编辑器组件使用的语言模式 ID
    pub mode: &'static str,
    /// 提示词中使用的显示名称
    pub display_name: &'static str,
}

/// 纯文本：未识别扩展名的回退语言
pub const PLAIN_TEXT: Language = Language {
    mode: "plaintext",
    display_name: "代码",
};

/// 扩展名（小写，不含点号）→ 语言
const LANGUAGE_TABLE: &[(&str, Language)] = &[
    ("php", Language { mode: "php", display_name: "PHP" }),
    ("js", Language { mode: "javascript", display_name: "JavaScript" }),
    ("html", Language { mode: "html", display_name: "HTML" }),
    ("css", Language { mode: "css", display_name: "CSS" }),
    ("json", Language { mode: "json", display_name: "JSON" }),
    ("md", Language { mode: "markdown", display_name: "Markdown" }),
    ("xml", Language { mode: "xml", display_name: "XML" }),
    ("sql", Language { mode: "sql", display_name: "SQL" }),
];

/// 根据扩展名查找语言
///
/// # 参数
/// - `extension` - 扩展名，可带或不带前导点号，大小写不敏感
pub fn from_extension(extension: &str) -> Language {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    LANGUAGE_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, language)| *language)
        .unwrap_or(PLAIN_TEXT)
}

/// 根据文件路径查找语言
pub fn from_path(path: &str) -> Language {
    Path::new(path)
        .extension()
        .map(|ext| from_extension(&ext.to_string_lossy()))
        .unwrap_or(PLAIN_TEXT)
}
