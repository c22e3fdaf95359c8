//! # 文件树数据模型
//!
//! 定义了文件浏览器中单个节点（FileNode）的 Rust 结构体，
//! 对应前端 TypeScript 中的 `FileNode` 接口。
//!
//! 目录节点的 `children` 采用懒加载：单层读取时为空数组，
//! 前端首次展开目录时再请求该目录的内容；递归读取时一次性填充。

use serde::{Deserialize, Serialize};

/// 文件树节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// 普通文件
    File,
    /// 目录
    Directory,
}

/// 文件树节点
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface FileNode {
///   name: string;
///   path: string;
///   type: 'file' | 'directory';
///   extension?: string;
///   children?: FileNode[];
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// 文件或目录名称（不含父路径）
    pub name: String,

    /// 完整的文件系统路径
    pub path: String,

    /// 节点类型：文件或目录
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// 文件扩展名（不含点号），仅文件节点且存在扩展名时有值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    /// 子节点列表，仅目录节点有值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    /// 是否为目录节点
    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }
}
