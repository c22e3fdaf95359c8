//! # 通用工具函数模块
//!
//! - `path` - 配置目录、默认工作目录、文件名校验和归档条目名转换

pub mod path;
