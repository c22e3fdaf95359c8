//! # Code Editor Shell - Tauri Cargo 构建脚本
//!
//! 在编译主项目之前执行，生成 Tauri 运行时所需的资源绑定代码、
//! 权限清单以及 Windows 平台的应用程序清单。
//!
//! 仅在启用 `desktop` feature 时调用 `tauri_build`；
//! 关闭该 feature 时服务层可以在没有 `tauri.conf.json` 处理的情况下独立编译。

fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build()
}
