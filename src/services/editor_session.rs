//! # 编辑器会话管理器
//!
//! 显式的会话对象，持有编辑器的全部结构状态：
//! - 当前项目路径
//! - 按标签页顺序排列的打开文件
//! - 激活文件
//! - 按路径缓存的编辑器缓冲区（内容 + 语言模式 + 是否已修改）
//!
//! 所有操作既可以直接调用方法，也可以构造 `EditorCommand` 交给 `dispatch`，
//! 后者在操作完成后返回新的 `SessionSnapshot` 供前端重绘。
//!
//! ## 持久化
//! 每次结构性变更（打开、关闭、切换、重命名、删除、切换项目）结束后，
//! 把完整的 `SessionState` 作为一次写入保存到设置存储的 `sessionState` 键。
//! 写盘失败只记录警告，不影响内存中的状态。
//!
//! ## 不变量
//! - 同一路径最多出现在一个标签页中
//! - 每个打开的文件都有且只有一个对应的缓冲区
//! - 激活文件（如果存在）一定是打开的文件之一

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::models::session::{EditorView, OpenFile, SessionSnapshot, SessionState};
use crate::services::file_tree;
use crate::services::language;
use crate::services::store::ProjectStore;
use crate::utils::path as path_utils;

/// 一个编辑器缓冲区
#[derive(Debug, Clone)]
struct Buffer {
    language: &'static str,
    content: String,
    dirty: bool,
}

impl Buffer {
    fn new(file_path: &str, content: String) -> Self {
        Self {
            language: language::from_path(file_path).mode,
            content,
            dirty: false,
        }
    }
}

/// 编辑器会话操作
///
/// 前端以 `{ "command": "setActive", "index": 1 }` 的形式发送。
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum EditorCommand {
    Open {
        file: OpenFile,
        #[serde(default = "default_activate")]
        activate: bool,
    },
    SetActive {
        index: usize,
    },
    Close {
        index: usize,
    },
    #[serde(rename_all = "camelCase")]
    Rename {
        path: String,
        new_name: String,
    },
    Delete {
        path: String,
    },
    UpdateContent {
        path: String,
        content: String,
    },
    Save {
        path: String,
    },
    SaveActive,
    SetProject {
        path: String,
    },
    Restore,
}

fn default_activate() -> bool {
    true
}

/// 编辑器会话管理器
pub struct EditorSessionManager {
    store: Arc<ProjectStore>,
    /// AI 服务是否已配置（决定快照中的 `ai_actions_enabled`）
    ai_available: bool,
    current_project: Option<String>,
    open_files: Vec<OpenFile>,
    /// 激活文件的路径；路径是标签页的稳定标识，下标会随关闭操作移动
    active_path: Option<String>,
    buffers: HashMap<String, Buffer>,
}

impl EditorSessionManager {
    pub fn new(store: Arc<ProjectStore>, ai_available: bool) -> Self {
        Self {
            store,
            ai_available,
            current_project: None,
            open_files: Vec::new(),
            active_path: None,
            buffers: HashMap::new(),
        }
    }

    /// 执行一个会话操作并返回新的快照
    pub async fn dispatch(&mut self, command: EditorCommand) -> Result<SessionSnapshot, String> {
        match command {
            EditorCommand::Open { file, activate } => self.open(file, activate).await?,
            EditorCommand::SetActive { index } => self.set_active(index).await?,
            EditorCommand::Close { index } => self.close(index).await?,
            EditorCommand::Rename { path, new_name } => {
                self.rename(&path, &new_name).await?;
            }
            EditorCommand::Delete { path } => self.delete(&path).await?,
            EditorCommand::UpdateContent { path, content } => self.update_content(&path, content)?,
            EditorCommand::Save { path } => self.save(&path).await?,
            EditorCommand::SaveActive => self.save_active().await?,
            EditorCommand::SetProject { path } => self.set_project(&path).await?,
            EditorCommand::Restore => self.restore().await?,
        }
        Ok(self.snapshot())
    }

    // ============ 结构性操作 ============

    /// 打开文件
    ///
    /// 文件已打开时只切换为激活状态。
    ///
    /// # 参数
    /// - `file` - 要打开的文件
    /// - `activate` - 打开后是否设为激活文件
    ///
    /// # 错误
    /// 文件无法读取时返回错误，会话状态保持不变
    pub async fn open(&mut self, file: OpenFile, activate: bool) -> Result<(), String> {
        if let Some(index) = self.index_of(&file.path) {
            return self.set_active(index).await;
        }
        self.open_without_persist(file, activate).await?;
        self.persist().await;
        Ok(())
    }

    /// 切换激活文件
    ///
    /// # 错误
    /// 下标越界时返回错误
    pub async fn set_active(&mut self, index: usize) -> Result<(), String> {
        self.activate_index(index)?;
        self.persist().await;
        Ok(())
    }

    /// 关闭标签页
    ///
    /// 同时丢弃其缓冲区。关闭后还有标签页时激活 `min(index, 剩余数量 - 1)`，
    /// 否则清空激活文件。
    pub async fn close(&mut self, index: usize) -> Result<(), String> {
        if index >= self.open_files.len() {
            return Err(format!("标签页下标越界: {}", index));
        }

        let closed = self.open_files.remove(index);
        self.buffers.remove(&closed.path);

        self.active_path = if self.open_files.is_empty() {
            None
        } else {
            let next = index.min(self.open_files.len() - 1);
            Some(self.open_files[next].path.clone())
        };

        self.persist().await;
        Ok(())
    }

    /// 重命名文件或目录
    ///
    /// 先在磁盘上重命名，再在一次变更中同步更新受影响的标签页记录、
    /// 缓冲区和激活路径，最后写盘一次。重命名目录时，目录下所有已打开的文件
    /// 都换成新前缀；被直接重命名的文件按新扩展名重新确定语言。
    ///
    /// # 返回值
    /// 新的完整路径
    pub async fn rename(&mut self, file_path: &str, new_name: &str) -> Result<String, String> {
        let old_root = Path::new(file_path);
        let new_root = file_tree::rename_entry(old_root, new_name).await?;
        let new_path = new_root.to_string_lossy().to_string();
        if new_path == file_path {
            return Ok(new_path);
        }

        let mut moved = false;
        for record in &mut self.open_files {
            let Some(moved_path) = relocate(&record.path, old_root, &new_root) else {
                continue;
            };
            if let Some(mut buffer) = self.buffers.remove(&record.path) {
                buffer.language = language::from_path(&moved_path).mode;
                self.buffers.insert(moved_path.clone(), buffer);
            }
            if record.path == file_path {
                record.name = new_name.trim().to_string();
                record.extension = path_utils::file_extension(&record.name);
            }
            record.path = moved_path;
            moved = true;
        }

        if let Some(active) = self
            .active_path
            .as_deref()
            .and_then(|active| relocate(active, old_root, &new_root))
        {
            self.active_path = Some(active);
        }

        if moved {
            self.persist().await;
        }
        Ok(new_path)
    }

    /// 删除文件或目录
    ///
    /// 删除目录时，目录下所有已打开的文件一并关闭。
    /// 只有被删除的文件正是激活文件时才清空激活状态，不会自动激活其他标签页。
    pub async fn delete(&mut self, file_path: &str) -> Result<(), String> {
        let target = Path::new(file_path);
        file_tree::delete_entry(target).await?;

        let before = self.open_files.len();
        let buffers = &mut self.buffers;
        self.open_files.retain(|f| {
            let removed = Path::new(&f.path).starts_with(target);
            if removed {
                buffers.remove(&f.path);
            }
            !removed
        });

        let active_removed = self
            .active_path
            .as_deref()
            .is_some_and(|active| Path::new(active).starts_with(target));
        if active_removed {
            self.active_path = None;
        }

        if before != self.open_files.len() || active_removed {
            self.persist().await;
        }
        Ok(())
    }

    /// 设置当前项目
    ///
    /// 同时记录为最近一次打开的项目（`lastProjectPath`）。
    pub async fn set_project(&mut self, project_path: &str) -> Result<(), String> {
        self.current_project = Some(project_path.to_string());
        if let Err(e) = self.store.set_last_project_path(project_path).await {
            log::warn!("记录最近项目失败: {}", e);
        }
        self.persist().await;
        Ok(())
    }

    /// 恢复上次保存的会话
    ///
    /// 按记录顺序重新打开文件（不激活），跳过已无法读取的文件；
    /// 最后重新激活记录的激活文件，整个过程只写盘一次。
    pub async fn restore(&mut self) -> Result<(), String> {
        let Some(state) = self.store.session_state() else {
            return Ok(());
        };

        if state.current_project.is_some() {
            self.current_project = state.current_project;
        }

        for file in state.open_files {
            if self.index_of(&file.path).is_some() {
                continue;
            }
            let file_path = file.path.clone();
            if let Err(e) = self.open_without_persist(file, false).await {
                log::warn!("恢复会话时跳过文件 {}: {}", file_path, e);
            }
        }

        if let Some(index) = state
            .active_file_path
            .as_deref()
            .and_then(|active| self.index_of(active))
        {
            self.activate_index(index)?;
        }

        self.persist().await;
        Ok(())
    }

    // ============ 缓冲区操作 ============

    /// 更新缓冲区内容（编辑器中的修改）
    ///
    /// # 错误
    /// 该路径没有打开时返回错误
    pub fn update_content(&mut self, file_path: &str, content: String) -> Result<(), String> {
        let buffer = self
            .buffers
            .get_mut(file_path)
            .ok_or_else(|| format!("文件未打开: {}", file_path))?;
        buffer.content = content;
        buffer.dirty = true;
        Ok(())
    }

    /// 将缓冲区内容保存到磁盘
    pub async fn save(&mut self, file_path: &str) -> Result<(), String> {
        let buffer = self
            .buffers
            .get_mut(file_path)
            .ok_or_else(|| format!("文件未打开: {}", file_path))?;

        if !file_tree::save_file(Path::new(file_path), &buffer.content).await {
            return Err(format!("保存文件失败: {}", file_path));
        }
        buffer.dirty = false;
        Ok(())
    }

    /// 保存激活文件
    ///
    /// # 错误
    /// 没有激活文件或写入失败时返回错误
    pub async fn save_active(&mut self) -> Result<(), String> {
        let active = self
            .active_path
            .clone()
            .ok_or_else(|| "没有激活的文件".to_string())?;
        self.save(&active).await
    }

    // ============ 查询 ============

    /// 生成当前会话的渲染快照
    pub fn snapshot(&self) -> SessionSnapshot {
        let active_index = self.active_index();
        SessionSnapshot {
            current_project: self.current_project.clone(),
            open_files: self.open_files.clone(),
            active_index,
            active_file_path: self.active_path.clone(),
            can_save: active_index.is_some(),
            ai_actions_enabled: active_index.is_some() && self.ai_available,
        }
    }

    /// 当前的持久化会话状态
    pub fn state(&self) -> SessionState {
        SessionState {
            current_project: self.current_project.clone(),
            open_files: self.open_files.clone(),
            active_file_path: self.active_path.clone(),
        }
    }

    /// 指定路径的缓冲区视图
    pub fn editor_view(&self, file_path: &str) -> Option<EditorView> {
        self.buffers.get(file_path).map(|buffer| EditorView {
            path: file_path.to_string(),
            language: buffer.language.to_string(),
            content: buffer.content.clone(),
            dirty: buffer.dirty,
        })
    }

    /// 激活文件的缓冲区视图
    pub fn active_view(&self) -> Option<EditorView> {
        self.active_path
            .as_deref()
            .and_then(|active| self.editor_view(active))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_path
            .as_deref()
            .and_then(|active| self.index_of(active))
    }

    // ============ 内部方法 ============

    fn index_of(&self, file_path: &str) -> Option<usize> {
        self.open_files.iter().position(|f| f.path == file_path)
    }

    fn activate_index(&mut self, index: usize) -> Result<(), String> {
        let file = self
            .open_files
            .get(index)
            .ok_or_else(|| format!("标签页下标越界: {}", index))?;
        self.active_path = Some(file.path.clone());
        Ok(())
    }

    /// 读取文件、追加标签页并创建缓冲区，不写盘
    async fn open_without_persist(&mut self, file: OpenFile, activate: bool) -> Result<(), String> {
        let content = file_tree::read_file(Path::new(&file.path))
            .await
            .ok_or_else(|| format!("无法读取文件: {}", file.path))?;

        self.buffers
            .insert(file.path.clone(), Buffer::new(&file.path, content));
        if activate {
            self.active_path = Some(file.path.clone());
        }
        self.open_files.push(file);
        Ok(())
    }

    /// 保存会话状态，失败只记录警告
    async fn persist(&self) {
        if let Err(e) = self.store.save_session_state(&self.state()).await {
            log::warn!("保存会话状态失败: {}", e);
        }
    }
}

/// `file_path` 位于 `old_root`（含其自身）之下时，返回换到 `new_root` 之后的路径
fn relocate(file_path: &str, old_root: &Path, new_root: &Path) -> Option<String> {
    let rest = Path::new(file_path).strip_prefix(old_root).ok()?;
    let moved = if rest.as_os_str().is_empty() {
        new_root.to_path_buf()
    } else {
        new_root.join(rest)
    };
    Some(moved.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::file_tree::NodeType;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: std::path::PathBuf,
        store: Arc<ProjectStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join("project");
            std::fs::create_dir(&root).unwrap();
            let store = Arc::new(ProjectStore::open(dir.path().join("config.json")));
            Self {
                _dir: dir,
                root,
                store,
            }
        }

        fn file(&self, name: &str, content: &str) -> OpenFile {
            let path = self.root.join(name);
            std::fs::write(&path, content).unwrap();
            OpenFile {
                path: path.to_string_lossy().to_string(),
                name: name.to_string(),
                node_type: NodeType::File,
                extension: path_utils::file_extension(name),
            }
        }

        fn manager(&self) -> EditorSessionManager {
            EditorSessionManager::new(self.store.clone(), true)
        }
    }

    fn names(manager: &EditorSessionManager) -> Vec<String> {
        manager.snapshot().open_files.into_iter().map(|f| f.name).collect()
    }

    #[tokio::test]
    async fn open_twice_only_activates() {
        let fx = Fixture::new();
        let mut session = fx.manager();
        let a = fx.file("a.php", "<?php");
        let b = fx.file("b.js", "let b;");

        session.open(a.clone(), true).await.unwrap();
        session.open(b, true).await.unwrap();
        session.open(a.clone(), true).await.unwrap();

        assert_eq!(names(&session), vec!["a.php", "b.js"]);
        assert_eq!(session.snapshot().active_index, Some(0));
        assert_eq!(session.editor_view(&a.path).unwrap().language, "php");
    }

    #[tokio::test]
    async fn open_unreadable_file_changes_nothing() {
        let fx = Fixture::new();
        let mut session = fx.manager();
        let ghost = OpenFile {
            path: fx.root.join("ghost.php").to_string_lossy().to_string(),
            name: "ghost.php".into(),
            node_type: NodeType::File,
            extension: Some("php".into()),
        };

        assert!(session.open(ghost, true).await.is_err());
        assert!(session.snapshot().open_files.is_empty());
        assert!(fx.store.session_state().is_none());
    }

    #[tokio::test]
    async fn close_activates_clamped_neighbour() {
        let fx = Fixture::new();
        let mut session = fx.manager();
        for name in ["a.php", "b.php", "c.php"] {
            session.open(fx.file(name, name), true).await.unwrap();
        }

        session.close(1).await.unwrap();
        assert_eq!(names(&session), vec!["a.php", "c.php"]);
        assert_eq!(session.snapshot().active_index, Some(1));

        session.close(1).await.unwrap();
        assert_eq!(session.snapshot().active_index, Some(0));

        session.close(0).await.unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.active_index, None);
        assert!(!snapshot.can_save);
        assert!(!snapshot.ai_actions_enabled);

        assert!(session.close(0).await.is_err());
    }

    #[tokio::test]
    async fn restore_reproduces_order_and_active_file() {
        let fx = Fixture::new();
        let project = fx.root.to_string_lossy().to_string();
        {
            let mut session = fx.manager();
            session.set_project(&project).await.unwrap();
            for name in ["a.php", "b.css", "c.md"] {
                session.open(fx.file(name, name), true).await.unwrap();
            }
        }

        let mut restored = fx.manager();
        restored.restore().await.unwrap();
        let snapshot = restored.snapshot();
        assert_eq!(names(&restored), vec!["a.php", "b.css", "c.md"]);
        assert_eq!(snapshot.active_index, Some(2));
        assert_eq!(snapshot.current_project.as_deref(), Some(project.as_str()));
        assert_eq!(restored.active_view().unwrap().language, "markdown");
        assert_eq!(fx.store.last_project_path().as_deref(), Some(project.as_str()));
    }

    #[tokio::test]
    async fn restore_skips_missing_files() {
        let fx = Fixture::new();
        let b = fx.file("b.php", "b");
        {
            let mut session = fx.manager();
            session.open(fx.file("a.php", "a"), true).await.unwrap();
            session.open(b.clone(), true).await.unwrap();
        }
        std::fs::remove_file(&b.path).unwrap();

        let mut restored = fx.manager();
        restored.restore().await.unwrap();
        assert_eq!(names(&restored), vec!["a.php"]);
        assert_eq!(restored.snapshot().active_index, None);
        assert_eq!(fx.store.session_state().unwrap().open_files.len(), 1);
    }

    #[tokio::test]
    async fn rename_updates_record_buffer_and_active_path() {
        let fx = Fixture::new();
        let mut session = fx.manager();
        let a = fx.file("a.php", "<?php echo 1;");
        session.open(a.clone(), true).await.unwrap();
        session.update_content(&a.path, "<?php echo 2;".into()).unwrap();

        let new_path = session.rename(&a.path, "main.js").await.unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.active_file_path.as_deref(), Some(new_path.as_str()));
        let record = &snapshot.open_files[0];
        assert_eq!(record.name, "main.js");
        assert_eq!(record.extension.as_deref(), Some("js"));

        assert!(session.editor_view(&a.path).is_none());
        let view = session.editor_view(&new_path).unwrap();
        assert_eq!(view.language, "javascript");
        assert_eq!(view.content, "<?php echo 2;");
        assert!(view.dirty);

        let persisted = fx.store.session_state().unwrap();
        assert_eq!(persisted.open_files[0].path, new_path);
        assert_eq!(persisted.active_file_path.as_deref(), Some(new_path.as_str()));
        assert!(Path::new(&new_path).exists());
    }

    #[tokio::test]
    async fn rename_directory_moves_open_files_under_it() {
        let fx = Fixture::new();
        let mut session = fx.manager();
        std::fs::create_dir(fx.root.join("lib")).unwrap();
        let inner = fx.file("lib/a.php", "<?php echo 1;");
        let outer = fx.file("index.php", "<?php");
        session.open(outer.clone(), false).await.unwrap();
        session.open(inner.clone(), true).await.unwrap();
        session.update_content(&inner.path, "<?php echo 2;".into()).unwrap();

        let lib = fx.root.join("lib").to_string_lossy().to_string();
        let new_dir = session.rename(&lib, "src").await.unwrap();
        let moved = Path::new(&new_dir).join("a.php").to_string_lossy().to_string();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.open_files[0].path, outer.path);
        assert_eq!(snapshot.open_files[1].path, moved);
        assert_eq!(snapshot.active_file_path.as_deref(), Some(moved.as_str()));
        assert!(session.editor_view(&inner.path).is_none());
        assert!(session.editor_view(&moved).unwrap().dirty);

        session.save_active().await.unwrap();
        assert_eq!(std::fs::read_to_string(&moved).unwrap(), "<?php echo 2;");

        let persisted = fx.store.session_state().unwrap();
        assert_eq!(persisted.active_file_path.as_deref(), Some(moved.as_str()));
    }

    #[test]
    fn relocate_matches_whole_components() {
        let old = Path::new("/p/lib");
        let new = Path::new("/p/src");
        assert_eq!(relocate("/p/lib", old, new).as_deref(), Some("/p/src"));
        assert_eq!(relocate("/p/lib/a/b.php", old, new).as_deref(), Some("/p/src/a/b.php"));
        assert_eq!(relocate("/p/library/c.php", old, new), None);
    }

    #[tokio::test]
    async fn delete_clears_active_only_when_deleted() {
        let fx = Fixture::new();
        let mut session = fx.manager();
        let a = fx.file("a.php", "a");
        let b = fx.file("b.php", "b");
        session.open(a.clone(), true).await.unwrap();
        session.open(b.clone(), true).await.unwrap();

        session.delete(&a.path).await.unwrap();
        assert_eq!(names(&session), vec!["b.php"]);
        assert_eq!(session.snapshot().active_file_path.as_deref(), Some(b.path.as_str()));

        session.delete(&b.path).await.unwrap();
        assert_eq!(session.snapshot().active_index, None);
        assert!(!Path::new(&b.path).exists());
        assert!(fx.store.session_state().unwrap().open_files.is_empty());
    }

    #[tokio::test]
    async fn delete_directory_closes_contained_files() {
        let fx = Fixture::new();
        let mut session = fx.manager();
        std::fs::create_dir(fx.root.join("lib")).unwrap();
        let inner = fx.file("lib/util.js", "x");
        let outer = fx.file("index.php", "y");
        session.open(outer.clone(), true).await.unwrap();
        session.open(inner, false).await.unwrap();

        let lib = fx.root.join("lib").to_string_lossy().to_string();
        session.delete(&lib).await.unwrap();
        assert_eq!(names(&session), vec!["index.php"]);
        assert_eq!(session.snapshot().active_file_path.as_deref(), Some(outer.path.as_str()));
    }

    #[tokio::test]
    async fn save_active_writes_buffer() {
        let fx = Fixture::new();
        let mut session = fx.manager();
        assert!(session.save_active().await.is_err());

        let a = fx.file("a.sql", "SELECT 1;");
        session.open(a.clone(), true).await.unwrap();
        session.update_content(&a.path, "SELECT 2;".into()).unwrap();
        session.save_active().await.unwrap();

        assert_eq!(std::fs::read_to_string(&a.path).unwrap(), "SELECT 2;");
        assert!(!session.active_view().unwrap().dirty);
    }

    #[tokio::test]
    async fn dispatch_returns_snapshot() {
        let fx = Fixture::new();
        let mut session = EditorSessionManager::new(fx.store.clone(), false);
        let a = fx.file("a.html", "<p>");

        let snapshot = session
            .dispatch(EditorCommand::Open {
                file: a,
                activate: true,
            })
            .await
            .unwrap();
        assert_eq!(snapshot.active_index, Some(0));
        assert!(snapshot.can_save);
        assert!(!snapshot.ai_actions_enabled);

        assert!(session.dispatch(EditorCommand::SetActive { index: 3 }).await.is_err());
    }

    #[test]
    fn editor_command_wire_format() {
        let command: EditorCommand =
            serde_json::from_str(r#"{"command":"rename","path":"/p/a.php","newName":"b.php"}"#).unwrap();
        assert!(matches!(command, EditorCommand::Rename { ref new_name, .. } if new_name == "b.php"));

        let command: EditorCommand = serde_json::from_str(r#"{"command":"saveActive"}"#).unwrap();
        assert!(matches!(command, EditorCommand::SaveActive));
    }
}
