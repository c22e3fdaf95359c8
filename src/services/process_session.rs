//! # 终端进程会话服务
//!
//! 管理编辑器内嵌终端背后的**持久 shell 子进程**，以及与之无关的一次性命令执行。
//!
//! ## 持久会话
//! - 同一时刻最多只有一个存活的子进程：`start` 会先终止并回收旧进程，再启动新进程
//! - stdout / stderr 各由一个转发任务读取，按到达顺序以文本块推送给 `TerminalSink`；
//!   被 read 边界截断的 UTF-8 多字节序列会在下一块中拼接完整
//! - 子进程自然退出后推送退出码，并按 `RestartPolicy` 自动重启；
//!   显式 `kill` 永远不会触发重启
//!
//! ## 进程归属
//! 每次 `start` 生成一个监督任务（supervisor），子进程句柄只归它所有：
//! 等待退出、终止、回收、按策略重启都在这一个任务内完成。
//! `start` / `kill` 通过生命周期互斥锁串行化，并等待旧监督任务结束，
//! 因此新进程启动前旧进程一定已被回收。
//!
//! ## 一次性命令
//! `run_once` 通过平台 shell 执行一条命令，等待退出后返回退出码和完整输出，
//! 不影响持久会话，也没有超时。

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::models::process::{CommandOutput, OutputStream, TerminalEvent};
use crate::utils::path;

/// 子进程退出后等待输出转发任务读完剩余数据的最长时间
///
/// shell 的后台子进程可能继承并一直持有输出管道，不能无限等待。
const FORWARDER_GRACE: Duration = Duration::from_millis(200);

/// 单次读取的缓冲区大小
const READ_CHUNK_SIZE: usize = 4096;

// ============ 事件接收端 ============

/// 终端事件接收端
///
/// 桌面端由 Tauri 事件实现（推送到前端终端组件），测试中使用 mpsc 通道。
pub trait TerminalSink: Send + Sync + 'static {
    fn emit(&self, event: TerminalEvent);
}

impl TerminalSink for mpsc::UnboundedSender<TerminalEvent> {
    fn emit(&self, event: TerminalEvent) {
        // 接收端已关闭说明没有人关心输出了，直接丢弃
        let _ = self.send(event);
    }
}

// ============ 重启策略 ============

/// 持久会话的自动重启策略
///
/// 第 n 次连续重启前等待 `initial_delay * 2^(n-1)`，上限 `max_delay`；
/// 连续重启超过 `max_attempts` 次后放弃。子进程存活超过 `stable_after`
/// 视为一次正常运行，连续计数清零。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub enabled: bool,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub stable_after: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
            stable_after: Duration::from_secs(10),
        }
    }
}

impl RestartPolicy {
    /// 不自动重启
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// 第 `attempt` 次（从 1 开始）连续重启前的等待时间
    ///
    /// # 返回值
    /// 超出重启预算或策略已禁用时返回 `None`
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled || attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        Some(self.initial_delay.saturating_mul(factor).min(self.max_delay))
    }
}

// ============ shell 选择 ============

/// 持久会话使用的 shell 程序及参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellProgram {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellProgram {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// 当前平台的默认交互 shell
    ///
    /// - Windows: `powershell.exe -NoLogo`
    /// - 其他平台: 存在 `/bin/bash` 时使用 bash，否则 `/bin/sh`
    pub fn platform_default() -> Self {
        if cfg!(target_os = "windows") {
            Self::new("powershell.exe", &["-NoLogo"])
        } else if Path::new("/bin/bash").exists() {
            Self::new("/bin/bash", &[])
        } else {
            Self::new("/bin/sh", &[])
        }
    }
}

/// 构造一次性命令的平台 shell 调用
fn one_shot_command(command_line: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut command = Command::new("powershell.exe");
        command.args(["-NoLogo", "-NoProfile", "-Command", command_line]);
        command
    } else {
        let mut command = Command::new("/bin/sh");
        command.args(["-c", command_line]);
        command
    }
}

// ============ UTF-8 分块拼接 ============

/// 把按字节到达的输出拼接为完整的 UTF-8 文本块
///
/// 末尾不完整的多字节序列暂存到下一次 `push`；
/// 真正非法的字节按 `U+FFFD` 替换，不会阻塞后续输出。
#[derive(Debug, Default)]
struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    fn push(&mut self, bytes: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(bytes);
        let split = self.pending.len() - incomplete_tail_len(&self.pending);
        if split == 0 {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending[..split]).into_owned();
        self.pending.drain(..split);
        Some(text)
    }

    /// 流结束时输出剩余字节
    fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(text)
    }
}

/// 末尾未完成的 UTF-8 序列长度（0..=3）
fn incomplete_tail_len(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let byte = bytes[bytes.len() - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let expected = match byte {
            0xF0..=0xFF => 4,
            0xE0..=0xEF => 3,
            0xC0..=0xDF => 2,
            _ => 1,
        };
        return if expected > back { back } else { 0 };
    }
    0
}

/// 启动一个输出转发任务
fn spawn_forwarder<R>(mut reader: R, stream: OutputStream, sink: Arc<dyn TerminalSink>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let mut chunker = Utf8Chunker::default();
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if let Some(data) = chunker.push(&buf[..n]) {
                        sink.emit(TerminalEvent::Output { stream, data });
                    }
                }
                Err(e) => {
                    log::warn!("读取终端输出失败 ({:?}): {}", stream, e);
                    break;
                }
            }
        }
        if let Some(data) = chunker.finish() {
            sink.emit(TerminalEvent::Output { stream, data });
        }
    })
}

// ============ 持久会话 ============

/// 会话内各任务共享的状态
struct Shared {
    sink: Arc<dyn TerminalSink>,
    shell: ShellProgram,
    policy: RestartPolicy,
    /// 当前子进程的 stdin；没有存活进程时为 `None`
    stdin: Mutex<Option<ChildStdin>>,
    /// 当前子进程 PID；0 表示没有存活进程
    pid: AtomicU32,
}

/// 一个正在运行的 shell 子进程
struct RunningShell {
    child: Child,
    forwarders: Vec<JoinHandle<()>>,
    started_at: Instant,
}

impl RunningShell {
    /// 等待输出转发任务读完管道中的剩余数据
    async fn drain(&mut self) {
        for handle in self.forwarders.drain(..) {
            if tokio::time::timeout(FORWARDER_GRACE, handle).await.is_err() {
                log::debug!("终端输出管道仍被占用，停止等待");
            }
        }
    }
}

impl Shared {
    /// 启动 shell 子进程并接好 stdin 和输出转发
    async fn spawn(&self, cwd: &Path) -> Result<RunningShell, String> {
        let mut child = Command::new(&self.shell.program)
            .args(&self.shell.args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("启动 shell 失败 ({}): {}", self.shell.program, e))?;

        let mut forwarders = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(spawn_forwarder(stdout, OutputStream::Stdout, self.sink.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(spawn_forwarder(stderr, OutputStream::Stderr, self.sink.clone()));
        }

        *self.stdin.lock().await = child.stdin.take();
        let pid = child.id().unwrap_or(0);
        self.pid.store(pid, Ordering::SeqCst);
        log::info!("终端 shell 已启动: {} (pid {})", self.shell.program, pid);

        Ok(RunningShell {
            child,
            forwarders,
            started_at: Instant::now(),
        })
    }

    /// 清除当前进程的 stdin 和 PID
    async fn detach(&self) {
        *self.stdin.lock().await = None;
        self.pid.store(0, Ordering::SeqCst);
    }
}

/// 监督任务：持有子进程直到被停止或放弃重启
async fn supervise(
    shared: Arc<Shared>,
    cwd: PathBuf,
    mut running: RunningShell,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut attempts: u32 = 0;

    loop {
        let exited = tokio::select! {
            _ = &mut stop_rx => None,
            status = running.child.wait() => Some(status),
        };

        let Some(status) = exited else {
            // 显式停止：终止并回收，不重启
            shared.detach().await;
            if let Err(e) = running.child.start_kill() {
                log::warn!("终止 shell 失败: {}", e);
            }
            let code = running.child.wait().await.ok().and_then(|s| s.code());
            running.drain().await;
            shared.sink.emit(TerminalEvent::Exit { code });
            log::info!("终端 shell 已终止");
            return;
        };

        let code = match status {
            Ok(status) => status.code(),
            Err(e) => {
                log::warn!("等待 shell 退出失败: {}", e);
                None
            }
        };
        running.drain().await;
        shared.detach().await;
        shared.sink.emit(TerminalEvent::Exit { code });
        log::info!("终端 shell 已退出: {:?}", code);

        if running.started_at.elapsed() >= shared.policy.stable_after {
            attempts = 0;
        }
        attempts += 1;

        let Some(delay) = shared.policy.delay_for(attempts) else {
            if shared.policy.enabled {
                let made = attempts - 1;
                log::warn!("终端 shell 连续重启 {} 次后放弃", made);
                shared.sink.emit(TerminalEvent::GaveUp { attempts: made });
            }
            return;
        };

        // drain 期间可能已收到停止请求，此时不再宣告重启
        if !matches!(stop_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
            log::info!("终端 shell 退出后收到停止请求，不再重启");
            return;
        }

        shared.sink.emit(TerminalEvent::Restarting {
            attempt: attempts,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        });

        tokio::select! {
            _ = &mut stop_rx => return,
            _ = tokio::time::sleep(delay) => {}
        }

        running = match shared.spawn(&cwd).await {
            Ok(running) => running,
            Err(e) => {
                log::error!("{}", e);
                shared.sink.emit(TerminalEvent::GaveUp { attempts });
                return;
            }
        };
    }
}

/// 一个监督任务的句柄
struct Supervisor {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Supervisor {
    /// 通知监督任务停止并等待其结束（子进程随之被回收）
    async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            log::warn!("终端监督任务异常结束: {}", e);
        }
    }
}

/// 持久终端会话
pub struct ProcessSession {
    shared: Arc<Shared>,
    /// 生命周期锁：串行化 start / kill
    lifecycle: Mutex<Option<Supervisor>>,
}

impl ProcessSession {
    /// 使用平台默认 shell 和默认重启策略创建会话（不会立即启动进程）
    pub fn new(sink: Arc<dyn TerminalSink>) -> Self {
        Self::with_shell(sink, ShellProgram::platform_default(), RestartPolicy::default())
    }

    pub fn with_shell(sink: Arc<dyn TerminalSink>, shell: ShellProgram, policy: RestartPolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                sink,
                shell,
                policy,
                stdin: Mutex::new(None),
                pid: AtomicU32::new(0),
            }),
            lifecycle: Mutex::new(None),
        }
    }

    /// 启动持久 shell
    ///
    /// 已有进程时先终止并回收，再启动新进程。
    ///
    /// # 参数
    /// - `working_dir` - 工作目录，`None` 时使用用户主目录
    ///
    /// # 返回值
    /// 启动成功返回 `true`；启动失败记录日志并返回 `false`
    pub async fn start(&self, working_dir: Option<&Path>) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Some(previous) = lifecycle.take() {
            previous.stop().await;
        }

        let cwd = working_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(path::default_working_dir);

        let running = match self.shared.spawn(&cwd).await {
            Ok(running) => running,
            Err(e) => {
                log::error!("{}", e);
                return false;
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(supervise(self.shared.clone(), cwd, running, stop_rx));
        *lifecycle = Some(Supervisor { stop_tx, handle });
        true
    }

    /// 向 shell 的 stdin 写入原始数据
    ///
    /// # 返回值
    /// 没有存活进程或写入失败时返回 `false`
    pub async fn send(&self, data: &str) -> bool {
        let mut stdin = self.shared.stdin.lock().await;
        let Some(writer) = stdin.as_mut() else {
            return false;
        };

        let result = match writer.write_all(data.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("写入终端失败: {}", e);
                false
            }
        }
    }

    /// 发送一行命令（自动追加换行）
    pub async fn send_line(&self, command: &str) -> bool {
        self.send(&format!("{}\n", command)).await
    }

    /// 终止持久 shell，不会触发自动重启
    ///
    /// # 返回值
    /// 没有运行中（或等待重启中）的会话时返回 `false`
    pub async fn kill(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock().await;
        match lifecycle.take() {
            Some(supervisor) => {
                let live = !supervisor.handle.is_finished();
                supervisor.stop().await;
                live
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.pid.load(Ordering::SeqCst) != 0
    }

    /// 当前子进程 PID
    pub fn pid(&self) -> Option<u32> {
        match self.shared.pid.load(Ordering::SeqCst) {
            0 => None,
            pid => Some(pid),
        }
    }
}

/// 通过平台 shell 执行一次性命令
///
/// # 参数
/// - `command_line` - 完整命令行
/// - `working_dir` - 工作目录，`None` 时使用用户主目录
///
/// # 错误
/// 进程无法启动时返回错误；命令本身失败（非零退出码）不算错误
pub async fn run_once(command_line: &str, working_dir: Option<&Path>) -> Result<CommandOutput, String> {
    let cwd = working_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(path::default_working_dir);

    let output = one_shot_command(command_line)
        .current_dir(&cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("执行命令失败: {}", e))?;

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
