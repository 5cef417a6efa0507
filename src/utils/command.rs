use std::io;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// 命令执行结果
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl CommandResult {
    pub fn from_output(output: Output) -> Self {
        CommandResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
            timed_out: false,
        }
    }

    pub fn from_error(error: io::Error) -> Self {
        CommandResult {
            success: false,
            stdout: String::new(),
            stderr: error.to_string(),
            exit_code: None,
            timed_out: false,
        }
    }

    fn timeout(timeout: Duration) -> Self {
        CommandResult {
            success: false,
            stdout: String::new(),
            stderr: format!("命令执行超时（{}s）", timeout.as_secs_f32()),
            exit_code: None,
            timed_out: true,
        }
    }

    /// 面向用户的一行失败描述
    pub fn failure_reason(&self) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else if let Some(code) = self.exit_code {
            format!("退出码 {code}")
        } else {
            "进程异常退出".to_string()
        }
    }
}

/// 命令执行器
///
/// 直接执行程序（不经过 shell），参数原样传递，避免引号转义问题。
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        CommandExecutor { timeout }
    }

    /// 执行命令，超时后终止子进程
    pub fn run(&self, program: &str, args: &[&str]) -> CommandResult {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(target_os = "windows")]
        command.creation_flags(0x08000000); // CREATE_NO_WINDOW

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return CommandResult::from_error(e),
        };

        self.wait_with_timeout(child)
    }

    fn wait_with_timeout(&self, mut child: Child) -> CommandResult {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => {
                    return match child.wait_with_output() {
                        Ok(output) => CommandResult::from_output(output),
                        Err(e) => CommandResult::from_error(e),
                    };
                }
                Ok(None) if Instant::now() >= deadline => {
                    if let Err(e) = child.kill() {
                        tracing::warn!(error = ?e, "终止超时子进程失败");
                    }
                    let _ = child.wait();
                    return CommandResult::timeout(self.timeout);
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return CommandResult::from_error(e),
            }
        }
    }
}
