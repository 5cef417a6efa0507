//! 环境变量的持久化方式
//!
//! - Windows：`setx` 写入用户级环境变量，失败只产生警告
//! - 其他平台：改写 shell 启动文件中的托管块，失败为致命错误

use crate::core::{AppError, AppResult};
use crate::data::managers::{ManagedBlock, ShellConfigRewriter, ShellSyntax};
use crate::utils::command::CommandExecutor;
use anyhow::anyhow;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// shell 启动文件中托管块的标记行
pub const SHELL_BLOCK_MARKER: &str = "# Claude Code environment variables";

/// `setx` 单次调用的超时时间
pub const SETX_TIMEOUT: Duration = Duration::from_secs(10);

/// 持久化能力：让新开的终端也能读到变量
pub trait DurablePersister: Send + Sync {
    /// 持久化目标的描述（文件路径或“用户环境变量”）
    fn target(&self) -> String;

    /// 持久化一组变量，返回非致命警告
    fn persist(&self, vars: &[(&str, &str)]) -> AppResult<Vec<String>>;
}

/// 通过 `setx` 写入 Windows 用户环境变量
pub struct RegistryPersister {
    program: String,
    executor: CommandExecutor,
}

impl RegistryPersister {
    pub fn new() -> Self {
        Self::with_program("setx", SETX_TIMEOUT)
    }

    /// 指定执行的程序（测试时替换 `setx`）
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            executor: CommandExecutor::new(timeout),
        }
    }
}

impl Default for RegistryPersister {
    fn default() -> Self {
        Self::new()
    }
}

impl DurablePersister for RegistryPersister {
    fn target(&self) -> String {
        "用户环境变量 (setx)".to_string()
    }

    fn persist(&self, vars: &[(&str, &str)]) -> AppResult<Vec<String>> {
        let mut warnings = Vec::new();
        for &(name, value) in vars {
            let result = self.executor.run(&self.program, &[name, value]);
            if result.success {
                tracing::debug!(var = name, "setx 执行成功");
                continue;
            }
            let reason = result.failure_reason();
            tracing::warn!(
                var = name,
                timed_out = result.timed_out,
                reason = %reason,
                "持久化环境变量失败"
            );
            warnings.push(format!("{} 持久化失败: {}", name, reason));
        }
        Ok(warnings)
    }
}

/// 改写 shell 启动文件中的托管块
pub struct ShellRcPersister {
    rc_file: PathBuf,
    syntax: ShellSyntax,
    rewriter: ShellConfigRewriter,
}

impl ShellRcPersister {
    pub fn new(rc_file: impl Into<PathBuf>, syntax: ShellSyntax) -> Self {
        Self {
            rc_file: rc_file.into(),
            syntax,
            rewriter: ShellConfigRewriter::new(),
        }
    }

    /// 根据 `$SHELL` 与主目录确定启动文件
    pub fn for_shell(shell: Option<&str>, home: &Path) -> Self {
        let (rc_file, syntax) = resolve_shell_rc(shell, home);
        Self::new(rc_file, syntax)
    }

    pub fn rc_file(&self) -> &Path {
        &self.rc_file
    }
}

impl DurablePersister for ShellRcPersister {
    fn target(&self) -> String {
        self.rc_file.display().to_string()
    }

    fn persist(&self, vars: &[(&str, &str)]) -> AppResult<Vec<String>> {
        let block = vars
            .iter()
            .fold(ManagedBlock::new(SHELL_BLOCK_MARKER, self.syntax), |block, (name, value)| {
                block.var(*name, *value)
            });
        if let Some(name) = block.first_unsafe_var() {
            return Err(AppError::PersistenceFailed {
                target: self.target(),
                reason: format!("{} 含有换行或控制字符", name),
            });
        }

        self.rewriter
            .rewrite(&self.rc_file, &block)
            .map_err(|e| AppError::PersistenceFailed {
                target: self.target(),
                reason: e.to_string(),
            })?;
        tracing::info!(rc_file = %self.rc_file.display(), "已更新 shell 启动文件");
        Ok(Vec::new())
    }
}

/// `$SHELL` → 启动文件路径与语法
///
/// zsh → `~/.zshrc`；fish → `~/.config/fish/config.fish`；其他或未设置 → `~/.bashrc`
pub fn resolve_shell_rc(shell: Option<&str>, home: &Path) -> (PathBuf, ShellSyntax) {
    let shell_name = shell
        .map(Path::new)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or("");

    if shell_name.contains("zsh") {
        (home.join(".zshrc"), ShellSyntax::Posix)
    } else if shell_name.contains("fish") {
        (
            home.join(".config").join("fish").join("config.fish"),
            ShellSyntax::Fish,
        )
    } else {
        (home.join(".bashrc"), ShellSyntax::Posix)
    }
}

/// 按当前平台选择持久化方式（启动时调用一次）
pub fn detect() -> anyhow::Result<Box<dyn DurablePersister>> {
    if cfg!(target_os = "windows") {
        return Ok(Box::new(RegistryPersister::new()));
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("无法获取用户主目录"))?;
    let shell = std::env::var("SHELL").ok();
    let persister = ShellRcPersister::for_shell(shell.as_deref(), &home);
    tracing::debug!(rc_file = %persister.rc_file().display(), "使用 shell 启动文件持久化");
    Ok(Box::new(persister))
}
