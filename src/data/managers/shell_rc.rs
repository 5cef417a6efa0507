//! Shell 启动文件管理器
//!
//! 把 `.bashrc` / `.zshrc` / `config.fish` 视为不透明的行序列，只维护其中一个
//! 由标记注释开头的“托管块”：
//!
//! ```text
//! # Claude Code environment variables
//! export ANTHROPIC_BASE_URL='https://example.com'
//! export ANTHROPIC_AUTH_TOKEN='sk-xxx'
//! ```
//!
//! 核心逻辑是纯函数 [`rewrite_lines`]，文件读写只是它的外壳。
//! 同样的输入重复执行结果逐字节一致，且无论执行多少次文件中都只有一个托管块。

use crate::data::atomic::{write_atomic, FilePermissions};
use crate::data::{DataError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// 匹配 `export NAME=...` 与 fish 的 `set -gx NAME ...`
static ASSIGNMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:export\s+([A-Za-z_][A-Za-z0-9_]*)=|set\s+(?:-[A-Za-z]+\s+)*([A-Za-z_][A-Za-z0-9_]*)(?:\s|$))",
    )
    .expect("invalid assignment regex")
});

/// 目标 shell 的赋值语法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellSyntax {
    /// bash / zsh / sh：`export NAME='value'`
    Posix,
    /// fish：`set -gx NAME 'value'`
    Fish,
}

impl ShellSyntax {
    pub fn assignment(self, name: &str, value: &str) -> String {
        match self {
            ShellSyntax::Posix => format!("export {}={}", name, posix_quote(value)),
            ShellSyntax::Fish => format!("set -gx {} {}", name, fish_quote(value)),
        }
    }
}

/// 值能否写进单行赋值：换行、回车等控制字符会截断引号，让后续内容作为命令执行
pub fn is_single_line(value: &str) -> bool {
    !value.chars().any(char::is_control)
}

fn posix_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn fish_quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', r"\\").replace('\'', r"\'"))
}

/// 托管块：标记行 + 若干变量赋值行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedBlock {
    marker: String,
    syntax: ShellSyntax,
    vars: Vec<(String, String)>,
}

impl ManagedBlock {
    pub fn new(marker: impl Into<String>, syntax: ShellSyntax) -> Self {
        Self {
            marker: marker.into(),
            syntax,
            vars: Vec::new(),
        }
    }

    /// 追加一个托管变量（按调用顺序输出）
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((name.into(), value.into()));
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// 第一个含控制字符的变量名
    pub fn first_unsafe_var(&self) -> Option<&str> {
        self.vars
            .iter()
            .find(|(_, value)| !is_single_line(value))
            .map(|(name, _)| name.as_str())
    }

    /// 渲染出的块内容（不含前导空行）
    pub fn render(&self) -> Vec<String> {
        std::iter::once(self.marker.clone())
            .chain(
                self.vars
                    .iter()
                    .map(|(name, value)| self.syntax.assignment(name, value)),
            )
            .collect()
    }

    fn is_marker(&self, line: &str) -> bool {
        line.trim() == self.marker
    }

    /// 该行是否为本块托管变量的赋值行（两种语法都识别）
    fn is_managed_assignment(&self, line: &str) -> bool {
        ASSIGNMENT_REGEX
            .captures(line)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|name| self.vars.iter().any(|(var, _)| var == name.as_str()))
            .unwrap_or(false)
    }
}

/// 纯函数：用新的托管块替换旧内容中的托管块
///
/// 遇到标记行时丢弃它以及其后紧邻的托管赋值行和空行，直到遇到其他行再恢复复制；
/// 保留内容末尾的空行会被裁掉，然后追加一个空行分隔（保留内容非空时）和新块。
pub fn rewrite_lines<'a, I>(old_lines: I, block: &ManagedBlock) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut retained: Vec<String> = Vec::new();
    let mut in_block = false;

    for line in old_lines {
        if block.is_marker(line) {
            in_block = true;
            continue;
        }
        if in_block {
            if line.trim().is_empty() || block.is_managed_assignment(line) {
                continue;
            }
            in_block = false;
        }
        retained.push(line.to_string());
    }

    while retained.last().is_some_and(|line| line.trim().is_empty()) {
        retained.pop();
    }
    if !retained.is_empty() {
        retained.push(String::new());
    }
    retained.extend(block.render());
    retained
}

/// Shell 启动文件改写器
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellConfigRewriter;

impl ShellConfigRewriter {
    pub fn new() -> Self {
        Self
    }

    /// 读取文件行（文件不存在视为空）
    pub fn read_lines(&self, path: &Path) -> Result<Vec<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content.lines().map(String::from).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(DataError::io(path, e)),
        }
    }

    /// 幂等地改写文件中的托管块，必要时创建父目录
    pub fn rewrite(&self, path: &Path, block: &ManagedBlock) -> Result<()> {
        let old_lines = self.read_lines(path)?;
        let new_lines = rewrite_lines(old_lines.iter().map(String::as_str), block);

        let mut content = new_lines.join("\n");
        content.push('\n');
        write_atomic(path, content.as_bytes(), FilePermissions::Inherit)?;

        tracing::debug!(
            path = %path.display(),
            marker = block.marker(),
            "已更新 shell 启动文件托管块"
        );
        Ok(())
    }
}
