//! 数据管理器实现
//!
//! - `json`: 强类型 JSON 读写（保持字段顺序）
//! - `shell_rc`: shell 启动文件中受管变量块的重写

pub mod json;
pub mod shell_rc;

pub use json::JsonManager;
pub use shell_rc::{is_single_line, ManagedBlock, ShellConfigRewriter, ShellSyntax};
