//! 数据持久化层
//!
//! - `error`: 统一错误类型定义
//! - `atomic`: 临时文件 + rename 的原子写入
//! - `lock`: 基于 `fs2` 的跨进程文件锁
//! - `managers`: JSON 与 shell 配置文件管理器

pub mod atomic;
pub mod error;
pub mod lock;
pub mod managers;

pub use error::{DataError, Result};
