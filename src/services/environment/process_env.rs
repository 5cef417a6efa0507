//! 进程环境变量上下文
//!
//! 注入器不直接调用 `std::env`，而是通过 [`ProcessEnv`] 读写，测试中可替换为内存实现。

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

pub trait ProcessEnv: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
}

/// 当前进程的真实环境变量
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnv;

impl ProcessEnv for SystemEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set(&self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }
}

/// 内存中的环境变量表
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }
}

impl ProcessEnv for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.vars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }
}
