// lib.rs - 暴露服务层给 CLI 使用

pub mod core; // 核心基础设施层
pub mod data; // 数据持久化层
pub mod models;
pub mod services;
pub mod utils;

pub use models::*;
pub use services::{
    ActivationOutcome, ActiveSelectionTracker, EnvironmentInjector, EnvironmentSnapshot,
    ProviderManager, ProviderStore,
};

// 重新导出常用类型
pub use anyhow::{Context, Result};

pub use core::{init_logger, AppError, AppResult};
