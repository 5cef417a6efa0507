//! 环境变量注入
//!
//! 激活提供商时先设置当前进程的环境变量，再交给 [`DurablePersister`] 持久化，
//! 让之后打开的终端也能读到。

pub mod persister;
pub mod process_env;

pub use persister::{
    detect, resolve_shell_rc, DurablePersister, RegistryPersister, ShellRcPersister,
    SHELL_BLOCK_MARKER,
};
pub use process_env::{MemoryEnv, ProcessEnv, SystemEnv};

use crate::core::{AppError, AppResult};
use crate::data::managers::is_single_line;
use crate::models::provider::{mask_api_key, ProviderRecord};

pub const ENV_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_AUTH_TOKEN: &str = "ANTHROPIC_AUTH_TOKEN";

/// 激活结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// 进程内变量与持久化均已完成
    Persisted { target: String },
    /// 进程内变量已生效，但持久化有警告
    Partial {
        target: String,
        warnings: Vec<String>,
    },
}

impl ActivationOutcome {
    pub fn warnings(&self) -> &[String] {
        match self {
            ActivationOutcome::Persisted { .. } => &[],
            ActivationOutcome::Partial { warnings, .. } => warnings,
        }
    }
}

/// 当前环境快照（不落盘）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    pub active_id: Option<String>,
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    /// 环境变量与激活提供商的配置不一致
    pub drift: bool,
}

impl EnvironmentSnapshot {
    /// 脱敏后的 token，用于展示
    pub fn token_preview(&self) -> Option<String> {
        self.auth_token.as_deref().map(mask_api_key)
    }

    /// 与激活记录比较，更新 `drift`
    pub fn with_drift_against(mut self, record: Option<&ProviderRecord>) -> Self {
        self.drift = match record {
            Some(record) => {
                self.base_url.as_deref() != Some(record.base_url.as_str())
                    || self.auth_token.as_deref() != Some(record.api_key.as_str())
            }
            None => false,
        };
        self
    }
}

pub struct EnvironmentInjector {
    env: Box<dyn ProcessEnv>,
    persister: Box<dyn DurablePersister>,
}

impl EnvironmentInjector {
    pub fn new(env: Box<dyn ProcessEnv>, persister: Box<dyn DurablePersister>) -> Self {
        Self { env, persister }
    }

    pub fn persister_target(&self) -> String {
        self.persister.target()
    }

    /// 把提供商的 Base URL 与 API Key 注入环境
    ///
    /// 两者任一为空时在修改任何状态前返回 `IncompleteProfile`；
    /// 含换行或控制字符时同样在修改前返回 `UnsafeValue`。
    /// 进程内变量总会被设置；持久化失败是否致命由持久化方式决定。
    pub fn activate(&self, id: &str, record: &ProviderRecord) -> AppResult<ActivationOutcome> {
        let endpoint = record.base_url.as_str();
        let token = record.api_key.as_str();
        if endpoint.is_empty() || token.is_empty() {
            return Err(AppError::incomplete(id, endpoint.is_empty(), token.is_empty()));
        }
        for (field, value) in [("Base URL", endpoint), ("API Key", token)] {
            if !is_single_line(value) {
                return Err(AppError::UnsafeValue {
                    id: id.to_string(),
                    field: field.to_string(),
                });
            }
        }

        self.env.set(ENV_BASE_URL, endpoint);
        self.env.set(ENV_AUTH_TOKEN, token);
        tracing::debug!(provider = id, "已设置进程环境变量");

        let warnings = self
            .persister
            .persist(&[(ENV_BASE_URL, endpoint), (ENV_AUTH_TOKEN, token)])?;

        let target = self.persister.target();
        if warnings.is_empty() {
            Ok(ActivationOutcome::Persisted { target })
        } else {
            Ok(ActivationOutcome::Partial { target, warnings })
        }
    }

    /// 读取当前进程中的两个变量
    pub fn snapshot(&self, active_id: Option<String>) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            active_id,
            base_url: self.env.get(ENV_BASE_URL).filter(|v| !v.is_empty()),
            auth_token: self.env.get(ENV_AUTH_TOKEN).filter(|v| !v.is_empty()),
            drift: false,
        }
    }
}
