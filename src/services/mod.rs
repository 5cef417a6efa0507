// 服务层模块
//
// - provider_store: 提供商存储（providers.json）
// - active_selection: 当前激活提供商（current.json）
// - environment: 环境变量注入与持久化
// - transfer: 配置导入/导出
// - provider_manager: 组合以上服务的业务入口

pub mod active_selection;
pub mod environment;
pub mod provider_manager;
pub mod provider_store;
pub mod transfer;


// 重新导出服务
pub use active_selection::ActiveSelectionTracker;
pub use environment::{
    ActivationOutcome, EnvironmentInjector, EnvironmentSnapshot, ProcessEnv, SystemEnv,
};
pub use provider_manager::{ExportSummary, ProviderManager, StatusReport};
pub use provider_store::{ProviderStore, RemovedProvider};
pub use transfer::{ConflictPolicy, ConflictResolver};
