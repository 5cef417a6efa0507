//! 配置导入/导出文档格式

use super::provider::ProviderCollection;
use serde::{Deserialize, Serialize};

/// 当前导出格式版本
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

/// 导出元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub version: String,
    pub export_time: String,
    pub total_providers: usize,
}

/// 导出文档：元数据 + 与 `providers.json` 同构的提供商集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferDocument {
    /// 导入时可缺省
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_info: Option<ExportInfo>,
    pub providers: ProviderCollection,
}

/// 导入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// 清空现有配置，导入内容原样成为新集合
    Replace,
    /// 保留现有配置，逐条合并
    Merge,
}

/// 导入结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// 导入后的完整集合（尚未落盘）
    pub collection: ProviderCollection,
    /// 计入导入数的条目数
    pub imported: usize,
    pub added: Vec<String>,
    pub overwritten: Vec<String>,
    pub skipped: Vec<String>,
}
