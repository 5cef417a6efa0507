//! Provider 数据类型定义
//!
//! - `ProviderRecord`: 单个提供商配置（以 id 为键存放在集合中）
//! - `ProviderCollection`: 保持插入顺序的 id → 配置映射
//! - `ProviderPatch`: 部分更新，只应用提供了的字段

use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Serialize};

// ==================== ProviderRecord ====================

/// 单个提供商配置
///
/// 字段名与 `providers.json` 的磁盘格式一致。缺失字段按空字符串处理。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub description: String,
}

impl ProviderRecord {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            description: description.into(),
        }
    }

    /// Base URL 与 API Key 都非空才算已配置，未配置的记录不能被激活
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    /// 应用部分更新
    pub fn apply(&mut self, patch: &ProviderPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(base_url) = &patch.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(api_key) = &patch.api_key {
            self.api_key = api_key.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
    }

    /// 去掉 API Key 的副本（用于不含密钥的导出）
    pub fn redacted(&self) -> Self {
        Self {
            api_key: String::new(),
            ..self.clone()
        }
    }
}

// ==================== ProviderPatch ====================

/// 部分更新：`None` 表示保持原值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderPatch {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub description: Option<String>,
}

impl ProviderPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.base_url.is_none()
            && self.api_key.is_none()
            && self.description.is_none()
    }
}

// ==================== ProviderCollection ====================

/// 有序的提供商集合（保持插入顺序，用于展示）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderCollection {
    entries: LinkedHashMap<String, ProviderRecord>,
}

impl ProviderCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ProviderRecord> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ProviderRecord> {
        self.entries.get_mut(id)
    }

    /// 插入或替换；已存在的 id 保持原位置
    pub fn upsert(&mut self, id: impl Into<String>, record: ProviderRecord) {
        let id = id.into();
        match self.entries.get_mut(&id) {
            Some(existing) => *existing = record,
            None => {
                self.entries.insert(id, record);
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<ProviderRecord> {
        self.entries.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProviderRecord)> {
        self.entries.iter().map(|(id, record)| (id.as_str(), record))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, ProviderRecord)> for ProviderCollection {
    fn from_iter<T: IntoIterator<Item = (String, ProviderRecord)>>(iter: T) -> Self {
        let mut collection = Self::new();
        for (id, record) in iter {
            collection.upsert(id, record);
        }
        collection
    }
}

/// 内置默认提供商（首次使用或存储文件损坏时使用，均未配置）
pub fn default_providers() -> ProviderCollection {
    [
        (
            "qwen",
            ProviderRecord::new(
                "阿里云通义千问",
                "https://dashscope.aliyuncs.com/api/v2/apps/claude-code-proxy",
                "",
                "阿里云通义千问系列模型",
            ),
        ),
        (
            "kimi",
            ProviderRecord::new(
                "Kimi (月之暗面)",
                "https://api.moonshot.cn/anthropic/",
                "",
                "月之暗面 Kimi 模型",
            ),
        ),
        (
            "zhipu",
            ProviderRecord::new(
                "智谱 GLM-4.5",
                "https://open.bigmodel.cn/api/anthropic",
                "",
                "智谱 AI GLM-4.5 模型",
            ),
        ),
        (
            "custom",
            ProviderRecord::new("自定义提供商", "", "", "自定义 API 提供商"),
        ),
    ]
    .into_iter()
    .map(|(id, record)| (id.to_string(), record))
    .collect()
}

// ==================== 展示用描述符 ====================

/// 提供商描述符（列表展示用，API Key 已脱敏）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub description: String,
    pub api_key_preview: String,
    pub is_current: bool,
    pub is_configured: bool,
}

impl ProviderDescriptor {
    pub fn from_record(id: &str, record: &ProviderRecord, active_id: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: record.name.clone(),
            base_url: record.base_url.clone(),
            description: record.description.clone(),
            api_key_preview: mask_api_key(&record.api_key),
            is_current: active_id == Some(id),
            is_configured: record.is_configured(),
        }
    }
}

/// API Key 脱敏：保留前后各 4 位
pub fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", prefix, suffix)
}
