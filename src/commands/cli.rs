//! 命令行参数定义

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Claude Code 提供商配置管理器
#[derive(Parser)]
#[command(name = "provider-switch", version)]
#[command(about = "管理并快速切换 Claude Code 的 API 提供商")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 输出调试日志
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 列出所有提供商
    List,
    /// 切换提供商
    Switch {
        /// 提供商 ID
        #[arg(required_unless_present = "clear")]
        provider: Option<String>,
        /// 清除当前提供商（不修改环境变量）
        #[arg(long, conflicts_with = "provider")]
        clear: bool,
    },
    /// 添加提供商
    Add {
        /// 提供商 ID
        id: String,
        /// 提供商名称
        name: String,
        /// Base URL
        base_url: String,
        /// API Key
        api_key: String,
        /// 描述
        #[arg(long, default_value = "")]
        description: String,
    },
    /// 更新提供商（只修改指定的字段）
    Update {
        /// 提供商 ID
        id: String,
        /// 提供商名称
        #[arg(long)]
        name: Option<String>,
        /// Base URL
        #[arg(long, alias = "base_url")]
        base_url: Option<String>,
        /// API Key
        #[arg(long, alias = "api_key")]
        api_key: Option<String>,
        /// 描述
        #[arg(long)]
        description: Option<String>,
    },
    /// 删除提供商
    Delete {
        /// 提供商 ID
        id: String,
    },
    /// 显示当前状态
    Status,
    /// 导出配置
    Export {
        /// 导出文件路径
        file: PathBuf,
        /// 包含 API Keys
        #[arg(long)]
        include_keys: bool,
    },
    /// 导入配置
    Import {
        /// 导入文件路径
        file: PathBuf,
        /// 合并模式（保留现有配置）
        #[arg(long)]
        merge: bool,
        /// 强制覆盖冲突的提供商
        #[arg(long, requires = "merge", conflicts_with = "interactive")]
        force: bool,
        /// 逐个确认是否覆盖冲突的提供商
        #[arg(long, short, requires = "merge")]
        interactive: bool,
    },
}
