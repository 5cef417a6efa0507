use crate::models::config::{LogConfig, LogFormat, LogLevel, LogOutput};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 文件日志的后台写入 guard，进程存活期间保持
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_PREFIX: &str = "provider-switch";

/// 初始化日志系统
///
/// 支持基于配置的日志输出，包括：
/// - 日志级别（trace/debug/info/warn/error），`RUST_LOG` 优先
/// - 输出格式（JSON/纯文本）
/// - 输出目标（控制台/文件/both）；控制台输出写到 stderr，不干扰命令输出
///
/// `default_log_dir` 在配置未指定 `file_path` 时作为日志目录。
pub fn init_logger(config: &LogConfig, default_log_dir: &Path) -> anyhow::Result<()> {
    let filter = create_env_filter(config.level);

    let console_layer = matches!(config.output, LogOutput::Console | LogOutput::Both)
        .then(|| create_console_layer(config.format));

    let file_layer = if matches!(config.output, LogOutput::File | LogOutput::Both) {
        let dir = config
            .file_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_log_dir.to_path_buf());
        Some(create_file_layer(config.format, &dir)?)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("日志系统已初始化，不能重复初始化: {e}"))?;

    tracing::debug!(
        level = config.level.as_str(),
        format = ?config.format,
        output = ?config.output,
        "日志系统初始化完成"
    );
    Ok(())
}

/// 创建环境过滤器
fn create_env_filter(level: LogLevel) -> EnvFilter {
    // 优先从环境变量读取，例如 RUST_LOG=provider_switch=trace
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("provider_switch={}", level.as_str())))
}

fn create_console_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(cfg!(debug_assertions))
            .with_thread_ids(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    }
}

fn create_file_layer<S>(
    format: LogFormat,
    log_dir: &Path,
) -> anyhow::Result<Box<dyn Layer<S> + Send + Sync + 'static>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    std::fs::create_dir_all(log_dir)?;
    let file_appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = non_blocking(file_appender);
    if FILE_GUARD.set(guard).is_err() {
        anyhow::bail!("文件日志已初始化，不能重复初始化");
    }

    Ok(match format {
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .boxed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_layer_creates_log_dir() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");

        let layer = create_file_layer::<tracing_subscriber::Registry>(LogFormat::Json, &log_dir);

        assert!(layer.is_ok());
        assert!(log_dir.is_dir());
    }
}
