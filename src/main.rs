use ::provider_switch::core::init_logger;
use ::provider_switch::models::config::LogLevel;
use ::provider_switch::services::environment::{self, EnvironmentInjector, SystemEnv};
use ::provider_switch::services::ProviderManager;
use ::provider_switch::utils::config::{config_dir, load_settings, log_dir};
use clap::Parser;
use std::process;

mod commands;
use commands::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("✗ {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let dir = config_dir()?;

    let (mut settings, settings_warning) = load_settings(&dir);
    if cli.verbose {
        settings.log.level = LogLevel::Debug;
    }
    init_logger(&settings.log, &log_dir(&dir))?;
    if let Some(warning) = settings_warning {
        tracing::warn!(error = %warning, "读取 settings.json 失败，使用默认设置");
    }
    tracing::debug!(config_dir = %dir.display(), "配置目录");

    let injector = EnvironmentInjector::new(Box::new(SystemEnv), environment::detect()?);
    let manager = ProviderManager::new(&dir, injector);

    commands::dispatch(&manager, cli.command)
}
