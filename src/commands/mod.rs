pub mod cli;
pub mod provider_commands;
pub mod transfer_commands;

pub use cli::{Cli, Commands};

use ::provider_switch::models::provider::{ProviderPatch, ProviderRecord};
use ::provider_switch::services::ProviderManager;
use anyhow::Result;

/// 执行子命令
pub fn dispatch(manager: &ProviderManager, command: Commands) -> Result<()> {
    match command {
        Commands::List => provider_commands::list(manager),
        Commands::Switch {
            provider: Some(id),
            clear: false,
        } => provider_commands::switch(manager, &id),
        Commands::Switch { .. } => provider_commands::clear(manager),
        Commands::Add {
            id,
            name,
            base_url,
            api_key,
            description,
        } => provider_commands::add(
            manager,
            &id,
            ProviderRecord::new(name, base_url, api_key, description),
        ),
        Commands::Update {
            id,
            name,
            base_url,
            api_key,
            description,
        } => provider_commands::update(
            manager,
            &id,
            ProviderPatch {
                name,
                base_url,
                api_key,
                description,
            },
        ),
        Commands::Delete { id } => provider_commands::delete(manager, &id),
        Commands::Status => provider_commands::status(manager),
        Commands::Export { file, include_keys } => {
            transfer_commands::export(manager, &file, include_keys)
        }
        Commands::Import {
            file,
            merge,
            force,
            interactive,
        } => transfer_commands::import(manager, &file, merge, force, interactive),
    }
}
