use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::Path;
use terraform_infra::cli::{Cli, Commands};
use terraform_infra::config::ConfigManager;
use terraform_infra::inventory::InventoryBuilder;
use terraform_infra::modules::{self, ModuleType};
use terraform_infra::terraform::{parse_outputs, TerraformOutputs};
use terraform_infra::{expand_groups, GroupMap};

fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            module_name,
            inputs,
        } => {
            let module = module_name.parse::<ModuleType>()?.create();
            let result = modules::execute(module.as_ref(), &inputs);
            println!("{}", serde_json::to_string(&result)?);
            if result.failed {
                std::process::exit(1);
            }
        }
        Commands::Schema { module_name } => {
            let module = module_name.parse::<ModuleType>()?.create();
            println!("{}", module.schema().trim());
        }
        Commands::ExpandGroups { groups, map } => {
            let group_map = load_group_map(map.as_deref())?;
            for group in expand_groups(groups, &group_map) {
                println!("{group}");
            }
        }
        Commands::Inventory { outputs, key, map } => {
            let group_map = load_group_map(map.as_deref())?;
            let outputs = load_outputs(&outputs)?;
            let key = key.unwrap_or_else(|| ConfigManager::instance().inventory_output_key());

            let builder = InventoryBuilder::from_terraform_outputs(&outputs, &key, group_map)?;
            print!("{}", builder.to_yaml()?);
        }
    }

    Ok(())
}

fn load_group_map(path: Option<&Path>) -> Result<GroupMap> {
    match path {
        Some(path) => GroupMap::from_path(path),
        None => {
            warn!("no group map given, hosts keep only their assigned groups");
            Ok(GroupMap::new())
        }
    }
}

fn load_outputs(path: &Path) -> Result<TerraformOutputs> {
    info!("Reading Terraform outputs from {}", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read Terraform outputs file {}", path.display()))?;
    Ok(parse_outputs(&path.display().to_string(), &content)?)
}
