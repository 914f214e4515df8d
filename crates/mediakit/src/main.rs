use anyhow::{bail, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::path::PathBuf;

use mediakitapp::config::MediakitConfig;
use mediakitapp::dispatch::{self, Operation, Request};
use mediakitapp::service::ContentService;
use mediakitapp::store::{EntryBackend, MetaBackend};

mod args;
mod render;
use args::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_dirs = ProjectDirs::from("com", "mediakit", "mediakit");
    let config_file = project_dirs
        .as_ref()
        .map(|dirs| dirs.config_dir().join("mediakit.toml"));
    let config = MediakitConfig::load(config_file.as_deref())?;

    let data_dir = resolve_data_dir(&cli, &config, project_dirs.as_ref())?;
    let service = ContentService::new(
        EntryBackend::open(&data_dir).context("opening the form entry store")?,
        MetaBackend::open(&data_dir).context("opening the post meta store")?,
    );

    let request = build_request(&cli)?;
    let response = dispatch::handle(&service, &request);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if !response.success {
        render::print_error(&response);
    } else {
        match &cli.command {
            Commands::Load { .. } => render::print_entity(&response),
            Commands::Save { .. } | Commands::SaveField { .. } => render::print_save(&response),
            Commands::Verify { .. } => render::print_sync(&response),
            Commands::Health => render::print_health(&response),
        }
    }

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

fn resolve_data_dir(
    cli: &Cli,
    config: &MediakitConfig,
    project_dirs: Option<&ProjectDirs>,
) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = &config.data_dir {
        return Ok(dir.clone());
    }
    project_dirs
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("could not determine a data directory; pass --data-dir")
}

fn build_request(cli: &Cli) -> Result<Request> {
    let blank = Request {
        operation: Operation::Health,
        record_id_a: cli.entry,
        record_id_b: cli.post,
        entity: None,
        compare_to: None,
        fields: None,
        field: None,
        value: None,
    };

    let request = match &cli.command {
        Commands::Load { entity } => Request {
            operation: Operation::Load,
            entity: Some(entity.clone()),
            ..blank
        },
        Commands::Save { entity, fields } => Request {
            operation: Operation::Save,
            entity: Some(entity.clone()),
            fields: Some(parse_fields(fields)?),
            ..blank
        },
        Commands::SaveField {
            entity,
            field,
            value,
        } => Request {
            operation: Operation::SaveSingle,
            entity: Some(entity.clone()),
            field: Some(field.clone()),
            value: Some(value.clone()),
            ..blank
        },
        Commands::Verify { entity, compare_to } => Request {
            operation: Operation::Verify,
            entity: Some(entity.clone()),
            compare_to: Some(compare_to.clone()),
            ..blank
        },
        Commands::Health => blank,
    };
    Ok(request)
}

fn parse_fields(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut fields = HashMap::new();
    for item in raw {
        match item.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                fields.insert(key.trim().to_string(), value.to_string());
            }
            _ => bail!("invalid field '{}'; expected KEY=VALUE", item),
        }
    }
    Ok(fields)
}
