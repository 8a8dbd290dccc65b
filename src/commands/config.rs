use colored::Colorize;

use crate::cli::{Cli, ConfigCommands};
use crate::config::Config;
use crate::error::{AxviewError, Result};

pub async fn run(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(cli).await,
        ConfigCommands::Get { key } => get(cli, key).await,
        ConfigCommands::Set { key, value } => set(cli, key, value).await,
        ConfigCommands::Path => path(cli).await,
        ConfigCommands::Init { force } => init(cli, *force).await,
    }
}

async fn show(cli: &Cli) -> Result<()> {
    let config = cli.effective_config()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| AxviewError::ConfigError(e.to_string()))?;
        println!("{}", toml_str);
    }

    Ok(())
}

async fn get(cli: &Cli, key: &str) -> Result<()> {
    let value = cli.effective_config()?.get_value(key)?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "key": key,
                "value": value
            })
        );
    } else {
        match value {
            Some(v) => println!("{}", v),
            None => println!("{}", "(not set)".dimmed()),
        }
    }

    Ok(())
}

async fn set(cli: &Cli, key: &str, value: &str) -> Result<()> {
    // Command-line overrides are not persisted
    let mut config = Config::load()?;
    config.set_value(key, value)?;
    config.save()?;

    if cli.json {
        println!("{}", serde_json::json!({ "key": key, "value": value }));
    } else {
        println!("{} Set {} = {}", "✓".green(), key, value);
    }

    Ok(())
}

async fn path(cli: &Cli) -> Result<()> {
    let path = Config::config_path();

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string(),
                "exists": path.exists()
            })
        );
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

async fn init(cli: &Cli, force: bool) -> Result<()> {
    let path = Config::config_path();

    if path.exists() && !force {
        return Err(AxviewError::ConfigError(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save_to(&path)?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "status": "created", "path": path.display().to_string() })
        );
    } else {
        println!(
            "{} Config written: {}",
            "✓".green(),
            path.display().to_string().dimmed()
        );
    }

    Ok(())
}
