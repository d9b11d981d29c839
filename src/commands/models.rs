//! Model availability commands for mockprep
//!
//! Lists the models visible to the configured API key and marks which of
//! them can serve `generateContent`.

use crate::config::Config;
use crate::error::{MockprepError, Result};
use crate::providers::{GeminiClient, ModelInfo};
use colored::Colorize;
use prettytable::{row, Table};

/// List models from the generation API
///
/// # Arguments
///
/// * `config` - Configuration containing generation settings
/// * `all` - Include models that do not support `generateContent`
/// * `json` - Print JSON instead of a table
///
/// # Errors
///
/// Returns error if no key is configured or the listing request fails
pub async fn list_models(config: &Config, all: bool, json: bool) -> Result<()> {
    let client = GeminiClient::new(config.generation.clone())?;
    tracing::info!("Checking available models (key status: {})", client.status());

    let models = if all {
        client.list_models().await?
    } else {
        client.generation_models().await?
    };

    if json {
        output_models_json(&models)?;
        return Ok(());
    }

    if models.is_empty() {
        println!(
            "{}",
            "No text generation models found. Check API key permissions.".red()
        );
        return Ok(());
    }

    output_models_table(&models, client.model());
    Ok(())
}

fn output_models_json(models: &[ModelInfo]) -> Result<()> {
    let json = serde_json::to_string_pretty(models).map_err(MockprepError::Serialization)?;
    println!("{}", json);
    Ok(())
}

fn output_models_table(models: &[ModelInfo], configured: &str) {
    let mut table = Table::new();
    table.add_row(row!["Model", "Display Name", "generateContent"]);

    for model in models {
        let name = if model.short_name() == configured {
            format!("{} (configured)", model.short_name())
        } else {
            model.short_name().to_string()
        };
        let supported = if model.supports_generation() {
            "yes"
        } else {
            "no"
        };
        table.add_row(row![name, model.display_name, supported]);
    }

    println!("\nAvailable models:\n");
    table.printstd();
    println!();
}
