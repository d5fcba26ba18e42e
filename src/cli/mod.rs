//! Command-line interface for polycms.
//!
//! Provides commands for discovering categories and for adding, listing and
//! deleting content. The operator running the binary is trusted with write
//! access; `--user` only names them in logs.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::access::WriteAccess;
use crate::catalog::CatalogBuilder;
use crate::config::{self, ResolvedConfig};
use crate::domain::{ContentRecord, RecordId};
use crate::repository::ContentRepository;
use crate::service::{ContentError, ContentService};
use crate::store::SqliteStore;
use crate::validation::RawInput;

/// polycms - Polymorphic content store
#[derive(Parser, Debug)]
#[command(name = "polycms")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Caller identity recorded with writes
    #[arg(long, global = true, env = "POLYCMS_USER", default_value = "operator")]
    pub user: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered content categories
    Types {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List content in a category
    List {
        /// Category id (e.g. "text", "url")
        category: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add content to a category
    Add {
        /// Category id
        category: String,

        /// Name for the content (unique within the category)
        name: String,

        /// Content payload
        content: String,

        /// Parse the payload as JSON instead of a plain string
        #[arg(long)]
        json: bool,
    },

    /// Delete content by id
    Delete {
        /// Record id
        id: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        if let Commands::Config = self.command {
            return show_config(cfg);
        }

        let service = open_service(cfg)?;
        let writer = WriteAccess::granted(self.user);

        match self.command {
            Commands::Types { json } => list_types(&service, json),
            Commands::List { category, json } => {
                list_content(&service, &writer, &category, json).await
            }
            Commands::Add {
                category,
                name,
                content,
                json,
            } => add_content(&service, &writer, &category, name, content, json).await,
            Commands::Delete { id } => delete_content(&service, &writer, &id).await,
            Commands::Config => show_config(cfg),
        }
    }
}

/// Build the catalog and store from configuration
fn open_service(cfg: &ResolvedConfig) -> Result<ContentService> {
    let catalog = CatalogBuilder::standard()
        .register_configured(&cfg.categories)
        .context("Invalid category configuration")?
        .build();

    let store = SqliteStore::open(&cfg.database)
        .with_context(|| format!("Failed to open database: {}", cfg.database.display()))?;

    Ok(ContentService::new(
        Arc::new(catalog),
        ContentRepository::new(Arc::new(store)),
    ))
}

/// List registered categories
fn list_types(service: &ContentService, json: bool) -> Result<()> {
    let types = service.get_types();

    if json {
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    println!("{:<16} {:<30}", "ID", "DISPLAY NAME");
    println!("{}", "-".repeat(46));

    for category in &types {
        println!("{:<16} {:<30}", category.id, category.display_name);
    }

    Ok(())
}

/// List content in a category
async fn list_content(
    service: &ContentService,
    writer: &WriteAccess,
    category: &str,
    json: bool,
) -> Result<()> {
    let records = service.get_by_category(&writer.read(), category).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No content in category: {}", category);
        return Ok(());
    }

    println!("{:<38} {:<24} {:<50}", "ID", "NAME", "CONTENT");
    println!("{}", "-".repeat(112));

    for record in &records {
        println!(
            "{:<38} {:<24} {:<50}",
            record.id.as_str(),
            truncate(record.label(), 24),
            truncate(&content_preview(record), 50)
        );
    }

    println!("\nTotal: {} items", records.len());

    Ok(())
}

/// Add content to a category
async fn add_content(
    service: &ContentService,
    writer: &WriteAccess,
    category: &str,
    name: String,
    content: String,
    json: bool,
) -> Result<()> {
    let content = if json {
        serde_json::from_str(&content).context("Content is not valid JSON")?
    } else {
        Value::String(content)
    };

    match service.add(writer, category, RawInput::new(name, content)).await {
        Ok(record) => {
            eprintln!("Added {} ({})", record.name, record.id);
            println!("{}", record.id);
            Ok(())
        }
        Err(ContentError::SchemaValidationFailed {
            category,
            violations,
        }) => {
            eprintln!("Invalid {} content:", category);
            for violation in &violations {
                eprintln!("  {}: {}", violation.path, violation.reason);
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete content by id
async fn delete_content(service: &ContentService, writer: &WriteAccess, id: &str) -> Result<()> {
    service.delete(writer, &RecordId::from(id)).await?;
    eprintln!("Deleted {}", id);
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("polycms configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Database: {}", cfg.database.display());
    println!();
    println!("Log filter: {}", cfg.log_filter);
    println!();
    println!("Configured categories:");
    if cfg.categories.is_empty() {
        println!("  (standard only)");
    } else {
        for category in &cfg.categories {
            println!("  {}: {} ({})", category.id, category.display_name, category.shape);
        }
    }

    Ok(())
}

fn content_preview(record: &ContentRecord) -> String {
    match &record.content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
