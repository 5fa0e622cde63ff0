use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use catalog::Catalog;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use store::{AirtableClient, DEFAULT_API_URL, DEFAULT_BASE_ID};
use tracing_subscriber::{EnvFilter, fmt};

/// Export projected catalog data as JSON, e.g. for a static site build.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "AIRTABLE_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "AIRTABLE_BASE_ID", default_value = DEFAULT_BASE_ID)]
    base_id: String,

    #[arg(long, env = "AIRTABLE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every project with authors, categories and courses resolved
    Projects,
    /// Every user with their project count
    Users,
    /// Id, full name and code of every user
    Students,
    /// A single project by slug
    Project { slug: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = AirtableClient::new(&args.api_key, &args.base_id)?.with_api_url(&args.api_url);
    let catalog = Catalog::new(Arc::new(client));

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Fetching {:?} from {}", args.command, args.base_id));

    let json = settle(&pb, export(&catalog, &args.command).await)?;

    match &args.out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?
        }
        None => println!("{json}"),
    }

    Ok(())
}

async fn export(catalog: &Catalog, command: &Command) -> anyhow::Result<String> {
    match command {
        Command::Projects => to_json(&catalog.all_projects().await?),
        Command::Users => to_json(&catalog.all_users().await?),
        Command::Students => to_json(&catalog.students().await?),
        Command::Project { slug } => match catalog.project_by_slug(slug).await? {
            Some(project) => to_json(&project),
            None => bail!("Project not found: {slug}"),
        },
    }
}

/// Finishes the spinner on both paths.
fn settle<T>(pb: &ProgressBar, result: anyhow::Result<T>) -> anyhow::Result<T> {
    match &result {
        Ok(_) => pb.finish_with_message("Done"),
        Err(_) => pb.finish_and_clear(),
    }
    result
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
