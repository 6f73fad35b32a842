use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backlog_import::client::DevOpsClient;
use backlog_import::config::{self, AppConfig};
use backlog_import::error::ImportError;
use backlog_import::models::ImportTree;
use backlog_import::pipeline::{self, ImportTarget};
use backlog_import::sheet::SheetFormat;
use backlog_import::tree_render::render_tree;

#[derive(Parser)]
#[command(name = "backlog-import")]
#[command(about = "Import a spreadsheet of features, user stories and tasks into Azure DevOps")]
struct Cli {
    /// Organization URL, e.g. https://dev.azure.com/acme
    #[arg(long, global = true)]
    url: Option<String>,

    /// Personal access token
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store connection settings in the config file
    Configure,
    /// List projects of the organization
    Projects,
    /// List iterations of a project
    Iterations {
        #[arg(short, long)]
        project: String,
    },
    /// Parse a sheet and print the hierarchy it describes
    Preview {
        file: PathBuf,

        #[arg(short, long)]
        project: String,
    },
    /// Parse a sheet and create its work items
    Import {
        file: PathBuf,

        #[arg(short, long)]
        project: String,

        /// Iteration name, e.g. "Sprint 3"
        #[arg(short, long)]
        iteration: String,

        /// Write the resulting tree (with assigned ids) to this file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
    /// Continue creating a tree saved by a failed import
    Resume {
        tree: PathBuf,

        #[arg(short, long)]
        project: String,

        #[arg(short, long)]
        iteration: String,
    },
}

/// Initialize tracing with output to stderr so stdout stays clean for results
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "backlog_import=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        url,
        token,
        command,
    } = Cli::parse();
    init_tracing();

    match command {
        Commands::Configure => {
            let path = config::config_path()?;
            AppConfig::update_file(&path, url, token)?;
            println!("Saved settings to {}", path.display());
        }
        Commands::Projects => {
            let client = connect(url, token)?;
            for project in client.list_projects().await? {
                println!("{}", project.name);
            }
        }
        Commands::Iterations { project } => {
            let client = connect(url, token)?;
            for iteration in client.list_iterations(&project).await? {
                println!("{}\t{}", iteration.name, iteration.path);
            }
        }
        Commands::Preview { file, project } => {
            let client = connect(url, token)?;
            let tree = load(&file, &project, &client).await?;
            print!("{}", render_tree(&tree));
        }
        Commands::Import {
            file,
            project,
            iteration,
            save,
        } => {
            let client = connect(url, token)?;
            let mut tree = load(&file, &project, &client).await?;
            let target = ImportTarget { project, iteration };
            create(&mut tree, &target, &client, save.as_deref()).await?;
        }
        Commands::Resume {
            tree: path,
            project,
            iteration,
        } => {
            let client = connect(url, token)?;
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut tree: ImportTree =
                serde_json::from_str(&content).context("Failed to parse saved tree")?;
            let target = ImportTarget { project, iteration };
            create(&mut tree, &target, &client, Some(&path)).await?;
        }
    }

    Ok(())
}

/// Client for the file settings overridden by environment, then flags.
fn connect(url: Option<String>, token: Option<String>) -> Result<DevOpsClient> {
    let config = AppConfig::load()?.with_overrides(url, token);
    DevOpsClient::from_config(&config)
}

async fn load(file: &Path, project: &str, client: &DevOpsClient) -> Result<ImportTree> {
    let format = SheetFormat::from_path(file)?;
    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    match pipeline::load_tree(bytes, format, project, client).await {
        Ok(tree) => Ok(tree),
        Err(ImportError::Validation(errors)) => {
            eprintln!("Sheet layout is invalid:");
            for error in &errors {
                eprintln!("  {}", error);
            }
            Err(ImportError::Validation(errors).into())
        }
        Err(e) => Err(e.into()),
    }
}

async fn create(
    tree: &mut ImportTree,
    target: &ImportTarget,
    client: &DevOpsClient,
    save: Option<&Path>,
) -> Result<()> {
    let result = pipeline::create_tree(tree, target, client).await;

    // Save even after a failure so `resume` can pick up the assigned ids.
    if let Some(path) = save {
        let json = serde_json::to_string_pretty(tree)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Saved tree to {}", path.display());
    }

    let report = result?;
    print!("{}", render_tree(tree));
    println!(
        "Import finished: {} created, {} already present",
        report.created, report.skipped
    );
    Ok(())
}
