//! treestate - git working-tree status from the command line
//!
//! Run with `treestate --help` for usage.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use treestate::{config::Config, git::GitExecutor, DiffLineKind, Repository, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Classify git working-tree files and annotate diffs")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run as if started in this directory
    #[arg(short = 'C', value_name = "DIR")]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the status of one path, or of the whole tree
    Status {
        /// Path to classify (default: every path git reports)
        path: Option<PathBuf>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a diff with line numbers
    Diff {
        path: PathBuf,

        /// Staged changes instead of working tree changes
        #[arg(long)]
        cached: bool,
    },

    /// List local branches and what they track
    Branches {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration
    Config {
        /// Initialize config file with defaults
        #[arg(long)]
        init: bool,
    },
}

fn setup_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
            .add_directive("gix=warn".parse()?)
            .add_directive("tokio=warn".parse()?)
    };

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(file).with_target(false))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    }

    Ok(())
}

async fn print_diff(repo: &Repository, path: &Path, cached: bool) -> Result<()> {
    let result = if cached {
        repo.staged_diff(path).await?
    } else {
        repo.diff(path).await?
    };

    if result.is_empty() {
        println!("No changes");
        return Ok(());
    }

    for line in &result.lines {
        match line.kind {
            DiffLineKind::HunkHeader => println!("{}", line.text),
            _ => println!("{} {}", result.gutter(line), line.text),
        }
    }

    let (added, removed) = result.stats();
    println!();
    println!("+{} -{}", added, removed);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre error hooks
    color_eyre::install()?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    setup_logging(cli.debug || config.debug, config.log_file.as_deref())?;
    debug!("Starting {} v{}", APP_NAME, VERSION);

    if let Commands::Config { init } = cli.command {
        if init {
            let path = match &cli.config {
                Some(path) => {
                    config.save_to(path)?;
                    path.clone()
                }
                None => config.save()?,
            };
            println!("Configuration initialized at {:?}", path);
        } else {
            println!("Configuration:");
            println!("{}", toml::to_string_pretty(&config)?);
            println!("\nConfig file: {:?}", Config::config_file_path()?);
        }
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let cwd = match &cli.directory {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };
    let cwd = std::fs::canonicalize(&cwd)?;

    GitExecutor::new(&cwd)
        .with_program(&config.git_program)
        .check_installed()
        .await?;

    let repo = Repository::discover(&cwd, config.repository_options())?;
    debug!("Repository {} at {:?}", repo.repo_name(), repo.root());

    match cli.command {
        Commands::Status { path, json } => match path {
            Some(path) => {
                let relative = repo.relative_path(&cwd, &path)?;
                let status = repo.status_of(&relative).await?;
                if json {
                    let value = serde_json::json!({
                        "path": relative,
                        "status": status,
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                } else {
                    println!("{} {}  ({})", status.short_label(), relative.display(), status);
                }
            }
            None => {
                let tree = repo.status_of_tree().await?;
                if json {
                    let entries: Vec<_> = tree
                        .iter()
                        .map(|(status, path)| serde_json::json!({ "path": path, "status": status }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else {
                    for (status, path) in &tree {
                        println!("{} {}", status.short_label(), path);
                    }
                }
            }
        },

        Commands::Diff { path, cached } => {
            let relative = repo.relative_path(&cwd, &path)?;
            print_diff(&repo, &relative, cached).await?;
        }

        Commands::Branches { json } => {
            let branches = repo.branch_status_all().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&branches)?);
            } else {
                for branch in &branches {
                    let marker = if branch.is_current { "*" } else { " " };
                    match &branch.tracks {
                        Some(tracks) => println!("{} {} -> {}", marker, branch.name, tracks),
                        None => println!("{} {}", marker, branch.name),
                    }
                }
            }
        }

        Commands::Config { .. } => unreachable!("handled before repository discovery"),
    }

    Ok(())
}
