use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use stylevar::config::CONFIG_FILE;
use stylevar::imports::resolve_imports;
use stylevar::{Settings, StylesheetWatcher, Workspace, logging};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "stylevar")]
#[command(about = "Index and resolve CSS/SCSS/SASS/LESS variables")]
struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Index every stylesheet in the workspace and persist the result
    Index,

    /// Rebuild the index from scratch, discarding all cached state
    Rebuild,

    /// List variables matching a prefix, with resolved values
    Complete {
        /// Name prefix (empty lists everything)
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Show the resolved value table and doc comment for one variable
    Doc {
        /// Variable name as declared (`--x`, `@x` or `$x`)
        #[arg(allow_hyphen_values = true)]
        name: String,
    },

    /// Show the resolved import closure of a file
    Imports {
        /// Stylesheet to start from
        file: PathBuf,
    },

    /// Watch the workspace and re-index stylesheets as they change
    Watch,

    /// Show the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };

    if let Commands::Init { force } = &cli.command {
        return init_config(&root, *force);
    }

    let workspace = Workspace::open(&root)
        .with_context(|| format!("failed to open workspace at {}", root.display()))?;
    logging::init_with_config(&workspace.settings().logging);
    let token = CancellationToken::new();

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Index => {
            let stats = workspace.index_all(&token)?;
            workspace.save()?;
            println!("Indexed {} files, {} variables", stats.files, stats.variables);
        }

        Commands::Rebuild => {
            let stats = workspace.rebuild(&token)?;
            workspace.save()?;
            println!(
                "Rebuilt index: {} files, {} variables",
                stats.files, stats.variables
            );
        }

        Commands::Complete { prefix } => {
            ensure_indexed(&workspace, &token)?;
            let items = workspace.completion_entries(&prefix, &token)?;
            if items.is_empty() {
                println!("No variables match {prefix:?}");
            }
            for item in items {
                println!("{}: {}", item.name, item.value);
                for row in &item.context_values {
                    if row.context != "default" {
                        println!("    {} {}", row.label, row.value);
                    }
                }
            }
        }

        Commands::Doc { name } => {
            ensure_indexed(&workspace, &token)?;
            match workspace.documentation(&name, &token)? {
                Some(doc) => {
                    println!("{}", doc.name);
                    if !doc.description.is_empty() {
                        println!("  {}", doc.description);
                    }
                    for example in &doc.examples {
                        println!("  example: {example}");
                    }
                    for row in &doc.values {
                        match &row.swatch {
                            Some(hex) if *hex != row.value => {
                                println!("  {:<12} {} ({hex})", row.label, row.value);
                            }
                            _ => println!("  {:<12} {}", row.label, row.value),
                        }
                    }
                }
                None => println!("{name} is not indexed"),
            }
        }

        Commands::Imports { file } => {
            let settings = workspace.settings();
            let resolved = resolve_imports(&file, workspace.root(), settings.max_import_depth());
            if resolved.is_empty() {
                println!("No imports resolved from {}", file.display());
            }
            let mut paths: Vec<_> = resolved.into_iter().collect();
            paths.sort();
            for path in paths {
                println!("{}", path.display());
            }
        }

        Commands::Watch => {
            workspace.index_all(&token)?;
            let workspace = Arc::new(workspace);
            println!("Watching {} (Ctrl-C to stop)", workspace.root().display());
            StylesheetWatcher::new(workspace, token).watch()?;
        }

        Commands::Config => {
            let rendered = toml::to_string_pretty(&workspace.settings())?;
            print!("{rendered}");
        }
    }
    Ok(())
}

fn init_config(root: &std::path::Path, force: bool) -> anyhow::Result<()> {
    let path = root.join(CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let rendered = toml::to_string_pretty(&Settings::default())?;
    fs::write(&path, rendered).with_context(|| format!("cannot write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Commands that query expect an index; build one in-process when no
/// snapshot was loaded.
fn ensure_indexed(workspace: &Workspace, token: &CancellationToken) -> anyhow::Result<()> {
    if workspace.stats().files == 0 {
        workspace.index_all(token)?;
    }
    Ok(())
}
