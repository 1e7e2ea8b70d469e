//! resx-lens - Show the resolved text of string resources next to the code
//! that references them
//!
//! resx-lens loads every `.resx` dictionary under a project root and prints
//! source files with the value of each `BaseName.Key` reference laid out
//! underneath, optionally watching the dictionaries for changes.

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr, eyre};
use resx_lens_core::{AnnotationSynchronizer, SharedStore};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use resx_lens::daemon::{Engine, run_watch};
use resx_lens::logging::{self, Verbosity};
use resx_lens::output::{TerminalSurface, render_annotated, render_store};
use resx_lens::{apply_overrides, load_config, load_store};

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "resx-lens", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Project root to search for resource files (default: current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Path to config file (default: .config/resx-lens/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Preferred culture, overriding the config (e.g. "fr" or "de-CH")
    #[arg(long, global = true, env = "RESX_LENS_CULTURE")]
    culture: Option<String>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Subcommands
#[derive(Debug, Subcommand)]
enum Command {
    /// Print a source file with resource values under each reference
    Annotate {
        /// Source file to annotate
        file: PathBuf,
    },

    /// List loaded resource files and the prefixes searched for
    List,

    /// Resolve a single `BaseName.Key` reference
    Lookup {
        /// Reference to resolve, e.g. `Resources.Title`
        reference: String,
    },

    /// Keep resources loaded and reload them as they change
    Watch {
        /// Source file to re-annotate after every reload
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().wrap_err("Failed to determine current directory")?,
    };
    if !root.is_dir() {
        return Err(eyre!("Root {} is not a directory", root.display()));
    }
    let config = apply_overrides(load_config(&root, cli.config.as_deref())?, cli.culture);
    let color = std::io::stdout().is_terminal();

    match cli.command {
        Command::Annotate { file } => {
            let store = load_store(&root, &config)?;
            let text = std::fs::read_to_string(&file)
                .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
            let mut view = AnnotationSynchronizer::new(
                SharedStore::new(store),
                TerminalSurface::new(),
                config.style(),
            );
            print!("{}", render_annotated(&mut view, &text, color));
            Ok(())
        }
        Command::List => {
            let store = load_store(&root, &config)?;
            print!("{}", render_store(&store, &root, color));
            Ok(())
        }
        Command::Lookup { reference } => lookup(&root, &config, &reference),
        Command::Watch { file } => {
            let (engine, events) = Engine::from_disk(&root, config);
            run_watch(engine, events, file, color).await
        }
    }
}

fn lookup(root: &Path, config: &resx_lens::config::Config, reference: &str) -> Result<()> {
    if !reference.contains('.') {
        return Err(eyre!(
            "Expected a reference of the form BaseName.Key, got {reference:?}"
        ));
    }
    let store = load_store(root, config)?;
    match store.resolve_reference(reference) {
        Some(value) => {
            println!("{value}");
            Ok(())
        }
        None => Err(eyre!("No value for {reference}")),
    }
}
