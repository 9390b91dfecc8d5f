//! cfgtool
//!
//! Inspect and edit configuration documents from the command line.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package cfgtool -- get app.cfg server.port
//! cargo run --package cfgtool -- set app.cfg server.port 9090
//! cargo run --package cfgtool -- add app.cfg server tls bool true
//! cargo run --package cfgtool -- fmt app.cfg --in-place
//! cargo run --package cfgtool -- json app.cfg --pretty
//! ```
//!
//! Engine options come from `cfgtree.toml` and `CFGTREE_*` variables, or
//! from the file given with `--options`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cfgtree::prelude::*;
use cfgtree::runtime::logging::LoggingBuilder;
use cfgtree::syntax::Assignment;
use cfgtree::Value;
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};

#[derive(Parser)]
#[command(name = "cfgtool")]
#[command(about = "Inspect and edit cfgtree configuration files", long_about = None)]
struct Cli {
    /// Engine options file (TOML)
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    /// Directory `@include` names are resolved against
    #[arg(short = 'I', long, global = true)]
    include_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a path
    Get { file: PathBuf, path: String },
    /// Replace the scalar at a path, keeping its kind
    Set {
        file: PathBuf,
        path: String,
        value: String,
        /// Print the result instead of rewriting the file
        #[arg(long)]
        dry_run: bool,
    },
    /// Add a setting to a group
    Add {
        file: PathBuf,
        parent: String,
        name: String,
        /// int, float, bool, string, group, list or array
        kind: Kind,
        /// Initial value for scalar kinds
        value: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the document in canonical form
    Fmt {
        file: PathBuf,
        /// Rewrite the file instead of printing
        #[arg(long)]
        in_place: bool,
        #[arg(long)]
        indent: Option<usize>,
        /// Write `name: value` instead of `name = value`
        #[arg(long)]
        colon: bool,
    },
    /// Print the document as JSON
    Json {
        file: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = OptionsLoader::new();
    if let Some(path) = &cli.options {
        loader = loader.file(path);
    }
    let options = loader.load().context("failed to load engine options")?;

    let mut logging = LoggingBuilder::from_config(&options.logging);
    if cli.verbose {
        logging = logging.with_level(Level::DEBUG);
    }
    logging.init();

    let mut config = Config::with_options(&options);
    if let Some(dir) = &cli.include_dir {
        config.set_include_dir(dir);
    }

    match cli.command {
        Commands::Get { file, path } => {
            load(&mut config, &file)?;
            let setting = config.lookup(&path)?;
            println!("{}", render(setting));
        }
        Commands::Set {
            file,
            path,
            value,
            dry_run,
        } => {
            load(&mut config, &file)?;
            let mut setting = config.lookup_mut(&path)?;
            assign(&mut setting, &value)?;
            save(&config, &file, dry_run)?;
        }
        Commands::Add {
            file,
            parent,
            name,
            kind,
            value,
            dry_run,
        } => {
            load(&mut config, &file)?;
            let mut setting = config.add_setting(&parent, &name, kind)?;
            if let Some(value) = value {
                assign(&mut setting, &value)?;
            }
            save(&config, &file, dry_run)?;
        }
        Commands::Fmt {
            file,
            in_place,
            indent,
            colon,
        } => {
            load(&mut config, &file)?;
            let mut write = config.write_options().clone();
            if let Some(width) = indent {
                write.indent_width = width;
            }
            if colon {
                write.assignment = Assignment::Colon;
            }
            config.set_write_options(write);
            save(&config, &file, !in_place)?;
        }
        Commands::Json { file, pretty } => {
            load(&mut config, &file)?;
            let json = config.to_json();
            if pretty {
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{json}");
            }
        }
    }

    Ok(())
}

fn load(config: &mut Config, file: &Path) -> Result<()> {
    config
        .read_file(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    debug!(file = %file.display(), "Loaded document");
    Ok(())
}

/// Prints the document, or writes it back to `file`.
fn save(config: &Config, file: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        print!("{}", config.write_string());
    } else {
        config.write_file(file)?;
        info!(file = %file.display(), "Updated");
    }
    Ok(())
}

/// Scalars print bare; aggregates print as JSON.
fn render(setting: SettingRef<'_>) -> String {
    match setting.value() {
        Value::Int(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::String(v) => v.clone(),
        _ => serde_json::to_string_pretty(&setting).unwrap_or_default(),
    }
}

/// Parses `raw` according to the setting's current kind.
fn assign(setting: &mut SettingMut<'_>, raw: &str) -> Result<()> {
    match setting.kind() {
        Kind::Int => setting.set_int(raw.parse().with_context(|| format!("'{raw}' is not an int"))?)?,
        Kind::Float => {
            setting.set_float(raw.parse().with_context(|| format!("'{raw}' is not a float"))?)?
        }
        Kind::Bool => setting.set_bool(raw.parse().with_context(|| format!("'{raw}' is not a bool"))?)?,
        Kind::String => setting.set_string(raw)?,
        kind => bail!("cannot assign a value to a {kind} setting"),
    }
    Ok(())
}
