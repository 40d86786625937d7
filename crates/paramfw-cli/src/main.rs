//! Command-line interface for the parameter framework subsystem loader.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use paramfw_core::prelude::*;
use paramfw_core::PluginNaming;
use serde::Serialize;

/// Parameter framework - Load subsystem plugins and inspect them.
#[derive(Parser, Debug)]
#[command(name = "paramfw")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Show the subsystem type and factory symbol derived from plugin paths.
    Symbol {
        /// Plugin file paths.
        #[arg(required = true)]
        plugins: Vec<String>,
    },
    /// Load the configured plugins and build the declared subsystems.
    Load {
        /// System class configuration file.
        #[arg(short, long)]
        config: PathBuf,
        /// Force the virtual fallback on.
        #[arg(long)]
        fallback: bool,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Load, then list subsystems needing a resync and their syncers.
    Resync {
        /// System class configuration file.
        #[arg(short, long)]
        config: PathBuf,
        /// Force the virtual fallback on.
        #[arg(long)]
        fallback: bool,
    },
}

/// Outcome of `paramfw load`, as printed with `--json`.
#[derive(Debug, Serialize)]
struct LoadSummary {
    success: bool,
    plugins_fully_loaded: bool,
    builder_types: Vec<String>,
    modules: Vec<String>,
    subsystems: Vec<SubsystemSummary>,
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SubsystemSummary {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let success = match args.command {
        Command::Symbol { plugins } => {
            show_symbols(&plugins);
            true
        }
        Command::Load {
            config,
            fallback,
            json,
        } => run_load(&config, fallback, json)?,
        Command::Resync { config, fallback } => run_resync(&config, fallback)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    // Check if JSON logging is requested
    let json_logging = std::env::var("PARAMFW_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_level = if verbose { "paramfw=debug" } else { "paramfw=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so command output stays machine readable.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn show_symbols(plugins: &[String]) {
    let naming = PluginNaming::default();
    for plugin in plugins {
        println!(
            "{} -> {} -> {}",
            plugin,
            naming.plugin_type(plugin),
            naming.symbol_name(plugin)
        );
    }
}

fn load_config(path: &Path, fallback: bool) -> Result<SystemConfig> {
    let mut config = SystemConfig::from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?
        .apply_env();
    if fallback {
        config.virtual_fallback = true;
    }
    Ok(config)
}

/// Load plugins, then build subsystems if the load succeeded.
fn load_system(config: &SystemConfig) -> (SystemClass, LoadReport, Option<LoadError>) {
    let mut system = SystemClass::from_config(config);
    let report = system.load_subsystems(&config.plugin_locations, config.virtual_fallback);

    // Subsystems cannot be built from a failed load.
    let populate_error = if report.is_success() {
        system.populate(&config.subsystems).err()
    } else {
        None
    };

    (system, report, populate_error)
}

fn run_load(path: &Path, fallback: bool, json: bool) -> Result<bool> {
    let config = load_config(path, fallback)?;
    let (system, report, populate_error) = load_system(&config);

    let mut errors = report.errors().entries().to_vec();
    errors.extend(populate_error.as_ref().map(ToString::to_string));
    let success = report.is_success() && populate_error.is_none();

    let summary = LoadSummary {
        success,
        plugins_fully_loaded: report.plugins_fully_loaded(),
        builder_types: system.registry().type_names(),
        modules: system.module_paths().into_iter().map(str::to_string).collect(),
        subsystems: system
            .subsystems()
            .iter()
            .map(|s| SubsystemSummary {
                name: s.name().to_string(),
                type_name: s.type_name().to_string(),
            })
            .collect(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(success)
}

fn print_summary(summary: &LoadSummary) {
    println!("Subsystem Plugins");
    println!("=================\n");

    println!("Builder types:   {}", summary.builder_types.join(", "));
    for module in &summary.modules {
        println!("Module:          {}", module);
    }
    for subsystem in &summary.subsystems {
        println!("Subsystem:       {} ({})", subsystem.name, subsystem.type_name);
    }

    if !summary.errors.is_empty() {
        println!("\nErrors:");
        for error in &summary.errors {
            println!("  {}", error);
        }
    }

    println!();
    if summary.success {
        println!("OK");
    } else {
        println!("FAILED");
    }
}

fn run_resync(path: &Path, fallback: bool) -> Result<bool> {
    let config = load_config(path, fallback)?;
    let (mut system, report, populate_error) = load_system(&config);

    if !report.is_success() {
        eprintln!("{}", report.error_report());
        return Ok(false);
    }
    if let Some(error) = populate_error {
        eprintln!("{}", error);
        return Ok(false);
    }

    let mut syncers = SyncerSet::new();
    let mut infos = InfoLog::new();
    let count = system.check_for_subsystems_to_resync(&mut syncers, &mut infos);

    for info in infos.entries() {
        println!("{}", info);
    }
    for syncer in syncers.iter() {
        println!("  {}", syncer);
    }
    println!("Total: {} subsystem(s) to resync", count);

    Ok(true)
}
