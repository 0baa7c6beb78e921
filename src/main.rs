//! Configurator CLI
//!
//! Entry point for the `configurator` command-line tool.

use clap::{Args, Parser, Subcommand};
use configurator::config::SECTIONS;
use configurator::logging::{init_logging, LoggingConfig};
use configurator::{ConfigType, LayeredConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "configurator")]
#[command(about = "Inspect layered component configuration", version)]
struct Cli {
    /// Log level or filter directive (overridden by CONFIGURATOR_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Disable colored log output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LayerArgs {
    /// Override file (.toml or .json); repeatable, later files win
    #[arg(long = "file", short = 'f')]
    files: Vec<PathBuf>,

    /// Override a value by dotted path (e.g. history.pushState=false); repeatable
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the built-in default schema
    Defaults {
        /// Print only this top-level section
        #[arg(long)]
        section: Option<String>,
    },

    /// Print the effective configuration after all layers
    Show {
        #[command(flatten)]
        layers: LayerArgs,
    },

    /// Resolve a key (top level, then one level down) and print the match
    Get {
        /// Key to resolve; empty string for the whole tree
        key: String,

        /// Print the match as a standalone configuration
        #[arg(long)]
        wrap: bool,

        #[command(flatten)]
        layers: LayerArgs,
    },

    /// Report whether a key resolves
    Has {
        key: String,

        #[command(flatten)]
        layers: LayerArgs,
    },

    /// Print the provenance of each contributing layer
    Sources {
        #[command(flatten)]
        layers: LayerArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: cli.log_level.clone(),
        color: !cli.no_color,
    };
    if let Err(e) = init_logging(&logging) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match cli.command {
        Commands::Defaults { section } => run_defaults(section),
        Commands::Show { layers } => run_show(&layers),
        Commands::Get { key, wrap, layers } => run_get(&key, wrap, &layers),
        Commands::Has { key, layers } => run_has(&key, &layers),
        Commands::Sources { layers } => run_sources(&layers),
    }
}

fn run_defaults(section: Option<String>) {
    let root = ConfigType::root();
    let defaults = root.defaults();

    match section {
        Some(name) => match defaults.get(&name) {
            Some(value) => print_json(value),
            None => {
                eprintln!(
                    "Unknown section: {} (built-in sections: {})",
                    name,
                    SECTIONS.join(", ")
                );
                process::exit(1);
            }
        },
        None => print_json(&defaults),
    }
}

fn run_show(layers: &LayerArgs) {
    let layered = load_layers(layers);
    print_json(&layered.to_effective());
}

fn run_get(key: &str, wrap: bool, layers: &LayerArgs) {
    let layered = load_layers(layers);
    let instance = layered.instance();

    if wrap {
        match instance.get_wrapped(key) {
            Some(wrapped) => print_json(wrapped.config()),
            None => {
                eprintln!("Key not found: {}", key);
                process::exit(1);
            }
        }
    } else {
        match instance.get(key) {
            Some(value) => print_json(value),
            None => {
                eprintln!("Key not found: {}", key);
                process::exit(1);
            }
        }
    }
}

fn run_has(key: &str, layers: &LayerArgs) {
    let layered = load_layers(layers);
    let found = layered.instance().has(key);

    println!("{}", found);
    process::exit(if found { 0 } else { 1 });
}

fn run_sources(layers: &LayerArgs) {
    let layered = load_layers(layers);
    print_json(layered.sources());
}

fn load_layers(layers: &LayerArgs) -> LayeredConfig {
    match LayeredConfig::build(&ConfigType::root(), layers.files.as_slice(), &layers.overrides) {
        Ok(layered) => layered,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
