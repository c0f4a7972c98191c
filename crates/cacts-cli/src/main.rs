//! CACTS CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cacts")]
#[command(about = "CMake-based project testing configuration tool", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short = 'f', long, env = "CACTS_CONFIG", default_value = "cacts.yaml")]
    config: PathBuf,

    /// Project root directory
    #[arg(short, long, default_value = ".")]
    root_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve project, machine and build types and print them as JSON
    Resolve {
        /// Machine name
        #[arg(short, long, default_value = "local")]
        machine: String,
        /// Machine file used for the 'local' machine
        #[arg(long)]
        local_file: Option<PathBuf>,
        /// Build types to resolve (default: all builds on by default)
        #[arg(short = 't', long = "build-type")]
        build_types: Vec<String>,
        /// Only keep build types that use baselines
        #[arg(short, long)]
        generate: bool,
        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        /// Also resolve every build type against this machine
        #[arg(short, long)]
        machine: Option<String>,
        /// Machine file used for the 'local' machine
        #[arg(long)]
        local_file: Option<PathBuf>,
    },
    /// Show the number of CPUs available to this process
    Cpus {
        /// Count physical cores instead of hardware threads
        #[arg(long)]
        physical: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Resolve {
            machine,
            local_file,
            build_types,
            generate,
            output,
        } => {
            let options = commands::resolve::ResolveOptions {
                config: cli.config,
                root_dir: cli.root_dir,
                machine,
                local_file,
                build_types: (!build_types.is_empty()).then_some(build_types),
                generate,
                output,
            };
            commands::resolve::run(&options)?;
        }
        Commands::Validate {
            machine,
            local_file,
        } => {
            commands::validate(
                &cli.config,
                &cli.root_dir,
                machine.as_deref(),
                local_file.as_deref(),
            )?;
        }
        Commands::Cpus { physical } => {
            commands::cpus(!physical)?;
        }
    }

    Ok(())
}
