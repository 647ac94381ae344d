//! lcm-gen CLI - Message type generator
//!
//! Commands:
//! - `lcm-gen generate` - Emit Rust and/or Java types from model files
//! - `lcm-gen fingerprint` - Print the fingerprint of every struct
//! - `lcm-gen check` - Validate model files

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lcm_core::{FingerprintEngine, Schema};
use lcm_gen::LcmGen;
use lcm_gen::builder::find_models;
use lcm_gen::config::{GenConfig, JavaOptions, RustLayout};
use lcm_gen::logging::{init_logging, level_for};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lcm-gen")]
#[command(author, version, about = "Generate message types from LCM schemas", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to lcm-gen.toml (default: ./lcm-gen.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit source code for the structs in the given model files
    Generate {
        /// Model files or directories searched for *.json
        #[arg(required = true)]
        models: Vec<PathBuf>,

        /// Emit Rust
        #[arg(long)]
        rust: bool,

        /// Rust output directory
        #[arg(long)]
        rust_path: Option<PathBuf>,

        /// Rust file layout
        #[arg(long, value_enum)]
        rust_layout: Option<RustLayout>,

        /// Module path the Rust output is mounted at
        #[arg(long)]
        module_root: Option<String>,

        /// Emit Java
        #[arg(long)]
        java: bool,

        /// Java output directory
        #[arg(long)]
        java_path: Option<PathBuf>,

        /// Regenerate even when artifacts are newer than their models
        #[arg(short, long)]
        force: bool,

        /// Print cargo:rerun-if-changed lines for the models
        #[arg(long)]
        cargo: bool,
    },

    /// Print the fingerprint of every struct
    Fingerprint {
        /// Model files or directories searched for *.json
        #[arg(required = true)]
        models: Vec<PathBuf>,
    },

    /// Validate model files
    Check {
        /// Model files or directories searched for *.json
        #[arg(required = true)]
        models: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let config = GenConfig::discover(cli.config.as_deref(), &cwd).context("Failed to load configuration")?;
    init_logging(&level_for(cli.verbose, &config.log_level));

    match cli.command {
        Commands::Generate {
            models,
            rust,
            rust_path,
            rust_layout,
            module_root,
            java,
            java_path,
            force,
            cargo,
        } => {
            if !rust && !java {
                bail!("Nothing to generate: pass --rust and/or --java");
            }

            let mut builder = LcmGen::from_config(&config);
            for model in expand_models(&models)? {
                builder = builder.add_file(model);
            }

            if rust {
                let mut options = config.rust.clone();
                if let Some(path) = rust_path {
                    options.output = path;
                }
                if let Some(layout) = rust_layout {
                    options.layout = layout;
                }
                if let Some(root) = module_root {
                    options.module_root = root;
                }
                builder = builder.rust_options(options);
            } else {
                builder = builder.without_rust();
            }

            if java {
                builder = builder.java(JavaOptions {
                    output: java_path.unwrap_or_else(|| config.java.output.clone()),
                });
            }

            let report = builder
                .incremental(config.incremental && !force)
                .cargo_messages(config.cargo_messages || cargo)
                .run()
                .context("Code generation failed")?;

            if !cargo {
                println!("✓ Wrote {} files", report.files_written());
                if !report.skipped.is_empty() {
                    println!("✓ Skipped {} up-to-date artifacts", report.skipped.len());
                }
            }
        }
        Commands::Fingerprint { models } => {
            let schema = load(&models)?;
            let fingerprints = FingerprintEngine::new(&schema);
            for (name, fingerprint) in fingerprints.all()? {
                println!("{name} {fingerprint:#018x}");
            }
        }
        Commands::Check { models } => {
            let schema = load(&models)?;
            let fingerprints = FingerprintEngine::new(&schema);
            fingerprints.all()?;

            println!("✓ Structs: {}", schema.len());
            println!("✓ Packages: {}", schema.packages().len());
            println!("\nSchema is valid!");
        }
    }

    Ok(())
}

/// Replace directories with the model files below them
fn expand_models(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut models = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = find_models(path)
                .with_context(|| format!("Failed to scan {}", path.display()))?;
            models.extend(found);
        } else {
            models.push(path.clone());
        }
    }
    Ok(models)
}

fn load(paths: &[PathBuf]) -> Result<Schema> {
    let models = expand_models(paths)?;
    Schema::load(models.iter().map(PathBuf::as_path))
        .with_context(|| format!("Failed to load models: {}", describe(&models)))
}

fn describe(models: &[PathBuf]) -> String {
    models
        .iter()
        .map(|m| m.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

