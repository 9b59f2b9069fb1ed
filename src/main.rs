//! devloop CLI - development-mode watch, rebuild, and reload orchestrator
//!
//! Usage: devloop <COMMAND>
//!
//! Commands:
//!   dev    Build, start, and continuously reload the application
//!   plan   Print the resolved plugin set and watch targets

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use devloop::bootstrap::{self, DevOptions};
use devloop::config::Config;
use devloop::plugins::active_plugins;
use devloop::targets::plan_targets;
use devloop::watcher::DevEvent;

/// devloop - development-mode watch, rebuild, and reload orchestrator
#[derive(Parser, Debug)]
#[command(name = "devloop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit events as NDJSON for tooling
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build, start, and continuously reload the application
    Dev {
        /// Path to the devloop config file
        #[arg(long, default_value = "devloop.toml")]
        config: PathBuf,

        /// Skip the active-plugin list (watch first-party trees only)
        #[arg(long)]
        core: bool,

        /// Skip the initial full build (assets assumed current)
        #[arg(long)]
        skip_build: bool,
    },

    /// Print the resolved plugin set and watch targets (debugging)
    Plan {
        /// Path to the devloop config file
        #[arg(long, default_value = "devloop.toml")]
        config: PathBuf,

        /// Skip the active-plugin list
        #[arg(long)]
        core: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // diagnostics go to stderr; stdout carries events (NDJSON under --json)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Dev {
            config,
            core,
            skip_build,
        } => cmd_dev(&config, core, skip_build, cli.verbose > 0, cli.json),
        Commands::Plan { config, core } => cmd_plan(&config, core, cli.json),
    }
}

fn load_config(path: &PathBuf) -> Result<Config> {
    let (config, warnings) =
        Config::load_or_default(path).with_context(|| format!("loading {}", path.display()))?;
    for warning in warnings {
        match warning.line {
            Some(line) => warn!(
                "unknown config key '{}' in {}:{line}",
                warning.key,
                warning.file.display()
            ),
            None => warn!(
                "unknown config key '{}' in {}",
                warning.key,
                warning.file.display()
            ),
        }
    }
    Ok(config)
}

fn cmd_dev(config_path: &PathBuf, core: bool, skip_build: bool, verbose: bool, json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let options = DevOptions {
        core_only: core,
        skip_build,
        verbose,
    };

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    if !json {
        println!("🔁 devloop");
        println!("App root: {}", config.app.root.display());
        println!("Press Ctrl+C to stop\n");
    }

    bootstrap::run(&config, config_path, &options, running, |event| {
        if json {
            println!("{}", event.to_json());
        } else {
            render_event(&event);
        }
    })?;

    Ok(())
}

fn render_event(event: &DevEvent) {
    match event {
        DevEvent::WatchStarted { targets } => {
            println!("👀 Watching {targets} targets");
        }
        DevEvent::TargetFired { target } => {
            println!("📝 Changed: {target}");
        }
        DevEvent::BuildStarted { action } => {
            println!("🔄 Building: {action}");
        }
        DevEvent::BuildFinished { action } => {
            println!("✓ Built: {action}");
        }
        DevEvent::BuildFailed { action, message } => {
            eprintln!("✗ Build failed for {action}: {message}");
        }
        DevEvent::Reloading => {
            println!("♻️  Server sources changed, restarting...");
        }
        DevEvent::AppStarted { pid } => {
            println!("🚀 App running (pid {pid})");
        }
        DevEvent::Shutdown => {
            println!("\n👋 Shutting down...");
        }
    }
}

fn cmd_plan(config_path: &PathBuf, core: bool, json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let plugins = active_plugins(&config, core)?;
    let targets = plan_targets(&plugins, config.watch.debounce())?;

    if json {
        let output = serde_json::json!({
            "event": "plan",
            "plugins": plugins,
            "targets": targets.iter().map(|t| {
                serde_json::json!({
                    "name": t.name.as_str(),
                    "patterns": t.patterns,
                    "debounce_ms": (t.debounce.as_millis() as u64),
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("📦 Plugins ({}):", plugins.len());
        for plugin in &plugins {
            println!("  - {plugin}");
        }
        println!();
        for target in &targets {
            println!(
                "┌─ {} ({}ms debounce)",
                target.name,
                target.debounce.as_millis()
            );
            for pattern in &target.patterns {
                println!("│  {pattern}");
            }
            println!("└─");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_dev() {
        let cli = Cli::try_parse_from(["devloop", "dev"]).unwrap();
        assert!(matches!(cli.command, Commands::Dev { .. }));
    }

    #[test]
    fn test_cli_parse_dev_with_flags() {
        let cli = Cli::try_parse_from([
            "devloop",
            "dev",
            "--config",
            "custom.toml",
            "--core",
            "--skip-build",
        ])
        .unwrap();

        if let Commands::Dev {
            config,
            core,
            skip_build,
        } = cli.command
        {
            assert_eq!(config, PathBuf::from("custom.toml"));
            assert!(core);
            assert!(skip_build);
        } else {
            panic!("Expected Dev command");
        }
    }

    #[test]
    fn test_cli_parse_plan() {
        let cli = Cli::try_parse_from(["devloop", "plan", "--core"]).unwrap();
        if let Commands::Plan { core, .. } = cli.command {
            assert!(core);
        } else {
            panic!("Expected Plan command");
        }
    }

    #[test]
    fn test_cli_json_flag() {
        let cli = Cli::try_parse_from(["devloop", "--json", "plan"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["devloop", "-vv", "dev"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
