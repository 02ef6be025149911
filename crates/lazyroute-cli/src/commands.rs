use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use lazyroute_loader::{ChunkRegistry, ChunkSnapshot, FsTransport};
use lazyroute_nav::{NavigationOutcome, Navigator, RetryPolicy};
use lazyroute_router::{RouteConfig, RouteDescriptor, RouteTable};
use lazyroute_types::ChunkState;
use serde_json::json;

use crate::cli::*;
use crate::config::CliConfig;
use crate::render::ConsoleRenderer;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Check(args) => cmd_check(args, format),
        Command::Match(args) => cmd_match(args, format),
        Command::Navigate(args) => cmd_navigate(args, format).await,
    }
}

fn load_table(path: &Path) -> anyhow::Result<RouteTable> {
    let config = RouteConfig::load(path)
        .with_context(|| format!("reading routes from {}", path.display()))?;
    let table = config
        .into_table()
        .with_context(|| format!("invalid route table in {}", path.display()))?;
    tracing::debug!(routes = table.len(), path = %path.display(), "route table loaded");
    Ok(table)
}

fn describe(descriptor: &RouteDescriptor) -> String {
    match descriptor {
        RouteDescriptor::Immediate { component } => component.to_string(),
        RouteDescriptor::Deferred { chunk, export } => format!("{chunk}#{export}"),
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let table = load_table(&args.routes)?;
    match format {
        OutputFormat::Json => {
            for route in table.routes() {
                println!(
                    "{}",
                    json!({
                        "pattern": route.pattern().as_str(),
                        "specificity": format!("{:?}", route.pattern().specificity()),
                        "route": route.descriptor(),
                    })
                );
            }
        }
        OutputFormat::Text => {
            println!(
                "{} {} routes, {} deferred chunks",
                "✓".green().bold(),
                table.len().to_string().bold(),
                table.chunk_ids().len().to_string().bold()
            );
            for route in table.routes() {
                let kind = if route.descriptor().is_deferred() {
                    "deferred".yellow()
                } else {
                    "immediate".green()
                };
                println!(
                    "  {:<24} {:<10} {}",
                    display_path(route.pattern().as_str()),
                    kind,
                    describe(route.descriptor())
                );
            }
        }
    }
    Ok(())
}

fn cmd_match(args: MatchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let table = load_table(&args.routes)?;
    for path in &args.paths {
        let matched = table.match_path(path);
        match format {
            OutputFormat::Json => println!("{}", json!({ "path": path, "match": matched })),
            OutputFormat::Text => match matched {
                Some(m) => {
                    print!(
                        "{} → {} ({})",
                        display_path(path).bold(),
                        display_path(&m.pattern).yellow(),
                        describe(&m.descriptor)
                    );
                    for (name, value) in m.params.iter() {
                        print!(" {}={}", name.cyan(), value);
                    }
                    println!();
                }
                None => println!("{} → {}", display_path(path).bold(), "no route".red()),
            },
        }
    }
    Ok(())
}

async fn cmd_navigate(args: NavigateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let table = load_table(&args.routes)?;
    let settings = navigate_settings(&args)?;
    tracing::debug!(
        root = %settings.transport.root.display(),
        timeout_ms = settings.transport.timeout.as_millis() as u64,
        attempts = settings.navigator.retry.max_attempts,
        "navigator configured"
    );
    let navigator = Navigator::with_config(
        Arc::new(table),
        ChunkRegistry::with_transport(Arc::new(FsTransport::new(settings.transport))),
        Arc::new(ConsoleRenderer::new(format)),
        settings.navigator,
    );

    if args.preload {
        let started = navigator.preload_all();
        tracing::info!(started, "preloading chunks");
    }

    let mut failures = 0usize;
    for path in &args.paths {
        if format == OutputFormat::Text {
            println!("{} {}", "navigate".bold(), display_path(path));
        }
        match navigator.navigate(path).await {
            Ok(NavigationOutcome::Rendered { .. }) => {}
            Ok(NavigationOutcome::Superseded { seq, by }) => {
                if format == OutputFormat::Text {
                    println!("  {} #{seq} by #{by}", "superseded".dimmed());
                }
            }
            // Already reported through the renderer.
            Err(_) => failures += 1,
        }
    }

    print_registry(&navigator.registry().snapshots(), format);
    if failures > 0 {
        anyhow::bail!("{failures} of {} navigations failed", args.paths.len());
    }
    Ok(())
}

/// Settings from `--config` (or defaults), overridden by explicit flags.
fn navigate_settings(args: &NavigateArgs) -> anyhow::Result<CliConfig> {
    let mut settings = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if let Some(chunks) = &args.chunks {
        settings.transport.root = chunks.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.transport.timeout = Duration::from_millis(timeout_ms);
    }
    if let Some(attempts) = args.attempts {
        settings.navigator.retry = RetryPolicy::attempts(attempts);
    }
    Ok(settings)
}

fn print_registry(snapshots: &[ChunkSnapshot], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for snapshot in snapshots {
                println!("{}", json!({ "chunk": snapshot }));
            }
        }
        OutputFormat::Text => {
            if snapshots.is_empty() {
                return;
            }
            println!("{}", "chunks".bold());
            for snapshot in snapshots {
                let state = match snapshot.state {
                    ChunkState::Loaded => snapshot.state.to_string().green(),
                    ChunkState::Failed => snapshot.state.to_string().red(),
                    _ => snapshot.state.to_string().yellow(),
                };
                let detail = match &snapshot.error {
                    Some(error) => error.clone(),
                    None => snapshot.exports.join(", "),
                };
                println!("  {:<24} {:<14} {}", snapshot.chunk_id.as_str(), state, detail.dimmed());
            }
        }
    }
}
