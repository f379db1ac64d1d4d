use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use libris_server::{LibrisConfig, LibrisServer};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Config(args) => cmd_config(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LibrisConfig> {
    match path {
        Some(path) => LibrisConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(LibrisConfig::default()),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }

    println!("{} Libris on {}", "▶".green().bold(), config.server.bind_addr.to_string().bold());
    println!("  Users: {}", config.users.len());
    if config.users.is_empty() {
        println!("  {} no users configured; every authenticated route will refuse requests", "!".yellow());
    }

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async move {
        let server = LibrisServer::new(config)?;
        server.serve().await
    })?;
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let config = load_config(Some(&args.path))?;
    println!("{} {} is valid", "✓".green().bold(), args.path.display());
    println!("  Bind: {}", config.server.bind_addr.to_string().bold());
    println!("  Public URL: {}", config.server.public_url.cyan());
    let payments = if config.billing.stripe.is_some() { "stripe" } else { "in-memory" };
    println!("  Payments: {} ({})", payments.yellow(), config.billing.currency);
    let channel = if config.notify.telegram.is_some() { "telegram" } else { "log" };
    println!("  Notifications: {}", channel.yellow());
    if config.sweep.enabled {
        println!("  Overdue sweep: every {}s", config.sweep.interval_secs);
    } else {
        println!("  Overdue sweep: {}", "disabled".dimmed());
    }
    let staff = config.users.iter().filter(|u| u.is_staff).count();
    println!("  Users: {} ({} staff)", config.users.len(), staff);
    Ok(())
}
