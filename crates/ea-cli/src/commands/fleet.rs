use ea_lifecycle::FleetEntry;
use ea_registry::preview;

use super::Context;

fn format_entry(entry: &FleetEntry) -> String {
    let ip = entry
        .config
        .ip_address
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "-".to_string());
    let port = entry
        .config
        .port
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let state = entry
        .container
        .as_ref()
        .map(|c| c.state.to_string())
        .unwrap_or_else(|| "not deployed".to_string());
    format!("  {:<24} {:<16} {:<6} {}", entry.name, ip, port, state)
}

pub async fn list(ctx: &Context) -> anyhow::Result<()> {
    let fleet = ctx.orchestrator.fleet().await?;

    println!("Supported EAs:");
    println!();
    if fleet.is_empty() {
        println!(
            "  No supported adapters found in {}",
            ctx.config.paths.adapters_dir.display()
        );
        return Ok(());
    }
    for entry in &fleet {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

pub async fn tags(ctx: &Context, adapter: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let tags = ctx.orchestrator.available_tags(adapter).await?;
    if tags.is_empty() {
        anyhow::bail!("no tags found for {adapter}");
    }

    let limit = limit.unwrap_or(ctx.config.registry.preview_count);
    println!("Available tags for {adapter}:");
    for (i, tag) in preview(&tags, limit).iter().enumerate() {
        println!("{i}) {tag}");
    }
    if tags.len() > limit {
        println!("... {} more", tags.len() - limit);
    }
    Ok(())
}
