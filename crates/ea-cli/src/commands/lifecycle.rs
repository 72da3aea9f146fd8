use ea_lifecycle::{AttachOutcome, DeployReport};

use super::Context;
use super::prompt::PromptSelector;

fn selector(ctx: &Context, yes: bool) -> PromptSelector {
    PromptSelector {
        limit: ctx.config.registry.preview_count,
        assume_default: yes,
    }
}

fn describe_attachment(attachment: &AttachOutcome) -> String {
    match attachment {
        AttachOutcome::Static(ip) | AttachOutcome::AlreadyAttached(ip) => ip.to_string(),
        AttachOutcome::Dynamic { assigned, .. } => match assigned {
            Some(ip) => format!("{ip} (dynamic)"),
            None => "dynamic".to_string(),
        },
        AttachOutcome::Detached { .. } => "not attached".to_string(),
    }
}

fn print_deploy(report: &DeployReport) {
    println!("  Container: {}", report.container);
    println!("  Image:     {}", report.image);
    println!("  Address:   {}", describe_attachment(&report.attachment));
    println!("  Port:      {}", report.port);
    if let Some(warning) = report.attachment.warning() {
        println!("  Warning:   {warning}");
    }
}

pub async fn initialize(ctx: &Context) -> anyhow::Result<()> {
    let report = ctx.orchestrator.initialize().await?;

    println!("✓ Environment initialized");
    println!("  Network:   {} ({})", ctx.config.network.name, report.network);
    println!("  Cache:     {} ({})", report.cache_container, report.cache);
    println!(
        "  Address:   {}",
        describe_attachment(&report.cache_attachment)
    );
    println!("  Port:      {}", report.cache_port);
    if let Some(warning) = report.cache_attachment.warning() {
        println!("  Warning:   {warning}");
    }
    Ok(())
}

pub async fn deploy(ctx: &Context, adapter: &str, tag: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let report = ctx
        .orchestrator
        .deploy(adapter, tag, &selector(ctx, yes))
        .await?;

    println!("✓ Deployed {adapter} at version {}", report.tag);
    print_deploy(&report);
    Ok(())
}

pub async fn upgrade(ctx: &Context, adapter: &str, tag: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let report = ctx
        .orchestrator
        .upgrade(adapter, tag, &selector(ctx, yes))
        .await?;

    println!(
        "✓ Upgraded {adapter} to version {} (was {})",
        report.deploy.tag, report.previous_image
    );
    print_deploy(&report.deploy);
    Ok(())
}

pub async fn test(ctx: &Context, container: &str, from: &str, to: &str) -> anyhow::Result<()> {
    println!("Container: {container}");
    println!("FROM:      {from}");
    println!("TO:        {to}");

    let report = ctx.orchestrator.test(container, from, to).await?;
    println!("{from} / {to} --> {}", report.result);
    Ok(())
}
