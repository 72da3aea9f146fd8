use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ea-manager",
    about = "Chainlink external adapter manager",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Manager config file (default: ~/.chainlink_ea_manager/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the shared network and cache container if missing
    #[command(alias = "init")]
    Initialize,
    /// Deploy an adapter, replacing any existing container
    Deploy {
        adapter: String,
        /// Image tag. Without it, available tags are listed for selection.
        #[arg(short, long)]
        tag: Option<String>,
        /// Take the newest tag without prompting
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Stop, remove and redeploy an existing adapter
    Upgrade {
        adapter: String,
        #[arg(short, long)]
        tag: Option<String>,
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Send a test price request to a running adapter
    Test {
        /// Container name or host
        container: String,
        from: String,
        to: String,
    },
    /// List adapters found in the adapters directory
    List,
    /// Show the newest published tags for an adapter
    Tags {
        adapter: String,
        /// How many tags to show (default: registry.preview_count)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the version
    Version,
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in [
        "ea_manager",
        "ea_core",
        "ea_registry",
        "ea_runtime",
        "ea_probe",
        "ea_journal",
        "ea_lifecycle",
    ] {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if matches!(cli.command, Commands::Version) {
        println!("ea-manager {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let ctx = commands::Context::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Initialize => commands::lifecycle::initialize(&ctx).await,
        Commands::Deploy { adapter, tag, yes } => {
            commands::lifecycle::deploy(&ctx, &adapter, tag.as_deref(), yes).await
        }
        Commands::Upgrade { adapter, tag, yes } => {
            commands::lifecycle::upgrade(&ctx, &adapter, tag.as_deref(), yes).await
        }
        Commands::Test {
            container,
            from,
            to,
        } => commands::lifecycle::test(&ctx, &container, &from, &to).await,
        Commands::List => commands::fleet::list(&ctx).await,
        Commands::Tags { adapter, limit } => commands::fleet::tags(&ctx, &adapter, limit).await,
        Commands::Version => Ok(()),
    }
}
