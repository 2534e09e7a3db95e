use anyhow::{Context, Result};
use ragdesk::cli::{commands, output::Output, Cli};
use ragdesk::utils::toml_config::{RagdeskConfig, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    dotenvy::dotenv().ok();

    let config = RagdeskConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_tracing(&config.server, cli.verbose);

    commands::run(cli, config, output).await
}

/// `RUST_LOG` wins over the configured level; `--verbose` forces debug.
fn init_tracing(server: &ServerConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ragdesk=debug,ragdesk_vector=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "ragdesk={level},ragdesk_vector={level},tower_http=info",
                level = server.log_level
            ))
        })
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if server.log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}
