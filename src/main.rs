use clap::Parser;
use tracing_subscriber::EnvFilter;
use voice_form_fill::cli::commands::{cmd_extract, cmd_fill, cmd_health, cmd_process};
use voice_form_fill::cli::config::{Cli, Commands, load_config, resolve_config};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // CLI > config > defaults
    let config = resolve_config(&cli, load_config(cli.config.as_deref()));

    match cli.command {
        Commands::Extract { page } => {
            cmd_extract(&page)?;
        }
        Commands::Fill { page, data, output } => {
            cmd_fill(&page, &data, output.as_deref(), &config.fill.match_options())?;
        }
        Commands::Process {
            page,
            url,
            audio,
            no_dwell,
        } => {
            let succeeded =
                cmd_process(&config, page.as_deref(), url.as_deref(), audio.as_deref(), no_dwell).await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Commands::Health => {
            cmd_health(&config).await?;
        }
    }

    Ok(())
}
