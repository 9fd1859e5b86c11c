use anyhow::Context;
use clap::{Parser, Subcommand};

use biblioteca_app::Storage;
use biblioteca_kernel::settings::Settings;

/// biblioteca - authors and books catalogue service
#[derive(Parser)]
#[command(name = "biblioteca")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the merged OpenAPI document to stdout
    Openapi,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load biblioteca settings")?;
    biblioteca_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => biblioteca_app::run(settings).await,
        Command::Migrate => migrate(&settings).await,
        Command::Openapi => print_openapi(&settings),
    }
}

async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let storage = Storage::connect(&settings.database)
        .await
        .context("failed to open storage")?;
    let registry = biblioteca_app::build_registry(&storage, settings);

    let applied = biblioteca_app::migrate(&registry, &storage).await?;
    if let Some(pool) = storage.pool() {
        pool.close().await;
    }

    tracing::info!(applied, "migrate finished");
    Ok(())
}

fn print_openapi(settings: &Settings) -> anyhow::Result<()> {
    // The document only depends on the registered modules, never on the data.
    let registry = biblioteca_app::build_registry(&Storage::in_memory(), settings);
    let document = biblioteca_http::openapi_document(&registry);

    let rendered =
        serde_json::to_string_pretty(&document).context("failed to render OpenAPI document")?;
    println!("{}", rendered);
    Ok(())
}
