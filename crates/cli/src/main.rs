use anyhow::Context;
use clap::{Parser, Subcommand};
use locallib_app::modules::catalog::queries::catalog_counts;
use locallib_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "locallib", version, about = "Local library catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Write a sample catalog into the configured store
    Seed,
    /// Print catalog record counts
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load settings")?;
    locallib_telemetry::init(&settings.telemetry)?;

    tracing::debug!(env = ?settings.environment, command = ?cli.command, "locallib CLI starting");

    match cli.command {
        Command::Serve => locallib_app::bootstrap::serve(settings).await,
        Command::Seed => {
            let store = locallib_db::connect(&settings.database.connect_options())
                .await
                .context("failed to connect to the document store")?;
            let report = locallib_app::seed::seed_catalog(&store).await?;
            println!(
                "seeded {} authors, {} genres, {} books, {} copies",
                report.authors, report.genres, report.books, report.copies
            );
            if store.backend_name() == "memory" {
                println!("note: the in-memory store is discarded when this command exits");
            }
            store.shutdown().await?;
            Ok(())
        }
        Command::Stats => {
            let store = locallib_db::connect(&settings.database.connect_options())
                .await
                .context("failed to connect to the document store")?;
            let counts = catalog_counts(&store).await?;
            println!("books:            {}", counts.book_count);
            println!("copies:           {}", counts.book_instance_count);
            println!("copies available: {}", counts.book_instance_available_count);
            println!("authors:          {}", counts.author_count);
            println!("genres:           {}", counts.genre_count);
            store.shutdown().await?;
            Ok(())
        }
    }
}
