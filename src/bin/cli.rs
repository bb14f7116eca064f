//! CampusHive CLI - bulk CSV imports and administrator bootstrap

use std::{fs::File, path::PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

use campushive_server::{
    config::AppConfig,
    logging,
    models::import_report::ImportReport,
    repository::Repository,
    services::import::ImportService,
};

#[derive(Parser)]
#[command(name = "campushive-cli")]
#[command(about = "CampusHive CLI - Administrative tools for CampusHive", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import users from a CSV file (username,email,first_name,last_name,role,password)
    ImportUsers {
        /// Path to the CSV file
        path: PathBuf,
    },
    /// Import equipment from a CSV file
    /// (name,category_name,identifier,description,quantity_total,quantity_available,status,purchase_date)
    ImportEquipment {
        /// Path to the CSV file
        path: PathBuf,
    },
    /// Import venues from a CSV file (name,capacity,location,has_projector,has_whiteboard)
    ImportVenues {
        /// Path to the CSV file
        path: PathBuf,
    },
    /// Create an administrator account
    CreateAdmin {
        #[arg(short = 'u', long)]
        username: String,

        #[arg(short = 'e', long)]
        email: String,

        #[arg(short = 'p', long)]
        password: String,
    },
}

fn open_csv(path: &PathBuf) -> anyhow::Result<File> {
    File::open(path).with_context(|| format!("File not found: {}", path.display()))
}

fn print_report(kind: &str, report: &ImportReport) {
    for message in &report.messages {
        println!("  {}", message);
    }
    println!(
        "\n{} import finished: {} created, {} skipped",
        kind, report.created, report.skipped
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let _log_guard =
        logging::init_tracing(&config.logging).context("Failed to initialize logging")?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let import = ImportService::new(Repository::new(pool));

    match cli.command {
        Commands::ImportUsers { path } => {
            let report = import.import_users(open_csv(&path)?).await?;
            print_report("User", &report);
        }
        Commands::ImportEquipment { path } => {
            let report = import.import_equipment(open_csv(&path)?).await?;
            print_report("Equipment", &report);
        }
        Commands::ImportVenues { path } => {
            let report = import.import_venues(open_csv(&path)?).await?;
            print_report("Venue", &report);
        }
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => {
            let created = import.create_admin(&username, &email, &password).await?;
            println!("Administrator {} created", created);
        }
    }

    Ok(())
}
