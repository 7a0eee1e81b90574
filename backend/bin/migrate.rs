use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use kindred::db::{migrations, DatabaseConfig};
use kindred::{get_db_pool, utils};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_logging();

    let matches = Command::new("migrate")
        .about("Apply the Kindred database schema")
        .arg(
            Arg::new("list")
                .long("list")
                .help("Print the embedded migrations without connecting")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("list") {
        for (version, description) in migrations::embedded_migrations() {
            println!("{}  {}", version, description);
        }
        return Ok(());
    }

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    info!("🗄️  Running database migrations...");
    migrations::run_migrations(&pool).await?;
    info!("✅ Migrations completed");

    Ok(())
}
