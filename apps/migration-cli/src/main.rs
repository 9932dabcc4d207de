use clap::{Parser, ValueEnum};
use document_manager::config::{parse_store_url, StoreKind};
use migration::{migrate, MigrationCommand};
use sea_orm::Database;

#[derive(Clone, Copy, ValueEnum)]
enum Command {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

impl From<Command> for MigrationCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Up => MigrationCommand::Up,
            Command::Down => MigrationCommand::Down,
            Command::Fresh => MigrationCommand::Fresh,
            Command::Reset => MigrationCommand::Reset,
            Command::Refresh => MigrationCommand::Refresh,
            Command::Status => MigrationCommand::Status,
        }
    }
}

#[derive(Parser)]
#[command(name = "docstore-migrate")]
#[command(about = "Prepare the SQLite document store schema")]
struct Args {
    /// Migration command to run
    #[arg(value_enum)]
    command: Command,

    /// Store URL, e.g. sqlite://docs.db?mode=rwc
    #[arg(long, env = "DOCSTORE_URL")]
    url: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_env_filter("migration=info,sqlx=warn")
        .init();

    let args = Args::parse();

    let url = match parse_store_url(&args.url) {
        Ok(StoreKind::Sqlite { url }) if !url.contains(":memory:") => url,
        Ok(_) => {
            eprintln!(
                "❌ In-memory stores are rebuilt on every connect; migrate a SQLite file instead."
            );
            eprintln!("Example: docstore-migrate --url 'sqlite://docs.db?mode=rwc' up");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(2);
        }
    };

    let db = match Database::connect(url.as_str()).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Connection failed: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = migrate(&db, args.command.into()).await {
        eprintln!("Migration failed: {e}");
        std::process::exit(1);
    }
}
