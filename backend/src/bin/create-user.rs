//! Create a login account from the command line
//! Useful for the very first Admin before anyone can use the register endpoint.
//!
//! Usage: create-user --username NAME --password PW --full-name "Full Name" [--role Admin]

use clap::Parser;

use barangay_api::{
    db,
    models::user::RegisterRequest,
    services::auth::AuthService,
};

#[derive(Parser)]
#[command(name = "create-user", about = "Create a user account in the barangay database")]
struct Args {
    #[arg(long)]
    username: String,

    #[arg(long)]
    password: String,

    #[arg(long)]
    full_name: String,

    /// Defaults to Staff
    #[arg(long)]
    role: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

    let pool = db::create_pool(&database_url, 2).await?;
    db::run_migrations(&pool).await?;

    let new_user = RegisterRequest {
        username: Some(args.username),
        password: Some(args.password),
        full_name: Some(args.full_name),
        role: args.role,
    }
    .validate()
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    let user = AuthService::register(&pool, new_user)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!("Created user {} ({}) with role {}", user.username, user.id, user.role);
    Ok(())
}
