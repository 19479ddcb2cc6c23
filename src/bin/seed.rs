use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::{Parser, Subcommand};
use cri_accounts::{
    db,
    seed::{self, AdminSeed, AdminSeedOutcome},
    users::PgUserStore,
};

#[derive(Parser)]
#[command(name = "seed", version, about = "Database maintenance for the accounts service")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the admin account if no admin exists yet
    CreateAdmin {
        #[arg(long, default_value = "Admin User")]
        name: String,
        #[arg(long, default_value = "admin@example.com")]
        email: String,
        #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin123")]
        password: String,
    },
    /// Insert one pending, one approved and one rejected sample user (needs an admin)
    CreateTestUsers,
    /// Delete every user record
    ClearDatabase {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Commands::ClearDatabase { yes: false } = cli.command {
        if !confirm("Are you sure you want to clear the database? (yes/no): ")? {
            println!("Database clearing cancelled");
            return Ok(());
        }
    }

    let pool = db::connect(&cli.database_url).await?;
    db::run_migrations(&pool).await?;
    let store = PgUserStore::new(pool);

    match cli.command {
        Commands::CreateAdmin { name, email, password } => {
            match seed::create_admin(&store, AdminSeed { name, email, password }).await? {
                AdminSeedOutcome::AlreadyExists(admin) => {
                    println!("Admin user already exists");
                    println!("Email: {}", admin.email);
                }
                AdminSeedOutcome::Created(admin) => {
                    println!("Admin user created successfully:");
                    println!("Email: {}", admin.email);
                    println!("Role: {}", admin.role);
                    println!("Status: {}", admin.status);
                }
            }
        }
        Commands::CreateTestUsers => {
            for (email, created) in seed::create_test_users(&store).await? {
                if created {
                    println!("Test user created: {email}");
                } else {
                    println!("Test user already exists: {email}");
                }
            }
            println!("Test users seeding completed");
        }
        Commands::ClearDatabase { .. } => {
            let removed = seed::clear_database(&store).await?;
            println!("Database cleared successfully ({removed} users removed)");
        }
    }

    Ok(())
}
