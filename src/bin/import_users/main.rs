//! One-off batch import of users from a flat comma-delimited file.
//!
//! Expected columns: id,username,email,role with a header row. Unknown
//! roles fall back to "user".

use chrono::Utc;
use env_logger::Env;
use migration::{Migrator, MigratorTrait};
use scorebook::config::Config;
use scorebook::orm::users::{self, Role};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/users.csv".to_string());

    let config = Config::from_env()?;
    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    let content = std::fs::read_to_string(&path)?;
    let mut imported = 0usize;

    for line in content.lines() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 4 {
            log::warn!("Skipping malformed row: {:?}", line);
            continue;
        }
        // Header row.
        if fields[1] == "username" {
            continue;
        }

        let role = match fields[3] {
            "moderator" => Role::Moderator,
            "admin" => Role::Admin,
            _ => Role::User,
        };

        let user = users::ActiveModel {
            username: Set(fields[1].to_owned()),
            email: Set(fields[2].to_lowercase()),
            role: Set(role),
            is_superuser: Set(false),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        match user.insert(&db).await {
            Ok(created) => {
                imported += 1;
                log::debug!("Imported user {}", created.username);
            }
            Err(e) => log::warn!("Failed to import row {:?}: {}", line, e),
        }
    }

    log::info!("Imported {} users from {}", imported, path);

    Ok(())
}
