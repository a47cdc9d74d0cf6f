use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use migration::{Migrator, MigratorTrait};
use scorebook::config::Config;
use sea_orm::Database;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    let bind_addr = config.bind_addr.clone();
    let db = Data::new(db);
    let config = Data::new(config);

    log::info!("Listening on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(config.clone())
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(scorebook::web::configure)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
