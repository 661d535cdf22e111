use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info, warn};
use user_api::application::book_service::BookService;
use user_api::application::user_service::UserService;
use user_api::data::book_repository::InMemoryBookRepository;
use user_api::data::mongo::{self, MongoBookRepository, MongoUserRepository};
use user_api::data::user_repository::InMemoryUserRepository;
use user_api::domain::repository::{BookRepository, UserRepository};
use user_api::infrastructure::config::AppConfig;
use user_api::infrastructure::logging::init_logging;
use user_api::presentation::handlers::AppState;
use user_api::presentation::middleware::{RequestIdMiddleware, TimingMiddleware};
use user_api::presentation::routes::{ROUTES, configure};

async fn build_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn UserRepository>, Arc<dyn BookRepository>)> {
    let Some(uri) = config.mongo_uri.as_deref() else {
        warn!("MONGO_URI is not set, records will only live in memory");
        return Ok((
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryBookRepository::new()),
        ));
    };

    let database = mongo::connect(uri, &config.database)
        .await
        .context("invalid MONGO_URI")?;
    let users = MongoUserRepository::new(database.clone());
    let books = MongoBookRepository::new(&database);

    // Keep serving if the database is down; requests report it as a server error.
    match users.ping().await {
        Ok(()) => info!(database = %config.database, "Database connected"),
        Err(e) => error!(error = %e, "MongoDB connection failed"),
    }

    Ok((Arc::new(users), Arc::new(books)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    info!(host = %config.host, port = config.port, "Configuration loaded");

    let (user_store, book_store) = build_stores(&config).await?;

    let state = web::Data::new(AppState {
        users: UserService::new(user_store),
        books: BookService::new(book_store),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(Cors::permissive())
            .configure(configure)
    });

    let server = server
        .bind(config.bind_address())
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;

    info!(host = %config.host, port = config.port, routes = ROUTES, "Server running");
    server.run().await?;
    Ok(())
}
