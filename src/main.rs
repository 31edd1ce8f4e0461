//! Issuedeck server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use sea_orm_migration::MigratorTrait;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use issuedeck_lib::api::{self, ApiDoc};
use issuedeck_lib::config::Config;
use issuedeck_lib::middleware::RequestLogger;
use issuedeck_lib::migration::Migrator;
use issuedeck_lib::services::scheduler::{SchedulerConfig, start_sync_task};
use issuedeck_lib::db;
use issuedeck_lib::services::{GithubClient, SyncService, TokenCipher, session};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, DECK_SESSION_SECRET,");
            error!("    and DECK_TOKEN_KEY must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Issuedeck Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and secrets");
    }

    // Connect to the database
    let database = db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    info!("Database connection established");

    // Run migrations
    Migrator::up(&database, None)
        .await
        .expect("Failed to run migrations");
    info!("Database migrations complete");

    // Build shared services
    let cipher =
        TokenCipher::from_hex_key(&config.token_key_hex).expect("Failed to build token cipher");
    let github = GithubClient::new();
    let sync = std::sync::Arc::new(SyncService::new(
        database.clone(),
        github,
        cipher.clone(),
        config.reconcile_mode,
    ));

    // Start the sync background task
    start_sync_task(
        database.clone(),
        sync.clone(),
        SchedulerConfig {
            cache_ttl_secs: config.cache_ttl_secs,
            scan_interval_secs: config.sync_scan_interval_secs,
        },
    );
    info!(
        "Sync scheduler started (ttl: {} seconds, scan every {} seconds)",
        config.cache_ttl_secs, config.sync_scan_interval_secs
    );

    // Prepare shared state
    let bind_address = config.bind_address();
    let is_development = config.is_development();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    // Start HTTP server
    HttpServer::new(move || {
        // Configure CORS
        let cors = if is_development {
            // Permissive CORS for development
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                ])
                .supports_credentials()
                .max_age(3600)
        } else {
            // Restrictive CORS for production (same-origin only)
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::CONTENT_TYPE,
                ])
                .max_age(3600)
        };

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            // Add request logging middleware
            .wrap(RequestLogger)
            // Add shared state
            .app_data(web::Data::new(database.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(cipher.clone()))
            .app_data(web::Data::from(sync.clone()))
            // Configure API routes
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(session::configure_routes)
                    .configure(api::configure_token_routes)
                    .configure(api::configure_repository_routes)
                    .configure(api::configure_issue_routes),
            )
            // Swagger UI with the generated OpenAPI document
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
