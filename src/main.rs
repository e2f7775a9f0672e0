//! Academy server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use academy_lib::api::{self, ApiDoc};
use academy_lib::config::Config;
use academy_lib::db::DbPool;
use academy_lib::middleware::RequestLogger;
use academy_lib::services::video_host::{MuxVideoHost, VideoHostService};
use academy_lib::services::{self, CleanupConfig, Copywriter, Storage};

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static directory not configured"))?;
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

fn fail(message: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", message, e);
    std::io::Error::other(format!("{}: {}", message, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| std::io::Error::other(format!("Failed to set tracing subscriber: {}", e)))?;

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL, S3 credentials and ACADEMY_SESSION_SECRET must be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Academy Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = DbPool::new(&config.database)
        .await
        .map_err(|e| fail("Failed to initialize database", e))?;
    info!("Database connection established");

    pool.run_migrations()
        .await
        .map_err(|e| fail("Failed to run migrations", e))?;
    info!("Database migrations complete");

    let storage = Storage::new(&config.storage)
        .await
        .map_err(|e| fail("Failed to initialize storage", e))?;

    if !config.mux.is_configured() {
        warn!("MUX_TOKEN_ID/MUX_TOKEN_SECRET not set - video sync will fail");
    }
    let video_host: Arc<dyn VideoHostService> = Arc::new(
        MuxVideoHost::new(&config.mux).map_err(|e| fail("Failed to initialize Mux client", e))?,
    );
    let copywriter = Copywriter::new(&config.copywriter)
        .map_err(|e| fail("Failed to initialize copywriter", e))?;
    if !copywriter.is_configured() {
        info!("Copywriter disabled (no API key)");
    }

    let cleanup_config = CleanupConfig {
        interval_secs: if config.is_development() { 60 } else { 3600 },
        ..CleanupConfig::default()
    };
    services::start_cleanup_task(Arc::new(pool.clone()), cleanup_config);

    let bind_address = config.bind_address();
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();
    // Multipart bodies carry one image plus a small crops field.
    let payload_limit = config.max_image_size + 64 * 1024;

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development { 4 } else { num_cpus::get() };
    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    let pool = web::Data::new(pool);
    let storage = web::Data::new(storage);
    let video_host: web::Data<dyn VideoHostService> = web::Data::from(video_host);
    let copywriter = web::Data::new(copywriter);
    let config = web::Data::new(config);

    let server = HttpServer::new(move || {
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .supports_credentials()
        } else {
            // Same-origin only
            Cors::default()
        };
        let cors = cors
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .max_age(3600);

        let mut app = App::new()
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(pool.clone())
            .app_data(storage.clone())
            .app_data(video_host.clone())
            .app_data(copywriter.clone())
            .app_data(config.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            .service(web::scope("/api/v1").configure(api::configure_routes))
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api/openapi.json", ApiDoc::openapi()),
            );

        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .service(Files::new("/favicon", dir.clone()).index_file("favicon.ico"))
                .default_service(web::route().to(spa_fallback));
        }

        app
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
