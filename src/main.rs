use actix_cors::Cors;
use actix_web::{
    http::header,
    middleware::{Compress, Logger},
    web, App, HttpServer,
};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use user_import_service::api;
use user_import_service::backend::SupabaseClient;
use user_import_service::config::AppConfig;
use user_import_service::services::ImportService;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("🚀 Starting User Import Service...");

    let backend = SupabaseClient::new(&config.backend).map_err(|e| {
        log::error!("❌ Failed to build backend client: {}", e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    std::fs::create_dir_all(&config.upload_dir)?;
    log::info!("📁 Uploads staged in {}", config.upload_dir.display());

    let import_service = web::Data::new(ImportService::new(
        Arc::new(backend),
        config.import,
        config.upload_dir.clone(),
    ));

    match config.import.max_rows {
        Some(max) => log::info!("📏 Imports capped at {} rows", max),
        None => log::info!("📏 Imports are not row-capped"),
    }

    let bind = (config.host.clone(), config.port);
    log::info!("🌐 Server starting on {}:{}", bind.0, bind.1);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", bind.0, bind.1);

    let api_key = config.api_key.clone();
    let cors_origins = config.cors_allowed_origins.clone();

    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::HeaderName::from_static("x-api-key"),
            ])
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();
        let api_key = api_key.clone();

        App::new()
            .app_data(import_service.clone())
            .wrap(cors)
            .wrap(Compress::default())
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            // Health & counters
            .route("/health", web::get().to(api::health::health_check))
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Bulk import, requires X-API-Key
            .configure(|cfg| api::users::configure(cfg, &api_key))
    })
    .bind(bind)?
    .run()
    .await
}
