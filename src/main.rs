mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::geocoding::{
    routes as geocoding_routes, GeocodeBackfill, GeocodeResolver, NominatimClient,
};
use crate::features::reports::handlers::ReportState;
use crate::features::reports::services::{DailyLimitService, DuplicateGuard};
use crate::features::reports::{
    routes as reports_routes, ReportService, ReportSubmissionPipeline, SubmissionGate,
};
use crate::modules::sheets::{
    ReportMirror, ServiceAccountKey, ServiceAccountTokenManager, SheetsMirror,
};
use crate::modules::storage::{LocalPhotoStorage, PhotoStorage};
use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically
    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Photo storage
    let photo_storage = LocalPhotoStorage::new(&config.storage.upload_dir);
    photo_storage.ensure_root_exists().await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to create upload directory {}: {}",
            config.storage.upload_dir,
            e
        )
    })?;
    tracing::info!(
        "Photo storage initialized at {}",
        photo_storage.root().display()
    );
    let photo_storage: Arc<dyn PhotoStorage> = Arc::new(photo_storage);

    let report_service = Arc::new(ReportService::new(pool.clone()));

    // Geocoding (optional)
    let resolver = if config.geocoding.enabled {
        let client = NominatimClient::new(&config.geocoding)
            .map_err(|e| anyhow::anyhow!("Failed to initialize geocoding client: {}", e))?;
        let base_url = client.base_url().to_string();
        let resolver = Arc::new(GeocodeResolver::new(Arc::new(client)));

        if resolver.test_connection().await {
            tracing::info!("Geocoding provider reachable at {}", base_url);
        } else {
            tracing::warn!(
                "Geocoding provider at {} is not reachable, reports will be stored without coordinates until it recovers",
                base_url
            );
        }

        if config.geocoding.backfill_interval_secs > 0 {
            let backfill = GeocodeBackfill::new(
                Arc::clone(&report_service),
                Arc::clone(&resolver),
                Duration::from_secs(config.geocoding.backfill_interval_secs),
                config.geocoding.backfill_batch_size,
                config.geocoding.max_attempts,
            );
            tokio::spawn(async move {
                backfill.run().await;
            });
            tracing::info!("Geocode backfill worker spawned");
        }

        Some(resolver)
    } else {
        tracing::info!("Geocoding disabled");
        None
    };

    // Spreadsheet mirror (optional)
    let mirror: Option<Arc<dyn ReportMirror>> = if config.sheets.enabled {
        let key = ServiceAccountKey::from_file(&config.sheets.credentials_path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load sheets credentials: {}", e))?;
        let tokens = ServiceAccountTokenManager::new(key)
            .map_err(|e| anyhow::anyhow!("Failed to initialize sheets token manager: {}", e))?;
        tracing::info!(
            "Spreadsheet mirror enabled (worksheet '{}', service account {})",
            config.sheets.worksheet_name,
            tokens.client_email()
        );
        let mirror: Arc<dyn ReportMirror> = Arc::new(SheetsMirror::new(
            Arc::new(tokens),
            config.sheets.spreadsheet_id.clone(),
            config.sheets.worksheet_name.clone(),
        ));
        Some(mirror)
    } else {
        tracing::info!("Spreadsheet mirror disabled");
        None
    };

    // Submission services
    let submission = config.submission.clone();
    let gate = Arc::new(SubmissionGate::new(submission.session_ttl));
    let duplicate_guard = Arc::new(DuplicateGuard::new(
        Arc::clone(&report_service),
        submission.duplicate_window,
    ));
    let daily_limit = Arc::new(DailyLimitService::new(
        Arc::clone(&report_service),
        submission.max_reports_per_day,
    ));
    let pipeline = Arc::new(ReportSubmissionPipeline::new(
        Arc::clone(&gate),
        duplicate_guard,
        daily_limit,
        Arc::clone(&report_service),
        photo_storage,
        resolver.clone(),
        mirror,
        submission.clone(),
    ));
    tracing::info!("Report submission pipeline initialized");

    let report_state = ReportState {
        pipeline,
        gate,
        reports: report_service,
        resolver: resolver.clone(),
    };

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(
                Arc::new(credentials),
                "swagger",
            )))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Operator routes (basic auth), mounted only when credentials are configured
    let operator_routes = if let Some(credentials) = config.operator.credentials() {
        tracing::info!("Operator routes enabled");
        reports_routes::operator_routes(report_state.clone()).route_layer(from_fn(
            middleware::basic_auth_middleware(Arc::new(credentials), "operator"),
        ))
    } else {
        tracing::info!("Operator routes disabled (no credentials configured)");
        Router::new()
    };

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required)
    let mut public_routes =
        Router::new().merge(reports_routes::routes(report_state, submission.max_photo_bytes));
    if let Some(resolver) = resolver {
        public_routes = public_routes.merge(geocoding_routes::routes(resolver));
    }

    let app = Router::new()
        .merge(swagger)
        .merge(public_routes)
        .merge(operator_routes)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(Duration::from_secs(60))
            .with_interval(Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    // Connect info feeds the client IP fallback of the daily report limit
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
