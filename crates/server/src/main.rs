//! Civica server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use civica_api::{middleware::AppState, router as api_router};
use civica_common::Config;
use civica_core::{
    ComplaintService, DepartmentService, EmailService, JobService, JobWorkerContext,
    NotificationService, RewardPolicy, UserService,
};
use civica_db::repositories::{
    ComplaintRepository, DepartmentRepository, NotificationRepository, RewardAccountRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install signal handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civica=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting civica server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = civica_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    civica_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let reward_repo = RewardAccountRepository::new(Arc::clone(&db));
    let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
    let department_repo = DepartmentRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize email delivery
    let email_service = EmailService::new(config.email.clone())?;
    if email_service.is_enabled() {
        info!("Email delivery enabled");
    } else {
        info!("Email delivery disabled (no [email] configuration)");
    }

    let job_service = JobService::new();
    let job_sender = job_service.sender();
    job_service.start(JobWorkerContext {
        email_service,
    });

    // Initialize services
    let policy = RewardPolicy::from_config(&config.policy);
    let user_service = UserService::new(user_repo.clone(), reward_repo.clone());
    let mut complaint_service = ComplaintService::new(
        Arc::clone(&db),
        complaint_repo,
        user_repo.clone(),
        reward_repo,
        department_repo.clone(),
        policy,
    );
    complaint_service.set_job_sender(job_sender);
    let department_service = DepartmentService::new(department_repo, user_repo);
    let notification_service = NotificationService::new(notification_repo);

    // Create app state
    let state = AppState {
        user_service,
        complaint_service,
        department_service,
        notification_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            civica_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
