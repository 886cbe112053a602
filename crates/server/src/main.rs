//! Afrec server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use apalis::prelude::*;
use axum::{Router, middleware};
use afrec_api::{AppState, router as api_router};
use afrec_common::{Config, LocalStorage, StorageBackend};
use afrec_core::{
    DeviceService, EmailConfig, EmailProvider, EmailService, IssueRequestService, MailgunConfig,
    SendGridConfig, SmtpConfig, StatusChangeNotifier, UserService,
};
use afrec_db::repositories::{
    DeviceDocumentRepository, DeviceRepository, IssueRequestRepository, PasswordResetRepository,
    UserProfileRepository, UserRepository,
};
use afrec_queue::{EmailJob, EmailWorkerContext, email_worker};
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
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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

/// Build the email service from configuration. Returns a disabled service
/// when outbound email is turned off.
fn build_email_service(config: &Config) -> EmailService {
    if !config.email.enabled {
        info!("Outbound email disabled");
        return EmailService::new(None);
    }

    let provider = match config.email.provider.as_str() {
        "smtp" => {
            let Some(host) = config.email.smtp_host.clone() else {
                tracing::warn!("No SMTP host configured, disabling outbound email");
                return EmailService::new(None);
            };
            EmailProvider::Smtp(SmtpConfig {
                host,
                port: config.email.smtp_port,
                starttls: config.email.smtp_starttls,
                username: config.email.smtp_username.clone(),
                password: config.email.smtp_password.clone(),
            })
        }
        "sendgrid" => {
            let Some(api_key) = config.email.sendgrid_api_key.clone() else {
                tracing::warn!("No SendGrid API key configured, disabling outbound email");
                return EmailService::new(None);
            };
            EmailProvider::SendGrid(SendGridConfig { api_key })
        }
        "mailgun" => {
            let (Some(api_key), Some(domain)) = (
                config.email.mailgun_api_key.clone(),
                config.email.mailgun_domain.clone(),
            ) else {
                tracing::warn!("Mailgun key or domain missing, disabling outbound email");
                return EmailService::new(None);
            };
            EmailProvider::Mailgun(MailgunConfig {
                api_key,
                domain,
                eu_region: config.email.mailgun_eu_region,
            })
        }
        other => {
            tracing::warn!(provider = other, "Unknown email provider, disabling outbound email");
            return EmailService::new(None);
        }
    };

    EmailService::new(Some(EmailConfig {
        provider,
        from_address: config.email.from_address.clone(),
        from_name: config.email.from_name.clone(),
        reply_to: config.email.support_address.clone(),
        app_name: config.notifications.app_name.clone(),
        app_url: config.server.url.clone(),
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "afrec=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting afrec server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = afrec_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    afrec_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis and initialize job queue
    info!("Connecting to Redis...");
    let redis_client =
        redis::Client::open(config.redis.url.as_str()).expect("Failed to create Redis client");
    let redis_conn = redis::aio::ConnectionManager::new(redis_client)
        .await
        .expect("Failed to connect to Redis");
    let redis_storage = apalis_redis::RedisStorage::<EmailJob>::new(redis_conn);
    info!("Connected to Redis job queue");

    // Initialize file storage
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));

    // Initialize email + notification dispatch
    let email_service = build_email_service(&config);
    let notifier = StatusChangeNotifier::new(
        email_service.clone(),
        config.notifications.admin_emails.clone(),
        config.server.frontend_url.clone(),
        config.email.welcome_attachments.clone(),
    );

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let reset_repo = PasswordResetRepository::new(Arc::clone(&db));
    let device_repo = DeviceRepository::new(Arc::clone(&db));
    let document_repo = DeviceDocumentRepository::new(Arc::clone(&db));
    let issue_request_repo = IssueRequestRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(
        user_repo.clone(),
        profile_repo,
        reset_repo,
        notifier.clone(),
    );
    let device_service = DeviceService::new(
        device_repo.clone(),
        document_repo,
        user_repo.clone(),
        notifier.clone(),
        Arc::clone(&storage),
    );
    let issue_request_service = IssueRequestService::new(
        issue_request_repo,
        device_repo,
        user_repo,
        notifier,
        storage,
    );

    // Create app state
    let state = AppState {
        user_service,
        device_service,
        issue_request_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            afrec_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start the email delivery worker
    info!("Starting email delivery worker...");
    let worker_ctx = EmailWorkerContext::new(email_service);
    tokio::spawn(async move {
        let monitor = Monitor::new().register({
            WorkerBuilder::new("email")
                .data(worker_ctx)
                .backend(redis_storage)
                .build_fn(email_worker)
        });

        if let Err(e) = monitor.run().await {
            tracing::error!(error = %e, "Email worker failed");
        }
    });
    info!("Email delivery worker started");

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
