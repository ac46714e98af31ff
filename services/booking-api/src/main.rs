//! Manikura Booking API

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use booking_api::api::{self, AppState};
use booking_api::application::{
    AuthService, PaymentService, ReservationService, SalonService, default_templates,
    notification_channel,
};
use booking_api::domain::repositories::{ReservationRepository, SalonRepository, UserRepository};
use booking_api::infrastructure::persistence::{
    PostgresReservationRepository, PostgresSalonRepository, PostgresUserRepository, schema,
};
use manikura_adapter_email::EmailClient;
use manikura_adapter_postgres::{MigrationManager, PostgresConfig, create_pool};
use manikura_adapter_stripe::StripeClient;
use manikura_auth_core::TokenService;
use manikura_config::AppConfig;
use manikura_telemetry::{init_metrics, init_tracing, init_tracing_json};
use secrecy::ExposeSecret;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置
    let config = AppConfig::load("config")?;

    // 初始化 tracing
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );

    let metrics = init_metrics();

    // 数据库连接池 + 迁移
    let pg_config = PostgresConfig::new(config.database.url.expose_secret())
        .with_max_connections(config.database.max_connections);
    let pool = create_pool(&pg_config).await?;

    let migration_result = MigrationManager::new(pool.clone())
        .migrate(&schema::migrations())
        .await?;
    if !migration_result.is_success() {
        return Err(format!("Database migration failed: {:?}", migration_result.errors).into());
    }
    info!(
        applied = migration_result.applied_count(),
        "Database migrations applied"
    );

    // Repositories
    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let salons: Arc<dyn SalonRepository> = Arc::new(PostgresSalonRepository::new(pool.clone()));
    let reservations: Arc<dyn ReservationRepository> =
        Arc::new(PostgresReservationRepository::new(pool.clone()));

    // 通知队列 + worker
    let email_client = Arc::new(EmailClient::new(config.email.clone()));
    let (notifier, worker) = notification_channel(
        config.notification.queue_capacity,
        email_client,
        default_templates()?,
    );
    let worker_handle = tokio::spawn(worker.run());

    // 应用服务
    let token_service = Arc::new(TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in as i64,
    ));
    let auth = Arc::new(AuthService::new(users.clone(), token_service));
    let salon_service = Arc::new(SalonService::new(salons.clone(), reservations.clone()));
    let reservation_service = Arc::new(ReservationService::new(
        reservations.clone(),
        salons.clone(),
        users.clone(),
        notifier.clone(),
    ));
    let gateway = Arc::new(StripeClient::new(config.stripe.clone()));
    let payment_service = Arc::new(PaymentService::new(
        gateway,
        reservations,
        salons,
        auth.clone(),
        notifier,
        config.stripe.clone(),
    ));

    let state = AppState {
        auth,
        salons: salon_service,
        reservations: reservation_service,
        payments: payment_service,
        pool,
        metrics: Some(metrics),
    };

    let app = api::build_router(state, &config.cors.allowed_origins);

    // 启动服务器
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "Starting booking API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 服务器停止后所有 Notifier 句柄随之释放，worker 排空队列退出
    info!("Draining notification queue");
    let _ = tokio::time::timeout(Duration::from_secs(5), worker_handle).await;

    Ok(())
}

/// 等待关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
