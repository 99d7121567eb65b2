use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::ports::{AlertStore, BloodBankStore, NotificationStore, UserStore};
use domain::services::{
    AlertLifecycleService, InventoryLedger, LoggingPushTransport, NotificationDispatcher,
    PushTransport,
};
use persistence::repositories::{
    AlertRepository, BloodBankRepository, NotificationRepository, UserRepository,
};
use shared::jwt::{JwtConfig, JwtError};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_auth, trace_id,
    RateLimiterState,
};
use crate::routes::{alerts, auth, blood_banks, donors, health, notifications};
use crate::services::{AuthService, FcmPushTransport};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub users: Arc<dyn UserStore>,
    pub blood_banks: Arc<dyn BloodBankStore>,
    pub auth: AuthService,
    pub alerts: AlertLifecycleService,
    pub notifications: NotificationDispatcher,
    pub inventory: InventoryLedger,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// Wires the Postgres stores into the domain services.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let config = Arc::new(config);
        let jwt = Arc::new(JwtConfig::from_rsa_pem(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?);

        let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
        let blood_banks: Arc<dyn BloodBankStore> = Arc::new(BloodBankRepository::new(pool.clone()));
        let alert_store: Arc<dyn AlertStore> = Arc::new(AlertRepository::new(pool.clone()));
        let notification_store: Arc<dyn NotificationStore> =
            Arc::new(NotificationRepository::new(pool.clone()));

        let notifications = NotificationDispatcher::new(notification_store, push_transport(&config));
        let alerts = AlertLifecycleService::new(
            alert_store,
            users.clone(),
            blood_banks.clone(),
            notifications.clone(),
            config.alerts.to_settings(),
        );

        let rate_limiter = if config.security.rate_limit_per_minute > 0 {
            Some(Arc::new(RateLimiterState::new(
                config.security.rate_limit_per_minute,
            )))
        } else {
            None
        };

        Ok(Self {
            pool,
            auth: AuthService::new(users.clone(), blood_banks.clone(), jwt.clone()),
            inventory: InventoryLedger::new(blood_banks.clone()),
            config,
            jwt,
            users,
            blood_banks,
            alerts,
            notifications,
            rate_limiter,
        })
    }
}

/// FCM when enabled and configured correctly, otherwise messages are only logged.
fn push_transport(config: &Config) -> Arc<dyn PushTransport> {
    if !config.fcm.enabled {
        tracing::info!("FCM disabled, push notifications will be logged only");
        return Arc::new(LoggingPushTransport::new());
    }

    match FcmPushTransport::new(config.fcm.clone()) {
        Ok(transport) => {
            tracing::info!(project_id = %config.fcm.project_id, "FCM push transport enabled");
            Arc::new(transport)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize FCM, falling back to logging transport");
            Arc::new(LoggingPushTransport::new())
        }
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let state = AppState::new(config, pool)?;
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Auth runs first (outermost route layer), then rate limiting keyed by the principal
    let protected_routes = Router::new()
        .route("/api/auth/profile", get(auth::profile))
        .route("/api/auth/bloodbank/profile", get(auth::blood_bank_profile))
        .route("/api/alerts", post(alerts::create_alert))
        .route("/api/alerts/notify-donors", post(alerts::notify_donors))
        .route("/api/alerts/bloodbank", get(alerts::list_for_blood_bank))
        .route("/api/alerts/doctor", get(alerts::list_for_doctor))
        .route("/api/alerts/:alert_id/respond", post(alerts::respond_to_alert))
        .route("/api/alerts/:alert_id/responses", get(alerts::list_responses))
        .route("/api/donors/nearby-alerts", get(donors::nearby_alerts))
        .route("/api/donors/location", patch(donors::update_location))
        .route("/api/donors/status", patch(donors::update_status))
        .route(
            "/api/bloodbanks/inventory",
            get(blood_banks::get_inventory).patch(blood_banks::update_inventory),
        )
        .route("/api/notifications/history", get(notifications::history))
        .route("/api/notifications/:notification_id/read", patch(notifications::mark_read))
        .route("/api/notifications/fcm-token", post(notifications::register_push_token))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/bloodbank/register", post(auth::register_blood_bank))
        .route("/api/auth/bloodbank/login", post(auth::login_blood_bank))
        .route("/api/bloodbanks/nearby", get(blood_banks::nearby))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state))
}
