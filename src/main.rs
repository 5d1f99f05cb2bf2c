use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use leadflow::config::Settings;
use leadflow::core::{
    LeadOrchestrator, Matcher, NotificationDispatcher, QualityGate, RelatedCategories,
};
use leadflow::routes::{self, handle_json_payload_error, AppState};
use leadflow::services::{
    CacheManager, ChannelTransport, HttpEmailTransport, LeadStore, LlmClassifier, LlmClient,
    LlmPersonalizer, PostgresClient, SessionStore, TwilioSmsTransport,
};

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Leadflow lead engine...");

    let settings = Settings::load().map_err(|e| startup_error("Configuration error", e))?;
    info!("Configuration loaded successfully");

    // Datastore
    let store: Arc<dyn LeadStore> = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error("PostgreSQL connection error", e))?,
    );
    info!("PostgreSQL client initialized");

    // LLM collaborators
    let llm = LlmClient::new(
        settings.llm.base_url.clone(),
        settings.llm.api_key.clone(),
        settings.llm.model.clone(),
        Duration::from_secs(settings.llm.timeout_secs),
    )
    .map_err(|e| startup_error("LLM client error", e))?
    .with_temperature(settings.llm.temperature);
    info!("LLM client initialized (model: {})", llm.model());

    let classifier = Arc::new(LlmClassifier::new(llm.clone()));

    // Dispatcher and its optional channels
    let mut dispatcher = NotificationDispatcher::new(store.clone())
        .with_batch_size(settings.dispatch.batch_size);

    if settings.llm.personalize {
        dispatcher = dispatcher.with_personalizer(Arc::new(LlmPersonalizer::new(llm)));
    } else {
        info!("Personalization disabled, using template messages");
    }

    match settings.email.as_ref().filter(|e| e.enabled) {
        Some(email) => {
            let transport: Arc<dyn ChannelTransport> = Arc::new(
                HttpEmailTransport::new(
                    email.api_url.clone(),
                    email.api_key.clone(),
                    email.from_address.clone(),
                    Duration::from_secs(email.timeout_secs),
                )
                .map_err(|e| startup_error("Email transport error", e))?,
            );
            dispatcher = dispatcher.with_email(transport);
            info!("Email channel enabled ({})", email.from_address);
        }
        None => warn!("Email channel disabled"),
    }

    match settings.sms.as_ref().filter(|s| s.enabled) {
        Some(sms) => {
            let transport: Arc<dyn ChannelTransport> = Arc::new(
                TwilioSmsTransport::new(
                    sms.api_url.clone(),
                    sms.account_sid.clone(),
                    sms.auth_token.clone(),
                    sms.from_number.clone(),
                    Duration::from_secs(sms.timeout_secs),
                )
                .map_err(|e| startup_error("SMS transport error", e))?,
            );
            dispatcher = dispatcher.with_sms(transport);
            info!("SMS channel enabled ({})", sms.from_number);
        }
        None => info!("SMS channel disabled"),
    }

    // Matcher
    let related = match &settings.matching.related_categories_path {
        Some(path) => RelatedCategories::load(path),
        None => RelatedCategories::builtin(),
    }
    .map_err(|e| startup_error("Category map error", e))?;
    let matcher = Matcher::new(settings.matching.clone(), related);

    let orchestrator = Arc::new(
        LeadOrchestrator::new(classifier, store.clone(), matcher, dispatcher)
            .with_quality_gate(QualityGate::new(settings.orchestrator.min_quality_score))
            .with_auto_send(settings.orchestrator.auto_send_notifications),
    );
    info!(
        "Orchestrator initialized (min quality {:.1}, auto-send {})",
        settings.orchestrator.min_quality_score, settings.orchestrator.auto_send_notifications
    );

    // Session storage (optional - leads still flow without it)
    let sessions = match &settings.cache {
        Some(cache) => {
            let ttl = cache.ttl_secs.unwrap_or(3600);
            let l1_size = cache.l1_cache_size.unwrap_or(10_000);
            match CacheManager::new(&cache.redis_url, l1_size, ttl).await {
                Ok(manager) => {
                    info!("Session cache initialized (L1: {} entries, TTL: {}s)", l1_size, ttl);
                    Some(Arc::new(SessionStore::new(Arc::new(manager))))
                }
                Err(e) => {
                    error!("Failed to connect to Redis ({}), sessions disabled", e);
                    None
                }
            }
        }
        None => {
            warn!("No cache configured, sessions disabled");
            None
        }
    };

    let app_state = AppState {
        orchestrator,
        store,
        sessions,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
