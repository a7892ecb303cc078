use fishbot_conversation::{ConversationHandler, InMemorySessionStore, SessionStore};
use fishbot_integration::{
    DialogflowClassifier, GoogleGeocoder, ImageCache, MessengerClient, RotatingRecognizer,
    StaticCatalog,
};
use fishbot_server::{
    app::{self, AppState},
    cleanup,
    config::ServerConfig,
    dispatch::Dispatcher,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        port = config.port,
        api_version = %config.messenger.api_version,
        locale = %config.classifier.locale,
        "Loaded configuration"
    );

    let http = reqwest::Client::new();
    let images = Arc::new(ImageCache::new(config.images.cache_max_entries));
    let messenger = Arc::new(MessengerClient::new(
        http.clone(),
        config.messenger.clone(),
        images,
    ));

    // Register the "Get started" button
    if let Err(e) = messenger.setup_profile().await {
        tracing::warn!(error = %e, "Failed to set up messenger profile");
    }

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    cleanup::spawn_session_cleanup(Arc::clone(&sessions), &config.session);

    let catalog = Arc::new(StaticCatalog::default());
    let locale = config.classifier.locale.clone();
    let handler = ConversationHandler::new(
        sessions,
        Arc::new(DialogflowClassifier::new(http.clone(), config.classifier)),
        catalog.clone(),
        Arc::new(GoogleGeocoder::new(http, config.geocoder)),
    )
    .with_locale(locale);
    let dispatcher = Arc::new(Dispatcher::new(
        handler,
        messenger.clone(),
        messenger.clone(),
        Arc::new(RotatingRecognizer::new(catalog)),
    ));

    let app_state = Arc::new(AppState::new(
        config.messenger.verify_token.clone(),
        &config.messenger.app_secret,
        dispatcher,
    ));
    let app = app::router(app_state, &config.images.dir);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
