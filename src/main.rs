use chrono::Local;
use home_energy_client::{
    auth::{IdentityToolkit, InMemoryAuth},
    config::{BackendKind, Config},
    notify::ChannelNotifier,
    preferences::PreferencesFile,
    seed::Seed,
    store::{memory::InMemoryStore, rest::RestStore},
    views::{AccountScreen, AppContext, DashboardScreen, SessionState},
    AuthGateway, DashboardState, DocumentStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "home_energy_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting home-energy-client");

    // Load configuration
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());

    let config = Config::load(&config_path)?;
    info!("Configuration loaded from: {}", config_path);

    let today = Local::now().date_naive();
    let (auth, store) = build_backend(&config, today).await?;

    let prefs_file = PreferencesFile::new(&config.preferences_path);
    let prefs = prefs_file.load();
    let mut session = SessionState::start(auth.as_ref(), &prefs_file)?;
    if session.is_first_launch {
        info!("First launch");
    }

    let (notifier, mut notifications) = ChannelNotifier::new(32);
    let ctx = AppContext::new(auth.clone(), store, Arc::new(notifier), prefs.notifications);

    let Some(account) = config.account.clone() else {
        warn!("No account configured, nothing to show");
        return Ok(());
    };

    let mut account_screen = AccountScreen::new(ctx.clone());
    account_screen.default_rate = config.default_rate;
    let user = account_screen.sign_in(&account.email, &account.password).await?;
    session.update(Some(&user));

    let mut dashboard = DashboardScreen::new(ctx);
    dashboard.load(today).await?;
    info!("Hello, {}", dashboard.user_name);

    let mut states = dashboard.subscribe();
    print_devices(&states.borrow_and_update());

    let mut users = auth.watch_user();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(notification) = notifications.recv() => {
                info!("[{}] {}", notification.title, notification.body);
            }
            changed = states.changed() => {
                if changed.is_err() {
                    error!("Dashboard stopped");
                    break;
                }
                print_devices(&states.borrow_and_update());
            }
            alive = session.follow(&mut users) => {
                if !alive || !session.is_logged_in {
                    info!("Signed out");
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    dashboard.stop();
    info!("Shutdown complete");
    Ok(())
}

async fn build_backend(
    config: &Config,
    today: chrono::NaiveDate,
) -> anyhow::Result<(Arc<dyn AuthGateway>, Arc<dyn DocumentStore>)> {
    match config.backend.kind {
        BackendKind::Memory => {
            let auth = Arc::new(InMemoryAuth::new());
            let store = Arc::new(InMemoryStore::new());
            if let Some(path) = &config.backend.seed_path {
                Seed::load(path)?.apply(&auth, &store, today).await?;
                info!("Seed loaded from: {}", path.display());
            }
            Ok((auth as Arc<dyn AuthGateway>, store as Arc<dyn DocumentStore>))
        }
        BackendKind::Rest => {
            // Both are checked by Config::validate
            let api_key = config.backend.api_key.clone().unwrap_or_default();
            let project_id = config.backend.project_id.clone().unwrap_or_default();
            let auth: Arc<dyn AuthGateway> = Arc::new(IdentityToolkit::new(api_key));
            let store: Arc<dyn DocumentStore> = Arc::new(RestStore::new(
                &project_id,
                auth.clone(),
                Duration::from_secs(config.backend.poll_interval_secs),
            ));
            info!("Using project {}", project_id);
            Ok((auth, store))
        }
    }
}

fn print_devices(state: &DashboardState) {
    if let Some(message) = &state.error_message {
        error!("{}", message);
    }
    for item in &state.devices {
        let (usage, cost) = item
            .energy
            .as_ref()
            .map(|e| (e.usage_time, e.cost))
            .unwrap_or_default();
        info!(
            "{:<24} {:<4} {:>6} min  ${:.2}",
            item.device.name,
            if item.is_on() { "ON" } else { "OFF" },
            usage,
            cost
        );
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
