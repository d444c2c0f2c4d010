use crate::cipher::SecretCipher;
use crate::config::InventoryConfig;
use crate::handlers::{credentials, groups, health, hosts, inventories};
use crate::services::{
    AccessEvaluator, ActivityLog, CredentialVault, DocumentStore, GroupTree, HostRegistry,
    InventoryCatalog, InventoryMaterializer, MongoStore, StoreActivityLog, StoreTeamResolver,
    TeamResolver,
};
use axum::{
    extract::Request,
    middleware,
    routing::{delete, get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub vault: Arc<CredentialVault>,
    pub access: Arc<AccessEvaluator>,
    pub groups: Arc<GroupTree>,
    pub hosts: Arc<HostRegistry>,
    pub inventories: Arc<InventoryCatalog>,
    pub activity: Arc<StoreActivityLog>,
    pub materializer: Arc<InventoryMaterializer>,
}

impl AppState {
    /// Wire every service over one store.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cipher: SecretCipher,
        teams: Arc<dyn TeamResolver>,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        let activity = Arc::new(StoreActivityLog::new(store.clone()));
        let log: Arc<dyn ActivityLog> = activity.clone();

        let vault = Arc::new(CredentialVault::new(
            store.clone(),
            Arc::new(cipher),
            log.clone(),
        ));
        let groups = Arc::new(GroupTree::new(store.clone(), log.clone()));
        let hosts = Arc::new(HostRegistry::new(store.clone(), groups.clone(), log.clone()));
        let inventories = Arc::new(InventoryCatalog::new(store.clone(), log));
        let materializer = Arc::new(InventoryMaterializer::new(
            vault.clone(),
            groups.clone(),
            hosts.clone(),
            scratch_root,
        ));

        Self {
            store,
            vault,
            access: Arc::new(AccessEvaluator::new(teams)),
            groups,
            hosts,
            inventories,
            activity,
            materializer,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .route(
            "/credentials",
            get(credentials::list_credentials).post(credentials::create_credential),
        )
        .route(
            "/credentials/:id",
            get(credentials::get_credential)
                .patch(credentials::update_credential)
                .delete(credentials::delete_credential),
        )
        .route("/credentials/:id/owner_users", get(credentials::owner_users))
        .route("/credentials/:id/owner_teams", get(credentials::owner_teams))
        .route("/credentials/:id/grants", post(credentials::grant_access))
        .route(
            "/credentials/:id/grants/:subject_type/:subject_id",
            delete(credentials::revoke_access),
        )
        .route(
            "/credentials/:id/activity_stream",
            get(credentials::activity_stream),
        )
        .route(
            "/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/groups/:id",
            get(groups::get_group)
                .put(groups::replace_group)
                .patch(groups::patch_group)
                .delete(groups::delete_group),
        )
        .route("/groups/:id/variable_data", get(groups::group_variables))
        .route("/groups/:id/children", get(groups::group_children))
        .route("/groups/:id/ancestors", get(groups::group_ancestors))
        .route(
            "/groups/:id/activity_stream",
            get(groups::group_activity_stream),
        )
        .route("/hosts", get(hosts::list_hosts).post(hosts::create_host))
        .route(
            "/hosts/:id",
            get(hosts::get_host)
                .put(hosts::replace_host)
                .patch(hosts::patch_host)
                .delete(hosts::delete_host),
        )
        .route("/hosts/:id/variable_data", get(hosts::host_variables))
        .route("/hosts/:id/all_groups", get(hosts::host_all_groups))
        .route("/hosts/:id/groups", get(hosts::host_groups))
        .route(
            "/hosts/:id/activity_stream",
            get(hosts::host_activity_stream),
        )
        .route(
            "/inventories",
            get(inventories::list_inventories).post(inventories::create_inventory),
        )
        .route(
            "/inventories/:id",
            get(inventories::get_inventory).delete(inventories::delete_inventory),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: InventoryConfig) -> Result<Self, AppError> {
        let db = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                AppError::DatabaseError(anyhow::Error::new(e))
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            AppError::DatabaseError(anyhow::Error::new(e))
        })?;

        let cipher = SecretCipher::from_config(config.secrets.encryption_key.as_ref())
            .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

        let store: Arc<dyn DocumentStore> = Arc::new(db);
        let teams: Arc<dyn TeamResolver> = Arc::new(StoreTeamResolver::new(store.clone()));
        let state = AppState::new(store, cipher, teams, config.tasks.scratch_path.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, router(state.clone()))
            .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
