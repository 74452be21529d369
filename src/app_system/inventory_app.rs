use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::api::{HttpInventoryApi, InventoryApi};
use crate::config::ClientConfig;
use crate::error::AppError;
use crate::local::{LocalInventory, LocalInventoryService};
use crate::query::{QueryClient, QueryService};
use crate::session::{Clock, RouteGuard, SessionManager, SystemClock};
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::view::ListViewController;

/// The running client: session, route guard and list screen, with the actors
/// behind them.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct InventoryApp {
    pub session: Arc<SessionManager>,
    pub guard: RouteGuard,
    pub view: ListViewController,
    query: QueryClient,
    local: Option<LocalInventory>,
    handles: Vec<JoinHandle<()>>,
}

impl InventoryApp {
    /// Starts the client described by `config`.
    ///
    /// Without an `api_url` the in-process backend is started and served
    /// instead of the remote service.
    #[instrument(name = "app_start", skip(config), fields(remote = config.api_url.is_some()))]
    pub fn start(config: &ClientConfig) -> Result<Self, AppError> {
        let store: Arc<dyn KeyValueStore> = match &config.store_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        match &config.api_url {
            Some(url) => {
                info!(url = %url, "Using remote inventory service");
                let api =
                    HttpInventoryApi::new(url.clone(), config.request_timeout, store.clone())?;
                Ok(Self::assemble(config, store, Arc::new(api), clock, None, Vec::new()))
            }
            None => {
                info!("Using in-process inventory backend");
                let (service, local) =
                    LocalInventoryService::new(config.mailbox_size, clock.clone());
                let handle = tokio::spawn(service.run());
                let api = Arc::new(local.clone());
                Ok(Self::assemble(config, store, api, clock, Some(local), vec![handle]))
            }
        }
    }

    fn assemble(
        config: &ClientConfig,
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn InventoryApi>,
        clock: Arc<dyn Clock>,
        local: Option<LocalInventory>,
        mut handles: Vec<JoinHandle<()>>,
    ) -> Self {
        let session = Arc::new(SessionManager::initialize(store, api.clone(), clock));
        let guard = RouteGuard::new(session.clone());

        let (service, query) =
            QueryService::new(config.mailbox_size, api.clone(), config.debounce, config.page_size);
        handles.push(tokio::spawn(service.run()));

        let view = ListViewController::new(session.clone(), query.clone(), api);
        Self {
            session,
            guard,
            view,
            query,
            local,
            handles,
        }
    }

    pub async fn shutdown(self) -> Result<(), AppError> {
        info!("Shutting down client...");

        if let Err(e) = self.query.shutdown().await {
            error!(error = %e, "Query coordinator already stopped");
        }
        if let Some(local) = &self.local {
            if let Err(e) = local.shutdown().await {
                error!(error = %e, "Local backend already stopped");
            }
        }

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(AppError::Task(e.to_string()));
            }
        }

        info!("Client shutdown complete.");
        Ok(())
    }
}
