use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Instrument};

use inventory_client::app_system::{setup_tracing, InventoryApp};
use inventory_client::config::{ClientConfig, DEFAULT_MAILBOX_SIZE};
use inventory_client::domain::{Credentials, MovementKind};
use inventory_client::session::{Navigation, Route};
use inventory_client::view::{MovementForm, ProductForm};

#[derive(Debug, Parser)]
#[command(name = "inventory-client", about = "Inventory client demo session", long_about = None)]
struct Args {
    /// Base URL of the inventory service. Omit to use the in-process backend.
    #[arg(long, env = "INVENTORY_API_URL")]
    api_url: Option<String>,

    /// File the session token is persisted to.
    #[arg(long, env = "INVENTORY_STORE_PATH")]
    store: Option<PathBuf>,

    #[arg(long, env = "INVENTORY_DEBOUNCE_MS", default_value_t = 300)]
    debounce_ms: u64,

    #[arg(long, env = "INVENTORY_PAGE_SIZE", default_value_t = 10)]
    page_size: u32,

    /// Request timeout in seconds.
    #[arg(long, env = "INVENTORY_TIMEOUT_SECS", default_value_t = 30)]
    timeout: u64,

    #[arg(long, env = "INVENTORY_USERNAME", default_value = "admin")]
    username: String,

    #[arg(long, env = "INVENTORY_PASSWORD", default_value = "admin123", hide_env_values = true)]
    password: String,
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            request_timeout: Duration::from_secs(self.timeout),
            debounce: Duration::from_millis(self.debounce_ms),
            page_size: self.page_size,
            store_path: self.store.clone(),
            mailbox_size: DEFAULT_MAILBOX_SIZE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let _env = dotenvy::dotenv();
    let args = Args::parse();

    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting inventory client");
    let app = InventoryApp::start(&args.config()).map_err(|e| e.to_string())?;

    if app.guard.check(&Route::Products) == Navigation::RedirectToLogin {
        let span = tracing::info_span!("login", username = %args.username);
        async {
            info!("No live session; logging in");
            app.session
                .login(Credentials::new(args.username.clone(), args.password.clone()))
                .await
                .map_err(|e| e.to_string())
        }
        .instrument(span)
        .await?;
    }
    info!(username = ?app.view.username(), "Session ready");

    let span = tracing::info_span!("catalogue");
    let result = async {
        app.view.sync_products().await?;
        app.view.create_product(&ProductForm {
            name: "Demo Desk Lamp".into(),
            category: "home".into(),
            supplier: "ACME".into(),
            price: Some(24.5),
            stock: Some(10),
        })
        .await
    }
    .instrument(span)
    .await;

    match result {
        Ok(product) => {
            let span = tracing::info_span!("movements", product_id = product.id);
            async {
                for (kind, quantity) in [(MovementKind::Inbound, 5), (MovementKind::Outbound, 20)] {
                    match app
                        .view
                        .register_movement(&MovementForm::new(product.id, kind, quantity))
                        .await
                    {
                        Ok(m) => info!(
                            stock_before = m.stock_before,
                            stock_after = m.stock_after,
                            "Movement applied"
                        ),
                        Err(e) => error!(error = %e, "Movement rejected"),
                    }
                }
            }
            .instrument(span)
            .await;
        }
        Err(e) => error!(error = %e, "Catalogue setup failed"),
    }

    let before = app.view.state().issued;
    app.view.set_search("lamp").await.map_err(|e| e.to_string())?;
    let state = app
        .view
        .subscribe()
        .wait_for(|s| s.issued > before && !s.loading)
        .await
        .map_err(|e| e.to_string())?
        .clone();
    for product in state.products() {
        info!(id = product.id, name = %product.name, stock = product.stock, "Listed");
    }
    info!(pages = ?app.view.page_indices(), "Listing complete");

    // Shutdown system gracefully
    app.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
