use std::sync::Arc;

use tracing::{debug, info};

use super::manager::SessionManager;

/// Screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Products,
    NewProduct,
    EditProduct(u64),
    StockMovements { product_id: Option<u64> },
}

impl Route {
    /// Maps a path to its screen. Unknown paths land on the login screen.
    ///
    /// The movements screen takes its product either as a path segment or as
    /// a `productId` query parameter.
    pub fn parse(path: &str) -> Route {
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["login"] => Route::Login,
            ["products"] => Route::Products,
            ["products", "new"] => Route::NewProduct,
            ["products", "edit", id] => id
                .parse()
                .map(Route::EditProduct)
                .unwrap_or(Route::Login),
            ["stock-movements"] => match query_param(query, "productId") {
                None => Route::StockMovements { product_id: None },
                Some(id) => match id.parse() {
                    Ok(id) => Route::StockMovements { product_id: Some(id) },
                    Err(_) => Route::Login,
                },
            },
            ["stock-movements", id] => match id.parse() {
                Ok(id) => Route::StockMovements { product_id: Some(id) },
                Err(_) => Route::Login,
            },
            _ => Route::Login,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Products => "/products".to_string(),
            Route::NewProduct => "/products/new".to_string(),
            Route::EditProduct(id) => format!("/products/edit/{id}"),
            Route::StockMovements { product_id: None } => "/stock-movements".to_string(),
            Route::StockMovements { product_id: Some(id) } => format!("/stock-movements/{id}"),
        }
    }

    /// Every screen but the login screen requires a live session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    RedirectToLogin,
}

/// Gate consulted before entering a protected screen.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionManager>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn check(&self, route: &Route) -> Navigation {
        if !route.is_protected() || self.session.is_authenticated() {
            debug!(route = %route.path(), "Navigation allowed");
            return Navigation::Allow;
        }
        info!(route = %route.path(), "No live session; redirecting to login");
        Navigation::RedirectToLogin
    }
}
