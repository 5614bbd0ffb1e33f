//! # Application
//!
//! Owns the merged configuration, the registry, the router, the registered
//! controllers and the database handle, and turns a [`Request`] into a
//! [`Response`].
//!
//! Dispatch: match the route, look up its controller, build the view from the
//! route's template, run the action, render. Unknown routes, unparsable typed
//! parameters, unregistered controllers and missing templates answer 404;
//! every other failure answers 500.

use crate::config::Config;
use crate::controller::{Controller, ControllerContext};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::request::Request;
use crate::route::Route;
use crate::router::{RouteId, Router};
use crate::view::View;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Registry key the configuration is published under
pub const CONFIG_KEY: &str = "config";

/// Body of every 404 response
pub const NOT_FOUND_BODY: &str = "<h1>404 Not Found</h1>";

/// Body of every 500 response
pub const INTERNAL_ERROR_BODY: &str = "<h1>500 Internal Server Error</h1>";

/// Outcome of a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header
    pub content_type: String,
    /// Response body
    pub body: String,
}

impl Response {
    /// HTML response with the given status
    #[must_use]
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8".to_string(),
            body: body.into(),
        }
    }

    /// The 404 page
    #[must_use]
    pub fn not_found() -> Self {
        Self::html(404, NOT_FOUND_BODY)
    }

    /// The 500 page
    #[must_use]
    pub fn internal_error() -> Self {
        Self::html(500, INTERNAL_ERROR_BODY)
    }
}

/// The web application
pub struct Application {
    config: Config,
    registry: Registry,
    router: Router,
    controllers: HashMap<String, Arc<dyn Controller>>,
    database: Option<Database>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut controllers: Vec<_> = self.controllers.keys().collect();
        controllers.sort();
        f.debug_struct("Application")
            .field("router", &self.router)
            .field("controllers", &controllers)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Application over an already merged configuration
    ///
    /// Routes come from the `routes` list. A database handle is created when
    /// a `database` or `MySql` section exists; it connects on first use.
    ///
    /// # Errors
    ///
    /// `Error::Config` or `Error::InvalidRoutePattern` for bad sections.
    pub fn new(config: Config) -> Result<Self> {
        let router = Router::from_config(&config.routes()?)?;
        let database = if config.get("database").is_some() || config.get("MySql").is_some() {
            Some(Database::from_config(&config)?)
        } else {
            None
        };

        let registry = Registry::new();
        registry.set(CONFIG_KEY, config.clone());

        info!(
            routes = router.routes().len(),
            database = database.is_some(),
            "Application initialized"
        );
        Ok(Self {
            config,
            registry,
            router,
            controllers: HashMap::new(),
            database,
        })
    }

    /// Application over config files merged in order
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files, plus the errors of [`new`](Self::new).
    pub async fn from_config_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut config = Config::new();
        for path in paths {
            config.load_file(path).await?;
        }
        Self::new(config)
    }

    /// Merged configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Application registry
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Configured database handle
    #[must_use]
    pub const fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Replace the database handle
    pub fn set_database(&mut self, database: Database) -> &mut Self {
        self.database = Some(database);
        self
    }

    /// Register a route in addition to the configured ones
    ///
    /// # Errors
    ///
    /// `Error::InvalidRoutePattern` for malformed or conflicting patterns.
    pub fn add_route(&mut self, route: Route) -> Result<RouteId> {
        self.router.add(route)
    }

    /// Bind a controller to the name routes refer to (case-insensitive)
    pub fn register_controller(
        &mut self,
        name: &str,
        controller: impl Controller + 'static,
    ) -> &mut Self {
        self.controllers
            .insert(name.to_lowercase(), Arc::new(controller));
        self
    }

    /// Run the request through its controller
    ///
    /// # Errors
    ///
    /// Routing, controller, view and storage errors, unmapped.
    pub async fn handle(&self, request: &Request) -> Result<Response> {
        let matched = self.router.match_route(request.method, &request.path)?;
        let route = matched.route;

        let controller = self
            .controllers
            .get(&route.controller.to_lowercase())
            .ok_or_else(|| Error::ControllerNotFound {
                name: route.controller.clone(),
            })?;

        info!(
            method = %request.method,
            path = %request.path,
            controller = %route.controller,
            "Dispatching request"
        );

        let view = View::from_config(&self.config, &route.view)?;
        let mut ctx = ControllerContext::new(
            request,
            matched.params,
            view,
            &self.config,
            &self.registry,
            self.database.as_ref(),
        );
        controller.action(&mut ctx).await?;

        let body = match ctx.body.take() {
            Some(body) => body,
            None => ctx.view.render().await?.unwrap_or_default(),
        };
        Ok(Response::html(ctx.status, body))
    }

    /// Run the request and map failures to error pages
    pub async fn dispatch(&self, request: &Request) -> Response {
        match self.handle(request).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                warn!(method = %request.method, path = %request.path, error = %e, "Not found");
                Response::not_found()
            }
            Err(e) => {
                error!(method = %request.method, path = %request.path, error = %e, "Dispatch failed");
                Response::internal_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::TemplateController;
    use crate::model::record::fixtures::User;
    use crate::model::{Filters, Order, SqlMapper};
    use crate::router::Method;
    use crate::value::DbValue;
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    struct Product;

    #[async_trait]
    impl Controller for Product {
        async fn action(&self, ctx: &mut ControllerContext<'_>) -> Result<()> {
            let id = ctx.param("id").cloned().unwrap_or_default();
            let tab = ctx.param("tab").cloned().unwrap_or_default();
            ctx.view.set("id", id).set("tab", tab);
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Controller for Broken {
        async fn action(&self, _ctx: &mut ControllerContext<'_>) -> Result<()> {
            Err(Error::config("shop.currency", "missing"))
        }
    }

    struct Users;

    #[async_trait]
    impl Controller for Users {
        async fn action(&self, ctx: &mut ControllerContext<'_>) -> Result<()> {
            let users = SqlMapper::<User>::new(ctx.database()?);
            let names: Vec<String> = users
                .list(&Filters::new(), &[Order::asc("name")], None, None)
                .await?
                .iter()
                .filter_map(|u| u.name().map(str::to_string))
                .collect();
            ctx.body = Some(names.join(","));
            Ok(())
        }
    }

    fn site() -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let views = dir.path().join("views");
        std::fs::create_dir(&views).unwrap();
        std::fs::write(views.join("product.html"), "<p>#{{ id }} {{ tab }}</p>").unwrap();
        std::fs::write(views.join("home.html"), "<p>home</p>").unwrap();
        std::fs::write(views.join("layout.html"), "<main>{{ content }}</main>").unwrap();

        let config = Config::from_value(json!({
            "application": {"rootPath": format!("{}/", dir.path().display())},
            "view": {"path": "views/", "layoutPath": "layout.html", "extension": ".html"},
            "routes": [
                {"path": "/", "controller": "home"},
                {"path": "/products/{id:int}", "controller": "Product", "tab": "details"},
                {"path": "/broken", "controller": "broken", "view": "home"},
                {"path": "/ghost", "controller": "ghost"},
                {"path": "/missing-view", "controller": "home", "view": "absent"}
            ]
        }))
        .unwrap();
        (dir, config)
    }

    fn app(config: Config) -> Application {
        let mut app = Application::new(config).unwrap();
        app.register_controller("home", TemplateController)
            .register_controller("product", Product)
            .register_controller("broken", Broken);
        app
    }

    #[tokio::test]
    async fn test_dispatch_renders_view_in_layout() {
        let (_dir, config) = site();
        let app = app(config);

        let response = app.dispatch(&Request::get("/products/42")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<main><p>#42 details</p></main>");

        let home = app.dispatch(&Request::get("/")).await;
        assert_eq!(home.body, "<main><p>home</p></main>");
    }

    #[tokio::test]
    async fn test_not_found_cases() {
        let (_dir, config) = site();
        let app = app(config);

        for path in ["/nowhere", "/products/abc", "/ghost", "/missing-view"] {
            let response = app.dispatch(&Request::get(path)).await;
            assert_eq!(response, Response::not_found(), "path {path}");
        }
        assert_eq!(Response::not_found().body, "<h1>404 Not Found</h1>");

        let post = app.dispatch(&Request::new(Method::Post, "/")).await;
        assert_eq!(post.status, 404);
    }

    #[tokio::test]
    async fn test_controller_failure_is_internal_error() {
        let (_dir, config) = site();
        let app = app(config);
        let response = app.dispatch(&Request::get("/broken")).await;
        assert_eq!(response, Response::internal_error());
    }

    #[tokio::test]
    async fn test_config_is_published_in_registry() {
        let (_dir, config) = site();
        let app = app(config.clone());
        assert_eq!(app.registry().get::<Config>(CONFIG_KEY), Some(config));
        assert!(app.database().is_none());
    }

    #[tokio::test]
    async fn test_controller_reads_database() {
        let (_dir, mut config) = site();
        config.merge(
            Config::from_value(json!({"database": {"url": "sqlite::memory:", "maxConnections": 1}}))
                .unwrap(),
        );
        let mut app = app(config);
        app.register_controller("users", Users);
        app.add_route(Route::new(Method::Get, "/users", "users")).unwrap();

        let db = app.database().unwrap();
        db.execute(
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name VARCHAR NOT NULL DEFAULT '', email VARCHAR)",
            &[],
        )
        .await
        .unwrap();
        let users = SqlMapper::<User>::new(db);
        for name in ["Bob", "Ada"] {
            users.save(&mut User::named(name, "x@x.io")).await.unwrap();
        }

        let response = app.dispatch(&Request::get("/users")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "Ada,Bob");
        assert_eq!(
            users.count(&Filters::new().eq("name", DbValue::from("Ada"))).await.unwrap(),
            1
        );
    }
}
