//! # Controllers
//!
//! A controller handles one matched route. It reads the request and route
//! parameters, talks to the mappers, and fills the view; the application
//! renders the view afterwards unless the action turned rendering off.

use crate::config::Config;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::request::Request;
use crate::value::DbValue;
use crate::view::View;
use async_trait::async_trait;
use indexmap::IndexMap;

/// Everything an action can reach
#[derive(Debug)]
pub struct ControllerContext<'a> {
    /// The incoming request
    pub request: &'a Request,
    /// Route defaults overridden by typed path parameters
    pub params: IndexMap<String, DbValue>,
    /// View rendered after the action
    pub view: View,
    /// Response status, 200 unless the action changes it
    pub status: u16,
    /// Body used instead of the view when set
    pub body: Option<String>,
    config: &'a Config,
    registry: &'a Registry,
    database: Option<&'a Database>,
}

impl<'a> ControllerContext<'a> {
    /// Context for one dispatch
    #[must_use]
    pub fn new(
        request: &'a Request,
        params: IndexMap<String, DbValue>,
        view: View,
        config: &'a Config,
        registry: &'a Registry,
        database: Option<&'a Database>,
    ) -> Self {
        Self {
            request,
            params,
            view,
            status: 200,
            body: None,
            config,
            registry,
            database,
        }
    }

    /// Route parameter by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&DbValue> {
        self.params.get(name)
    }

    /// Merged application configuration
    #[must_use]
    pub const fn config(&self) -> &'a Config {
        self.config
    }

    /// Application registry
    #[must_use]
    pub const fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Application database handle
    ///
    /// # Errors
    ///
    /// `Error::Config` when no database is configured.
    pub fn database(&self) -> Result<&'a Database> {
        self.database
            .ok_or_else(|| Error::config("database.url", "no database configured"))
    }
}

/// Request handler bound to routes by name
///
/// ```ignore
/// struct Product;
///
/// #[async_trait]
/// impl Controller for Product {
///     async fn action(&self, ctx: &mut ControllerContext<'_>) -> Result<()> {
///         let id = ctx.param("id").cloned().unwrap_or_default();
///         ctx.view.set("id", id);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Controller: Send + Sync {
    /// Handle the request; the default only renders the route's view
    async fn action(&self, ctx: &mut ControllerContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }
}

/// Controller that renders its template and nothing else
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateController;

#[async_trait]
impl Controller for TemplateController {}
