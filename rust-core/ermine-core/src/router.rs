//! # Router
//!
//! Radix-trie based router using `matchit`, one trie per HTTP method.
//!
//! ## Features
//!
//! - Path parameter extraction (`/users/{id}`)
//! - Typed parameters (`/users/{id:int}`), converted to [`DbValue`]
//! - Catch-all routes (`/files/{*path}`)
//! - Static per-route defaults merged under the path parameters

use crate::config::RouteConfig;
use crate::error::{Error, Result};
use crate::route::Route;
use crate::value::DbValue;
use indexmap::IndexMap;
use matchit::Router as MatchitRouter;
use std::collections::HashMap;
use tracing::debug;

/// HTTP methods supported by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
    /// HTTP HEAD
    Head,
    /// HTTP OPTIONS
    Options,
}

impl Method {
    /// Parse a method name, case-insensitively
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
            Self::Head => write!(f, "HEAD"),
            Self::Options => write!(f, "OPTIONS"),
        }
    }
}

/// Index of a route in registration order
pub type RouteId = usize;

/// Matched route with its converted parameters
#[derive(Debug)]
pub struct Match<'a> {
    /// The matched route
    pub route: &'a Route,
    /// Route defaults, then typed path parameters
    pub params: IndexMap<String, DbValue>,
}

impl Match<'_> {
    /// Get a parameter by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DbValue> {
        self.params.get(name)
    }

    /// Get a parameter as i64 (convenience method)
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.params.get(name).and_then(DbValue::as_int)
    }
}

/// HTTP router over configured routes
#[derive(Clone, Default)]
pub struct Router {
    /// Per-method tries, values index into `routes`
    tries: HashMap<Method, MatchitRouter<RouteId>>,
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").field("routes", &self.routes).finish()
    }
}

impl Router {
    /// Create a new empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Router over every entry of the `routes` config list
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` for malformed or conflicting
    /// entries.
    pub fn from_config(entries: &[RouteConfig]) -> Result<Self> {
        let mut router = Self::new();
        for entry in entries {
            router.add(Route::from_config(entry)?)?;
        }
        Ok(router)
    }

    /// Register a route
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` if the pattern is malformed or
    /// conflicts with an earlier route.
    pub fn add(&mut self, route: Route) -> Result<RouteId> {
        let route_id = self.routes.len();

        self.tries
            .entry(route.method)
            .or_insert_with(MatchitRouter::new)
            .insert(route.match_pattern.clone(), route_id)
            .map_err(|e| Error::InvalidRoutePattern {
                pattern: route.path_pattern.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            method = %route.method,
            path = %route.path_pattern,
            controller = %route.controller,
            "Route registered"
        );
        self.routes.push(route);
        Ok(route_id)
    }

    /// Registered routes, in registration order
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Match a request path against registered routes
    ///
    /// # Errors
    ///
    /// Returns `Error::RouteNotFound` if no route matches, and
    /// `Error::InvalidParameter` if a typed segment does not parse.
    pub fn match_route(&self, method: Method, path: &str) -> Result<Match<'_>> {
        let not_found = || Error::RouteNotFound {
            path: path.to_string(),
        };

        let matched = self
            .tries
            .get(&method)
            .ok_or_else(not_found)?
            .at(path)
            .map_err(|_| not_found())?;
        let route = self.routes.get(*matched.value).ok_or_else(not_found)?;

        let mut params = route.defaults.clone();
        for (name, raw) in matched.params.iter() {
            let value = route.param_type(name).convert(name, raw)?;
            params.insert(name.to_string(), value);
        }

        Ok(Match { route, params })
    }
}
