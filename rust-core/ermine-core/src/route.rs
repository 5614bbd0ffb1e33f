//! # Route Metadata
//!
//! One configured route: pattern, typed parameters, controller, template and
//! static defaults.

use crate::config::RouteConfig;
use crate::error::{Error, Result};
use crate::router::Method;
use crate::types::{ParamType, PathParam};
use crate::value::DbValue;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

/// Route definition
///
/// ```ignore
/// let route = Route::new(Method::Get, "/products/{id:int}", "product")
///     .with_default("tab", "details");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// HTTP method
    pub method: Method,
    /// Original path pattern (e.g., "/users/{id:int}")
    pub path_pattern: String,
    /// Normalized path for matchit (e.g., "/users/{id}")
    pub match_pattern: String,
    /// Parameter name to type mapping
    pub param_types: HashMap<String, ParamType>,
    /// Name the controller was registered under
    pub controller: String,
    /// Template rendered by the default action
    pub view: String,
    /// Parameters every match carries, overridden by path parameters
    pub defaults: IndexMap<String, DbValue>,
}

impl Route {
    /// Route to `controller`, rendering the template of the same name
    #[must_use]
    pub fn new(method: Method, path: &str, controller: impl Into<String>) -> Self {
        let (match_pattern, param_types) = Self::parse_path_pattern(path);
        let controller = controller.into();

        Self {
            method,
            path_pattern: path.to_string(),
            match_pattern,
            param_types,
            view: controller.to_lowercase(),
            controller,
            defaults: IndexMap::new(),
        }
    }

    /// Render another template
    #[must_use]
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = view.into();
        self
    }

    /// Add a static default parameter
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<DbValue>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Build from a `routes` config entry
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` for an unknown method.
    pub fn from_config(entry: &RouteConfig) -> Result<Self> {
        let method = match entry.method.as_deref() {
            None => Method::Get,
            Some(name) => Method::parse(name).ok_or_else(|| Error::InvalidRoutePattern {
                pattern: entry.path.clone(),
                reason: format!("unknown method {name}"),
            })?,
        };

        let mut route = Self::new(method, &entry.path, entry.controller.clone());
        if let Some(view) = &entry.view {
            route.view.clone_from(view);
        }
        for (name, value) in &entry.defaults {
            route.defaults.insert(name.clone(), json_to_db_value(value));
        }
        Ok(route)
    }

    /// Parse path pattern to extract parameter types
    ///
    /// Converts `{name:type}` to `{name}` for matchit compatibility;
    /// catch-all segments keep their `*`.
    fn parse_path_pattern(path: &str) -> (String, HashMap<String, ParamType>) {
        let mut param_types = HashMap::new();
        let mut normalized_parts = Vec::new();

        for segment in path.split('/') {
            if segment.is_empty() {
                continue;
            }

            if let Some(param) = PathParam::parse(segment) {
                normalized_parts.push(param.matcher_segment());
                param_types.insert(param.name, param.kind);
            } else {
                normalized_parts.push(segment.to_string());
            }
        }

        let normalized = if normalized_parts.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", normalized_parts.join("/"))
        };

        (normalized, param_types)
    }

    /// Get the type for a parameter by name
    ///
    /// Returns `ParamType::String` if the parameter is untyped.
    #[must_use]
    pub fn param_type(&self, name: &str) -> ParamType {
        self.param_types.get(name).copied().unwrap_or_default()
    }
}

fn json_to_db_value(value: &Value) -> DbValue {
    match value {
        Value::Null => DbValue::Null,
        Value::Bool(b) => DbValue::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map_or_else(|| DbValue::from(n.as_f64()), DbValue::Int),
        Value::String(s) => DbValue::String(s.clone()),
        other => DbValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_simple() {
        let route = Route::new(Method::Get, "/users", "Users");
        assert_eq!(route.match_pattern, "/users");
        assert!(route.param_types.is_empty());
        assert_eq!(route.view, "users");
    }

    #[test]
    fn test_route_with_typed_params() {
        let route = Route::new(Method::Get, "/users/{user_id:int}/posts/{slug}", "post");
        assert_eq!(route.match_pattern, "/users/{user_id}/posts/{slug}");
        assert_eq!(route.param_type("user_id"), ParamType::Int);
        assert_eq!(route.param_type("slug"), ParamType::String);
    }

    #[test]
    fn test_route_catch_all() {
        let route = Route::new(Method::Get, "/static/{*file}", "assets");
        assert_eq!(route.match_pattern, "/static/{*file}");
    }

    #[test]
    fn test_route_root() {
        let route = Route::new(Method::Get, "/", "home");
        assert_eq!(route.match_pattern, "/");
    }

    #[test]
    fn test_route_from_config() {
        let entry: RouteConfig = serde_json::from_value(json!({
            "path": "/cart/{id:int}",
            "controller": "cart",
            "method": "post",
            "view": "cart/show",
            "page": 1,
            "ratio": 0.5
        }))
        .unwrap();

        let route = Route::from_config(&entry).unwrap();
        assert_eq!(route.method, Method::Post);
        assert_eq!(route.view, "cart/show");
        assert_eq!(route.defaults.get("page"), Some(&DbValue::Int(1)));
        assert_eq!(route.defaults.get("ratio"), Some(&DbValue::Float(0.5)));
    }

    #[test]
    fn test_route_from_config_rejects_unknown_method() {
        let entry: RouteConfig = serde_json::from_value(json!({
            "path": "/", "controller": "home", "method": "BREW"
        }))
        .unwrap();
        assert!(Route::from_config(&entry).is_err());
    }
}
