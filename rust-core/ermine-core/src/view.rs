//! # Views
//!
//! A view is a template file plus an optional layout. The view is rendered
//! first; the layout is then rendered with the result available as
//! `{{ content }}`.
//!
//! Templates only substitute `{{ name }}` placeholders. Values are inserted
//! as-is, without HTML escaping.

use crate::config::Config;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Variable under which the layout receives the rendered view
pub const CONTENT_VAR: &str = "content";

/// Template + layout pair with its variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    view_path: Option<PathBuf>,
    layout_path: Option<PathBuf>,
    layout_enabled: bool,
    rendered: bool,
    vars: IndexMap<String, String>,
}

impl View {
    /// View over explicit files
    #[must_use]
    pub fn new(view_path: impl Into<PathBuf>, layout_path: Option<PathBuf>) -> Self {
        Self {
            view_path: Some(view_path.into()),
            layout_enabled: layout_path.is_some(),
            layout_path,
            rendered: true,
            vars: IndexMap::new(),
        }
    }

    /// View that renders nothing, for actions writing their own body
    #[must_use]
    pub fn none() -> Self {
        Self {
            view_path: None,
            layout_path: None,
            layout_enabled: false,
            rendered: false,
            vars: IndexMap::new(),
        }
    }

    /// View for template `name`, resolved as
    /// `<application.rootPath><view.path><name><view.extension>`, with the
    /// configured layout `<application.rootPath><view.path><view.layoutPath>`
    ///
    /// # Errors
    ///
    /// `Error::Config` for malformed `application` or `view` sections.
    pub fn from_config(config: &Config, name: &str) -> Result<Self> {
        let root = config.application()?.root_path;
        let view = config.view()?;
        let dir = format!("{root}{}", view.path);

        let view_path = format!("{dir}{name}{}", view.extension);
        let layout_path = view.layout_path.map(|layout| PathBuf::from(format!("{dir}{layout}")));
        Ok(Self::new(view_path, layout_path))
    }

    /// Set a template variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Display) -> &mut Self {
        self.vars.insert(name.into(), value.to_string());
        self
    }

    /// Read a template variable
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Template file, if any
    #[must_use]
    pub fn view_path(&self) -> Option<&Path> {
        self.view_path.as_deref()
    }

    /// Layout file, if any
    #[must_use]
    pub fn layout_path(&self) -> Option<&Path> {
        self.layout_path.as_deref()
    }

    /// Replace the layout
    pub fn set_layout_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.layout_path = Some(path.into());
        self.layout_enabled = true;
        self
    }

    /// Check if the layout wraps the view
    #[must_use]
    pub const fn is_layout_enabled(&self) -> bool {
        self.layout_enabled
    }

    /// Turn the layout on or off
    pub fn set_layout_enabled(&mut self, enabled: bool) -> &mut Self {
        self.layout_enabled = enabled;
        self
    }

    /// Check if `render` produces output
    #[must_use]
    pub const fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Turn rendering on or off
    pub fn set_rendered(&mut self, rendered: bool) -> &mut Self {
        self.rendered = rendered;
        self
    }

    /// Render the view, then the layout around it
    ///
    /// Returns `None` when rendering is turned off.
    ///
    /// # Errors
    ///
    /// `Error::ViewNotFound` when the template or the layout file is missing.
    pub async fn render(&self) -> Result<Option<String>> {
        if !self.rendered {
            return Ok(None);
        }

        let view_path = self.view_path.as_deref().ok_or_else(|| Error::ViewNotFound {
            path: String::new(),
        })?;
        let content = render_template(&read_template(view_path).await?, &self.vars);

        let layout = self.layout_path.as_deref().filter(|_| self.layout_enabled);
        let Some(layout_path) = layout else {
            return Ok(Some(content));
        };

        let mut vars = self.vars.clone();
        vars.insert(CONTENT_VAR.to_string(), content);
        Ok(Some(render_template(&read_template(layout_path).await?, &vars)))
    }
}

async fn read_template(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            debug!(path = %path.display(), "Template loaded");
            Ok(text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::ViewNotFound {
            path: path.display().to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Substitute `{{ name }}` placeholders; unknown names render empty
#[must_use]
pub fn render_template(template: &str, vars: &IndexMap<String, String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        output.push_str(&rest[..start]);
        let name = rest[start + 2..start + 2 + len].trim();
        if let Some(value) = vars.get(name) {
            output.push_str(value);
        }
        rest = &rest[start + 2 + len + 2..];
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_render_template() {
        let out = render_template("Hello {{ name }}, {{missing}}!", &vars(&[("name", "Ada")]));
        assert_eq!(out, "Hello Ada, !");
    }

    #[test]
    fn test_render_template_unclosed_placeholder() {
        let out = render_template("a {{ b", &vars(&[("b", "x")]));
        assert_eq!(out, "a {{ b");
    }

    #[tokio::test]
    async fn test_layout_wraps_view() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("home.html"), "<p>{{ greeting }}</p>").unwrap();
        std::fs::write(
            dir.path().join("layout.html"),
            "<title>{{ title }}</title>{{ content }}",
        )
        .unwrap();

        let mut view = View::new(dir.path().join("home.html"), Some(dir.path().join("layout.html")));
        view.set("greeting", "Hi").set("title", "Shop");

        let html = view.render().await.unwrap().unwrap();
        assert_eq!(html, "<title>Shop</title><p>Hi</p>");

        view.set_layout_enabled(false);
        assert_eq!(view.render().await.unwrap().unwrap(), "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_missing_files_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let view = View::new(dir.path().join("absent.html"), None);
        let err = view.render().await.unwrap_err();
        assert!(matches!(err, Error::ViewNotFound { .. }));
        assert!(err.is_not_found());

        std::fs::write(dir.path().join("home.html"), "x").unwrap();
        let view = View::new(dir.path().join("home.html"), Some(dir.path().join("nope.html")));
        assert!(matches!(view.render().await, Err(Error::ViewNotFound { .. })));
    }

    #[tokio::test]
    async fn test_unrendered_view_produces_nothing() {
        assert!(View::none().render().await.unwrap().is_none());
    }

    #[test]
    fn test_paths_from_config() {
        let config = Config::from_value(json!({
            "application": {"rootPath": "/srv/app/"},
            "view": {"path": "views/", "layoutPath": "layout.phtml", "extension": ".phtml"}
        }))
        .unwrap();

        let view = View::from_config(&config, "product").unwrap();
        assert_eq!(view.view_path(), Some(Path::new("/srv/app/views/product.phtml")));
        assert_eq!(view.layout_path(), Some(Path::new("/srv/app/views/layout.phtml")));
        assert!(view.is_layout_enabled());
    }
}
