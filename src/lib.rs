pub mod breakpoint;
pub mod config;
pub mod css;
pub mod error;
pub mod logging;
pub mod node;
pub mod page;
pub mod resolver;
pub mod stylesheet;
pub mod theme;

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

pub use error::{AppError, AppResult};
pub use node::{ComponentNode, ResolvedComponentNode};
pub use page::{AppConfiguration, BuiltApp, PageBuilder, PageRenderer, ResolvedPage};
pub use resolver::{resolve, resolve_for_viewport, resolve_with, ResolveOptions};
pub use stylesheet::{generate, GeneratedStylesheet, StylesheetCache};
pub use theme::{validate, ThemeConfig};

/// Entrypoint used by higher-level integrations and CLI bindings: reads the
/// engine settings, installs logging and builds the application at `path`.
pub fn build_app(path: &Path, cache: &Arc<StylesheetCache>) -> AppResult<BuiltApp> {
    let config = config::load_engine_config();
    logging::init(config.log_filter.as_deref());
    tracing::info!(?path, "building app configuration");

    let app = page::load_app_configuration(path)?;
    let built = PageBuilder::from_config(&config, Arc::clone(cache)).build(&app)?;
    Ok(built)
}

/// Resolves one raw component tree against a raw theme.
pub fn resolve_document(tree: &Value, theme: Option<&Value>) -> AppResult<ResolvedComponentNode> {
    let theme = validate(theme)?;
    let tree = ComponentNode::from_value(tree)?;
    Ok(resolve(&tree, &theme)?)
}
