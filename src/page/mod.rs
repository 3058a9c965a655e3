use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::node::{ComponentNode, ResolvedComponentNode};
use crate::resolver::{ResolutionErrors, ResolveOptions, TreeResolver};
use crate::stylesheet::{generate, GeneratedStylesheet, StylesheetCache};
use crate::theme::{validate, ValidationErrors};

pub type PageResult<T> = std::result::Result<T, PageError>;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to read app configuration: {path}")]
    ReadConfig { path: PathBuf, source: io::Error },
    #[error("failed to parse app configuration: {path}")]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Theme(#[from] ValidationErrors),
    #[error(transparent)]
    Resolution(#[from] ResolutionErrors),
}

/// The parts of an application document this engine consumes. Other top-level
/// keys (tables, automations, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfiguration {
    pub name: String,
    #[serde(default)]
    pub theme: Option<Value>,
    #[serde(default)]
    pub pages: Vec<PageDefinition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageDefinition {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub meta: IndexMap<String, Value>,
    #[serde(default)]
    pub sections: Vec<ComponentNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPage {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub meta: IndexMap<String, Value>,
    pub sections: Vec<ResolvedComponentNode>,
}

/// Implemented by whatever turns resolved pages into output (HTML, a DOM,
/// snapshots). Every page of a build receives the same stylesheet.
pub trait PageRenderer {
    type Output;
    type Error;

    fn render(
        &mut self,
        page: &ResolvedPage,
        stylesheet: &GeneratedStylesheet,
    ) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone)]
pub struct BuiltApp {
    pub name: String,
    pub stylesheet: Arc<GeneratedStylesheet>,
    pub pages: Vec<ResolvedPage>,
}

impl BuiltApp {
    pub fn page(&self, path: &str) -> Option<&ResolvedPage> {
        self.pages.iter().find(|page| page.path == path)
    }

    /// Renders every page in declaration order, stopping at the first failure.
    pub fn render_with<R: PageRenderer>(&self, renderer: &mut R) -> Result<Vec<R::Output>, R::Error> {
        self.pages
            .iter()
            .map(|page| renderer.render(page, &self.stylesheet))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageBuilder {
    cache: Option<Arc<StylesheetCache>>,
    options: ResolveOptions,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder honoring the engine settings; `cache` is only used when
    /// caching is enabled.
    pub fn from_config(config: &EngineConfig, cache: Arc<StylesheetCache>) -> Self {
        Self {
            cache: config.cache_enabled.then_some(cache),
            options: config.resolve_options(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<StylesheetCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the theme, obtains the stylesheet and resolves every section
    /// of every page. Resolution errors from the stylesheet and from all
    /// pages are reported together; nothing is returned unless all succeed.
    pub fn build(&self, app: &AppConfiguration) -> PageResult<BuiltApp> {
        tracing::debug!(app = %app.name, pages = app.pages.len(), "building app");
        let theme = validate(app.theme.as_ref())?;

        let mut errors = ResolutionErrors::new(Vec::new());
        let generated = match &self.cache {
            Some(cache) => cache.get_or_generate(&app.name, &theme),
            None => generate(&theme).map(Arc::new),
        };
        let stylesheet = generated.map_err(|err| errors.extend(err)).ok();

        let resolver = TreeResolver::new(&theme, self.options);
        let mut pages = Vec::with_capacity(app.pages.len());
        for (page_index, page) in app.pages.iter().enumerate() {
            let mut sections = Vec::with_capacity(page.sections.len());
            for (section_index, section) in page.sections.iter().enumerate() {
                let root = format!(
                    "pages[{page_index}]<{}>.sections[{section_index}]<{}>",
                    page.name, section.node_type
                );
                match resolver.resolve_at(section, &root) {
                    Ok(resolved) => sections.push(resolved),
                    Err(err) => errors.extend(err),
                }
            }
            pages.push(ResolvedPage {
                name: page.name.clone(),
                path: page.path.clone(),
                meta: page.meta.clone(),
                sections,
            });
        }

        match stylesheet {
            Some(stylesheet) if errors.is_empty() => {
                tracing::info!(
                    app = %app.name,
                    pages = pages.len(),
                    stylesheet_bytes = stylesheet.css().len(),
                    "app built"
                );
                Ok(BuiltApp {
                    name: app.name.clone(),
                    stylesheet,
                    pages,
                })
            }
            _ => {
                tracing::warn!(app = %app.name, errors = errors.len(), "app build failed");
                Err(PageError::Resolution(errors))
            }
        }
    }
}

pub fn load_app_configuration(path: &Path) -> PageResult<AppConfiguration> {
    let serialized = fs::read_to_string(path).map_err(|source| PageError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&serialized).map_err(|source| PageError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}
