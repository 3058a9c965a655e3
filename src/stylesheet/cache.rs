use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{generate, GeneratedStylesheet};
use crate::resolver::ResolveResult;
use crate::theme::ThemeConfig;

#[derive(Debug)]
struct CachedStylesheet {
    theme_hash: blake3::Hash,
    stylesheet: Arc<GeneratedStylesheet>,
}

/// Process-wide store of generated stylesheets, shared by concurrent page builds.
/// Holds one entry per configuration; a changed theme replaces it.
#[derive(Debug, Default)]
pub struct StylesheetCache {
    entries: DashMap<String, CachedStylesheet>,
}

impl StylesheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached stylesheet for `config_id` if it was generated from
    /// `theme`, otherwise generates and stores it.
    ///
    /// Generation runs while the entry is locked, so callers racing on one
    /// configuration generate once and share the result. Failed generations
    /// are not cached.
    pub fn get_or_generate(
        &self,
        config_id: &str,
        theme: &ThemeConfig,
    ) -> ResolveResult<Arc<GeneratedStylesheet>> {
        self.get_or_generate_with(config_id, theme, generate)
    }

    pub(crate) fn get_or_generate_with(
        &self,
        config_id: &str,
        theme: &ThemeConfig,
        generate: impl FnOnce(&ThemeConfig) -> ResolveResult<GeneratedStylesheet>,
    ) -> ResolveResult<Arc<GeneratedStylesheet>> {
        let theme_hash = theme.content_hash();
        if let Some(cached) = self.entries.get(config_id) {
            if cached.theme_hash == theme_hash {
                tracing::trace!(config_id, "stylesheet cache hit");
                return Ok(Arc::clone(&cached.stylesheet));
            }
        }

        match self.entries.entry(config_id.to_string()) {
            Entry::Occupied(entry) if entry.get().theme_hash == theme_hash => {
                Ok(Arc::clone(&entry.get().stylesheet))
            }
            Entry::Occupied(mut entry) => {
                let stylesheet = Arc::new(generate(theme)?);
                tracing::debug!(config_id, bytes = stylesheet.css().len(), "replaced stale stylesheet");
                entry.insert(CachedStylesheet {
                    theme_hash,
                    stylesheet: Arc::clone(&stylesheet),
                });
                Ok(stylesheet)
            }
            Entry::Vacant(entry) => {
                let stylesheet = Arc::new(generate(theme)?);
                tracing::debug!(config_id, bytes = stylesheet.css().len(), "cached generated stylesheet");
                entry.insert(CachedStylesheet {
                    theme_hash,
                    stylesheet: Arc::clone(&stylesheet),
                });
                Ok(stylesheet)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops the entry of one configuration. Returns whether one existed.
    pub fn invalidate(&self, config_id: &str) -> bool {
        let removed = self.entries.remove(config_id).is_some();
        tracing::debug!(config_id, removed, "invalidated cached stylesheet");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::validate;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    fn theme(raw: serde_json::Value) -> ThemeConfig {
        validate(Some(&raw)).expect("theme should validate")
    }

    #[test]
    fn repeated_lookups_share_one_stylesheet() {
        let cache = StylesheetCache::new();
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let first = cache.get_or_generate("site", &theme).unwrap();
        let second = cache.get_or_generate("site", &theme).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_configurations_never_share_an_entry() {
        let cache = StylesheetCache::new();
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let a = cache.get_or_generate("marketing", &theme).unwrap();
        let b = cache.get_or_generate("docs", &theme).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn changed_theme_is_regenerated() {
        let cache = StylesheetCache::new();
        let old = cache
            .get_or_generate("site", &theme(json!({ "colors": { "primary": "#007bff" } })))
            .unwrap();
        let new = cache
            .get_or_generate("site", &theme(json!({ "colors": { "primary": "#ff4081" } })))
            .unwrap();
        assert_eq!(old.variable("--color-primary"), Some("#007bff"));
        assert_eq!(new.variable("--color-primary"), Some("#ff4081"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn repeated_edits_keep_one_entry_per_configuration() {
        let cache = StylesheetCache::new();
        for index in 0..50 {
            let edited = theme(json!({ "colors": { "primary": format!("#0000{index:02x}") } }));
            cache.get_or_generate("site", &edited).unwrap();
        }
        cache.get_or_generate("docs", &theme(json!({}))).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_generation_is_not_cached() {
        let cache = StylesheetCache::new();
        let broken = theme(json!({
            "animations": { "glow": { "to": { "color": "$theme.colors.missing" } } }
        }));
        assert!(cache.get_or_generate("site", &broken).is_err());
        assert!(cache.is_empty());

        let good = theme(json!({ "colors": { "primary": "#007bff" } }));
        let cached = cache.get_or_generate("site", &good).unwrap();
        assert!(cache.get_or_generate("site", &broken).is_err());
        let after = cache.get_or_generate("site", &good).unwrap();
        assert!(Arc::ptr_eq(&cached, &after));
    }

    #[test]
    fn invalidate_and_clear_drop_entries() {
        let cache = StylesheetCache::new();
        let theme = theme(json!({ "spacing": { "sm": "4px" } }));
        cache.get_or_generate("a", &theme).unwrap();
        cache.get_or_generate("b", &theme).unwrap();
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_builds_receive_the_same_stylesheet() {
        let cache = StylesheetCache::new();
        let theme = theme(json!({
            "colors": { "primary": "#007bff" },
            "animations": { "fadeIn": true }
        }));
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_generate("site", &theme).unwrap()))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });
        assert_eq!(cache.len(), 1);
        assert!(results.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn racing_callers_generate_once() {
        let cache = StylesheetCache::new();
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let generations = AtomicUsize::new(0);
        let barrier = Barrier::new(8);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    barrier.wait();
                    cache
                        .get_or_generate_with("site", &theme, |theme| {
                            generations.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            generate(theme)
                        })
                        .unwrap();
                });
            }
        });
        assert_eq!(generations.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }
}
