pub mod error;

use serde::Deserialize;

use crate::breakpoint::{applicable, mediate, Breakpoint};
use crate::css::{reference_pieces, ReferencePiece};
use crate::node::{
    Child, ComponentNode, Primitive, PropValue, ResolvedChild, ResolvedComponentNode,
    ResolvedPropMap, ResolvedValue,
};
use crate::theme::path::is_token_reference;
use crate::theme::{resolve_reference, ReferenceScope, ResolvedToken, ThemeConfig, TokenTable};

pub use error::{ResolutionError, ResolutionErrors, ResolveResult};

const STYLE_PROP: &str = "style";
const RESPONSIVE_PROP: &str = "responsive";

/// What to do with references embedded in a raw CSS `style` string such as
/// `"color: $theme.colors.primary"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawStylePolicy {
    /// Keep the string untouched.
    #[default]
    Passthrough,
    /// Replace each embedded reference with its `var()`; unknown paths fail.
    Substitute,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub raw_style_tokens: RawStylePolicy,
}

pub fn resolve(tree: &ComponentNode, theme: &ThemeConfig) -> ResolveResult<ResolvedComponentNode> {
    resolve_with(tree, theme, ResolveOptions::default())
}

pub fn resolve_with(
    tree: &ComponentNode,
    theme: &ThemeConfig,
    options: ResolveOptions,
) -> ResolveResult<ResolvedComponentNode> {
    TreeResolver::new(theme, options).resolve(tree)
}

/// Resolves `tree` and applies every `responsive` override whose breakpoint is
/// at most `viewport_px` wide, smallest first.
pub fn resolve_for_viewport(
    tree: &ComponentNode,
    theme: &ThemeConfig,
    viewport_px: f64,
) -> ResolveResult<ResolvedComponentNode> {
    TreeResolver::new(theme, ResolveOptions::default()).resolve_for_viewport(tree, viewport_px)
}

/// Resolver bound to one theme. Holds no mutable state, so one instance can
/// serve any number of trees, including from several threads.
#[derive(Debug, Clone)]
pub struct TreeResolver {
    tokens: TokenTable,
    breakpoints: Vec<Breakpoint>,
    options: ResolveOptions,
}

impl TreeResolver {
    pub fn new(theme: &ThemeConfig, options: ResolveOptions) -> Self {
        Self {
            tokens: TokenTable::from_theme(theme),
            breakpoints: theme.sorted_breakpoints(),
            options,
        }
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn resolve(&self, tree: &ComponentNode) -> ResolveResult<ResolvedComponentNode> {
        self.resolve_at(tree, &tree.node_type)
    }

    /// Like [`Self::resolve`], with error locations rooted at `root`.
    pub fn resolve_at(
        &self,
        tree: &ComponentNode,
        root: &str,
    ) -> ResolveResult<ResolvedComponentNode> {
        tracing::trace!(root, "resolving component tree");
        let mut errors = Vec::new();
        let resolved = self.node(tree, root, &mut errors);
        if errors.is_empty() {
            Ok(resolved)
        } else {
            tracing::debug!(root, errors = errors.len(), "component tree has unresolved references");
            Err(ResolutionErrors::new(errors))
        }
    }

    pub fn resolve_for_viewport(
        &self,
        tree: &ComponentNode,
        viewport_px: f64,
    ) -> ResolveResult<ResolvedComponentNode> {
        let mut resolved = self.resolve(tree)?;
        self.apply_viewport(&mut resolved, viewport_px);
        Ok(resolved)
    }

    fn node(
        &self,
        node: &ComponentNode,
        location: &str,
        errors: &mut Vec<ResolutionError>,
    ) -> ResolvedComponentNode {
        let mut props = ResolvedPropMap::with_capacity(node.props.len());
        for (key, value) in &node.props {
            let location = format!("{location}.props.{key}");
            let resolved = if key == RESPONSIVE_PROP {
                self.responsive(value, &location, errors)
            } else {
                self.entry(key, value, &location, errors)
            };
            props.insert(key.clone(), resolved);
        }

        let children = node
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| match child {
                Child::Node(child) => ResolvedChild::Node(self.node(
                    child,
                    &format!("{location}.children[{index}]<{}>", child.node_type),
                    errors,
                )),
                Child::Text(text) => {
                    ResolvedChild::Text(self.text(text, &format!("{location}.children[{index}]"), errors))
                }
            })
            .collect();

        let content = node
            .content
            .as_deref()
            .map(|content| self.text(content, &format!("{location}.content"), errors));

        ResolvedComponentNode {
            node_type: node.node_type.clone(),
            props,
            children,
            content,
        }
    }

    fn entry(
        &self,
        key: &str,
        value: &PropValue,
        location: &str,
        errors: &mut Vec<ResolutionError>,
    ) -> ResolvedValue {
        match value {
            PropValue::Primitive(Primitive::Text(css)) if key == STYLE_PROP => {
                ResolvedValue::text(self.raw_style(css, location, errors))
            }
            other => self.value(other, location, errors),
        }
    }

    fn value(
        &self,
        value: &PropValue,
        location: &str,
        errors: &mut Vec<ResolutionError>,
    ) -> ResolvedValue {
        match value {
            PropValue::Primitive(primitive) => ResolvedValue::Primitive(primitive.clone()),
            PropValue::TokenRef(reference) => ResolvedValue::text(
                self.reference(reference, location, errors)
                    .map(|token| token.css_var())
                    .unwrap_or_default(),
            ),
            PropValue::StyleMap(map) => ResolvedValue::StyleMap(
                map.iter()
                    .map(|(key, value)| {
                        let location = format!("{location}.{key}");
                        (key.clone(), self.entry(key, value, &location, errors))
                    })
                    .collect(),
            ),
            PropValue::NodeList(nodes) => ResolvedValue::NodeList(
                nodes
                    .iter()
                    .enumerate()
                    .map(|(index, node)| {
                        self.node(node, &format!("{location}[{index}]<{}>", node.node_type), errors)
                    })
                    .collect(),
            ),
            PropValue::List(items) => ResolvedValue::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.value(item, &format!("{location}[{index}]"), errors))
                    .collect(),
            ),
        }
    }

    fn responsive(
        &self,
        value: &PropValue,
        location: &str,
        errors: &mut Vec<ResolutionError>,
    ) -> ResolvedValue {
        let PropValue::StyleMap(overrides) = value else {
            return self.value(value, location, errors);
        };
        for name in overrides.keys() {
            if !self.breakpoints.iter().any(|bp| &bp.name == name) {
                errors.push(ResolutionError::UnknownBreakpoint {
                    location: location.to_string(),
                    name: name.clone(),
                });
            }
        }
        self.value(value, location, errors)
    }

    /// Text content cannot hold `var()`, so a reference resolves to the literal value.
    fn text(&self, text: &str, location: &str, errors: &mut Vec<ResolutionError>) -> String {
        if !is_token_reference(text) {
            return text.to_string();
        }
        self.reference(text, location, errors)
            .map(|token| token.value)
            .unwrap_or_default()
    }

    fn raw_style(&self, css: &str, location: &str, errors: &mut Vec<ResolutionError>) -> String {
        if self.options.raw_style_tokens == RawStylePolicy::Passthrough {
            return css.to_string();
        }
        let mut out = String::with_capacity(css.len());
        for piece in reference_pieces(css) {
            match piece {
                ReferencePiece::Text(text) => out.push_str(text),
                ReferencePiece::Reference(reference) => {
                    if let Some(token) = self.reference(reference, location, errors) {
                        out.push_str(&token.css_var());
                    }
                }
            }
        }
        out
    }

    fn reference(
        &self,
        reference: &str,
        location: &str,
        errors: &mut Vec<ResolutionError>,
    ) -> Option<ResolvedToken> {
        match resolve_reference(reference, &self.tokens, ReferenceScope::All) {
            Ok(token) => Some(token),
            Err(err) => {
                errors.push(ResolutionError::UnresolvedTokenReference {
                    location: location.to_string(),
                    reference: reference.to_string(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn apply_viewport(&self, node: &mut ResolvedComponentNode, viewport_px: f64) {
        if matches!(node.props.get(RESPONSIVE_PROP), Some(ResolvedValue::StyleMap(_))) {
            if let Some(ResolvedValue::StyleMap(overrides)) = node.props.shift_remove(RESPONSIVE_PROP) {
                // Names were checked during resolution.
                let mediated = mediate(
                    &self.breakpoints,
                    overrides.iter().map(|(name, value)| (name.as_str(), value)),
                )
                .unwrap_or_default();
                for entry in applicable(&mediated, viewport_px) {
                    merge_override(&mut node.props, entry.value);
                }
            }
        }

        for value in node.props.values_mut() {
            self.apply_viewport_value(value, viewport_px);
        }
        for child in &mut node.children {
            if let ResolvedChild::Node(child) = child {
                self.apply_viewport(child, viewport_px);
            }
        }
    }

    /// Reaches nodes nested anywhere inside a prop, e.g. `slots.header[0]`.
    fn apply_viewport_value(&self, value: &mut ResolvedValue, viewport_px: f64) {
        match value {
            ResolvedValue::Primitive(_) => {}
            ResolvedValue::NodeList(nodes) => {
                for nested in nodes {
                    self.apply_viewport(nested, viewport_px);
                }
            }
            ResolvedValue::StyleMap(map) => {
                for nested in map.values_mut() {
                    self.apply_viewport_value(nested, viewport_px);
                }
            }
            ResolvedValue::List(items) => {
                for nested in items {
                    self.apply_viewport_value(nested, viewport_px);
                }
            }
        }
    }
}

/// Later overrides replace props; `style` maps are merged key by key.
fn merge_override(props: &mut ResolvedPropMap, override_value: &ResolvedValue) {
    let ResolvedValue::StyleMap(overrides) = override_value else {
        return;
    };
    for (key, value) in overrides {
        if key == STYLE_PROP {
            if let (Some(ResolvedValue::StyleMap(base)), ResolvedValue::StyleMap(patch)) =
                (props.get_mut(key), value)
            {
                for (property, patched) in patch {
                    base.insert(property.clone(), patched.clone());
                }
                continue;
            }
        }
        props.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::validate;
    use serde_json::{json, Value};

    fn theme(raw: Value) -> ThemeConfig {
        validate(Some(&raw)).expect("theme should validate")
    }

    fn node(raw: Value) -> ComponentNode {
        ComponentNode::from_value(&raw).expect("node should parse")
    }

    fn contains_token_reference(value: &Value) -> bool {
        match value {
            Value::String(text) => is_token_reference(text),
            Value::Array(items) => items.iter().any(contains_token_reference),
            Value::Object(map) => map.values().any(contains_token_reference),
            _ => false,
        }
    }

    #[test]
    fn resolves_style_reference_to_css_var() {
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let tree = node(json!({
            "type": "section",
            "props": { "style": { "backgroundColor": "$theme.colors.primary" } }
        }));
        let resolved = resolve(&tree, &theme).unwrap();
        assert_eq!(
            resolved.style("backgroundColor").and_then(ResolvedValue::as_str),
            Some("var(--color-primary)")
        );
    }

    #[test]
    fn missing_path_yields_exactly_one_error() {
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let tree = node(json!({
            "type": "section",
            "props": { "style": { "color": "$theme.colors.missing" } }
        }));
        let errs = resolve(&tree, &theme).unwrap_err();
        assert_eq!(errs.len(), 1);
        let ResolutionError::UnresolvedTokenReference { location, reference, .. } = &errs.errors()[0] else {
            panic!("expected an unresolved token reference");
        };
        assert_eq!(location, "section.props.style.color");
        assert_eq!(reference, "$theme.colors.missing");
    }

    #[test]
    fn complete_tree_leaves_no_token_strings() {
        let theme = theme(json!({
            "colors": { "primary": "#007bff", "text": { "muted": "#6b7280" } },
            "fonts": { "heading": { "family": "Inter", "weight": 700 } },
            "spacing": { "section": "4rem" },
            "shadows": { "card": "0 1px 3px rgba(0,0,0,.2)" },
            "borderRadius": { "md": "8px" }
        }));
        let tree = node(json!({
            "type": "section",
            "props": {
                "style": { "padding": "$theme.spacing.section", "boxShadow": "$theme.shadows.card" },
                "cards": [{
                    "type": "card",
                    "props": { "style": { "borderRadius": "$theme.borderRadius.md" } }
                }]
            },
            "children": [
                { "type": "h2", "props": { "style": {
                    "fontFamily": "$theme.fonts.heading.family",
                    "fontWeight": "$theme.fonts.heading.weight",
                    "color": "$theme.colors.text.muted"
                } }, "content": "Features" }
            ]
        }));
        let resolved = resolve(&tree, &theme).unwrap();
        let json = resolved.to_json();
        assert!(!contains_token_reference(&json), "{json}");
        assert_eq!(
            json["children"][0]["props"]["style"]["fontWeight"],
            "var(--font-heading-weight)"
        );
        assert_eq!(
            json["props"]["cards"][0]["props"]["style"]["borderRadius"],
            "var(--radius-md)"
        );
    }

    #[test]
    fn collects_errors_from_the_whole_tree() {
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let tree = node(json!({
            "type": "page",
            "props": { "accent": "$theme.colors.accent" },
            "children": [{ "type": "p", "props": { "style": { "margin": "$theme.spacing.md" } } }]
        }));
        let errs = resolve(&tree, &theme).unwrap_err();
        let locations: Vec<_> = errs.errors().iter().map(ResolutionError::location).collect();
        assert_eq!(
            locations,
            ["page.props.accent", "page.children[0]<p>.props.style.margin"]
        );
    }

    #[test]
    fn malformed_reference_is_unresolved() {
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let tree = node(json!({ "type": "div", "props": { "color": "$theme." } }));
        let errs = resolve(&tree, &theme).unwrap_err();
        assert!(matches!(
            errs.errors(),
            [ResolutionError::UnresolvedTokenReference { .. }]
        ));
    }

    #[test]
    fn test_hooks_pass_through_unchanged() {
        let theme = theme(json!({}));
        let tree = node(json!({
            "type": "button",
            "props": { "id": "cta-1", "data-testid": "hero-cta", "data-state": "  open " }
        }));
        let resolved = resolve(&tree, &theme).unwrap();
        assert_eq!(resolved.prop("id").and_then(ResolvedValue::as_str), Some("cta-1"));
        assert_eq!(
            resolved.prop("data-testid").and_then(ResolvedValue::as_str),
            Some("hero-cta")
        );
        assert_eq!(
            resolved.prop("data-state").and_then(ResolvedValue::as_str),
            Some("  open ")
        );
    }

    #[test]
    fn raw_style_strings_pass_through_by_default() {
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let tree = node(json!({
            "type": "div",
            "props": { "style": "color: $theme.colors.primary; margin: 0" }
        }));
        let resolved = resolve(&tree, &theme).unwrap();
        assert_eq!(
            resolved.prop("style").and_then(ResolvedValue::as_str),
            Some("color: $theme.colors.primary; margin: 0")
        );
    }

    #[test]
    fn raw_style_strings_substitute_when_enabled() {
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let options = ResolveOptions {
            raw_style_tokens: RawStylePolicy::Substitute,
        };
        let tree = node(json!({
            "type": "div",
            "props": { "style": "color: $theme.colors.primary; margin: 0" }
        }));
        let resolved = resolve_with(&tree, &theme, options).unwrap();
        assert_eq!(
            resolved.prop("style").and_then(ResolvedValue::as_str),
            Some("color: var(--color-primary); margin: 0")
        );

        let broken = node(json!({ "type": "div", "props": { "style": "color: $theme.colors.nope" } }));
        let errs = resolve_with(&broken, &theme, options).unwrap_err();
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn text_references_resolve_to_literal_values() {
        let theme = theme(json!({ "fonts": { "body": { "family": "Inter" } } }));
        let tree = node(json!({
            "type": "p",
            "content": "$theme.fonts.body.family",
            "children": ["Typeface: ", "$theme.fonts.body.family"]
        }));
        let resolved = resolve(&tree, &theme).unwrap();
        assert_eq!(resolved.content.as_deref(), Some("Inter"));
        assert_eq!(resolved.children[1], ResolvedChild::Text("Inter".into()));
    }

    #[test]
    fn resolution_does_not_touch_the_input_tree() {
        let theme = theme(json!({ "colors": { "primary": "#007bff" } }));
        let tree = node(json!({ "type": "div", "props": { "color": "$theme.colors.primary" } }));
        let before = tree.clone();
        let first = resolve(&tree, &theme).unwrap();
        let second = resolve(&tree, &theme).unwrap();
        assert_eq!(tree, before);
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_responsive_breakpoint_is_reported() {
        let theme = theme(json!({ "breakpoints": { "md": "768px" } }));
        let tree = node(json!({
            "type": "div",
            "props": { "responsive": { "xl": { "hidden": true } } }
        }));
        let errs = resolve(&tree, &theme).unwrap_err();
        assert_eq!(
            errs.errors(),
            [ResolutionError::UnknownBreakpoint {
                location: "div.props.responsive".into(),
                name: "xl".into()
            }]
        );
    }

    #[test]
    fn viewport_applies_overrides_smallest_first() {
        let theme = theme(json!({
            "spacing": { "sm": "1rem", "lg": "3rem" },
            "breakpoints": { "lg": "1024px", "sm": "640px", "md": "768px" }
        }));
        let tree = node(json!({
            "type": "section",
            "props": {
                "columns": 1,
                "style": { "padding": "0.5rem", "color": "black" },
                "responsive": {
                    "lg": { "columns": 3, "style": { "padding": "$theme.spacing.lg" } },
                    "sm": { "columns": 2, "style": { "padding": "$theme.spacing.sm" } }
                }
            }
        }));

        let narrow = resolve_for_viewport(&tree, &theme, 320.0).unwrap();
        assert_eq!(narrow.to_json()["props"]["columns"], 1);
        assert!(narrow.prop("responsive").is_none());

        let tablet = resolve_for_viewport(&tree, &theme, 800.0).unwrap();
        assert_eq!(tablet.to_json()["props"]["columns"], 2);
        assert_eq!(
            tablet.style("padding").and_then(ResolvedValue::as_str),
            Some("var(--spacing-sm)")
        );
        assert_eq!(tablet.style("color").and_then(ResolvedValue::as_str), Some("black"));

        let desktop = resolve_for_viewport(&tree, &theme, 1280.0).unwrap();
        assert_eq!(desktop.to_json()["props"]["columns"], 3);
        assert_eq!(
            desktop.style("padding").and_then(ResolvedValue::as_str),
            Some("var(--spacing-lg)")
        );
    }

    #[test]
    fn viewport_reaches_nodes_nested_in_prop_maps() {
        let theme = theme(json!({ "breakpoints": { "md": "768px" } }));
        let tree = node(json!({
            "type": "layout",
            "props": {
                "slots": {
                    "header": [{
                        "type": "nav",
                        "props": {
                            "style": { "display": "none" },
                            "responsive": { "md": { "style": { "display": "flex" } } }
                        }
                    }]
                }
            }
        }));

        let narrow = resolve_for_viewport(&tree, &theme, 320.0).unwrap();
        let nav = &narrow.to_json()["props"]["slots"]["header"][0];
        assert_eq!(nav["props"]["style"]["display"], "none");
        assert!(nav["props"].get("responsive").is_none());

        let wide = resolve_for_viewport(&tree, &theme, 1024.0).unwrap();
        assert_eq!(
            wide.to_json()["props"]["slots"]["header"][0]["props"]["style"]["display"],
            "flex"
        );
    }
}
