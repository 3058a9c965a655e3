pub mod cache;
pub mod keyframes;
pub mod media;

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::breakpoint::{Breakpoint, UnknownBreakpoint};
use crate::css::{self, ValuePiece};
use crate::node::ResolvedComponentNode;
use crate::resolver::{ResolutionErrors, ResolveResult};
use crate::theme::{kebab_case, presets, AnimationToken, ThemeConfig, TokenTable};

pub use cache::StylesheetCache;
pub use keyframes::{KeyframeStep, KeyframesBlock};

/// Nesting limit when expanding `var()` chains.
const MAX_VAR_DEPTH: usize = 16;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedStylesheet {
    css: String,
    variables: IndexMap<String, String>,
    breakpoints: Vec<Breakpoint>,
    keyframes: Vec<String>,
}

impl GeneratedStylesheet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn is_empty(&self) -> bool {
        self.css.is_empty()
    }

    /// Value of a custom property, e.g. `variable("--color-primary")`.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Breakpoints in ascending pixel order.
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn keyframe_names(&self) -> &[String] {
        &self.keyframes
    }

    /// What a browser would compute for `property: value` under this
    /// stylesheet: `var()` references are expanded (falling back to the
    /// inline fallback, or left as written when undeclared) and a unitless
    /// `0` becomes `0px` for length properties.
    pub fn computed_value(&self, property: &str, value: &str) -> String {
        let expanded = self.expand_vars(value, 0);
        if !is_length_property(&kebab_case(property)) {
            return expanded;
        }
        expanded
            .split_whitespace()
            .map(|part| if part == "0" { "0px" } else { part })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `@media` rules for the node's `responsive` style overrides.
    pub fn media_rules(
        &self,
        selector: &str,
        node: &ResolvedComponentNode,
    ) -> Result<String, Vec<UnknownBreakpoint>> {
        media::responsive_rules(selector, node, &self.breakpoints)
    }

    fn expand_vars(&self, value: &str, depth: usize) -> String {
        if depth >= MAX_VAR_DEPTH {
            return value.to_string();
        }
        css::value_pieces(value)
            .into_iter()
            .map(|piece| match piece {
                ValuePiece::Text(text) => text.to_string(),
                ValuePiece::Var {
                    name,
                    fallback,
                    raw,
                } => match self.variable(name).or(fallback) {
                    Some(replacement) => self.expand_vars(replacement, depth + 1),
                    None => raw.to_string(),
                },
            })
            .collect()
    }
}

fn is_length_property(property: &str) -> bool {
    matches!(
        property,
        "width"
            | "height"
            | "top"
            | "right"
            | "bottom"
            | "left"
            | "inset"
            | "gap"
            | "row-gap"
            | "column-gap"
            | "flex-basis"
            | "font-size"
            | "letter-spacing"
            | "border-width"
            | "outline-width"
            | "outline-offset"
    ) || property.starts_with("min-")
        || property.starts_with("max-")
        || property.starts_with("margin")
        || property.starts_with("padding")
        || property.ends_with("radius")
}

/// Generates the stylesheet for `theme`: one `:root` block with every custom
/// property in category order, then the `@keyframes` blocks in declaration
/// order. An empty theme produces an empty string.
///
/// Keyframe references that cannot be resolved fail the whole generation;
/// every failure is reported.
pub fn generate(theme: &ThemeConfig) -> ResolveResult<GeneratedStylesheet> {
    tracing::debug!(
        colors = theme.colors.len(),
        fonts = theme.fonts.len(),
        animations = theme.animations.len(),
        breakpoints = theme.breakpoints.len(),
        "generating stylesheet"
    );
    let tokens = TokenTable::from_theme(theme);

    let mut errors = Vec::new();
    let mut blocks: IndexMap<String, KeyframesBlock> = IndexMap::new();
    for (name, animation) in &theme.animations {
        let block = match animation {
            AnimationToken::Flag(true) => presets::preset(name).map(KeyframesBlock::from_preset),
            AnimationToken::Keyframes(steps) => {
                Some(KeyframesBlock::resolve(name, steps, &tokens, &mut errors))
            }
            AnimationToken::Flag(false) | AnimationToken::Shorthand(_) | AnimationToken::Timing(_) => None,
        };
        let Some(block) = block else {
            continue;
        };
        if blocks.insert(block.name.clone(), block).is_some() {
            tracing::warn!(animation = %name, "duplicate keyframes name; later block wins");
        }
    }
    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "stylesheet generation failed");
        return Err(ResolutionErrors::new(errors));
    }

    let mut css = String::new();
    if !tokens.is_empty() {
        css.push_str(":root {\n");
        for (variable, value) in tokens.iter() {
            let _ = writeln!(css, "  {variable}: {value};");
        }
        css.push_str("}\n");
    }
    for block in blocks.values() {
        if !css.is_empty() {
            css.push('\n');
        }
        block.write_css(&mut css);
    }

    Ok(GeneratedStylesheet {
        css,
        variables: tokens
            .iter()
            .map(|(variable, value)| (variable.to_string(), value.to_string()))
            .collect(),
        breakpoints: theme.sorted_breakpoints(),
        keyframes: blocks.into_keys().collect(),
    })
}
