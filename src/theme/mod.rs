mod error;
pub mod length;
pub mod path;
pub mod presets;
pub mod tokens;
mod validate;

use indexmap::IndexMap;

pub use error::{ValidationError, ValidationErrorKind, ValidationErrors};
pub use length::{parse_length, Length, LengthUnit};
pub use path::{resolve_reference, ReferenceError, ReferenceScope, ResolvedToken, TokenPath};
pub use tokens::TokenTable;
pub use validate::validate;

pub type ThemeResult<T> = std::result::Result<T, ValidationErrors>;

/// Top-level theme categories, in the order they are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Colors,
    Fonts,
    Spacing,
    Animations,
    Breakpoints,
    Shadows,
    BorderRadius,
}

impl Category {
    /// Fixed processing order. Keyframe steps may only reference categories
    /// that come before [`Category::Animations`].
    pub const ORDER: [Category; 7] = [
        Category::Colors,
        Category::Fonts,
        Category::Spacing,
        Category::Animations,
        Category::Breakpoints,
        Category::Shadows,
        Category::BorderRadius,
    ];

    /// Key used in the configuration document and in token paths.
    pub const fn key(self) -> &'static str {
        match self {
            Category::Colors => "colors",
            Category::Fonts => "fonts",
            Category::Spacing => "spacing",
            Category::Animations => "animations",
            Category::Breakpoints => "breakpoints",
            Category::Shadows => "shadows",
            Category::BorderRadius => "borderRadius",
        }
    }

    /// Prefix of every CSS custom property emitted for this category.
    pub const fn variable_prefix(self) -> &'static str {
        match self {
            Category::Colors => "color",
            Category::Fonts => "font",
            Category::Spacing => "spacing",
            Category::Animations => "animation",
            Category::Breakpoints => "breakpoint",
            Category::Shadows => "shadow",
            Category::BorderRadius => "radius",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|category| category.key() == key)
    }

    pub fn is_processed_before(self, other: Category) -> bool {
        self < other
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A leaf value or a nested group of tokens (`colors.brand.primary`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenNode {
    Value(String),
    Group(TokenGroup),
}

pub type TokenGroup = IndexMap<String, TokenNode>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontToken {
    pub family: String,
    pub fallback: Option<String>,
    pub weight: Option<String>,
    pub size: Option<String>,
    pub line_height: Option<String>,
    pub letter_spacing: Option<String>,
}

impl FontToken {
    /// Accepted keys in the configuration document.
    pub const FIELDS: [&'static str; 6] = [
        "family",
        "fallback",
        "weight",
        "size",
        "lineHeight",
        "letterSpacing",
    ];

    /// Present sub-fields as `(document key, value)`, in [`Self::FIELDS`] order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("family", Some(self.family.as_str())),
            ("fallback", self.fallback.as_deref()),
            ("weight", self.weight.as_deref()),
            ("size", self.size.as_deref()),
            ("lineHeight", self.line_height.as_deref()),
            ("letterSpacing", self.letter_spacing.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationTiming {
    pub duration: Option<String>,
    pub easing: Option<String>,
}

/// A keyframe declaration value: either CSS text (possibly a token reference)
/// or a bare number such as an opacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyframeValue {
    Text(String),
    Number(serde_json::Number),
}

pub type KeyframeDeclarations = IndexMap<String, KeyframeValue>;

/// Step selector (`from`, `to`, `50%`) to declarations.
pub type KeyframeSteps = IndexMap<String, KeyframeDeclarations>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationToken {
    /// `true` enables the preset of the same name, `false` disables it.
    Flag(bool),
    /// Shorthand usable directly as an `animation` value.
    Shorthand(String),
    Timing(AnimationTiming),
    Keyframes(KeyframeSteps),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointToken {
    pub raw: String,
    pub length: Length,
}

/// Only ever produced by [`validate`]. Maps keep declaration order, which the
/// stylesheet output and collision policy rely on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeConfig {
    pub colors: TokenGroup,
    pub fonts: IndexMap<String, FontToken>,
    pub spacing: TokenGroup,
    pub animations: IndexMap<String, AnimationToken>,
    pub breakpoints: IndexMap<String, BreakpointToken>,
    pub shadows: TokenGroup,
    pub border_radius: TokenGroup,
}

impl ThemeConfig {
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
            && self.fonts.is_empty()
            && self.spacing.is_empty()
            && self.animations.is_empty()
            && self.breakpoints.is_empty()
            && self.shadows.is_empty()
            && self.border_radius.is_empty()
    }

    /// Groups for the categories whose values are plain (possibly nested) strings.
    pub fn group(&self, category: Category) -> Option<&TokenGroup> {
        match category {
            Category::Colors => Some(&self.colors),
            Category::Spacing => Some(&self.spacing),
            Category::Shadows => Some(&self.shadows),
            Category::BorderRadius => Some(&self.border_radius),
            Category::Fonts | Category::Animations | Category::Breakpoints => None,
        }
    }

    /// Breakpoints in ascending pixel order, ties kept in declaration order.
    pub fn sorted_breakpoints(&self) -> Vec<crate::breakpoint::Breakpoint> {
        crate::breakpoint::sort_breakpoints(&self.breakpoints)
    }

    /// Content hash over every category in processing order. Two themes that
    /// generate different stylesheets never share a hash; declaration order is
    /// part of the content.
    pub fn content_hash(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for category in Category::ORDER {
            feed(&mut hasher, category.key());
            match category {
                Category::Fonts => {
                    for (name, font) in &self.fonts {
                        feed(&mut hasher, name);
                        for (field, value) in font.fields() {
                            feed(&mut hasher, field);
                            feed(&mut hasher, value);
                        }
                        feed(&mut hasher, "}");
                    }
                }
                Category::Animations => {
                    for (name, animation) in &self.animations {
                        feed(&mut hasher, name);
                        feed_animation(&mut hasher, animation);
                    }
                }
                Category::Breakpoints => {
                    for (name, breakpoint) in &self.breakpoints {
                        feed(&mut hasher, name);
                        feed(&mut hasher, &breakpoint.raw);
                    }
                }
                Category::Colors | Category::Spacing | Category::Shadows | Category::BorderRadius => {
                    if let Some(group) = self.group(category) {
                        feed_group(&mut hasher, group);
                    }
                }
            }
        }
        hasher.finalize()
    }
}

// Length-prefixed so that adjacent fields can never alias each other.
fn feed(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn feed_group(hasher: &mut blake3::Hasher, group: &TokenGroup) {
    for (key, node) in group {
        feed(hasher, key);
        match node {
            TokenNode::Value(value) => {
                feed(hasher, "=");
                feed(hasher, value);
            }
            TokenNode::Group(nested) => {
                feed(hasher, "{");
                feed_group(hasher, nested);
                feed(hasher, "}");
            }
        }
    }
}

fn feed_animation(hasher: &mut blake3::Hasher, animation: &AnimationToken) {
    match animation {
        AnimationToken::Flag(enabled) => feed(hasher, if *enabled { "flag:1" } else { "flag:0" }),
        AnimationToken::Shorthand(value) => {
            feed(hasher, "shorthand");
            feed(hasher, value);
        }
        AnimationToken::Timing(timing) => {
            feed(hasher, "timing");
            feed(hasher, timing.duration.as_deref().unwrap_or(""));
            feed(hasher, timing.easing.as_deref().unwrap_or(""));
        }
        AnimationToken::Keyframes(steps) => {
            feed(hasher, "keyframes");
            for (step, declarations) in steps {
                feed(hasher, step);
                for (property, value) in declarations {
                    feed(hasher, property);
                    match value {
                        KeyframeValue::Text(text) => feed(hasher, text),
                        KeyframeValue::Number(number) => feed(hasher, &number.to_string()),
                    }
                }
                feed(hasher, "}");
            }
        }
    }
}

/// `backgroundColor` -> `background-color`. Already kebab-cased names are kept.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
