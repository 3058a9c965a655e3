//! Token-reference parsing and the one place CSS variable names are derived.

use thiserror::Error;

use super::{kebab_case, Category, TokenTable};
use crate::css::is_segment_char;

/// Prefix that marks a string as a token reference.
pub const TOKEN_PREFIX: &str = "$theme.";

pub fn is_token_reference(value: &str) -> bool {
    value.starts_with(TOKEN_PREFIX)
}

/// Token names and path segments are restricted so they can be embedded in a
/// custom property name unescaped.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(is_segment_char)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenPathError {
    #[error("token path is empty")]
    Empty,
    #[error("`{0}` is not a theme category")]
    UnknownCategory(String),
    #[error("token path names only the `{0}` category")]
    CategoryOnly(Category),
    #[error("token path contains an empty segment")]
    EmptySegment,
    #[error("segment `{0}` may only contain ASCII letters, digits, `-` and `_`")]
    InvalidSegment(String),
}

/// A parsed `category.segment.segment` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPath {
    category: Category,
    segments: Vec<String>,
}

impl TokenPath {
    /// Parses a full reference such as `$theme.colors.primary`.
    pub fn parse_reference(reference: &str) -> Result<Self, TokenPathError> {
        let path = reference
            .strip_prefix(TOKEN_PREFIX)
            .ok_or(TokenPathError::Empty)?;
        Self::parse(path)
    }

    /// Parses a bare path such as `fonts.body.family`.
    pub fn parse(path: &str) -> Result<Self, TokenPathError> {
        if path.is_empty() {
            return Err(TokenPathError::Empty);
        }
        let mut parts = path.split('.');
        let head = parts.next().unwrap_or_default();
        let category =
            Category::from_key(head).ok_or_else(|| TokenPathError::UnknownCategory(head.into()))?;

        let mut segments = Vec::new();
        for part in parts {
            if part.is_empty() {
                return Err(TokenPathError::EmptySegment);
            }
            if !is_valid_segment(part) {
                return Err(TokenPathError::InvalidSegment(part.into()));
            }
            segments.push(part.to_string());
        }
        if segments.is_empty() {
            return Err(TokenPathError::CategoryOnly(category));
        }
        Ok(Self { category, segments })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn variable_name(&self) -> String {
        variable_name(self.category, &self.segments)
    }
}

impl std::fmt::Display for TokenPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.category, self.segments.join("."))
    }
}

/// Custom property name for a path within a category.
///
/// `--{prefix}-{segments joined by -}`. Font sub-fields are kebab-cased
/// (`fonts.body.lineHeight` -> `--font-body-line-height`); every other segment
/// is used verbatim. Two paths that flatten to the same name denote the same
/// variable.
pub fn variable_name<S: AsRef<str>>(category: Category, segments: &[S]) -> String {
    let mut name = format!("--{}", category.variable_prefix());
    let last = segments.len().saturating_sub(1);
    for (index, segment) in segments.iter().enumerate() {
        name.push('-');
        if category == Category::Fonts && index == last && index > 0 {
            name.push_str(&kebab_case(segment.as_ref()));
        } else {
            name.push_str(segment.as_ref());
        }
    }
    name
}

/// Which categories a reference may point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceScope {
    All,
    /// Only categories processed before the given one.
    Before(Category),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error(transparent)]
    Malformed(#[from] TokenPathError),
    #[error("`{0}` is not declared in the theme")]
    NotDeclared(String),
    #[error("`{path}` is not available here; only categories processed before {scope} can be referenced")]
    OutOfScope { path: String, scope: Category },
}

/// A successfully resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub variable: String,
    pub value: String,
}

impl ResolvedToken {
    pub fn css_var(&self) -> String {
        format!("var({})", self.variable)
    }
}

pub fn resolve_reference(
    reference: &str,
    tokens: &TokenTable,
    scope: ReferenceScope,
) -> Result<ResolvedToken, ReferenceError> {
    let path = TokenPath::parse_reference(reference)?;
    if let ReferenceScope::Before(limit) = scope {
        if !path.category().is_processed_before(limit) {
            return Err(ReferenceError::OutOfScope {
                path: path.to_string(),
                scope: limit,
            });
        }
    }
    let variable = path.variable_name();
    let value = tokens
        .get(&variable)
        .ok_or_else(|| ReferenceError::NotDeclared(path.to_string()))?;
    Ok(ResolvedToken {
        value: value.to_string(),
        variable,
    })
}
