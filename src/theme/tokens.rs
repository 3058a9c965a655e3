use indexmap::IndexMap;

use super::path::variable_name;
use super::presets;
use super::{AnimationToken, Category, ThemeConfig, TokenGroup, TokenNode};

/// Every custom property a theme defines, in emission order.
///
/// Built once per theme. Names come from [`variable_name`], so a reference and
/// its declaration can never disagree. When two paths of a category flatten to
/// the same name the later value wins and the declaration keeps the position
/// of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTable {
    declarations: IndexMap<String, Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    category: Category,
    value: String,
}

impl TokenTable {
    pub fn from_theme(theme: &ThemeConfig) -> Self {
        let mut table = Self::default();
        for category in Category::ORDER {
            match category {
                Category::Fonts => {
                    for (name, font) in &theme.fonts {
                        for (field, value) in font.fields() {
                            table.declare(category, variable_name(category, &[name.as_str(), field]), value);
                        }
                    }
                }
                Category::Animations => {
                    for (name, animation) in &theme.animations {
                        table.declare_animation(name, animation);
                    }
                }
                Category::Breakpoints => {
                    for (name, breakpoint) in &theme.breakpoints {
                        table.declare(category, variable_name(category, &[name]), &breakpoint.raw);
                    }
                }
                Category::Colors | Category::Spacing | Category::Shadows | Category::BorderRadius => {
                    if let Some(group) = theme.group(category) {
                        let mut segments = Vec::new();
                        table.declare_group(category, group, &mut segments);
                    }
                }
            }
        }
        table
    }

    pub fn get(&self, variable: &str) -> Option<&str> {
        self.declarations
            .get(variable)
            .map(|declaration| declaration.value.as_str())
    }

    pub fn category_of(&self, variable: &str) -> Option<Category> {
        self.declarations
            .get(variable)
            .map(|declaration| declaration.category)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// `(variable, value)` pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(name, declaration)| (name.as_str(), declaration.value.as_str()))
    }

    fn declare_group<'a>(
        &mut self,
        category: Category,
        group: &'a TokenGroup,
        segments: &mut Vec<&'a str>,
    ) {
        for (key, node) in group {
            segments.push(key);
            match node {
                TokenNode::Value(value) => {
                    self.declare(category, variable_name(category, segments.as_slice()), value);
                }
                TokenNode::Group(nested) => self.declare_group(category, nested, segments),
            }
            segments.pop();
        }
    }

    fn declare_animation(&mut self, name: &str, animation: &AnimationToken) {
        let category = Category::Animations;
        match animation {
            AnimationToken::Flag(false) => {}
            AnimationToken::Flag(true) => {
                // Unknown presets are rejected during validation.
                if let Some(preset) = presets::preset(name) {
                    self.declare(category, variable_name(category, &[name]), preset.keyframes_name);
                }
            }
            AnimationToken::Shorthand(value) => {
                self.declare(category, variable_name(category, &[name]), value);
            }
            AnimationToken::Timing(timing) => {
                if let Some(duration) = &timing.duration {
                    self.declare(category, variable_name(category, &[name, "duration"]), duration);
                }
                if let Some(easing) = &timing.easing {
                    self.declare(category, variable_name(category, &[name, "easing"]), easing);
                }
            }
            AnimationToken::Keyframes(_) => {
                self.declare(category, variable_name(category, &[name]), name);
            }
        }
    }

    fn declare(&mut self, category: Category, variable: String, value: &str) {
        let declaration = Declaration {
            category,
            value: value.to_string(),
        };
        if let Some(previous) = self.declarations.insert(variable.clone(), declaration) {
            tracing::warn!(
                %variable,
                %category,
                previous = %previous.value,
                current = %value,
                "token paths collide; later declaration wins"
            );
        }
    }
}
