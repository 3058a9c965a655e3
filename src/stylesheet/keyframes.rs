use std::fmt::Write as _;

use crate::css::{reference_pieces, ReferencePiece};
use crate::resolver::ResolutionError;
use crate::theme::presets::AnimationPreset;
use crate::theme::{
    kebab_case, resolve_reference, Category, KeyframeSteps, KeyframeValue, ReferenceScope,
    TokenTable,
};

/// A fully resolved `@keyframes` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframesBlock {
    pub name: String,
    pub steps: Vec<KeyframeStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframeStep {
    pub selector: String,
    /// `(css property, value)` with property names already kebab-cased.
    pub declarations: Vec<(String, String)>,
}

impl KeyframesBlock {
    pub fn from_preset(preset: &AnimationPreset) -> Self {
        Self {
            name: preset.keyframes_name.to_string(),
            steps: preset
                .steps
                .iter()
                .map(|(selector, declarations)| KeyframeStep {
                    selector: selector.to_string(),
                    declarations: declarations
                        .iter()
                        .map(|(property, value)| (property.to_string(), value.to_string()))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Resolves a user keyframe map. References may only point into
    /// categories processed before animations; failures are pushed onto
    /// `errors` and the offending value is left empty.
    pub(super) fn resolve(
        name: &str,
        steps: &KeyframeSteps,
        tokens: &TokenTable,
        errors: &mut Vec<ResolutionError>,
    ) -> Self {
        let steps = steps
            .iter()
            .map(|(selector, declarations)| KeyframeStep {
                selector: selector.clone(),
                declarations: declarations
                    .iter()
                    .map(|(property, value)| {
                        let location = format!("theme.animations.{name}.{selector}.{property}");
                        let value = match value {
                            KeyframeValue::Number(number) => number.to_string(),
                            KeyframeValue::Text(text) => substitute(text, tokens, &location, errors),
                        };
                        (kebab_case(property), value)
                    })
                    .collect(),
            })
            .collect();
        Self {
            name: name.to_string(),
            steps,
        }
    }

    pub fn write_css(&self, out: &mut String) {
        let _ = writeln!(out, "@keyframes {} {{", self.name);
        for step in &self.steps {
            let _ = writeln!(out, "  {} {{", step.selector);
            for (property, value) in &step.declarations {
                let _ = writeln!(out, "    {property}: {value};");
            }
            out.push_str("  }\n");
        }
        out.push_str("}\n");
    }
}

fn substitute(
    text: &str,
    tokens: &TokenTable,
    location: &str,
    errors: &mut Vec<ResolutionError>,
) -> String {
    let mut out = String::with_capacity(text.len());
    for piece in reference_pieces(text) {
        match piece {
            ReferencePiece::Text(text) => out.push_str(text),
            ReferencePiece::Reference(reference) => {
                match resolve_reference(reference, tokens, ReferenceScope::Before(Category::Animations)) {
                    Ok(token) => out.push_str(&token.css_var()),
                    Err(err) => errors.push(ResolutionError::UnresolvedTokenReference {
                        location: location.to_string(),
                        reference: reference.to_string(),
                        reason: err.to_string(),
                    }),
                }
            }
        }
    }
    out
}
