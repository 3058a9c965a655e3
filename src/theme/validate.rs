use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::error::{ValidationError, ValidationErrorKind, ValidationErrors};
use super::length::parse_length;
use super::path::is_valid_segment;
use super::presets;
use super::{
    AnimationTiming, AnimationToken, BreakpointToken, Category, FontToken, KeyframeDeclarations,
    KeyframeSteps, KeyframeValue, ThemeConfig, TokenGroup, TokenNode,
};

use ValidationErrorKind::*;

const ROOT: &str = "theme";

/// Shape-checks a raw theme tree.
///
/// `None` and JSON `null` both mean "no theme" and yield an empty
/// [`ThemeConfig`]. Every error in the tree is collected; the theme is only
/// returned when there are none.
pub fn validate(raw: Option<&Value>) -> Result<ThemeConfig, ValidationErrors> {
    let mut validator = Validator::default();
    let theme = match raw {
        None | Some(Value::Null) => ThemeConfig::default(),
        Some(Value::Object(map)) => validator.theme(map),
        Some(other) => {
            validator.push(InvalidType, ROOT, format!("expected an object, found {}", type_name(other)));
            ThemeConfig::default()
        }
    };

    if validator.errors.is_empty() {
        tracing::debug!(empty = theme.is_empty(), "theme validated");
        Ok(theme)
    } else {
        tracing::debug!(errors = validator.errors.len(), "theme rejected");
        Err(ValidationErrors::new(validator.errors))
    }
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    fn push(&mut self, kind: ValidationErrorKind, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(kind, path, message));
    }

    fn theme(&mut self, map: &Map<String, Value>) -> ThemeConfig {
        let mut theme = ThemeConfig::default();
        for (key, value) in map {
            let path = format!("{ROOT}.{key}");
            let Some(category) = Category::from_key(key) else {
                let known: Vec<_> = Category::ORDER.iter().map(|c| c.key()).collect();
                self.push(
                    UnknownCategory,
                    path,
                    format!("unknown theme category; expected one of {}", known.join(", ")),
                );
                continue;
            };
            let entries = match value {
                Value::Null => continue,
                Value::Object(entries) => entries,
                other => {
                    self.push(InvalidType, path, format!("expected an object, found {}", type_name(other)));
                    continue;
                }
            };

            match category {
                Category::Colors => theme.colors = self.token_group(entries, &path),
                Category::Spacing => theme.spacing = self.token_group(entries, &path),
                Category::Shadows => theme.shadows = self.token_group(entries, &path),
                Category::BorderRadius => theme.border_radius = self.token_group(entries, &path),
                Category::Fonts => theme.fonts = self.fonts(entries, &path),
                Category::Animations => theme.animations = self.animations(entries, &path),
                Category::Breakpoints => theme.breakpoints = self.breakpoints(entries, &path),
            }
        }
        theme
    }

    fn token_name(&mut self, key: &str, path: &str) -> bool {
        if is_valid_segment(key) {
            return true;
        }
        self.push(
            InvalidFormat,
            path,
            "token names may only contain ASCII letters, digits, `-` and `_`",
        );
        false
    }

    fn token_group(&mut self, entries: &Map<String, Value>, path: &str) -> TokenGroup {
        let mut group = TokenGroup::new();
        for (key, value) in entries {
            let path = format!("{path}.{key}");
            if !self.token_name(key, &path) {
                continue;
            }
            match value {
                Value::String(text) => {
                    if let Some(text) = self.non_empty(text, &path) {
                        group.insert(key.clone(), TokenNode::Value(text));
                    }
                }
                Value::Object(nested) => {
                    group.insert(key.clone(), TokenNode::Group(self.token_group(nested, &path)));
                }
                other => self.push(
                    InvalidType,
                    path,
                    format!("expected a string or a group of tokens, found {}", type_name(other)),
                ),
            }
        }
        group
    }

    fn non_empty(&mut self, text: &str, path: &str) -> Option<String> {
        if text.trim().is_empty() {
            self.push(InvalidFormat, path, "value must not be empty");
            return None;
        }
        Some(text.to_string())
    }

    fn fonts(&mut self, entries: &Map<String, Value>, path: &str) -> IndexMap<String, FontToken> {
        let mut fonts = IndexMap::new();
        for (key, value) in entries {
            let path = format!("{path}.{key}");
            if !self.token_name(key, &path) {
                continue;
            }
            let Value::Object(fields) = value else {
                self.push(InvalidType, path, format!("expected a font object, found {}", type_name(value)));
                continue;
            };
            if let Some(font) = self.font(fields, &path) {
                fonts.insert(key.clone(), font);
            }
        }
        fonts
    }

    fn font(&mut self, fields: &Map<String, Value>, path: &str) -> Option<FontToken> {
        let before = self.errors.len();
        let mut font = FontToken::default();
        let mut family = None;

        for (field, value) in fields {
            let field_path = format!("{path}.{field}");
            if !FontToken::FIELDS.contains(&field.as_str()) {
                self.push(
                    InvalidFormat,
                    field_path,
                    format!("unknown font field; expected one of {}", FontToken::FIELDS.join(", ")),
                );
                continue;
            }
            let text = match value {
                Value::Null => continue,
                Value::String(text) => self.non_empty(text, &field_path),
                Value::Number(number) if field == "weight" => Some(number.to_string()),
                other => {
                    self.push(InvalidType, field_path, format!("expected a string, found {}", type_name(other)));
                    None
                }
            };
            let Some(text) = text else { continue };
            match field.as_str() {
                "family" => family = Some(text),
                "fallback" => font.fallback = Some(text),
                "weight" => font.weight = Some(text),
                "size" => font.size = Some(text),
                "lineHeight" => font.line_height = Some(text),
                "letterSpacing" => font.letter_spacing = Some(text),
                _ => {}
            }
        }

        match family {
            Some(family) => font.family = family,
            None if !fields.get("family").is_some_and(|v| !v.is_null()) => {
                self.push(MissingField, format!("{path}.family"), "font requires a `family`");
            }
            // Present but invalid; already reported.
            None => {}
        }
        (self.errors.len() == before).then_some(font)
    }

    fn breakpoints(
        &mut self,
        entries: &Map<String, Value>,
        path: &str,
    ) -> IndexMap<String, BreakpointToken> {
        let mut breakpoints = IndexMap::new();
        for (key, value) in entries {
            let path = format!("{path}.{key}");
            if !self.token_name(key, &path) {
                continue;
            }
            let Value::String(raw) = value else {
                self.push(InvalidType, path, format!("expected a length string, found {}", type_name(value)));
                continue;
            };
            match parse_length(raw) {
                Some(length) if length.value >= 0.0 => {
                    breakpoints.insert(
                        key.clone(),
                        BreakpointToken {
                            raw: raw.trim().to_string(),
                            length,
                        },
                    );
                }
                Some(_) => self.push(InvalidFormat, path, "breakpoint must not be negative"),
                None => self.push(
                    InvalidFormat,
                    path,
                    format!("`{raw}` is not a length with a known unit (px, rem, em, pt)"),
                ),
            }
        }
        breakpoints
    }

    fn animations(
        &mut self,
        entries: &Map<String, Value>,
        path: &str,
    ) -> IndexMap<String, AnimationToken> {
        let mut animations = IndexMap::new();
        for (key, value) in entries {
            let path = format!("{path}.{key}");
            if !self.token_name(key, &path) {
                continue;
            }
            if let Some(animation) = self.animation(key, value, &path) {
                animations.insert(key.clone(), animation);
            }
        }
        animations
    }

    fn animation(&mut self, name: &str, value: &Value, path: &str) -> Option<AnimationToken> {
        match value {
            Value::Bool(true) if presets::preset(name).is_none() => {
                let known: Vec<_> = presets::preset_names().collect();
                self.push(
                    InvalidFormat,
                    path,
                    format!("no preset animation named `{name}`; presets are {}", known.join(", ")),
                );
                None
            }
            Value::Bool(enabled) => Some(AnimationToken::Flag(*enabled)),
            Value::String(text) => self.non_empty(text, path).map(AnimationToken::Shorthand),
            Value::Object(fields) if !fields.is_empty() && fields.keys().all(|k| is_step_selector(k)) => {
                self.keyframes(fields, path).map(AnimationToken::Keyframes)
            }
            Value::Object(fields)
                if !fields.is_empty() && fields.keys().all(|k| k == "duration" || k == "easing") =>
            {
                self.timing(fields, path).map(AnimationToken::Timing)
            }
            other => {
                self.push(
                    InvalidAnimationShape,
                    path,
                    format!(
                        "expected a boolean, a shorthand string, {{duration, easing}} or keyframe steps, found {}",
                        describe_shape(other)
                    ),
                );
                None
            }
        }
    }

    fn timing(&mut self, fields: &Map<String, Value>, path: &str) -> Option<AnimationTiming> {
        let before = self.errors.len();
        let mut timing = AnimationTiming::default();
        for (field, value) in fields {
            let field_path = format!("{path}.{field}");
            let Value::String(text) = value else {
                self.push(InvalidType, field_path, format!("expected a string, found {}", type_name(value)));
                continue;
            };
            let text = self.non_empty(text, &field_path);
            if field == "duration" {
                timing.duration = text;
            } else {
                timing.easing = text;
            }
        }
        (self.errors.len() == before).then_some(timing)
    }

    fn keyframes(&mut self, steps: &Map<String, Value>, path: &str) -> Option<KeyframeSteps> {
        let before = self.errors.len();
        let mut keyframes = KeyframeSteps::new();
        for (step, declarations) in steps {
            let step_path = format!("{path}.{step}");
            let Value::Object(declarations) = declarations else {
                self.push(
                    InvalidAnimationShape,
                    step_path,
                    format!("keyframe step must be a style map, found {}", type_name(declarations)),
                );
                continue;
            };
            let mut parsed = KeyframeDeclarations::new();
            for (property, value) in declarations {
                let property_path = format!("{step_path}.{property}");
                if !is_valid_segment(property) {
                    self.push(InvalidFormat, property_path, "not a valid style property name");
                    continue;
                }
                match value {
                    Value::String(text) => {
                        if let Some(text) = self.non_empty(text, &property_path) {
                            parsed.insert(property.clone(), KeyframeValue::Text(text));
                        }
                    }
                    Value::Number(number) => {
                        parsed.insert(property.clone(), KeyframeValue::Number(number.clone()));
                    }
                    other => self.push(
                        InvalidType,
                        property_path,
                        format!("expected a string or number, found {}", type_name(other)),
                    ),
                }
            }
            keyframes.insert(step.clone(), parsed);
        }
        (self.errors.len() == before).then_some(keyframes)
    }
}

/// `from`, `to`, or a percentage between 0% and 100%.
pub(crate) fn is_step_selector(key: &str) -> bool {
    if key == "from" || key == "to" {
        return true;
    }
    key.strip_suffix('%')
        .filter(|number| !number.is_empty() && !number.starts_with(['+', '-']))
        .and_then(|number| number.parse::<f64>().ok())
        .is_some_and(|percent| (0.0..=100.0).contains(&percent))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn describe_shape(value: &Value) -> String {
    match value {
        Value::Object(fields) if fields.is_empty() => "an empty object".to_string(),
        Value::Object(fields) => {
            let keys: Vec<_> = fields.keys().map(String::as_str).collect();
            format!("an object with keys [{}]", keys.join(", "))
        }
        other => type_name(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errors(raw: Value) -> ValidationErrors {
        validate(Some(&raw)).expect_err("theme should be rejected")
    }

    #[test]
    fn absent_theme_is_empty() {
        assert!(validate(None).unwrap().is_empty());
        assert!(validate(Some(&Value::Null)).unwrap().is_empty());
    }

    #[test]
    fn accepts_every_category() {
        let theme = validate(Some(&json!({
            "colors": { "primary": "#007bff", "brand": { "accent": "tomato" } },
            "fonts": { "body": { "family": "Inter", "fallback": "sans-serif", "weight": 400, "size": "16px" } },
            "spacing": { "section": "4rem" },
            "animations": {
                "fadeIn": true,
                "pop": "pop 200ms ease-out",
                "slow": { "duration": "600ms", "easing": "ease-in-out" },
                "colorPulse": {
                    "0%": { "backgroundColor": "$theme.colors.primary" },
                    "100%": { "opacity": 1 }
                }
            },
            "breakpoints": { "sm": "640px", "md": "48rem" },
            "shadows": { "soft": "0 1px 2px rgba(0,0,0,.1)" },
            "borderRadius": { "none": "0", "full": "9999px" }
        })))
        .unwrap();

        assert_eq!(theme.fonts["body"].weight.as_deref(), Some("400"));
        assert_eq!(theme.breakpoints["md"].length.to_px(), 768.0);
        assert!(matches!(theme.animations["fadeIn"], AnimationToken::Flag(true)));
        assert!(matches!(theme.animations["slow"], AnimationToken::Timing(_)));
        assert!(matches!(theme.animations["colorPulse"], AnimationToken::Keyframes(_)));
        assert_eq!(
            theme.colors.get("brand"),
            Some(&TokenNode::Group(TokenGroup::from([(
                "accent".to_string(),
                TokenNode::Value("tomato".to_string())
            )])))
        );
    }

    #[test]
    fn rejects_non_object_theme() {
        let errs = errors(json!(["colors"]));
        assert_eq!(errs.kinds(), [InvalidType]);
        assert_eq!(errs.errors()[0].path, "theme");
    }

    #[test]
    fn reports_unknown_category_with_path() {
        let errs = errors(json!({ "palette": { "primary": "#fff" } }));
        assert_eq!(errs.kinds(), [UnknownCategory]);
        assert_eq!(errs.errors()[0].path, "theme.palette");
    }

    #[test]
    fn collects_every_error_in_one_pass() {
        let errs = errors(json!({
            "colors": { "primary": "", "secondary": 12 },
            "fonts": { "body": { "size": "16px" } },
            "breakpoints": { "md": "768" },
            "animations": { "wiggle": [1, 2] }
        }));
        assert_eq!(
            errs.kinds(),
            [InvalidFormat, InvalidType, MissingField, InvalidFormat, InvalidAnimationShape]
        );
        let paths: Vec<_> = errs.errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "theme.colors.primary",
                "theme.colors.secondary",
                "theme.fonts.body.family",
                "theme.breakpoints.md",
                "theme.animations.wiggle"
            ]
        );
    }

    #[test]
    fn font_family_must_be_a_non_empty_string() {
        let errs = errors(json!({ "fonts": { "body": { "family": 3 }, "heading": { "family": " " } } }));
        assert_eq!(errs.kinds(), [InvalidType, InvalidFormat]);
    }

    #[test]
    fn unknown_font_field_is_invalid_format() {
        let errs = errors(json!({ "fonts": { "body": { "family": "Inter", "style": "italic" } } }));
        assert_eq!(errs.kinds(), [InvalidFormat]);
        assert_eq!(errs.errors()[0].path, "theme.fonts.body.style");
    }

    #[test]
    fn animation_shapes_outside_the_four_forms_are_rejected() {
        for shape in [json!(3), json!(null), json!({}), json!({ "duration": "1s", "0%": {} })] {
            let errs = errors(json!({ "animations": { "thing": shape } }));
            assert_eq!(errs.kinds(), [InvalidAnimationShape], "shape {shape}");
        }
    }

    #[test]
    fn animation_flag_requires_known_preset() {
        let errs = errors(json!({ "animations": { "wobble": true } }));
        assert_eq!(errs.kinds(), [InvalidFormat]);
        assert!(validate(Some(&json!({ "animations": { "wobble": false } }))).is_ok());
    }

    #[test]
    fn keyframe_step_must_be_a_style_map() {
        let errs = errors(json!({ "animations": { "blink": { "from": "opacity: 0" } } }));
        assert_eq!(errs.kinds(), [InvalidAnimationShape]);
        assert_eq!(errs.errors()[0].path, "theme.animations.blink.from");
    }

    #[test]
    fn step_selectors_accept_from_to_and_percentages() {
        assert!(is_step_selector("from"));
        assert!(is_step_selector("to"));
        assert!(is_step_selector("0%"));
        assert!(is_step_selector("37.5%"));
        assert!(is_step_selector("100%"));
        assert!(!is_step_selector("101%"));
        assert!(!is_step_selector("-1%"));
        assert!(!is_step_selector("%"));
        assert!(!is_step_selector("duration"));
    }

    #[test]
    fn breakpoint_units_ignore_case() {
        let theme = validate(Some(&json!({ "breakpoints": { "sm": "640PX", "md": "48Rem" } }))).unwrap();
        assert_eq!(theme.breakpoints["sm"].length.to_px(), 640.0);
        assert_eq!(theme.breakpoints["md"].length.to_px(), 768.0);
    }

    #[test]
    fn negative_breakpoint_is_rejected() {
        let errs = errors(json!({ "breakpoints": { "sm": "-1px" } }));
        assert_eq!(errs.kinds(), [InvalidFormat]);
    }

    #[test]
    fn token_names_must_be_css_safe() {
        let errs = errors(json!({ "spacing": { "a b": "1rem" } }));
        assert_eq!(errs.kinds(), [InvalidFormat]);
    }

    #[test]
    fn error_display_lists_every_path() {
        let errs = errors(json!({ "colors": { "a": 1 }, "extra": {} }));
        let rendered = errs.to_string();
        assert!(rendered.contains("2 error(s)"));
        assert!(rendered.contains("theme.colors.a"));
        assert!(rendered.contains("theme.extra"));
    }
}
