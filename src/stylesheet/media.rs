use std::fmt::Write as _;

use crate::breakpoint::{mediate, Breakpoint, UnknownBreakpoint};
use crate::node::{Primitive, ResolvedComponentNode, ResolvedValue};
use crate::theme::kebab_case;
use crate::theme::length::format_px;

/// Emits one `@media (min-width: Npx)` block per breakpoint, smallest first,
/// scoping each override's `style` map to `selector`. Overrides without a
/// style map produce nothing.
pub fn responsive_rules(
    selector: &str,
    node: &ResolvedComponentNode,
    breakpoints: &[Breakpoint],
) -> Result<String, Vec<UnknownBreakpoint>> {
    let Some(overrides) = node.prop("responsive").and_then(ResolvedValue::as_style_map) else {
        return Ok(String::new());
    };
    let mediated = mediate(
        breakpoints,
        overrides.iter().map(|(name, value)| (name.as_str(), value)),
    )?;

    let mut css = String::new();
    for entry in mediated {
        let Some(style) = entry
            .value
            .as_style_map()
            .and_then(|props| props.get("style"))
            .and_then(ResolvedValue::as_style_map)
        else {
            continue;
        };
        let declarations: Vec<_> = style
            .iter()
            .filter_map(|(property, value)| css_text(value).map(|text| (kebab_case(property), text)))
            .collect();
        if declarations.is_empty() {
            continue;
        }

        if !css.is_empty() {
            css.push('\n');
        }
        let _ = writeln!(css, "@media (min-width: {}) {{", format_px(entry.min_width_px));
        let _ = writeln!(css, "  {selector} {{");
        for (property, value) in declarations {
            let _ = writeln!(css, "    {property}: {value};");
        }
        css.push_str("  }\n}\n");
    }
    Ok(css)
}

fn css_text(value: &ResolvedValue) -> Option<String> {
    match value {
        ResolvedValue::Primitive(Primitive::Text(text)) => Some(text.clone()),
        ResolvedValue::Primitive(Primitive::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}
