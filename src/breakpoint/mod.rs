use indexmap::IndexMap;
use thiserror::Error;

use crate::theme::BreakpointToken;

#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    pub name: String,
    pub min_width_px: f64,
    /// Position in the theme's `breakpoints` map; breaks ties between equal widths.
    pub declared_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown breakpoint `{name}`")]
pub struct UnknownBreakpoint {
    pub name: String,
}

/// One override placed at its breakpoint's min-width.
#[derive(Debug, Clone, PartialEq)]
pub struct MediatedOverride<V> {
    pub breakpoint: String,
    pub min_width_px: f64,
    pub value: V,
}

/// Ascending by pixel width; equal widths keep declaration order.
pub fn sort_breakpoints(tokens: &IndexMap<String, BreakpointToken>) -> Vec<Breakpoint> {
    let mut breakpoints: Vec<_> = tokens
        .iter()
        .enumerate()
        .map(|(declared_index, (name, token))| Breakpoint {
            name: name.clone(),
            min_width_px: token.length.to_px(),
            declared_index,
        })
        .collect();
    breakpoints.sort_by(|a, b| {
        a.min_width_px
            .total_cmp(&b.min_width_px)
            .then(a.declared_index.cmp(&b.declared_index))
    });
    breakpoints
}

/// Orders per-breakpoint overrides smallest viewport first.
///
/// `breakpoints` must come from [`sort_breakpoints`]. Every unknown name is
/// reported; nothing is returned unless all names are known.
pub fn mediate<'a, V>(
    breakpoints: &[Breakpoint],
    overrides: impl IntoIterator<Item = (&'a str, V)>,
) -> Result<Vec<MediatedOverride<V>>, Vec<UnknownBreakpoint>> {
    let mut placed = Vec::new();
    let mut unknown = Vec::new();
    for (name, value) in overrides {
        match breakpoints.iter().position(|bp| bp.name == name) {
            Some(rank) => placed.push((rank, value)),
            None => unknown.push(UnknownBreakpoint { name: name.to_string() }),
        }
    }
    if !unknown.is_empty() {
        return Err(unknown);
    }

    placed.sort_by_key(|(rank, _)| *rank);
    Ok(placed
        .into_iter()
        .map(|(rank, value)| {
            let breakpoint = &breakpoints[rank];
            MediatedOverride {
                breakpoint: breakpoint.name.clone(),
                min_width_px: breakpoint.min_width_px,
                value,
            }
        })
        .collect())
}

/// Overrides that apply at `viewport_px`, in application order (later wins).
pub fn applicable<V>(
    mediated: &[MediatedOverride<V>],
    viewport_px: f64,
) -> impl Iterator<Item = &MediatedOverride<V>> {
    mediated
        .iter()
        .filter(move |entry| entry.min_width_px <= viewport_px)
}
