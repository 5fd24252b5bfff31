//! Numeric coercion of raw snapshot cells.
//!
//! Finviz renders numbers in several textual encodings: plain (`"11.61"`),
//! percentage (`"23.50%"`), magnitude-suffixed (`"3.20B"`), and the `"-"`
//! placeholder for missing data. Everything funnels through [`coerce`].

/// Outcome of coercing one raw cell.
///
/// Kept as a two-variant result rather than a bool-plus-cast so that the
/// dropped-attribute path is visible at every call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Numeric(f64),
    NonNumeric,
}

impl Coerced {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Coerced::Numeric(_))
    }
}

/// Coerce a raw cell to a float.
///
/// A direct parse is tried first; on failure the final character is stripped
/// and the parse retried, which covers `%` and magnitude suffixes. The suffix
/// is NOT applied as a multiplier: `"3.2B"` coerces to `3.2`, not `3.2e9`.
/// Cells failing both attempts (placeholders like `"-"`, ranges, dates) are
/// [`Coerced::NonNumeric`].
pub fn coerce(raw: &str) -> Coerced {
    if let Ok(value) = raw.parse::<f64>() {
        return Coerced::Numeric(value);
    }

    let mut chars = raw.chars();
    if chars.next_back().is_some() {
        if let Ok(value) = chars.as_str().parse::<f64>() {
            return Coerced::Numeric(value);
        }
    }

    Coerced::NonNumeric
}
