//! `?ordering=` parameter parsing.
//!
//! The parameter is a comma-separated list of field names, each optionally
//! prefixed with `-` for descending order. Unknown fields are ignored; when
//! nothing usable remains the caller's default ordering applies. Columns are
//! resolved through [`OrderField`] so user input never reaches SQL directly.

/// Sort direction for one ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A whitelisted sortable field.
pub trait OrderField: Copy + PartialEq {
    /// Resolve a public parameter name to a field, or `None` if not sortable.
    fn from_param(name: &str) -> Option<Self>;

    /// The SQL column expression this field sorts by.
    fn column(self) -> &'static str;
}

/// One parsed ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm<F> {
    pub field: F,
    pub direction: Direction,
}

/// Parse a raw `?ordering=` value into whitelisted terms.
///
/// Duplicate fields keep their first occurrence.
pub fn parse_ordering<F: OrderField>(raw: Option<&str>) -> Vec<OrderTerm<F>> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut terms: Vec<OrderTerm<F>> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, direction) = match part.strip_prefix('-') {
            Some(rest) => (rest, Direction::Desc),
            None => (part, Direction::Asc),
        };
        let Some(field) = F::from_param(name) else {
            continue;
        };
        if terms.iter().any(|t| t.field == field) {
            continue;
        }
        terms.push(OrderTerm { field, direction });
    }
    terms
}

/// Render an `ORDER BY` body (without the keyword).
///
/// Falls back to `default` when `terms` is empty. `tiebreak` (typically
/// `"id DESC"`) is always appended so pagination is deterministic.
pub fn order_clause<F: OrderField>(
    terms: &[OrderTerm<F>],
    default: &[OrderTerm<F>],
    tiebreak: &str,
) -> String {
    let chosen = if terms.is_empty() { default } else { terms };
    let mut parts: Vec<String> = chosen
        .iter()
        .map(|t| format!("{} {}", t.field.column(), t.direction.as_sql()))
        .collect();
    parts.push(tiebreak.to_string());
    parts.join(", ")
}
