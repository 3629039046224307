//! Search filter encoding.
//!
//! # Grammar
//! A filter list travels as one query parameter. Each filter renders as
//! `<field><symbol><value>[,<value>...]` and filters are joined with `;`.
//! Before assembly the field and every value are percent-encoded on their
//! own, leaving only ASCII alphanumerics and `-_.` raw. `~` is unreserved in
//! URLs but is the range symbol here, so it is escaped as well. The
//! structural characters `; , : ! < > = ~ @` therefore only ever appear as
//! structure. The assembled string is then percent-encoded once more for
//! the URL.
//!
//! Numbers must be finite; integers are sent exactly.
//!
//! Decoding reverses this: URL-decode once, split on `;`, read the operator
//! at the first structural character, split the operands on `,`, and decode
//! each component.
//!
//! | operator | symbol | operands |
//! |----------|--------|----------|
//! | `Eq`     | `:`    | 1        |
//! | `Ne`     | `!:`   | 1        |
//! | `Gt`     | `>`    | 1        |
//! | `Gte`    | `>=`   | 1        |
//! | `Lt`     | `<`    | 1        |
//! | `Lte`    | `<=`   | 1        |
//! | `Range`  | `~`    | 2        |
//! | `In`     | `@`    | 1 or more|
//! | `NotIn`  | `!@`   | 1 or more|

use std::fmt;

use thiserror::Error;

pub const FILTER_DELIMITER: char = ';';
pub const VALUE_DELIMITER: char = ',';

const OPERATOR_CHARS: &[char] = &[':', '!', '<', '>', '=', '~', '@'];

/// Comparison operators understood by the search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Range,
    In,
    NotIn,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 9] = [
        FilterOperator::Eq,
        FilterOperator::Ne,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Range,
        FilterOperator::In,
        FilterOperator::NotIn,
    ];

    /// Wire symbol for this operator.
    pub fn symbol(self) -> &'static str {
        match self {
            FilterOperator::Eq => ":",
            FilterOperator::Ne => "!:",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::Range => "~",
            FilterOperator::In => "@",
            FilterOperator::NotIn => "!@",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    fn arity(self) -> Arity {
        match self {
            FilterOperator::Range => Arity::Exactly(2),
            FilterOperator::In | FilterOperator::NotIn => Arity::AtLeastOne,
            _ => Arity::Exactly(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeastOne,
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeastOne => count >= 1,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {n}"),
            Arity::AtLeastOne => f.write_str("at least 1"),
        }
    }
}

/// Errors from building or parsing filters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter segment `{0}` has no operator")]
    MissingOperator(String),

    #[error("unknown filter operator `{0}`")]
    UnknownOperator(String),

    #[error("operator {operator:?} takes {expected} value(s), got {found}")]
    Arity {
        operator: FilterOperator,
        expected: Arity,
        found: usize,
    },

    #[error("invalid percent-encoding in `{0}`")]
    Decode(String),

    #[error("filter on `{0}` has a non-finite number")]
    NonFinite(String),
}

/// A single operand.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl FilterValue {
    fn is_finite(&self) -> bool {
        match self {
            FilterValue::Number(n) => n.is_finite(),
            FilterValue::Text(_) | FilterValue::Integer(_) => true,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Integer(n) => write!(f, "{n}"),
            FilterValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(i64::from(value))
    }
}

/// One search constraint. Fields are private so a filter cannot change after
/// its operands have been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    field: String,
    operator: FilterOperator,
    values: Vec<FilterValue>,
}

impl Filter {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        values: Vec<FilterValue>,
    ) -> Result<Self, FilterError> {
        let field = field.into();
        check_arity(operator, values.len())?;
        if !values.iter().all(FilterValue::is_finite) {
            return Err(FilterError::NonFinite(field));
        }
        Ok(Self {
            field,
            operator,
            values,
        })
    }

    pub fn eq(
        field: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Result<Self, FilterError> {
        Self::new(field, FilterOperator::Eq, vec![value.into()])
    }

    pub fn ne(
        field: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Result<Self, FilterError> {
        Self::new(field, FilterOperator::Ne, vec![value.into()])
    }

    pub fn gt(
        field: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Result<Self, FilterError> {
        Self::new(field, FilterOperator::Gt, vec![value.into()])
    }

    pub fn gte(
        field: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Result<Self, FilterError> {
        Self::new(field, FilterOperator::Gte, vec![value.into()])
    }

    pub fn lt(
        field: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Result<Self, FilterError> {
        Self::new(field, FilterOperator::Lt, vec![value.into()])
    }

    pub fn lte(
        field: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Result<Self, FilterError> {
        Self::new(field, FilterOperator::Lte, vec![value.into()])
    }

    /// Inclusive range `low..=high`.
    pub fn range(
        field: impl Into<String>,
        low: impl Into<FilterValue>,
        high: impl Into<FilterValue>,
    ) -> Result<Self, FilterError> {
        Self::new(field, FilterOperator::Range, vec![low.into(), high.into()])
    }

    /// Field value must be one of `values`. Fails on an empty set.
    pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::new(
            field,
            FilterOperator::In,
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// Field value must not be any of `values`. Fails on an empty set.
    pub fn none_of<I, V>(field: impl Into<String>, values: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::new(
            field,
            FilterOperator::NotIn,
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn values(&self) -> &[FilterValue] {
        &self.values
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&encode_component(&self.field));
        out.push_str(self.operator.symbol());
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push(VALUE_DELIMITER);
            }
            out.push_str(&encode_component(&value.to_string()));
        }
    }
}

/// A filter as the backend sees it after decoding: operands are plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFilter {
    pub field: String,
    pub operator: FilterOperator,
    pub values: Vec<String>,
}

impl From<&Filter> for DecodedFilter {
    fn from(filter: &Filter) -> Self {
        Self {
            field: filter.field.clone(),
            operator: filter.operator,
            values: filter.values.iter().map(ToString::to_string).collect(),
        }
    }
}

fn check_arity(operator: FilterOperator, found: usize) -> Result<(), FilterError> {
    let expected = operator.arity();
    if expected.accepts(found) {
        Ok(())
    } else {
        Err(FilterError::Arity {
            operator,
            expected,
            found,
        })
    }
}

/// Render filters in their structural form, before URL encoding.
pub fn encode_filters(filters: &[Filter]) -> String {
    let mut out = String::new();
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            out.push(FILTER_DELIMITER);
        }
        filter.write_to(&mut out);
    }
    out
}

/// Encode filters as a URL-safe query value. An empty list yields `""`.
pub fn filters_to_query_string(filters: &[Filter]) -> String {
    if filters.is_empty() {
        return String::new();
    }
    urlencoding::encode(&encode_filters(filters)).into_owned()
}

/// Decode a value produced by [`filters_to_query_string`].
pub fn parse_query_string(encoded: &str) -> Result<Vec<DecodedFilter>, FilterError> {
    let raw = urlencoding::decode(encoded).map_err(|_| FilterError::Decode(encoded.to_string()))?;
    parse_filters(&raw)
}

/// Parse the structural form, i.e. a `filters` value after the query string
/// itself has been decoded.
pub fn parse_filters(raw: &str) -> Result<Vec<DecodedFilter>, FilterError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(FILTER_DELIMITER).map(parse_segment).collect()
}

fn parse_segment(segment: &str) -> Result<DecodedFilter, FilterError> {
    let start = segment
        .find(OPERATOR_CHARS)
        .ok_or_else(|| FilterError::MissingOperator(segment.to_string()))?;
    let (field, rest) = segment.split_at(start);
    let end = rest
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(rest.len());
    let (symbol, operands) = rest.split_at(end);

    let operator = FilterOperator::from_symbol(symbol)
        .ok_or_else(|| FilterError::UnknownOperator(symbol.to_string()))?;
    let values = operands
        .split(VALUE_DELIMITER)
        .map(decode_component)
        .collect::<Result<Vec<_>, _>>()?;
    check_arity(operator, values.len())?;

    Ok(DecodedFilter {
        field: decode_component(field)?,
        operator,
        values,
    })
}

fn encode_component(component: &str) -> String {
    urlencoding::encode(component).replace('~', "%7E")
}

fn decode_component(component: &str) -> Result<String, FilterError> {
    urlencoding::decode(component)
        .map(|s| s.into_owned())
        .map_err(|_| FilterError::Decode(component.to_string()))
}
