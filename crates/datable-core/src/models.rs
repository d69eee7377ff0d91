//! Shared typed models used across configuration, query and rendering layers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{DatableError, DatableResult};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Attribute grouped on when options do not name one.
pub const DEFAULT_ATTRIBUTE: &str = "created_at";

/// Ordered mapping of year to the months of that year that have records.
pub type ArchiveCollection = IndexMap<i32, Vec<u32>>;

// ---------------------------------------------------------------------------
// 1. SortOrder
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Whether `values` respects this order (ties allowed).
    pub fn is_sorted<T: PartialOrd>(self, values: &[T]) -> bool {
        values.windows(2).all(|w| match self {
            SortOrder::Asc => w[0] <= w[1],
            SortOrder::Desc => w[0] >= w[1],
        })
    }
}

impl FromStr for SortOrder {
    type Err = DatableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            other => Err(DatableError::Config(format!(
                "unknown sort order {other:?}, expected ASC or DESC"
            ))),
        }
    }
}

impl TryFrom<String> for SortOrder {
    type Error = DatableError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortOrder> for String {
    fn from(value: SortOrder) -> Self {
        value.as_sql().to_string()
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

// ---------------------------------------------------------------------------
// 2. DatePart
// ---------------------------------------------------------------------------

/// Calendar component extracted from the datable attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
}

impl DatePart {
    /// `strftime` format producing this component.
    pub fn strftime_format(self) -> &'static str {
        match self {
            DatePart::Year => "%Y",
            DatePart::Month => "%m",
        }
    }

    /// Column alias used for the extracted value.
    pub fn alias(self) -> &'static str {
        match self {
            DatePart::Year => "year",
            DatePart::Month => "month",
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Filter
// ---------------------------------------------------------------------------

/// Comparison operator of a single filter condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::IsNull => "IS NULL",
            CompareOp::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator compares against a bound value.
    pub fn takes_value(self) -> bool {
        !matches!(self, CompareOp::IsNull | CompareOp::IsNotNull)
    }
}

/// Literal compared against a column. Always bound, never interpolated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl rusqlite::types::ToSql for FilterValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value, ValueRef};

        Ok(match self {
            FilterValue::Null => ToSqlOutput::Owned(Value::Null),
            FilterValue::Bool(v) => ToSqlOutput::Owned(Value::Integer(*v as i64)),
            FilterValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            FilterValue::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            FilterValue::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Real(value)
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

/// One `column op value` clause.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    #[serde(default)]
    pub value: FilterValue,
}

/// Conjunction of conditions. The empty filter matches every record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new filter with `column op value` appended.
    pub fn and(mut self, column: &str, op: CompareOp, value: impl Into<FilterValue>) -> Self {
        self.conditions.push(Condition {
            column: column.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn and_eq(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.and(column, CompareOp::Eq, value)
    }

    pub fn and_null(self, column: &str) -> Self {
        self.and(column, CompareOp::IsNull, FilterValue::Null)
    }

    pub fn and_not_null(self, column: &str) -> Self {
        self.and(column, CompareOp::IsNotNull, FilterValue::Null)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// 4. ArchiveOptions / ArchiveConfig
// ---------------------------------------------------------------------------

/// Caller-supplied options for making a record type archive-capable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveOptions {
    /// Datable attribute, `created_at` when unset.
    pub on: Option<String>,
    /// Sort order for years and months, `DESC` when unset.
    pub order: Option<SortOrder>,
    /// Restricts which records contribute to the archive.
    pub conditions: Option<Filter>,
}

impl ArchiveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, attribute: &str) -> Self {
        self.on = Some(attribute.to_string());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn conditions(mut self, filter: Filter) -> Self {
        self.conditions = Some(filter);
        self
    }

    /// Parse options from a JSON object such as
    /// `{"on": "published_at", "order": "ASC", "conditions": [...]}`.
    pub fn from_json_str(raw: &str) -> DatableResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Fill in defaults and freeze into a shareable configuration.
    pub fn resolve(self) -> ArchiveConfig {
        ArchiveConfig {
            attribute: self.on.unwrap_or_else(|| DEFAULT_ATTRIBUTE.to_string()),
            sort_order: self.order.unwrap_or_default(),
            filter: self.conditions.unwrap_or_default(),
        }
    }
}

/// Resolved per-type archive configuration. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArchiveConfig {
    pub attribute: String,
    pub sort_order: SortOrder,
    pub filter: Filter,
}

pub type SharedConfig = Arc<ArchiveConfig>;

// ---------------------------------------------------------------------------
// 5. Selection / ArchiveTarget
// ---------------------------------------------------------------------------

/// Year/month the current request is browsing. Used only for highlighting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl Selection {
    pub fn new(year: Option<i32>, month: Option<u32>) -> Self {
        Self { year, month }
    }

    pub fn year(year: i32) -> Self {
        Self::new(Some(year), None)
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self::new(Some(year), Some(month))
    }

    /// Build a selection from raw request parameters. Missing, blank or
    /// non-numeric values become `None`.
    pub fn from_params(year: Option<&str>, month: Option<&str>) -> Self {
        Self {
            year: year.and_then(parse_param),
            month: month.and_then(parse_param),
        }
    }

    pub fn is_year_current(&self, year: i32) -> bool {
        self.year == Some(year) && self.month.is_none()
    }

    pub fn is_month_current(&self, year: i32, month: u32) -> bool {
        self.year == Some(year) && self.month == Some(month)
    }
}

/// Parse one request parameter. Blank, non-numeric or out-of-range values
/// become `None`.
pub fn parse_param<T: TryFrom<i64>>(raw: &str) -> Option<T> {
    let value: i64 = raw.trim().parse().ok()?;
    T::try_from(value).ok()
}

/// Navigation target carried by an archive link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveTarget {
    pub year: i32,
    pub month: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!(" DESC ".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn sort_order_checks_sequences() {
        assert!(SortOrder::Asc.is_sorted(&[2009, 2009, 2010]));
        assert!(!SortOrder::Asc.is_sorted(&[2010, 2009]));
        assert!(SortOrder::Desc.is_sorted(&[12, 3, 1]));
        assert!(SortOrder::Desc.is_sorted::<u32>(&[]));
    }

    #[test]
    fn options_resolve_to_defaults() {
        let config = ArchiveOptions::new().resolve();
        assert_eq!(config.attribute, "created_at");
        assert_eq!(config.sort_order, SortOrder::Desc);
        assert!(config.filter.is_empty());
    }

    #[test]
    fn options_from_json() {
        let raw = r#"{
            "on": "published_at",
            "order": "asc",
            "conditions": [
                {"column": "status", "op": "=", "value": "published"},
                {"column": "deleted_at", "op": "IS NULL"}
            ]
        }"#;
        let options = ArchiveOptions::from_json_str(raw).unwrap();
        assert_eq!(options.on.as_deref(), Some("published_at"));
        assert_eq!(options.order, Some(SortOrder::Asc));
        let filter = options.conditions.unwrap();
        assert_eq!(filter.conditions().len(), 2);
        assert_eq!(filter.conditions()[0].value, FilterValue::Text("published".into()));
        assert_eq!(filter.conditions()[1].op, CompareOp::IsNull);
        assert_eq!(filter.conditions()[1].value, FilterValue::Null);
    }

    #[test]
    fn options_from_json_rejects_bad_order() {
        let err = ArchiveOptions::from_json_str(r#"{"order": "up"}"#).unwrap_err();
        assert!(matches!(err, DatableError::Json(_)));
    }

    #[test]
    fn selection_from_params_is_lenient() {
        assert_eq!(
            Selection::from_params(Some("2009"), Some("3")),
            Selection::month(2009, 3)
        );
        assert_eq!(
            Selection::from_params(Some("abc"), Some("")),
            Selection::default()
        );
        assert_eq!(Selection::from_params(Some(" 2010 "), None), Selection::year(2010));
    }

    #[test]
    fn parse_param_rejects_malformed_values() {
        assert_eq!(parse_param::<i32>("2009"), Some(2009));
        assert_eq!(parse_param::<u32>(" 3 "), Some(3));
        assert_eq!(parse_param::<i32>(""), None);
        assert_eq!(parse_param::<i32>("20x9"), None);
        assert_eq!(parse_param::<i32>("3.5"), None);
        assert_eq!(parse_param::<u32>("-1"), None);
        assert_eq!(parse_param::<i32>("99999999999"), None);
    }

    #[test]
    fn malformed_params_select_nothing() {
        let selection = Selection::from_params(Some("nineteen"), Some("-4"));
        assert_eq!(selection, Selection::default());
        assert!(!selection.is_year_current(2009));
        assert!(!selection.is_month_current(2009, 3));
    }

    #[test]
    fn selection_current_markers() {
        let year_only = Selection::year(2010);
        assert!(year_only.is_year_current(2010));
        assert!(!year_only.is_year_current(2009));
        assert!(!year_only.is_month_current(2010, 7));

        let month = Selection::month(2009, 3);
        assert!(!month.is_year_current(2009));
        assert!(month.is_month_current(2009, 3));
        assert!(!month.is_month_current(2010, 3));
    }
}
