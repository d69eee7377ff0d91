//! Structured builder for the year/month grouping queries.
//!
//! Identifiers (table, datable attribute, filter columns) are validated and
//! quoted; every literal travels as a bound parameter.

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::types::ToSql;

use crate::errors::{DatableError, DatableResult};
use crate::models::{DatePart, Filter, FilterValue, SortOrder};

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Validate a SQL identifier and return it quoted.
///
/// Uses grave accents; SQLite reads an unknown double-quoted name as a
/// string literal.
pub fn quote_ident(ident: &str) -> DatableResult<String> {
    if IDENT_RE.is_match(ident) {
        Ok(format!("`{ident}`"))
    } else {
        Err(DatableError::Query(format!("invalid identifier: {ident:?}")))
    }
}

/// Integer expression extracting `part` from an already-quoted attribute.
fn extract_expr(attribute: &str, part: DatePart) -> String {
    format!(
        "CAST(strftime('{}', {attribute}) AS INTEGER)",
        part.strftime_format()
    )
}

/// A `SELECT <part> ... GROUP BY <part> ORDER BY <part>` query over one table.
#[derive(Clone, Debug)]
pub struct DatePartQuery<'a> {
    table: &'a str,
    attribute: &'a str,
    part: DatePart,
    order: SortOrder,
    filter: &'a Filter,
    year: Option<i32>,
}

impl<'a> DatePartQuery<'a> {
    pub fn new(
        table: &'a str,
        attribute: &'a str,
        part: DatePart,
        order: SortOrder,
        filter: &'a Filter,
    ) -> Self {
        Self {
            table,
            attribute,
            part,
            order,
            filter,
            year: None,
        }
    }

    /// Restrict to records whose extracted year equals `year`.
    pub fn in_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Render the SQL text and its positional parameters.
    ///
    /// The year restriction comes first, followed by the filter conditions,
    /// all joined with `AND`. The filter itself is only read.
    pub fn build(&self) -> DatableResult<(String, Vec<Box<dyn ToSql + 'a>>)> {
        let table = quote_ident(self.table)?;
        let attribute = quote_ident(self.attribute)?;
        let alias = self.part.alias();

        let mut clauses: Vec<String> = vec![format!("{attribute} IS NOT NULL")];
        let mut params: Vec<Box<dyn ToSql + 'a>> = Vec::new();
        let mut param_idx = 1;

        let part_expr = extract_expr(&attribute, self.part);
        clauses.push(format!("{part_expr} IS NOT NULL"));

        if let Some(year) = self.year {
            clauses.push(format!(
                "{} = ?{param_idx}",
                extract_expr(&attribute, DatePart::Year)
            ));
            params.push(Box::new(year));
            param_idx += 1;
        }

        let filter: &'a Filter = self.filter;
        for cond in filter.conditions() {
            let column = quote_ident(&cond.column)?;
            if cond.op.takes_value() {
                if cond.value == FilterValue::Null {
                    return Err(DatableError::Query(format!(
                        "condition on {:?} compares with NULL using {}",
                        cond.column,
                        cond.op.as_sql()
                    )));
                }
                clauses.push(format!("{column} {} ?{param_idx}", cond.op.as_sql()));
                params.push(Box::new(&cond.value));
                param_idx += 1;
            } else {
                clauses.push(format!("{column} {}", cond.op.as_sql()));
            }
        }

        let sql = format!(
            "SELECT {part_expr} AS {alias} FROM {table} WHERE {} \
             GROUP BY {alias} ORDER BY {alias} {};",
            clauses.join(" AND "),
            self.order.as_sql()
        );
        Ok((sql, params))
    }
}
