//! Year/month aggregation over an archive-capable table.

use chrono::Datelike;
use rusqlite::types::ToSql;
use rusqlite::Connection;
use tracing::debug;

use crate::errors::{DatableError, DatableResult};
use crate::models::{ArchiveCollection, ArchiveConfig, DatePart};
use crate::query::builder::DatePartQuery;

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn run_part_query(conn: &Connection, query: &DatePartQuery<'_>) -> DatableResult<Vec<i64>> {
    let (sql, params) = query.build()?;
    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let values = stmt
        .query_map(param_refs.as_slice(), |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}

/// Distinct years of the datable attribute, ordered per the configuration.
pub fn years_impl(conn: &Connection, table: &str, config: &ArchiveConfig) -> DatableResult<Vec<i32>> {
    let query = DatePartQuery::new(
        table,
        &config.attribute,
        DatePart::Year,
        config.sort_order,
        &config.filter,
    );
    let years = run_part_query(conn, &query)?
        .into_iter()
        .map(|v| {
            i32::try_from(v)
                .map_err(|_| DatableError::Database(format!("year {v} out of range in {table}")))
        })
        .collect::<DatableResult<Vec<_>>>()?;
    debug!(table, attribute = %config.attribute, count = years.len(), "archive years");
    Ok(years)
}

/// Distinct months of `year` (current year when `None`), ordered per the
/// configuration. The year restriction is ANDed with the configured filter.
pub fn months_of_year_impl(
    conn: &Connection,
    table: &str,
    config: &ArchiveConfig,
    year: Option<i32>,
) -> DatableResult<Vec<u32>> {
    let year = year.unwrap_or_else(current_year);
    let query = DatePartQuery::new(
        table,
        &config.attribute,
        DatePart::Month,
        config.sort_order,
        &config.filter,
    )
    .in_year(year);
    let months = run_part_query(conn, &query)?
        .into_iter()
        .map(|v| match u32::try_from(v) {
            Ok(m @ 1..=12) => Ok(m),
            _ => Err(DatableError::Database(format!(
                "month {v} out of range in {table}"
            ))),
        })
        .collect::<DatableResult<Vec<_>>>()?;
    debug!(table, year, count = months.len(), "archive months");
    Ok(months)
}

/// Year -> months mapping in year order. One query for the years plus one
/// per year.
pub fn collection_impl(
    conn: &Connection,
    table: &str,
    config: &ArchiveConfig,
) -> DatableResult<ArchiveCollection> {
    let mut collection = ArchiveCollection::new();
    for year in years_impl(conn, table, config)? {
        let months = months_of_year_impl(conn, table, config, Some(year))?;
        collection.insert(year, months);
    }
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArchiveOptions, Filter, SortOrder};

    fn setup_posts(dates: &[(&str, &str)]) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'published',
                created_at TEXT,
                published_at TEXT
            );",
        )
        .unwrap();
        for (created_at, status) in dates {
            conn.execute(
                "INSERT INTO posts(title, status, created_at) VALUES ('post', ?1, ?2);",
                rusqlite::params![status, created_at],
            )
            .unwrap();
        }
        conn
    }

    fn sample_posts() -> Connection {
        setup_posts(&[
            ("2009-01-15 10:00:00", "published"),
            ("2009-03-02 08:30:00", "published"),
            ("2010-07-01 12:00:00", "published"),
        ])
    }

    fn default_config() -> ArchiveConfig {
        ArchiveOptions::new().resolve()
    }

    #[test]
    fn years_and_months_descending() {
        let conn = sample_posts();
        let config = default_config();
        assert_eq!(years_impl(&conn, "posts", &config).unwrap(), vec![2010, 2009]);
        assert_eq!(
            months_of_year_impl(&conn, "posts", &config, Some(2009)).unwrap(),
            vec![3, 1]
        );
        let collection = collection_impl(&conn, "posts", &config).unwrap();
        let pairs: Vec<(i32, Vec<u32>)> = collection.into_iter().collect();
        assert_eq!(pairs, vec![(2010, vec![7]), (2009, vec![3, 1])]);
    }

    #[test]
    fn ascending_order() {
        let conn = sample_posts();
        let config = ArchiveOptions::new().order(SortOrder::Asc).resolve();
        assert_eq!(years_impl(&conn, "posts", &config).unwrap(), vec![2009, 2010]);
        assert_eq!(
            months_of_year_impl(&conn, "posts", &config, Some(2009)).unwrap(),
            vec![1, 3]
        );
    }

    #[test]
    fn duplicates_collapse_and_months_stay_in_range() {
        let conn = setup_posts(&[
            ("2011-12-31T23:59:59", "published"),
            ("2011-12-01", "published"),
            ("2011-02-10", "published"),
            ("2011-02-11", "published"),
            ("2012-06-06", "published"),
        ]);
        let config = default_config();
        let years = years_impl(&conn, "posts", &config).unwrap();
        assert_eq!(years, vec![2012, 2011]);
        for year in years {
            let months = months_of_year_impl(&conn, "posts", &config, Some(year)).unwrap();
            assert!(months.iter().all(|m| (1..=12).contains(m)));
            assert!(SortOrder::Desc.is_sorted(&months));
            let mut deduped = months.clone();
            deduped.dedup();
            assert_eq!(deduped, months);
        }
    }

    #[test]
    fn empty_table_yields_empty_results() {
        let conn = setup_posts(&[]);
        let config = default_config();
        assert!(years_impl(&conn, "posts", &config).unwrap().is_empty());
        assert!(months_of_year_impl(&conn, "posts", &config, Some(2009))
            .unwrap()
            .is_empty());
        assert!(collection_impl(&conn, "posts", &config).unwrap().is_empty());
    }

    #[test]
    fn null_and_unparseable_dates_are_skipped() {
        let conn = sample_posts();
        conn.execute(
            "INSERT INTO posts(title, created_at) VALUES ('draft', NULL), ('junk', 'not a date');",
            [],
        )
        .unwrap();
        let config = default_config();
        assert_eq!(years_impl(&conn, "posts", &config).unwrap(), vec![2010, 2009]);
    }

    #[test]
    fn filter_restricts_years_and_months() {
        let conn = setup_posts(&[
            ("2009-01-15", "published"),
            ("2009-03-02", "draft"),
            ("2010-07-01", "draft"),
        ]);
        let config = ArchiveOptions::new()
            .order(SortOrder::Desc)
            .conditions(Filter::new().and_eq("status", "published"))
            .resolve();
        assert_eq!(years_impl(&conn, "posts", &config).unwrap(), vec![2009]);
        // Repeated calls compose the same condition every time.
        for _ in 0..3 {
            assert_eq!(
                months_of_year_impl(&conn, "posts", &config, Some(2009)).unwrap(),
                vec![1]
            );
        }
        let pairs: Vec<(i32, Vec<u32>)> =
            collection_impl(&conn, "posts", &config).unwrap().into_iter().collect();
        assert_eq!(pairs, vec![(2009, vec![1])]);
    }

    #[test]
    fn custom_attribute() {
        let conn = sample_posts();
        conn.execute(
            "UPDATE posts SET published_at = '2015-05-05' WHERE created_at LIKE '2010%';",
            [],
        )
        .unwrap();
        let config = ArchiveOptions::new()
            .on("published_at")
            .order(SortOrder::Desc)
            .resolve();
        assert_eq!(years_impl(&conn, "posts", &config).unwrap(), vec![2015]);
        assert_eq!(
            months_of_year_impl(&conn, "posts", &config, Some(2015)).unwrap(),
            vec![5]
        );
    }

    #[test]
    fn months_default_to_current_year() {
        let conn = setup_posts(&[]);
        let this_year = current_year();
        conn.execute(
            "INSERT INTO posts(title, created_at) VALUES ('now', ?1);",
            rusqlite::params![format!("{this_year}-04-01")],
        )
        .unwrap();
        let config = default_config();
        assert_eq!(
            months_of_year_impl(&conn, "posts", &config, None).unwrap(),
            vec![4]
        );
    }

    #[test]
    fn unknown_attribute_propagates_sqlite_error() {
        let conn = sample_posts();
        let config = ArchiveOptions::new().on("no_such_column").resolve();
        let err = years_impl(&conn, "posts", &config).unwrap_err();
        assert!(matches!(err, DatableError::Sqlite(_)), "got {err:?}");
    }

    #[test]
    fn malformed_attribute_is_a_query_error() {
        let conn = sample_posts();
        let config = ArchiveOptions::new().on("created_at) --").resolve();
        let err = collection_impl(&conn, "posts", &config).unwrap_err();
        assert!(matches!(err, DatableError::Query(_)), "got {err:?}");
    }
}
