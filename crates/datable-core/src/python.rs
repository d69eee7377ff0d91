//! Python bindings (`_datable_core`), built with the `python` feature.

use indexmap::IndexMap;
use pyo3::prelude::*;

use crate::errors::DatableError;
use crate::models::{parse_param, ArchiveOptions, Filter, Selection, SortOrder};
use crate::render::archive::render_archive;
use crate::store::database::Database;

/// Read a request parameter that may be an int, a numeric string, or junk.
fn lenient_int<T: TryFrom<i64>>(value: Option<&Bound<'_, PyAny>>) -> Option<T> {
    let value = value?;
    if value.is_none() {
        return None;
    }
    let raw = match value.extract::<i64>() {
        Ok(v) => v.to_string(),
        Err(_) => value.extract::<String>().ok()?,
    };
    parse_param(&raw)
}

#[pyclass(name = "Database")]
pub struct PyDatabase {
    inner: Database,
}

#[pymethods]
impl PyDatabase {
    #[new]
    fn new(db_path: std::path::PathBuf) -> PyResult<Self> {
        Ok(Self {
            inner: Database::new(db_path)?,
        })
    }

    #[getter]
    fn db_path(&self) -> String {
        self.inner.db_path().to_string_lossy().into_owned()
    }

    /// Make `table` archive-capable. `conditions` is a JSON array of
    /// `{"column", "op", "value"}` objects.
    #[pyo3(signature = (table, on=None, order=None, conditions=None))]
    fn configure(
        &self,
        table: &str,
        on: Option<String>,
        order: Option<&str>,
        conditions: Option<&str>,
    ) -> PyResult<()> {
        let order = order.map(str::parse::<SortOrder>).transpose()?;
        let conditions = conditions
            .map(|raw| serde_json::from_str::<Filter>(raw).map_err(DatableError::from))
            .transpose()?;
        self.inner.configure(
            table,
            ArchiveOptions {
                on,
                order,
                conditions,
            },
        );
        Ok(())
    }

    fn is_archive_capable(&self, table: &str) -> bool {
        self.inner.is_archive_capable(table)
    }

    fn years(&self, table: &str) -> PyResult<Vec<i32>> {
        Ok(self.inner.years(table)?)
    }

    #[pyo3(signature = (table, year=None))]
    fn months_of_year(&self, table: &str, year: Option<i32>) -> PyResult<Vec<u32>> {
        Ok(self.inner.months_of_year(table, year)?)
    }

    fn collection(&self, table: &str) -> PyResult<IndexMap<i32, Vec<u32>>> {
        Ok(self.inner.collection(table)?)
    }
}

#[pyfunction]
#[pyo3(name = "render_archive", signature = (collection, year=None, month=None, base=""))]
fn py_render_archive(
    collection: IndexMap<i32, Vec<u32>>,
    year: Option<&Bound<'_, PyAny>>,
    month: Option<&Bound<'_, PyAny>>,
    base: &str,
) -> String {
    let selection = Selection::new(lenient_int(year), lenient_int(month));
    render_archive(&collection, &selection, base)
}

#[pymodule]
fn _datable_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDatabase>()?;
    m.add_function(wrap_pyfunction!(py_render_archive, m)?)?;
    m.add("DEFAULT_ATTRIBUTE", crate::models::DEFAULT_ATTRIBUTE)?;
    Ok(())
}
