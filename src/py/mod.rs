use pyo3::prelude::*;

mod plan;
mod reproject;

/// Register all Python-visible functions.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(reproject::reproject_chunked, m)?)?;
    m.add_function(wrap_pyfunction!(plan::plan_reproject, m)?)?;
    Ok(())
}
