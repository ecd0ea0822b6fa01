pub mod attrs;
pub mod check;

use std::path::Path;
use std::sync::Arc;

use provgate_core::AttributeCatalogue;

/// Catalogue from `path`, else the built-in one
pub(crate) fn load_catalogue(
    path: Option<&Path>,
) -> Result<Arc<AttributeCatalogue>, Box<dyn std::error::Error>> {
    let catalogue = match path {
        Some(p) => AttributeCatalogue::load(p)?,
        None => AttributeCatalogue::builtin()?,
    };
    Ok(Arc::new(catalogue))
}
