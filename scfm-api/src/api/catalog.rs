//! Static reference data for the submission form

use axum::Json;
use scfm_common::catalog::{catalog, Catalog};

/// GET /api/catalog
pub async fn get_catalog() -> Json<Catalog> {
    Json(catalog())
}
