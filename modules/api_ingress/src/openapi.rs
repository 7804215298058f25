use std::sync::Arc;

use modkit::{Problem, RestfulModule};
use utoipa::OpenApi;

use crate::web::{self, HealthDto};

#[derive(OpenApi)]
#[openapi(
    info(title = "TaskBoard API", description = "Personal task tracker"),
    paths(web::health_check),
    components(schemas(HealthDto, Problem)),
    tags((name = "system", description = "Probes and metadata"))
)]
struct IngressApiDoc;

/// One document for the whole server: the ingress' own routes plus every module's fragment.
pub fn build_openapi(modules: &[Arc<dyn RestfulModule>]) -> utoipa::openapi::OpenApi {
    let mut doc = IngressApiDoc::openapi();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    for module in modules {
        tracing::debug!(module = module.name(), "merging OpenAPI fragment");
        doc.merge(module.openapi());
    }
    doc
}
