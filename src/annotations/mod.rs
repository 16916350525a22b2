pub mod dto;
pub mod handlers;
pub mod model;
pub mod store;

use crate::state::AppState;
use axum::Router;

pub use model::{Annotation, AnnotationPatch, NewAnnotation};

/// Routes relative to the resource root; the app nests them under `/api/annotations`.
pub fn router() -> Router<AppState> {
    handlers::routes()
}
