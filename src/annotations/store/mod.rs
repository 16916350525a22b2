//! Owner-scoped persistence for annotations.
//!
//! Every operation takes the caller's id and filters on it, so a record owned
//! by someone else behaves exactly like a record that does not exist.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::model::{Annotation, AnnotationPatch, NewAnnotation, ValidationErrors};

pub mod memory;
pub mod postgres;


pub use memory::MemoryAnnotationStore;
pub use postgres::PgAnnotationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("annotation not found")]
    NotFound,
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn create(&self, owner_id: Uuid, new: NewAnnotation) -> StoreResult<Annotation>;
    async fn find(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Annotation>;
    /// Newest first.
    async fn list(&self, owner_id: Uuid) -> StoreResult<Vec<Annotation>>;
    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: AnnotationPatch,
    ) -> StoreResult<Annotation>;
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> StoreResult<()>;
}
