//! In-memory annotation store.
//!
//! Not durable: everything is lost on restart. Used when no database is
//! configured and by the test suite. Records are kept in insertion order;
//! writes take the lock exclusively, reads share it.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AnnotationStore, StoreError, StoreResult};
use crate::annotations::model::{now_utc, Annotation, AnnotationPatch, NewAnnotation};

#[derive(Debug, Default)]
pub struct MemoryAnnotationStore {
    records: RwLock<Vec<Annotation>>,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnnotationStore for MemoryAnnotationStore {
    async fn create(&self, owner_id: Uuid, new: NewAnnotation) -> StoreResult<Annotation> {
        new.validate()?;
        let annotation = new.into_annotation(owner_id, now_utc());
        self.records.write().await.push(annotation.clone());
        Ok(annotation)
    }

    async fn find(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Annotation> {
        self.records
            .read()
            .await
            .iter()
            .find(|a| a.id == id && a.owner_id == owner_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, owner_id: Uuid) -> StoreResult<Vec<Annotation>> {
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut owned: Vec<Annotation> = self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: AnnotationPatch,
    ) -> StoreResult<Annotation> {
        patch.validate()?;
        let mut records = self.records.write().await;
        let annotation = records
            .iter_mut()
            .find(|a| a.id == id && a.owner_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        patch.apply(annotation, now_utc());
        Ok(annotation.clone())
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|a| a.id == id && a.owner_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        records.remove(index);
        Ok(())
    }
}
