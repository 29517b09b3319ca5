//! In-process record store.
//!
//! Experiments live in a `BTreeMap` keyed by number and each experiment's
//! images in a map keyed by id, mirroring the hash-per-experiment layout of
//! a key-value engine. Every operation runs under one lock acquisition, so
//! multi-step writes (insert image + recount) are atomic.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use labfolio_core::error::CoreError;
use labfolio_core::experiment::{default_experiment_name, next_experiment_number};
use labfolio_core::image_update::ImageUpdate;
use labfolio_core::types::{ExperimentNumber, ImageId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::experiment::{CatalogStats, Experiment, UpdateExperimentMeta};
use crate::models::image::{ExperimentImage, NewImage};
use crate::store::{RecordStore, StoreError};

#[derive(Default)]
struct Inner {
    experiments: BTreeMap<ExperimentNumber, Experiment>,
    images: HashMap<ExperimentNumber, HashMap<ImageId, ExperimentImage>>,
}

impl Inner {
    fn insert_experiment(
        &mut self,
        number: ExperimentNumber,
        name: String,
        description: String,
    ) -> Experiment {
        let now = Utc::now();
        let experiment = Experiment {
            number,
            name,
            description,
            image_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.experiments.insert(number, experiment.clone());
        experiment
    }

    fn image_count(&self, number: ExperimentNumber) -> i64 {
        self.images.get(&number).map_or(0, |m| m.len() as i64)
    }

    fn recount(&mut self, number: ExperimentNumber) {
        let count = self.image_count(number);
        if let Some(experiment) = self.experiments.get_mut(&number) {
            experiment.image_count = count;
            experiment.updated_at = Utc::now();
        }
    }
}

/// A [`RecordStore`] held entirely in memory.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: RwLock<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}

    async fn list_experiments(&self) -> Result<Vec<Experiment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.experiments.values().cloned().collect())
    }

    async fn get_experiment(
        &self,
        number: ExperimentNumber,
    ) -> Result<Option<Experiment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.experiments.get(&number).cloned())
    }

    async fn create_experiment(
        &self,
        number: ExperimentNumber,
        name: &str,
        description: &str,
    ) -> Result<Experiment, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.experiments.contains_key(&number) {
            return Err(CoreError::Conflict(format!("Experiment {number} already exists")).into());
        }
        Ok(inner.insert_experiment(number, name.to_string(), description.to_string()))
    }

    async fn next_experiment_number(&self) -> Result<ExperimentNumber, StoreError> {
        let inner = self.inner.read().await;
        Ok(next_experiment_number(inner.experiments.keys().copied()))
    }

    async fn update_experiment_meta(
        &self,
        number: ExperimentNumber,
        update: &UpdateExperimentMeta,
    ) -> Result<Option<Experiment>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(experiment) = inner.experiments.get_mut(&number) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            experiment.name = name.clone();
        }
        if let Some(description) = &update.description {
            experiment.description = description.clone();
        }
        experiment.updated_at = Utc::now();
        Ok(Some(experiment.clone()))
    }

    async fn delete_experiment(
        &self,
        number: ExperimentNumber,
    ) -> Result<Option<Vec<ExperimentImage>>, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.experiments.remove(&number).is_none() {
            return Ok(None);
        }
        let mut images: Vec<_> = inner
            .images
            .remove(&number)
            .map(|m| m.into_values().collect())
            .unwrap_or_default();
        images.sort_by_key(|i: &ExperimentImage| i.order);
        Ok(Some(images))
    }

    async fn list_images(
        &self,
        number: ExperimentNumber,
    ) -> Result<Vec<ExperimentImage>, StoreError> {
        let inner = self.inner.read().await;
        let mut images: Vec<_> = inner
            .images
            .get(&number)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        images.sort_by_key(|i: &ExperimentImage| i.order);
        Ok(images)
    }

    async fn get_image(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
    ) -> Result<Option<ExperimentImage>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .images
            .get(&number)
            .and_then(|m| m.get(&image_id))
            .cloned())
    }

    async fn add_image(
        &self,
        number: ExperimentNumber,
        image: NewImage,
    ) -> Result<ExperimentImage, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.experiments.contains_key(&number) {
            inner.insert_experiment(number, default_experiment_name(number), String::new());
        }

        let record = ExperimentImage {
            id: Uuid::new_v4(),
            experiment_number: number,
            filename: image.filename,
            optimized: image.optimized,
            thumbnail: image.thumbnail,
            original_name: image.original_name,
            description: image.description,
            notes: String::new(),
            annotations: Vec::new(),
            order: inner.image_count(number) + 1,
            uploaded_by: image.uploaded_by,
            mime_type: image.mime_type,
            size: image.size,
            created_at: Utc::now(),
        };

        inner
            .images
            .entry(number)
            .or_default()
            .insert(record.id, record.clone());
        inner.recount(number);
        Ok(record)
    }

    async fn apply_image_update(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
        update: &ImageUpdate,
    ) -> Result<Option<ExperimentImage>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(image) = inner
            .images
            .get_mut(&number)
            .and_then(|m| m.get_mut(&image_id))
        else {
            return Ok(None);
        };
        match update {
            ImageUpdate::SetDescription(text) => image.description = text.clone(),
            ImageUpdate::SetNotes(text) => image.notes = text.clone(),
            ImageUpdate::SetAnnotations(list) => image.annotations = list.clone(),
        }
        Ok(Some(image.clone()))
    }

    async fn delete_image(
        &self,
        number: ExperimentNumber,
        image_id: ImageId,
    ) -> Result<Option<ExperimentImage>, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .images
            .get_mut(&number)
            .and_then(|m| m.remove(&image_id));
        if removed.is_some() {
            inner.recount(number);
        }
        Ok(removed)
    }

    async fn stats(&self) -> Result<CatalogStats, StoreError> {
        let inner = self.inner.read().await;
        Ok(CatalogStats {
            total_experiments: inner.experiments.len() as i64,
            total_images: inner.experiments.values().map(|e| e.image_count).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn upload(name: &str) -> NewImage {
        NewImage {
            filename: format!("/uploads/1/{name}"),
            optimized: None,
            thumbnail: None,
            original_name: name.to_string(),
            description: String::new(),
            uploaded_by: "Anonymous".to_string(),
            mime_type: "image/png".to_string(),
            size: 10,
        }
    }

    #[tokio::test]
    async fn duplicate_number_conflicts() {
        let store = MemoryRecordStore::new();
        store.create_experiment(1, "A", "").await.unwrap();
        let err = store.create_experiment(1, "B", "").await.unwrap_err();
        assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn add_image_auto_creates_experiment() {
        let store = MemoryRecordStore::new();
        store.add_image(5, upload("a.png")).await.unwrap();
        let experiment = store.get_experiment(5).await.unwrap().unwrap();
        assert_eq!(experiment.name, "Experiment 5");
        assert_eq!(experiment.image_count, 1);
    }

    #[tokio::test]
    async fn recount_after_delete() {
        let store = MemoryRecordStore::new();
        let first = store.add_image(1, upload("a.png")).await.unwrap();
        store.add_image(1, upload("b.png")).await.unwrap();
        store.delete_image(1, first.id).await.unwrap();
        assert_eq!(store.get_experiment(1).await.unwrap().unwrap().image_count, 1);
    }

    #[tokio::test]
    async fn update_unknown_image_returns_none() {
        let store = MemoryRecordStore::new();
        store.create_experiment(1, "A", "").await.unwrap();
        let res = store
            .apply_image_update(1, Uuid::new_v4(), &ImageUpdate::SetNotes("n".into()))
            .await
            .unwrap();
        assert!(res.is_none());
    }
}
