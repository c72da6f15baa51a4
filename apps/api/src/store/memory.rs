use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::store::{DocKind, DocumentStore, StoreError};

/// In-memory document store for tests. Preserves insertion order so
/// field-filtered queries come back oldest-first, like the Postgres impl.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<Vec<((DocKind, Uuid), Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, kind: DocKind, id: Uuid) -> Result<Option<Value>, StoreError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .find(|(key, _)| *key == (kind, id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn upsert(&self, kind: DocKind, id: Uuid, doc: Value) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(entry) = docs.iter_mut().find(|(key, _)| *key == (kind, id)) {
            entry.1 = doc;
        } else {
            docs.push(((kind, id), doc));
        }
        Ok(())
    }

    async fn delete(&self, kind: DocKind, id: Uuid) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap();
        docs.retain(|(key, _)| *key != (kind, id));
        Ok(())
    }

    async fn query_by_field(
        &self,
        kind: DocKind,
        field: &str,
        value: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let docs = self.docs.lock().unwrap();
        Ok(docs
            .iter()
            .filter(|((k, _), doc)| *k == kind && doc.get(field) == Some(&value))
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateRun;
    use crate::store::Store;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_upsert_get_delete_roundtrip() {
        let store = Store::new(Arc::new(MemoryStore::new()));
        let id = Uuid::new_v4();

        let run = CandidateRun::pending(id, "/uploads/cv.pdf");
        store.save_candidate_run(&run).await.unwrap();

        let loaded = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.file_path, "/uploads/cv.pdf");

        // Upsert over the same key keeps one document per id.
        let mut updated = loaded.clone();
        updated.mark_failed("boom");
        store.save_candidate_run(&updated).await.unwrap();
        let reloaded = store.get_candidate_run(id).await.unwrap().unwrap();
        assert_eq!(reloaded.status_comment.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_pending_query_filters_status() {
        let store = Store::new(Arc::new(MemoryStore::new()));

        let pending = CandidateRun::pending(Uuid::new_v4(), "/a.pdf");
        let mut failed = CandidateRun::pending(Uuid::new_v4(), "/b.pdf");
        failed.mark_failed("Unsupported file type: /b.docx");

        store.save_candidate_run(&pending).await.unwrap();
        store.save_candidate_run(&failed).await.unwrap();

        let pending_runs = store.pending_candidate_runs().await.unwrap();
        assert_eq!(pending_runs.len(), 1);
        assert_eq!(pending_runs[0].id, pending.id);
    }
}
