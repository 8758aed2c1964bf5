// [libs/infra/vector/src/lib.rs]
/*!
 * VECTOR INDEX ADAPTER
 * RESPONSIBILITY: upsert, top-k query, and namespace-scoped deletion
 * against a single Qdrant collection, with the tenant namespace stored
 * as a payload field rather than as a separate Qdrant collection per
 * user — one collection scales better than thousands of small ones.
 *
 * Every point's payload carries `namespace` (`user_<id>`), `chunk_id`,
 * and `text`; queries always filter on `namespace` so one user's
 * narrative chunks never leak into another's retrieval results.
 */

use std::sync::Arc;

use qdrant_client::qdrant::{
    r#match::MatchValue, Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    FieldCondition, Filter, Match, PointStruct, QueryPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use thiserror::Error;
use tracing::{debug, info};

pub const COLLECTION_NAME: &str = "grant_narrative_chunks";

#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("qdrant request failed: {0}")]
    Client(#[from] qdrant_client::QdrantError),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub chunk_id: String,
    pub namespace: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
}

pub struct VectorIndex {
    client: Arc<Qdrant>,
    vector_dimensions: usize,
}

impl VectorIndex {
    pub fn new(client: Arc<Qdrant>, vector_dimensions: usize) -> Self {
        VectorIndex { client, vector_dimensions }
    }

    /// Idempotent: safe to call at startup every time. Qdrant errors on
    /// re-creating an existing collection with different params, but
    /// for an unchanged schema this is a no-op after the first call.
    pub async fn ensure_collection(&self) -> Result<(), VectorIndexError> {
        let exists = self.client.collection_exists(COLLECTION_NAME).await?;
        if exists {
            return Ok(());
        }
        info!(collection = COLLECTION_NAME, "creating vector collection");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(COLLECTION_NAME)
                    .vectors_config(VectorParamsBuilder::new(self.vector_dimensions as u64, Distance::Cosine)),
            )
            .await?;
        Ok(())
    }

    /// Upserting the same `chunk_id` twice overwrites the point in
    /// place, which is what makes re-chunking an unchanged narrative
    /// idempotent at the vector-storage layer.
    pub async fn upsert(&self, chunks: &[Chunk]) -> Result<(), VectorIndexError> {
        let mut points = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.embedding.len() != self.vector_dimensions {
                return Err(VectorIndexError::DimensionMismatch {
                    expected: self.vector_dimensions,
                    actual: chunk.embedding.len(),
                });
            }
            let payload: Payload = serde_json::json!({
                "namespace": chunk.namespace,
                "chunk_id": chunk.chunk_id,
                "text": chunk.text,
            })
            .try_into()
            .expect("chunk payload is always a valid JSON object");

            points.push(PointStruct::new(
                stable_point_id(&chunk.chunk_id).to_string(),
                chunk.embedding.clone(),
                payload,
            ));
        }

        debug!(count = points.len(), "upserting chunks into vector index");
        self.client
            .upsert_points(UpsertPointsBuilder::new(COLLECTION_NAME, points))
            .await?;
        Ok(())
    }

    pub async fn query(&self, namespace: &str, embedding: Vec<f32>, top_k: u64) -> Result<Vec<ScoredChunk>, VectorIndexError> {
        let filter = Filter::must([Condition::from(FieldCondition::match_keyword("namespace", namespace))]);

        let response = self
            .client
            .query(
                QueryPointsBuilder::new(COLLECTION_NAME)
                    .query(embedding)
                    .filter(filter)
                    .limit(top_k)
                    .with_payload(true),
            )
            .await?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;
                let chunk_id = payload.get("chunk_id")?.as_str()?.to_string();
                let text = payload.get("text")?.as_str()?.to_string();
                Some(ScoredChunk { chunk_id, text, score: point.score })
            })
            .collect())
    }

    /// Deletes every point in a user's namespace. Called when a user is
    /// deleted, so no vector outlives the record it was derived from.
    pub async fn delete_namespace(&self, namespace: &str) -> Result<(), VectorIndexError> {
        let filter = Filter::must([Condition::from(FieldCondition::match_keyword("namespace", namespace))]);
        self.client
            .delete_points(DeletePointsBuilder::new(COLLECTION_NAME).points(filter))
            .await?;
        Ok(())
    }
}

/// Qdrant point ids must be a u64 or UUID; chunk ids are deterministic
/// strings (`{narrative_hash}_{window_index}`), so we derive a stable
/// UUID from the string rather than tracking a separate id mapping.
fn stable_point_id(chunk_id: &str) -> uuid::Uuid {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, chunk_id.as_bytes())
}

trait FieldConditionExt {
    fn match_keyword(field: &str, value: &str) -> FieldCondition;
}

impl FieldConditionExt for FieldCondition {
    fn match_keyword(field: &str, value: &str) -> FieldCondition {
        FieldCondition {
            key: field.to_string(),
            r#match: Some(Match::from(MatchValue::Keyword(value.to_string()))),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_point_id_is_deterministic() {
        let a = stable_point_id("narrative123_0");
        let b = stable_point_id("narrative123_0");
        assert_eq!(a, b);
    }

    #[test]
    fn stable_point_id_differs_per_chunk() {
        let a = stable_point_id("narrative123_0");
        let b = stable_point_id("narrative123_1");
        assert_ne!(a, b);
    }
}
