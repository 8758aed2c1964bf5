// [libs/domain/rag/src/retrieval.rs]
//! Retrieval step: embed the (user, grant) query text and pull the
//! top-k most relevant narrative chunks back out of the user's
//! namespace for the generator to ground each section in.

use grantwell_domain_models::grant::Grant;
use grantwell_infra_adapters::{AdapterError, EmbeddingAdapter};
use grantwell_infra_vector::{ScoredChunk, VectorIndex, VectorIndexError};

pub const TOP_K: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("embedding request failed: {0}")]
    Embedding(#[from] AdapterError),
    #[error("vector index query failed: {0}")]
    VectorIndex(#[from] VectorIndexError),
}

/// Builds the text used to embed a grant for retrieval: title,
/// description, and a short eligibility summary, matching the three
/// fields the spec names for the query side of retrieval.
pub fn build_query_text(grant: &Grant, eligibility_summary: &str) -> String {
    format!("{} {} {}", grant.title, grant.description, eligibility_summary)
}

pub async fn retrieve_relevant_chunks(
    embedder: &dyn EmbeddingAdapter,
    vector_index: &VectorIndex,
    namespace: &str,
    query_text: &str,
) -> Result<Vec<ScoredChunk>, RetrievalError> {
    let mut embeddings = embedder.embed(std::slice::from_ref(&query_text.to_string())).await?;
    let embedding = embeddings.pop().unwrap_or_default();
    let chunks = vector_index.query(namespace, embedding, TOP_K).await?;
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use grantwell_domain_models::grant::{FundingBounds, GeographicScope, RecordStatus};
    use std::collections::HashMap;
    use uuid::Uuid;

    #[test]
    fn query_text_combines_title_description_and_eligibility() {
        let grant = Grant {
            id: Uuid::new_v4(),
            source_url: "https://example.gov/g".into(),
            title: "Rural Broadband Fund".into(),
            description: "Expands broadband access in rural areas.".into(),
            funder_name: "Example Foundation".into(),
            sectors: vec!["telecom".into()],
            funding: FundingBounds { min_amount: None, max_amount: None },
            deadline: None,
            geographic_scope: GeographicScope::Regional,
            eligible_regions: vec![],
            status: RecordStatus::Active,
            score: None,
            composite_score: None,
            raw_source_data: HashMap::new(),
            first_found_at: Utc::now(),
            retrieved_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let text = build_query_text(&grant, "Open to registered nonprofits.");
        assert!(text.contains("Rural Broadband Fund"));
        assert!(text.contains("Open to registered nonprofits."));
    }
}
