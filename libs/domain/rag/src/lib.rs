// [libs/domain/rag/src/lib.rs]
/*!
 * RAG APPLICATION GENERATOR
 * RESPONSIBILITY: chunk a business narrative for retrieval, pull the
 * chunks most relevant to a given grant back out of the vector index,
 * and draft the six application sections grounded in what comes back.
 */

pub mod chunking;
pub mod generation;
pub mod retrieval;

pub use chunking::{chunk_narrative, NarrativeChunk, WINDOW_OVERLAP_CHARS, WINDOW_SIZE_CHARS};
pub use generation::{RagGenerator, Section, MAX_SECTION_WORDS, MIN_SECTION_WORDS};
pub use retrieval::{build_query_text, retrieve_relevant_chunks, RetrievalError, TOP_K};
