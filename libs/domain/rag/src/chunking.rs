// [libs/domain/rag/src/chunking.rs]
//! Narrative chunking: fixed-size windows with overlap, nudged to a
//! sentence boundary where one is available nearby, with a chunk id
//! derived purely from content so re-chunking an unchanged narrative
//! reproduces identical ids (and therefore overwrites, not duplicates,
//! existing vector points).

pub const WINDOW_SIZE_CHARS: usize = 500;
pub const WINDOW_OVERLAP_CHARS: usize = 50;
/// How far past the nominal window boundary to look for a sentence end
/// before giving up and cutting mid-sentence.
const BOUNDARY_SEARCH_RADIUS: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeChunk {
    pub chunk_id: String,
    pub text: String,
}

/// Deterministic 64-bit FNV-1a hash, used instead of `DefaultHasher`
/// (which is randomly seeded per-process) so chunk ids are stable
/// across runs.
fn fnv1a_hex(input: &str) -> String {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    format!("{hash:016x}")
}

/// Splits `narrative` into overlapping windows, preferring to end each
/// window at a sentence boundary (`.`, `!`, `?` followed by whitespace
/// or end-of-string) within `BOUNDARY_SEARCH_RADIUS` chars of the
/// nominal cut point. Empty narratives yield no chunks.
pub fn chunk_narrative(narrative: &str) -> Vec<NarrativeChunk> {
    let chars: Vec<char> = narrative.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let narrative_hash = fnv1a_hex(narrative);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut window_index = 0usize;

    while start < chars.len() {
        let nominal_end = (start + WINDOW_SIZE_CHARS).min(chars.len());
        let end = if nominal_end == chars.len() { nominal_end } else { find_sentence_boundary(&chars, nominal_end).unwrap_or(nominal_end) };

        let text: String = chars[start..end].iter().collect();
        chunks.push(NarrativeChunk { chunk_id: format!("{narrative_hash}_{window_index}"), text: text.trim().to_string() });

        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(WINDOW_OVERLAP_CHARS);
        window_index += 1;
    }

    chunks.into_iter().filter(|c| !c.text.is_empty()).collect()
}

fn find_sentence_boundary(chars: &[char], nominal_end: usize) -> Option<usize> {
    let search_start = nominal_end.saturating_sub(BOUNDARY_SEARCH_RADIUS);
    let search_end = (nominal_end + BOUNDARY_SEARCH_RADIUS).min(chars.len());

    (search_start..search_end)
        .filter(|&i| matches!(chars[i], '.' | '!' | '?') && chars.get(i + 1).map_or(true, |c| c.is_whitespace()))
        .min_by_key(|&i| (i as isize - nominal_end as isize).abs())
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_narrative_yields_no_chunks() {
        assert!(chunk_narrative("").is_empty());
    }

    #[test]
    fn short_narrative_yields_one_chunk() {
        let chunks = chunk_narrative("A short business narrative.");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn long_narrative_yields_overlapping_windows() {
        let sentence = "This business serves underbanked communities with fair lending products. ";
        let narrative = sentence.repeat(20);
        let chunks = chunk_narrative(&narrative);
        assert!(chunks.len() > 1);
    }

    #[test]
    fn chunking_is_idempotent() {
        let narrative = "Alpha beta gamma. Delta epsilon zeta. ".repeat(30);
        let first = chunk_narrative(&narrative);
        let second = chunk_narrative(&narrative);
        assert_eq!(first, second);
    }

    #[test]
    fn different_narratives_produce_different_chunk_ids() {
        let a = chunk_narrative(&"Alpha. ".repeat(100));
        let b = chunk_narrative(&"Beta. ".repeat(100));
        assert_ne!(a[0].chunk_id, b[0].chunk_id);
    }

    #[test]
    fn chunk_ids_are_unique_within_one_narrative() {
        let narrative = "Sentence number one here. Sentence number two here. ".repeat(15);
        let chunks = chunk_narrative(&narrative);
        let mut ids: Vec<&str> = chunks.iter().map(|c| c.chunk_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), chunks.len());
    }
}
