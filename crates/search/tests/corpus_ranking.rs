//! Chunked corpus through the BM25 index

use researchforge_common::config::CorpusConfig;
use researchforge_ingestion::{Chunker, ChunkingConfig, CorpusLoader};
use researchforge_search::{Bm25Index, Bm25Params};

fn build(size: usize, overlap: usize, docs: &[(&str, &str)]) -> Bm25Index {
    let chunker = Chunker::new(ChunkingConfig::new(size, overlap).unwrap());
    let loader = CorpusLoader::new(chunker, &CorpusConfig::default());
    let report = loader.load_texts(docs.iter().copied());
    Bm25Index::with_params(report.chunks, Bm25Params::default())
}

#[test]
fn two_chunk_corpus_ranks_matching_chunk_first() {
    let index = build(
        100,
        10,
        &[("d1", "the cat sat on the mat"), ("d2", "dogs bark at the moon")],
    );

    let hits = index.query("cat mat", 1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].source, "d1");
    assert_eq!(hits[0].offset, 0);
}

#[test]
fn hits_point_back_into_their_source() {
    let text = "Photosynthesis converts light into chemical energy. \
                Chlorophyll absorbs mostly blue and red light. \
                Mitochondria handle cellular respiration instead.";
    let index = build(40, 10, &[("bio.txt", text)]);

    let hit = index.query("chlorophyll", 1)[0];
    let reconstructed: String = text.chars().skip(hit.offset).take(hit.char_len()).collect();

    assert_eq!(reconstructed, hit.text);
    assert!(hit.text.to_lowercase().contains("chlorophyll"));
}

#[test]
fn ids_follow_load_order_across_documents() {
    let index = build(5, 0, &[("a", "aaaa bbbb"), ("b", "cccc")]);
    let ids: Vec<usize> = index.chunks().iter().map(|c| c.id).collect();
    let expected: Vec<usize> = (0..index.len()).collect();
    assert_eq!(ids, expected);
    assert_eq!(index.chunks().last().unwrap().source, "b");
}
