//! Full research runs over an in-memory corpus with offline collaborators

use async_trait::async_trait;
use researchforge_common::config::{CorpusConfig, ReviewOrder};
use researchforge_common::models::Snippet;
use researchforge_common::Result;
use researchforge_context::stages::{NO_SOURCES_MARKER, PIECE_SEPARATOR};
use researchforge_context::{EchoGenerator, Generator, PipelineSettings, ResearchPipeline, StaticSnippetSource};
use researchforge_ingestion::{Chunker, ChunkingConfig, CorpusLoader};
use researchforge_search::Bm25Index;
use std::sync::{Arc, Mutex};

/// Echoes like `EchoGenerator` and keeps every prompt it was given
#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        EchoGenerator.generate(prompt).await
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

fn index(docs: &[(&str, &str)]) -> Arc<Bm25Index> {
    let chunker = Chunker::new(ChunkingConfig::new(60, 15).unwrap());
    let report = CorpusLoader::new(chunker, &CorpusConfig::default()).load_texts(docs.iter().copied());
    Arc::new(Bm25Index::build(report.chunks))
}

fn settings(max_snippet_chars: usize) -> PipelineSettings {
    PipelineSettings {
        top_k: 2,
        max_external_results: 2,
        max_snippet_chars,
        review_order: ReviewOrder::Concurrent,
    }
}

#[tokio::test]
async fn empty_corpus_and_no_snippets_still_completes() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = ResearchPipeline::new(
        index(&[]),
        Arc::new(StaticSnippetSource::empty()),
        generator.clone(),
        settings(200),
    );

    let state = pipeline.run("deep sea vents").await.unwrap();

    assert!(state.is_complete());
    for field in [state.summary(), state.critique_a(), state.critique_b(), state.insight()] {
        assert!(!field.unwrap().is_empty());
    }
    assert!(state.sources().is_empty());
    assert!(state.snippets().is_empty());

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 4);
    let research = prompts
        .iter()
        .find(|p| p.starts_with("You are a research assistant."))
        .unwrap();
    assert!(research.contains(&format!("Sources:\n{NO_SOURCES_MARKER}")));
}

#[tokio::test]
async fn local_and_external_material_are_recorded() {
    let corpus = index(&[
        (
            "vents.txt",
            "Hydrothermal vents host chemosynthetic bacteria that feed tube worms on the sea floor.",
        ),
        ("birds.txt", "Migratory birds navigate using the magnetic field of the earth."),
    ]);
    let wiki = StaticSnippetSource::new(vec![
        Snippet::new("Hydrothermal vent", "A hydrothermal vent is a fissure on the seabed. ".repeat(20), "https://w/vent"),
        Snippet::new("Tube worm", "Giant tube worms live near vents.", "https://w/worm"),
        Snippet::new("Ignored", "beyond the limit", "https://w/ignored"),
    ]);
    let pipeline = ResearchPipeline::new(corpus, Arc::new(wiki), Arc::new(EchoGenerator), settings(120));

    let state = pipeline.run("hydrothermal vents bacteria").await.unwrap();

    assert_eq!(state.sources(), ["vents.txt", "Hydrothermal vent", "Tube worm"].map(String::from));

    // one matching local piece and two encyclopedia pieces, each body within budget
    assert_eq!(state.snippets().len(), 3);
    for piece in state.snippets() {
        let (_, body) = piece.split_once('\n').unwrap();
        assert!(body.chars().count() <= 120);
        assert!(!piece.contains(PIECE_SEPARATOR));
    }
    assert!(state.snippets()[0].starts_with("[PDF SOURCE: vents.txt | CHUNK: vents.txt__chunk0]"));
    assert!(state.snippets()[1].starts_with("[WIKI: Hydrothermal vent | URL: https://w/vent]"));
}

#[tokio::test]
async fn pipeline_serves_concurrent_runs() {
    let pipeline = Arc::new(ResearchPipeline::new(
        index(&[("a.txt", "alpha beta gamma"), ("b.txt", "delta epsilon")]),
        Arc::new(StaticSnippetSource::empty()),
        Arc::new(EchoGenerator),
        settings(200),
    ));

    let handles: Vec<_> = ["alpha", "delta", "gamma epsilon"]
        .into_iter()
        .map(|topic| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.run(topic).await })
        })
        .collect();

    for handle in handles {
        let state = handle.await.unwrap().unwrap();
        assert!(state.is_complete());
    }
}
