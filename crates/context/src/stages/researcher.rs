//! RESEARCH: gather local and encyclopedia material, summarize it

use super::{Stage, StageContext};
use crate::state::{PipelineState, ResearchUpdate, StageUpdate};
use researchforge_common::errors::Result;
use researchforge_common::metrics;
use researchforge_common::models::{Chunk, Snippet};
use researchforge_common::text::truncate_text;
use researchforge_search::RetrievedChunk;
use std::collections::HashSet;
use tracing::{info, warn};

/// Joins context pieces in the research prompt
pub const PIECE_SEPARATOR: &str = "\n\n---\n\n";

/// Stands in for the context when neither source produced anything
pub const NO_SOURCES_MARKER: &str = "No sources found for this topic.";

/// Header and truncated text of a local chunk
pub fn format_local_piece(chunk: &Chunk, max_chars: usize) -> String {
    format!(
        "[PDF SOURCE: {} | CHUNK: {}]\n{}",
        chunk.source,
        chunk.chunk_id(),
        truncate_text(chunk.text.trim(), max_chars)
    )
}

/// Header and truncated text of an encyclopedia snippet
pub fn format_snippet_piece(snippet: &Snippet, max_chars: usize) -> String {
    format!(
        "[WIKI: {} | URL: {}]\n{}",
        snippet.title,
        snippet.source_url,
        truncate_text(snippet.content.trim(), max_chars)
    )
}

/// Source ids in first-seen order: chunk sources, then snippet titles
fn collect_sources(local: &[RetrievedChunk], external: &[Snippet]) -> Vec<String> {
    let mut seen = HashSet::new();
    local
        .iter()
        .map(|r| r.chunk.source.as_str())
        .chain(external.iter().map(|s| s.title.as_str()))
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Drop zero-score hits, unless nothing scored at all
fn relevant_hits(hits: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
    if hits.iter().any(|h| h.score > 0.0) {
        hits.into_iter().filter(|h| h.score > 0.0).collect()
    } else {
        hits
    }
}

fn build_prompt(topic: &str, context: &str) -> String {
    format!(
        "You are a research assistant.\n\
         Summarize what the sources below say about the topic \"{topic}\".\n\
         Be concise and name the source behind every claim.\n\n\
         Sources:\n{context}\n\n\
         Summary:"
    )
}

pub(super) async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> Result<StageUpdate> {
    let topic = state.topic();
    let settings = ctx.settings;

    let (local, external) = tokio::join!(
        ctx.retriever.retrieve(topic, settings.top_k),
        ctx.snippets.fetch_snippets(topic, settings.max_external_results),
    );

    let local = relevant_hits(local?);
    let external = match external {
        Ok(snippets) => {
            metrics::record_snippet_fetch(ctx.snippets.name(), false);
            snippets
        }
        Err(e) => {
            warn!(source = ctx.snippets.name(), error = %e, "Snippet fetch failed, continuing without external sources");
            metrics::record_snippet_fetch(ctx.snippets.name(), true);
            Vec::new()
        }
    };

    let max_chars = settings.max_snippet_chars;
    let snippets: Vec<String> = local
        .iter()
        .map(|r| format_local_piece(&r.chunk, max_chars))
        .chain(external.iter().map(|s| format_snippet_piece(s, max_chars)))
        .collect();
    let sources = collect_sources(&local, &external);

    info!(
        local_chunks = local.len(),
        external_snippets = external.len(),
        sources = sources.len(),
        "Research material gathered"
    );

    let context = if snippets.is_empty() {
        NO_SOURCES_MARKER.to_string()
    } else {
        snippets.join(PIECE_SEPARATOR)
    };

    let summary = ctx.generate(Stage::Research, &build_prompt(topic, &context)).await?;

    Ok(StageUpdate::Research(ResearchUpdate {
        summary,
        sources,
        snippets,
    }))
}
