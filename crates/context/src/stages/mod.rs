//! Pipeline stages
//!
//! A stage reads the state it depends on, calls its collaborators, and
//! returns a [`StageUpdate`] with only the fields it owns. Stages never
//! mutate the state themselves; the orchestrator applies their output.

mod researcher;
mod reviewer;
mod synthesizer;

pub use researcher::{format_local_piece, format_snippet_piece, NO_SOURCES_MARKER, PIECE_SEPARATOR};
pub use reviewer::ReviewFocus;

use crate::llm::Generator;
use crate::orchestrator::PipelineSettings;
use crate::sources::SnippetSource;
use crate::state::{PipelineState, StageUpdate};
use researchforge_common::errors::{AppError, Result};
use researchforge_common::metrics;
use researchforge_search::Retriever;
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument};

/// Named unit of pipeline work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Research,
    ReviewA,
    ReviewB,
    Synthesize,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 4] = [Stage::Research, Stage::ReviewA, Stage::ReviewB, Stage::Synthesize];

    /// Name attached to errors and metrics
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Research => "RESEARCH",
            Stage::ReviewA => "REVIEW_A",
            Stage::ReviewB => "REVIEW_B",
            Stage::Synthesize => "SYNTHESIZE",
        }
    }

    /// Run this stage against the current state
    #[instrument(skip_all, fields(stage = self.name()))]
    pub async fn execute(self, state: &PipelineState, ctx: &StageContext<'_>) -> Result<StageUpdate> {
        let started = Instant::now();

        let update = match self {
            Stage::Research => researcher::run(state, ctx).await?,
            Stage::ReviewA => reviewer::run(ReviewFocus::Logic, state, ctx).await?,
            Stage::ReviewB => reviewer::run(ReviewFocus::Gaps, state, ctx).await?,
            Stage::Synthesize => synthesizer::run(state, ctx).await?,
        };

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Stage finished");
        Ok(update)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collaborators and settings shared by every stage of a run
pub struct StageContext<'a> {
    pub retriever: &'a dyn Retriever,
    pub snippets: &'a dyn SnippetSource,
    pub generator: &'a dyn Generator,
    pub settings: &'a PipelineSettings,
}

impl StageContext<'_> {
    /// Call the generator, recording latency and outcome for `stage`
    pub(crate) async fn generate(&self, stage: Stage, prompt: &str) -> Result<String> {
        let started = Instant::now();
        let result = self.generator.generate(prompt).await;
        metrics::record_generation(started.elapsed().as_secs_f64(), stage.name(), result.is_ok());
        result
    }
}

/// Input a stage depends on but found missing
fn missing(field: &'static str) -> AppError {
    AppError::StateViolation { field }
}
