//! Stage orchestrator
//!
//! Drives one research run through the fixed stage graph:
//!
//! ```text
//! START -> RESEARCH -> { REVIEW_A, REVIEW_B } -> SYNTHESIZE -> DONE
//! ```
//!
//! The two reviews write distinct fields and read only the summary, so they
//! are awaited together and joined before synthesis. A run either completes
//! every stage or returns the first failure tagged with its stage name; a
//! partially filled state is never handed back.

use crate::llm::Generator;
use crate::sources::SnippetSource;
use crate::stages::{Stage, StageContext};
use crate::state::{PipelineState, StageUpdate};
use researchforge_common::config::{AppConfig, ReviewOrder};
use researchforge_common::errors::{AppError, Result};
use researchforge_common::metrics;
use researchforge_search::Retriever;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Per-run knobs taken from the application config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Local chunks retrieved for the topic
    pub top_k: usize,
    /// Encyclopedia snippets requested for the topic
    pub max_external_results: usize,
    /// Per-piece truncation limit in characters
    pub max_snippet_chars: usize,
    /// Scheduling of the two reviews
    pub review_order: ReviewOrder,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_external_results: config.research.max_external_results,
            max_snippet_chars: config.research.max_snippet_chars,
            review_order: config.research.review_order,
        }
    }
}

/// Runs research topics against a fixed set of collaborators.
///
/// The pipeline holds no per-run state, so one instance can serve many
/// runs, concurrently if the caller wishes; the retriever is only read.
pub struct ResearchPipeline {
    retriever: Arc<dyn Retriever>,
    snippets: Arc<dyn SnippetSource>,
    generator: Arc<dyn Generator>,
    settings: PipelineSettings,
}

impl ResearchPipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        snippets: Arc<dyn SnippetSource>,
        generator: Arc<dyn Generator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            retriever,
            snippets,
            generator,
            settings,
        }
    }

    /// Research `topic` and return the completed state
    #[instrument(skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn run(&self, topic: &str) -> Result<PipelineState> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::InvalidTopic);
        }

        let started = Instant::now();
        info!(
            retriever = self.retriever.name(),
            snippet_source = self.snippets.name(),
            model = self.generator.model_name(),
            "Research run started"
        );

        let result = self.run_stages(PipelineState::new(topic)).await;
        metrics::record_pipeline_run(result.is_ok());

        match &result {
            Ok(state) => info!(
                sources = state.sources().len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Research run complete"
            ),
            Err(e) => warn!(stage = e.stage().unwrap_or("START"), error = %e, "Research run failed"),
        }

        result
    }

    async fn run_stages(&self, mut state: PipelineState) -> Result<PipelineState> {
        let update = self.execute(Stage::Research, &state).await?;
        state.apply(update)?;

        let (review_a, review_b) = match self.settings.review_order {
            ReviewOrder::Concurrent => {
                futures::future::try_join(
                    self.execute(Stage::ReviewA, &state),
                    self.execute(Stage::ReviewB, &state),
                )
                .await?
            }
            ReviewOrder::AThenB => {
                let a = self.execute(Stage::ReviewA, &state).await?;
                let b = self.execute(Stage::ReviewB, &state).await?;
                (a, b)
            }
            ReviewOrder::BThenA => {
                let b = self.execute(Stage::ReviewB, &state).await?;
                let a = self.execute(Stage::ReviewA, &state).await?;
                (a, b)
            }
        };

        // Join barrier: both critiques land before synthesis reads them
        state.apply(review_a)?;
        state.apply(review_b)?;

        let update = self.execute(Stage::Synthesize, &state).await?;
        state.apply(update)?;

        Ok(state)
    }

    /// Run one stage, attributing any failure to it
    pub async fn execute(&self, stage: Stage, state: &PipelineState) -> Result<StageUpdate> {
        let ctx = StageContext {
            retriever: self.retriever.as_ref(),
            snippets: self.snippets.as_ref(),
            generator: self.generator.as_ref(),
            settings: &self.settings,
        };

        stage
            .execute(state, &ctx)
            .await
            .map_err(|e| AppError::stage_failed(stage.name(), e))
    }
}
