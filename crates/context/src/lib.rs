//! ResearchForge Context Engine
//!
//! Runs a research topic through a fixed pipeline of stages over one
//! shared, append-only state:
//!
//! ```text
//! START -> RESEARCH -> { REVIEW_A, REVIEW_B } -> SYNTHESIZE -> DONE
//! ```
//!
//! - RESEARCH gathers local chunks and encyclopedia snippets and writes a summary
//! - REVIEW_A and REVIEW_B critique the summary independently
//! - SYNTHESIZE folds summary and both critiques into an insight report
//!
//! Text generation and snippet fetching sit behind traits so the
//! pipeline runs the same against remote services and in-process fakes.

pub mod llm;
pub mod orchestrator;
mod retry;
pub mod sources;
pub mod stages;
pub mod state;

pub use llm::{create_generator, EchoGenerator, Generator, OpenAiGenerator};
pub use orchestrator::{PipelineSettings, ResearchPipeline};
pub use sources::{SnippetSource, StaticSnippetSource, WikipediaClient};
pub use stages::Stage;
pub use state::{PipelineState, StageUpdate};
