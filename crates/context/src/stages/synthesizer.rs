//! SYNTHESIZE: merge summary and both critiques into an insight report

use super::{missing, Stage, StageContext};
use crate::state::{PipelineState, StageUpdate, SynthesisUpdate};
use researchforge_common::errors::Result;

fn build_prompt(topic: &str, summary: &str, critique_a: &str, critique_b: &str, sources: &[String]) -> String {
    let source_list = if sources.is_empty() {
        "- none".to_string()
    } else {
        sources
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a research synthesizer.\n\
         Combine the summary and both critiques on \"{topic}\" into a Collective Insight Report with:\n\
         1. An actionable insight in 2-3 sentences.\n\
         2. Two testable hypotheses.\n\
         3. References to the sources listed below.\n\n\
         Summary:\n{summary}\n\n\
         Critique from Reviewer A:\n{critique_a}\n\n\
         Critique from Reviewer B:\n{critique_b}\n\n\
         Sources:\n{source_list}\n\n\
         Collective Insight Report:"
    )
}

pub(super) async fn run(state: &PipelineState, ctx: &StageContext<'_>) -> Result<StageUpdate> {
    let summary = state.summary().ok_or_else(|| missing("summary"))?;
    let critique_a = state.critique_a().ok_or_else(|| missing("critique_a"))?;
    let critique_b = state.critique_b().ok_or_else(|| missing("critique_b"))?;

    let prompt = build_prompt(state.topic(), summary, critique_a, critique_b, state.sources());
    let insight = ctx.generate(Stage::Synthesize, &prompt).await?;

    Ok(StageUpdate::Synthesize(SynthesisUpdate { insight }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_merges_all_inputs() {
        let sources = vec!["paper.pdf".to_string(), "Tide".to_string()];
        let prompt = build_prompt("tides", "S", "CA", "CB", &sources);

        assert!(prompt.starts_with("You are a research synthesizer."));
        assert!(prompt.contains("Collective Insight Report"));
        assert!(prompt.contains("Critique from Reviewer A:\nCA"));
        assert!(prompt.contains("Critique from Reviewer B:\nCB"));
        assert!(prompt.contains("- paper.pdf\n- Tide"));
    }

    #[test]
    fn test_prompt_without_sources() {
        let prompt = build_prompt("tides", "S", "CA", "CB", &[]);
        assert!(prompt.contains("Sources:\n- none"));
    }
}
