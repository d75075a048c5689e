//! REVIEW_A / REVIEW_B: independent critiques of the summary
//!
//! Both reviewers read only the topic and the summary, never each other's
//! output, so they can run in any order or at the same time.

use super::{missing, Stage, StageContext};
use crate::state::{CritiqueUpdate, PipelineState, StageUpdate};
use researchforge_common::errors::Result;

/// What a reviewer looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFocus {
    /// Reviewer A: logical support and internal consistency
    Logic,
    /// Reviewer B: gaps, missing alternatives, bias
    Gaps,
}

impl ReviewFocus {
    pub fn stage(self) -> Stage {
        match self {
            ReviewFocus::Logic => Stage::ReviewA,
            ReviewFocus::Gaps => Stage::ReviewB,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ReviewFocus::Logic => "Reviewer A",
            ReviewFocus::Gaps => "Reviewer B",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            ReviewFocus::Logic => {
                "Check whether each claim is supported by the cited evidence \
                 and whether the reasoning is internally consistent."
            }
            ReviewFocus::Gaps => {
                "Point out gaps in the evidence, alternative explanations the \
                 summary does not consider, and signs of bias."
            }
        }
    }

    pub(crate) fn build_prompt(self, topic: &str, summary: &str) -> String {
        format!(
            "You are {label}.\n\
             Critically review the research summary below on \"{topic}\".\n\
             {instruction}\n\
             Answer in concise bullet points.\n\n\
             Summary:\n{summary}\n\n\
             Critique:",
            label = self.label(),
            instruction = self.instruction(),
        )
    }
}

pub(super) async fn run(focus: ReviewFocus, state: &PipelineState, ctx: &StageContext<'_>) -> Result<StageUpdate> {
    let summary = state.summary().ok_or_else(|| missing("summary"))?;
    let prompt = focus.build_prompt(state.topic(), summary);

    let critique = ctx.generate(focus.stage(), &prompt).await?;
    let update = CritiqueUpdate { critique };

    Ok(match focus {
        ReviewFocus::Logic => StageUpdate::ReviewA(update),
        ReviewFocus::Gaps => StageUpdate::ReviewB(update),
    })
}
