//! Shared pipeline state
//!
//! A [`PipelineState`] is created per run from the topic and filled in by
//! the stages. Fields are private: stages never touch the state directly,
//! they return a [`StageUpdate`] naming only the fields they own, and
//! [`PipelineState::apply`] merges it. A field is written once and only
//! after everything it depends on is present.

use researchforge_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Output of the RESEARCH stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchUpdate {
    pub summary: String,
    pub sources: Vec<String>,
    pub snippets: Vec<String>,
}

/// Output of one review stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CritiqueUpdate {
    pub critique: String,
}

/// Output of the SYNTHESIZE stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisUpdate {
    pub insight: String,
}

/// Partial state returned by a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageUpdate {
    Research(ResearchUpdate),
    ReviewA(CritiqueUpdate),
    ReviewB(CritiqueUpdate),
    Synthesize(SynthesisUpdate),
}

/// Record carried through one research run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    topic: String,
    summary: Option<String>,
    critique_a: Option<String>,
    critique_b: Option<String>,
    insight: Option<String>,
    sources: Option<Vec<String>>,
    snippets: Option<Vec<String>>,
}

impl PipelineState {
    /// Fresh state holding only the topic
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn critique_a(&self) -> Option<&str> {
        self.critique_a.as_deref()
    }

    pub fn critique_b(&self) -> Option<&str> {
        self.critique_b.as_deref()
    }

    pub fn insight(&self) -> Option<&str> {
        self.insight.as_deref()
    }

    /// Source ids in first-seen order, local documents before articles
    pub fn sources(&self) -> &[String] {
        self.sources.as_deref().unwrap_or_default()
    }

    /// Headed, truncated context pieces fed to the research prompt
    pub fn snippets(&self) -> &[String] {
        self.snippets.as_deref().unwrap_or_default()
    }

    /// Every field written
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
            && self.critique_a.is_some()
            && self.critique_b.is_some()
            && self.insight.is_some()
            && self.sources.is_some()
            && self.snippets.is_some()
    }

    /// Merge a stage's output.
    ///
    /// Rejects with `StateViolation` a write to a field that is already set
    /// or whose inputs are still missing. The state is unchanged on error.
    pub fn apply(&mut self, update: StageUpdate) -> Result<()> {
        match update {
            StageUpdate::Research(u) => {
                Self::ensure_unset(&self.summary, "summary")?;
                Self::ensure_unset(&self.sources, "sources")?;
                Self::ensure_unset(&self.snippets, "snippets")?;
                self.summary = Some(u.summary);
                self.sources = Some(u.sources);
                self.snippets = Some(u.snippets);
            }
            StageUpdate::ReviewA(u) => {
                Self::ensure_set(&self.summary, "critique_a")?;
                Self::ensure_unset(&self.critique_a, "critique_a")?;
                self.critique_a = Some(u.critique);
            }
            StageUpdate::ReviewB(u) => {
                Self::ensure_set(&self.summary, "critique_b")?;
                Self::ensure_unset(&self.critique_b, "critique_b")?;
                self.critique_b = Some(u.critique);
            }
            StageUpdate::Synthesize(u) => {
                Self::ensure_set(&self.summary, "insight")?;
                Self::ensure_set(&self.critique_a, "insight")?;
                Self::ensure_set(&self.critique_b, "insight")?;
                Self::ensure_unset(&self.insight, "insight")?;
                self.insight = Some(u.insight);
            }
        }
        Ok(())
    }

    fn ensure_unset<T>(slot: &Option<T>, field: &'static str) -> Result<()> {
        match slot {
            Some(_) => Err(AppError::StateViolation { field }),
            None => Ok(()),
        }
    }

    fn ensure_set<T>(dependency: &Option<T>, field: &'static str) -> Result<()> {
        match dependency {
            Some(_) => Ok(()),
            None => Err(AppError::StateViolation { field }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn research() -> StageUpdate {
        StageUpdate::Research(ResearchUpdate {
            summary: "summary".into(),
            sources: vec!["a.pdf".into()],
            snippets: vec!["piece".into()],
        })
    }

    fn critique(text: &str) -> CritiqueUpdate {
        CritiqueUpdate { critique: text.into() }
    }

    #[test]
    fn test_new_state_holds_only_topic() {
        let state = PipelineState::new("solar sails");
        assert_eq!(state.topic(), "solar sails");
        assert!(state.summary().is_none());
        assert!(state.sources().is_empty());
        assert!(!state.is_complete());
    }

    #[test]
    fn test_full_sequence_completes() {
        let mut state = PipelineState::new("t");
        state.apply(research()).unwrap();
        state.apply(StageUpdate::ReviewB(critique("b"))).unwrap();
        state.apply(StageUpdate::ReviewA(critique("a"))).unwrap();
        state
            .apply(StageUpdate::Synthesize(SynthesisUpdate { insight: "i".into() }))
            .unwrap();

        assert!(state.is_complete());
        assert_eq!(state.critique_a(), Some("a"));
        assert_eq!(state.critique_b(), Some("b"));
        assert_eq!(state.sources(), ["a.pdf".to_string()]);
    }

    #[test]
    fn test_overwrite_is_rejected() {
        let mut state = PipelineState::new("t");
        state.apply(research()).unwrap();

        let err = state.apply(research()).unwrap_err();
        assert!(matches!(err, AppError::StateViolation { field: "summary" }));
        assert_eq!(state.summary(), Some("summary"));
    }

    #[test]
    fn test_review_before_research_is_rejected() {
        let mut state = PipelineState::new("t");
        let err = state.apply(StageUpdate::ReviewA(critique("a"))).unwrap_err();
        assert!(matches!(err, AppError::StateViolation { field: "critique_a" }));
        assert!(state.critique_a().is_none());
    }

    #[test]
    fn test_synthesis_waits_for_both_reviews() {
        let mut state = PipelineState::new("t");
        state.apply(research()).unwrap();
        state.apply(StageUpdate::ReviewA(critique("a"))).unwrap();

        let err = state
            .apply(StageUpdate::Synthesize(SynthesisUpdate { insight: "i".into() }))
            .unwrap_err();
        assert!(matches!(err, AppError::StateViolation { field: "insight" }));
        assert!(state.insight().is_none());
    }

    #[test]
    fn test_state_serializes() {
        let mut state = PipelineState::new("t");
        state.apply(research()).unwrap();

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["topic"], "t");
        assert_eq!(json["summary"], "summary");
        assert!(json["insight"].is_null());
    }
}
