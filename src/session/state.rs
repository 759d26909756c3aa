use serde::{Deserialize, Serialize};

/// Phase of a fill session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    #[default]
    Idle,
    Analyzing,
    Crawling,
    Brain,
    Filling,
    Success,
    Error,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Idle => "IDLE",
            Step::Analyzing => "ANALYZING",
            Step::Crawling => "CRAWLING",
            Step::Brain => "BRAIN",
            Step::Filling => "FILLING",
            Step::Success => "SUCCESS",
            Step::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Success | Step::Error)
    }

    /// True for every step between IDLE and a terminal step.
    pub fn is_processing(&self) -> bool {
        !matches!(self, Step::Idle | Step::Success | Step::Error)
    }

    /// Status line shown while the step is current.
    pub fn default_message(&self) -> &'static str {
        match self {
            Step::Idle => "",
            Step::Analyzing => "Analyzing your voice...",
            Step::Crawling => "Crawling through the form...",
            Step::Brain => "Working out what goes where...",
            Step::Filling => "Filling in the form...",
            Step::Success => "All fields filled!",
            Step::Error => "Something went wrong",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_processing: bool,
    pub step: Step,
    pub message: String,
}

impl SessionState {
    pub fn new(step: Step, message: impl Into<String>) -> Self {
        Self {
            is_processing: step.is_processing(),
            step,
            message: message.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(Step::Idle, "")
    }
}

/// Pushed to every observer on each transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub action: &'static str,
    pub state: SessionState,
}

impl StatusUpdate {
    pub const ACTION: &'static str = "STATUS_UPDATE";

    pub fn new(state: SessionState) -> Self {
        Self {
            action: Self::ACTION,
            state,
        }
    }
}
