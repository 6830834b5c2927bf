//! Upload → analyze → render lifecycle of one planner page.

/// Visible phase of the planner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnalysisPhase {
    #[default]
    Idle,
    ImageSelected,
    Analyzing,
    Rendered,
    Failed(String),
}

/// Identifies one analysis request; only the latest ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

#[derive(Debug, Clone, Default)]
pub struct Session {
    phase: AnalysisPhase,
    has_image: bool,
    latest: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &AnalysisPhase {
        &self.phase
    }

    pub fn select_image(&mut self) {
        self.has_image = true;
        if self.phase != AnalysisPhase::Analyzing {
            self.phase = AnalysisPhase::ImageSelected;
        }
    }

    pub fn can_analyze(&self) -> bool {
        self.has_image && self.phase != AnalysisPhase::Analyzing
    }

    /// Input rejected before any request was sent.
    pub fn reject_input(&mut self, message: impl Into<String>) {
        if self.phase != AnalysisPhase::Analyzing {
            self.phase = AnalysisPhase::Failed(message.into());
        }
    }

    /// Start a request. Returns `None` when no image is selected or one is in flight.
    pub fn begin_analysis(&mut self) -> Option<RequestTicket> {
        if !self.can_analyze() {
            return None;
        }
        self.latest += 1;
        self.phase = AnalysisPhase::Analyzing;
        Some(RequestTicket(self.latest))
    }

    /// Record the outcome of a request. Stale tickets are dropped and `false` is returned.
    pub fn finish(&mut self, ticket: RequestTicket, outcome: Result<(), String>) -> bool {
        if ticket.0 != self.latest {
            return false;
        }
        self.phase = match outcome {
            Ok(()) => AnalysisPhase::Rendered,
            Err(message) => AnalysisPhase::Failed(message),
        };
        true
    }
}
