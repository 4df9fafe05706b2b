/// Lifecycle phase of the tracked job, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Transcribing,
    Converting,
    Synthesizing,
    Merging,
    Completed,
    Error,
}

impl Phase {
    /// Phase entered once the upload is accepted, before the first status tick.
    pub const FIRST_REMOTE: Phase = Phase::Transcribing;

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Transcribing => "transcribing",
            Phase::Converting => "converting",
            Phase::Synthesizing => "synthesizing",
            Phase::Merging => "merging",
            Phase::Completed => "completed",
            Phase::Error => "error",
        }
    }

    /// Human-readable status line for presentation.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "",
            Phase::Uploading => "Uploading...",
            Phase::Transcribing => "Running speech recognition...",
            Phase::Converting => "Converting to Taiwanese...",
            Phase::Synthesizing => "Synthesizing Taiwanese speech...",
            Phase::Merging => "Merging final video...",
            Phase::Completed => "Processing complete",
            Phase::Error => "Processing failed",
        }
    }
}

/// Phase as reported by the processing service on a status tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedPhase {
    Known(Phase),
    /// Service is busy but did not name a stage; the current phase is kept.
    Working,
    /// A value outside the known set, kept verbatim for the error message.
    Unrecognized(String),
}

impl From<Phase> for ReportedPhase {
    fn from(phase: Phase) -> Self {
        ReportedPhase::Known(phase)
    }
}
