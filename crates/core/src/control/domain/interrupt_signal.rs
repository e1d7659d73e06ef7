use std::fmt;

/// Signal an observer can leave for a running job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterruptSignal {
    #[default]
    None,
    /// End the frame loop now; reassemble what was written so far.
    StopProcessing,
    /// Finish the run with raw frames only.
    DisableDetection,
    /// Terminal marker written by the job itself once it is done.
    Ended,
}

const STOP_PROCESSING: &str = "STOPPROCESS";
const DISABLE_DETECTION: &str = "STOPDETECTION";
const ENDED: &str = "Ended";

impl InterruptSignal {
    /// Parses the on-disk form. Surrounding whitespace is ignored; empty or
    /// unknown text is `None`.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            STOP_PROCESSING => Self::StopProcessing,
            DISABLE_DETECTION => Self::DisableDetection,
            ENDED => Self::Ended,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::StopProcessing => STOP_PROCESSING,
            Self::DisableDetection => DISABLE_DETECTION,
            Self::Ended => ENDED,
        }
    }
}

impl fmt::Display for InterruptSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
