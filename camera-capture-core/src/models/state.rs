/// Capture session running state.
///
/// ```text
/// idle ⇄ running
/// ```
///
/// Both transitions are idempotent: starting a running session or stopping
/// an idle one does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Running,
}

impl CaptureState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Movie recording state machine.
///
/// State transitions:
/// ```text
/// not_recording → recording → exporting → not_recording
///                     ↓
///              (finalize error) → not_recording
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    NotRecording,
    Recording,
    Exporting,
}

impl RecordingState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    /// Whether a recording or its export is still in flight.
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::NotRecording)
    }
}
