use crate::models::error::CaptureError;
use crate::models::orientation::Point;
use crate::models::state::RecordingState;

/// Event delegate for camera session notifications.
///
/// The session holds its delegate weakly and never keeps it alive.
/// All methods are called from the session worker or backend threads, not
/// the UI thread. Implementations should marshal to the UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called once the backend reports the session running.
    fn on_session_started(&self);

    /// Called once the backend reports the session stopped.
    fn on_session_stopped(&self);

    /// Called after a single tap focused the camera, with the view-space point.
    fn on_single_tap(&self, point: Point);

    /// Called on a double tap of the camera view.
    fn on_double_tap(&self);

    /// Called when a background operation fails.
    fn on_error(&self, error: &CaptureError);

    /// Called on every recording state transition.
    fn on_recording_state_changed(&self, state: RecordingState);
}
