use thiserror::Error;

/// Errors that can occur during camera capture operations.
///
/// None of these are fatal to the session: a failed operation leaves the
/// session running and is reported through a return value, a completion
/// callback or `SessionDelegate::on_error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceUnavailable,

    /// The active video input was removed but no replacement could be bound.
    #[error("partial reconfiguration: no active video input after camera switch")]
    PartialReconfiguration,

    #[error("capture output not available")]
    OutputUnavailable,

    #[error("a recording is already in progress")]
    RecordingInProgress,

    #[error("recording failed: {0}")]
    RecordingFailed(String),

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("photo capture failed: {0}")]
    PhotoCaptureFailed(String),

    #[error("device lock failed: {0}")]
    LockFailed(String),

    #[error("a configuration transaction is already open")]
    TransactionInProgress,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}
