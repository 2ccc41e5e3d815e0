//! Movie export by file copy.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use camera_capture_core::models::error::CaptureError;
use camera_capture_core::traits::movie_exporter::{ExportCallback, ExportRequest, MovieExporter};

/// `MovieExporter` that "transcodes" by copying the source to the
/// destination on a background thread. Preset and container are recorded
/// in the log only.
#[derive(Default)]
pub struct CopyExporter {
    completed: Arc<AtomicUsize>,
}

impl CopyExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of exports that produced a file.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

fn copy_movie(request: &ExportRequest) -> Result<(), CaptureError> {
    if !request.source.is_file() {
        return Err(CaptureError::ExportFailed(format!(
            "source {} does not exist",
            request.source.display()
        )));
    }
    if let Some(parent) = request.destination.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CaptureError::ExportFailed(format!("failed to create export directory: {}", e)))?;
    }
    fs::copy(&request.source, &request.destination)
        .map_err(|e| CaptureError::ExportFailed(format!("failed to copy movie: {}", e)))?;
    Ok(())
}

impl MovieExporter for CopyExporter {
    fn export(&self, request: ExportRequest, completion: ExportCallback) {
        log::debug!(
            "Export {:?} as {:?} (network optimized: {})",
            request.preset,
            request.file_type,
            request.optimize_for_network_use
        );

        let slot = Arc::new(Mutex::new(Some(completion)));
        let worker_slot = Arc::clone(&slot);
        let completed = Arc::clone(&self.completed);

        let spawned = thread::Builder::new().name("movie-export".into()).spawn(move || {
            let result = copy_movie(&request).map(|()| request.destination.clone());
            if result.is_ok() {
                completed.fetch_add(1, Ordering::SeqCst);
            }
            if let Some(completion) = worker_slot.lock().take() {
                completion(result);
            }
        });

        if let Err(e) = spawned {
            log::error!("Failed to spawn export thread: {}", e);
            if let Some(completion) = slot.lock().take() {
                completion(Err(CaptureError::ExportFailed(e.to_string())));
            }
        }
    }
}
