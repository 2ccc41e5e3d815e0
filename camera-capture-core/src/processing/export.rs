use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::config::SessionConfiguration;
use crate::storage::temp_files;
use crate::traits::movie_exporter::{ExportRequest, MovieExporter};

/// Post-record export of a finished movie into the delivery format.
///
/// Failures are not classified for the caller: the completion receives
/// `None` whenever no usable output exists at the destination.
pub struct ExportPipeline<E: MovieExporter> {
    exporter: Arc<E>,
    config: SessionConfiguration,
}

impl<E: MovieExporter> ExportPipeline<E> {
    pub fn new(exporter: Arc<E>, config: SessionConfiguration) -> Self {
        Self { exporter, config }
    }

    /// Build the export request for `source`, writing to a new temp path.
    pub fn request_for(&self, source: &Path) -> ExportRequest {
        ExportRequest {
            source: source.to_path_buf(),
            destination: temp_files::movie_file_path(
                &self.config.temp_directory,
                &self.config.file_prefix,
                self.config.export_file_type,
            ),
            preset: self.config.export_preset,
            file_type: self.config.export_file_type,
            optimize_for_network_use: self.config.optimize_for_network_use,
        }
    }

    /// Export `source` asynchronously. `completion` runs exactly once.
    pub fn export<F>(&self, source: &Path, completion: F)
    where
        F: FnOnce(Option<PathBuf>) + Send + 'static,
    {
        let request = self.request_for(source);
        log::info!(
            "Exporting {} -> {} ({:?}, {:?})",
            request.source.display(),
            request.destination.display(),
            request.preset,
            request.file_type
        );

        self.exporter.export(
            request,
            Box::new(move |result| {
                let output = match result {
                    Ok(path) if path.is_file() => Some(path),
                    Ok(path) => {
                        log::warn!("Export reported {} but no file exists there", path.display());
                        None
                    }
                    Err(e) => {
                        log::warn!("Export failed: {}", e);
                        None
                    }
                };
                completion(output);
            }),
        );
    }
}
