use std::path::{Path, PathBuf};

use crate::models::config::MovieFileType;

/// A fresh, unique movie path: `<dir>/<prefix>_movie_<uuid>.<ext>`.
///
/// Used for both raw recordings and their exports, so an export never
/// overwrites its source.
pub fn movie_file_path(dir: &Path, prefix: &str, file_type: MovieFileType) -> PathBuf {
    dir.join(format!(
        "{}_movie_{}.{}",
        prefix,
        uuid::Uuid::new_v4(),
        file_type.extension()
    ))
}
