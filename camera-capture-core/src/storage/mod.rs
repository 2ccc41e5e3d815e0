pub mod metadata;
pub mod temp_files;
