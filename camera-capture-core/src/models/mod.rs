pub mod config;
pub mod device;
pub mod error;
pub mod orientation;
pub mod photo;
pub mod recording_metadata;
pub mod state;
