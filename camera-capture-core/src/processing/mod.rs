pub mod export;
pub mod orientation;
pub mod photo;
