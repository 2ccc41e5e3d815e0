mod adjustments;
mod capture;

pub mod camera_session;
pub mod device_lock;
pub mod queue;
pub mod transaction;

#[cfg(test)]
pub(crate) mod testing;
