use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::config::SessionPreset;
use crate::models::device::{CaptureDeviceHandle, DeviceInput, OutputKind};
use crate::models::error::CaptureError;
use crate::traits::capture_backend::CaptureBackend;

/// Outcome of binding a device to the session.
///
/// The session may refuse an input it cannot accept. That is not an error
/// by itself; the caller decides what a skipped binding means.
#[derive(Debug, Clone, PartialEq)]
pub enum InputBinding {
    Added(DeviceInput),
    Skipped(DeviceInput),
}

impl InputBinding {
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    /// The bound input, if the session accepted it.
    pub fn added(self) -> Option<DeviceInput> {
        match self {
            Self::Added(input) => Some(input),
            Self::Skipped(_) => None,
        }
    }
}

/// A begin/commit configuration bracket on the capture session.
///
/// All structural mutation (inputs, outputs, preset) goes through an open
/// transaction. Only one may be open per session at a time. The bracket is
/// committed by `commit` or, on every other exit path, when dropped.
pub struct ConfigurationTransaction<'a, B: CaptureBackend> {
    backend: &'a B,
    open: &'a AtomicBool,
    finished: bool,
}

impl<'a, B: CaptureBackend> ConfigurationTransaction<'a, B> {
    /// Begin configuration. `open` is the session's transaction flag.
    pub fn begin(backend: &'a B, open: &'a AtomicBool) -> Result<Self, CaptureError> {
        if open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CaptureError::TransactionInProgress);
        }
        backend.begin_configuration();
        log::debug!("Configuration transaction opened");
        Ok(Self {
            backend,
            open,
            finished: false,
        })
    }

    /// Build an input for `device` and add it if the session accepts it.
    ///
    /// Fails with `DeviceUnavailable` if the input cannot be constructed.
    pub fn try_add_input(&mut self, device: &CaptureDeviceHandle) -> Result<InputBinding, CaptureError> {
        let input = self.backend.make_input(device).map_err(|e| {
            log::warn!("Cannot create input for {}: {}", device.name, e);
            CaptureError::DeviceUnavailable
        })?;

        if !self.backend.can_add_input(&input) {
            log::warn!("Session cannot accept input {}; skipped", device.name);
            return Ok(InputBinding::Skipped(input));
        }

        self.backend.add_input(&input);
        log::debug!("Added input {} ({:?})", device.name, device.position);
        Ok(InputBinding::Added(input))
    }

    /// Remove `input` from the session. Does nothing if it is not attached.
    pub fn remove_input(&mut self, input: &DeviceInput) {
        self.backend.remove_input(input);
        log::debug!("Removed input {}", input.device.name);
    }

    /// Attach `output` unless it is attached already or the session
    /// refuses it. Returns whether the output is attached afterwards.
    pub fn try_add_output(&mut self, output: OutputKind) -> bool {
        if self.backend.has_output(output) {
            return true;
        }
        if !self.backend.can_add_output(output) {
            log::warn!("Session cannot accept {:?} output; skipped", output);
            return false;
        }
        self.backend.add_output(output);
        log::debug!("Added {:?} output", output);
        true
    }

    pub fn set_preset(&mut self, preset: SessionPreset) {
        self.backend.set_preset(preset);
    }

    /// Commit the configuration.
    pub fn commit(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.backend.commit_configuration();
        self.open.store(false, Ordering::Release);
        log::debug!("Configuration transaction committed");
    }
}

impl<B: CaptureBackend> Drop for ConfigurationTransaction<'_, B> {
    fn drop(&mut self) {
        self.finish();
    }
}
