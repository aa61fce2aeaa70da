//! Read-only capabilities for sensors.

use std::sync::Mutex;
use std::sync::PoisonError;

use super::Capability;
use crate::model::EntityModel;
use crate::Error;

/// A sensor whose value is pushed in by the owner.
#[derive(Debug, Default)]
pub struct Gauge {
    value: Mutex<String>,
}

impl Gauge {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(value.into()),
        }
    }

    pub fn get(&self) -> String {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Store a new reading. Call `Entity::publish_state` to report it.
    pub fn set(&self, value: impl Into<String>) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value.into();
    }
}

impl Capability for Gauge {
    fn state(&self, _model: &EntityModel) -> Result<String, Error> {
        Ok(self.get())
    }
}

/// A sensor that takes a fresh reading every time its state is requested.
pub struct Probe<F> {
    read: F,
}

impl<F> Probe<F>
where
    F: Fn() -> Result<String, Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    pub fn new(read: F) -> Self {
        Self { read }
    }
}

impl<F> Capability for Probe<F>
where
    F: Fn() -> Result<String, Box<dyn std::error::Error + Send + Sync>> + Send + Sync,
{
    fn state(&self, _model: &EntityModel) -> Result<String, Error> {
        (self.read)().map_err(Error::Read)
    }
}
