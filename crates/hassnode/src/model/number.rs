use serde::Serialize;

use super::classes::NumberMode;
use super::classes::SensorDeviceClass;

/// Number: an actuator holding a numeric value within `min..=max`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<SensorDeviceClass>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<NumberMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_reset: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
}

impl Default for NumberModel {
    fn default() -> Self {
        Self {
            command_template: None,
            command_topic: None,
            device_class: None,
            min: Some(1.0),
            max: Some(100.0),
            step: Some(1.0),
            mode: None,
            payload_reset: None,
            unit_of_measurement: None,
            value_template: None,
        }
    }
}

impl NumberModel {
    /// Clamp `value` into the configured range.
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}
