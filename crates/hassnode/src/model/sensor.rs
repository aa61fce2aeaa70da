use serde::Serialize;

use super::classes::SensorDeviceClass;
use super::classes::SensorStateClass;

/// Sensor: reports a value, accepts no commands.
///
/// When `device_class` is set the hub expects a matching
/// `unit_of_measurement`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorModel {
    /// Seconds after which the last reading is considered stale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_after: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_update: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<SensorDeviceClass>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reset_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_display_precision: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<SensorStateClass>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
}
