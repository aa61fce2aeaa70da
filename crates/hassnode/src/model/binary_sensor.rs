use serde::Serialize;

use super::classes::BinarySensorDeviceClass;

/// Binary sensor: reports one of two states.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BinarySensorModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_after: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_update: Option<bool>,

    /// Seconds after which the sensor falls back to "off"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub off_delay: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<BinarySensorDeviceClass>,

    /// State payload meaning "off" (hub default: `OFF`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,

    /// State payload meaning "on" (hub default: `ON`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
}
