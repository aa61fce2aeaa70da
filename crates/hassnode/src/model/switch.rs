use serde::Serialize;

use super::classes::SwitchDeviceClass;

/// Switch: the simplest two-state actuator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwitchModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<SwitchDeviceClass>,

    /// When false the hub waits for the state topic to confirm a command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimistic: Option<bool>,

    /// Command the hub sends to switch off
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,

    /// Command the hub sends to switch on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,

    /// State we report when off (hub default: `payload_off`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_off: Option<String>,

    /// State we report when on (hub default: `payload_on`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_on: Option<String>,
}
