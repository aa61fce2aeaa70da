use serde::Serialize;

use super::classes::TemperatureUnit;

/// Water heater or boiler.
///
/// Water heaters report through their own mode/temperature topics rather
/// than a single state topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WaterHeaterModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temperature_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temperature_topic: Option<String>,

    /// Target temperature the hub assumes before the first state update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_state_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimistic: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_state_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_unit: Option<TemperatureUnit>,
}
