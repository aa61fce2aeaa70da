use serde::Serialize;

/// Fan or ventilation unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FanModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,

    /// Command and state payload meaning "off" (hub default: `OFF`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,

    /// Command and state payload meaning "on" (hub default: `ON`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oscillation_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oscillation_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oscillation_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oscillation_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_oscillation_off: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_oscillation_on: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_reset_percentage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_reset_preset_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_mode_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_mode_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_mode_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_mode_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_modes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_range_max: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_range_min: Option<u32>,
}
