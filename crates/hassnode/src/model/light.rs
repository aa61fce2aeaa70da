use serde::Serialize;

use super::classes::LightCommandType;

/// Light using the default (non-JSON) schema: on/off plus optional
/// brightness, color and effect channels on their own topics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LightModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_command_template: Option<String>,

    /// Value the hub sends for full brightness (hub default: 255)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_scale: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temp_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,

    /// Command and state payload meaning "off" (hub default: `OFF`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,

    /// Command and state payload meaning "on" (hub default: `ON`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_list: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hs_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hs_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hs_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hs_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_mireds: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_mireds: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_command_type: Option<LightCommandType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbw_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbw_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbw_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbw_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbww_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbww_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbww_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgbww_value_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_scale: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy_command_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy_command_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy_state_topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy_value_template: Option<String>,
}
