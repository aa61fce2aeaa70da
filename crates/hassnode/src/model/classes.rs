//! Enumerations from the Home Assistant MQTT discovery schema.
//!
//! All of them serialize to the snake_case names the hub expects, and parse
//! from the same names via `FromStr`.

use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::EnumString;

/// Device class for sensors; selects the unit and icon the hub displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorDeviceClass {
    ApparentPower,
    Aqi,
    AtmosphericPressure,
    Battery,
    CarbonDioxide,
    CarbonMonoxide,
    Current,
    DataRate,
    DataSize,
    Date,
    Distance,
    Duration,
    Energy,
    EnergyStorage,
    Enum,
    Frequency,
    Gas,
    Humidity,
    Illuminance,
    Irradiance,
    Moisture,
    Monetary,
    NitrogenDioxide,
    NitrogenMonoxide,
    NitrousOxide,
    Ozone,
    Ph,
    #[serde(rename = "pm1")]
    #[strum(serialize = "pm1")]
    Pm1,
    #[serde(rename = "pm25")]
    #[strum(serialize = "pm25")]
    Pm25,
    #[serde(rename = "pm10")]
    #[strum(serialize = "pm10")]
    Pm10,
    PowerFactor,
    Power,
    Precipitation,
    Pressure,
    ReactivePower,
    SignalStrength,
    SoundPressure,
    Speed,
    SulphurDioxide,
    Temperature,
    Timestamp,
    VolatileOrganicCompounds,
    VolatileOrganicCompoundsParts,
    Voltage,
    Volume,
    VolumeFlowRate,
    VolumeStorage,
    Water,
    Weight,
    WindSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorStateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

/// Device class for binary sensors, matching Home Assistant's binary_sensor device classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Battery,
    BatteryCharging,
    CarbonMonoxide,
    Cold,
    Connectivity,
    Door,
    GarageDoor,
    Gas,
    Heat,
    Light,
    Lock,
    Moisture,
    Motion,
    Moving,
    Occupancy,
    Opening,
    Plug,
    Power,
    Presence,
    Problem,
    Running,
    Safety,
    Smoke,
    Sound,
    Tamper,
    Update,
    Vibration,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SwitchDeviceClass {
    Outlet,
    Switch,
}

/// When a light sends its "on" command relative to brightness/color commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LightCommandType {
    Last,
    First,
    Brightness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NumberMode {
    Auto,
    Box,
    Slider,
}

/// How multiple availability topics combine into one availability state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AvailabilityMode {
    All,
    Any,
    Latest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum TemperatureUnit {
    C,
    F,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_device_class_names() {
        assert_eq!(SensorDeviceClass::Temperature.to_string(), "temperature");
        assert_eq!(SensorDeviceClass::Pm25.to_string(), "pm25");
        assert_eq!(
            serde_json::to_value(SensorDeviceClass::VolumeFlowRate).unwrap(),
            "volume_flow_rate"
        );
        assert_eq!(
            BinarySensorDeviceClass::from_str("garage_door").unwrap(),
            BinarySensorDeviceClass::GarageDoor
        );
        assert!(SensorStateClass::from_str("bogus").is_err());
    }

    #[test]
    fn test_deserialize_from_config_names() {
        #[derive(Deserialize)]
        struct Holder {
            class: SensorStateClass,
            unit: TemperatureUnit,
        }

        let holder: Holder = toml::from_str(
            r#"
            class = "total_increasing"
            unit = "C"
            "#,
        )
        .unwrap();
        assert_eq!(holder.class, SensorStateClass::TotalIncreasing);
        assert_eq!(holder.unit, TemperatureUnit::C);
    }
}
