//! Discovery attribute bags.
//!
//! An [`EntityModel`] is the common record every entity kind shares (linkage
//! fields, delivery settings, presentation) plus a kind-specific payload
//! selected by [`EntityKind`]. Serializing the model yields the discovery
//! document; the kind tag itself is never serialized, it only picks the
//! discovery class used in the topic.

mod binary_sensor;
mod classes;
mod device;
mod fan;
mod light;
mod number;
mod sensor;
mod switch;
mod water_heater;

use serde::Deserialize;
use serde::Serialize;

pub use binary_sensor::BinarySensorModel;
pub use classes::AvailabilityMode;
pub use classes::BinarySensorDeviceClass;
pub use classes::LightCommandType;
pub use classes::NumberMode;
pub use classes::SensorDeviceClass;
pub use classes::SensorStateClass;
pub use classes::SwitchDeviceClass;
pub use classes::TemperatureUnit;
pub use device::DeviceInfo;
pub use fan::FanModel;
pub use light::LightModel;
pub use number::NumberModel;
pub use sensor::SensorModel;
pub use switch::SwitchModel;
pub use water_heater::WaterHeaterModel;

use crate::Error;

pub const DEFAULT_ENCODING: &str = "utf-8";

/// MQTT delivery guarantee, serialized as its numeric level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Qos {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl Qos {
    pub fn level(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

impl TryFrom<u8> for Qos {
    type Error = u8;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            other => Err(other),
        }
    }
}

impl Serialize for Qos {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl<'de> Deserialize<'de> for Qos {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = u8::deserialize(deserializer)?;
        Qos::try_from(level).map_err(|level| {
            serde::de::Error::custom(format!("invalid QoS level {level}, expected 0, 1 or 2"))
        })
    }
}

/// One availability topic the hub watches for this entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Availability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_available: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_not_available: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
}

/// Kind-specific part of an entity model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityKind {
    Sensor(SensorModel),
    BinarySensor(BinarySensorModel),
    Switch(SwitchModel),
    Light(LightModel),
    Fan(FanModel),
    Number(NumberModel),
    WaterHeater(WaterHeaterModel),
}

/// Payloads a two-state entity receives as commands and reports as state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnOffPayloads {
    pub command_on: String,
    pub command_off: String,
    pub state_on: String,
    pub state_off: String,
}

impl OnOffPayloads {
    fn symmetric(on: Option<&String>, off: Option<&String>) -> Self {
        let on = on.map_or("ON", String::as_str).to_string();
        let off = off.map_or("OFF", String::as_str).to_string();
        Self {
            command_on: on.clone(),
            command_off: off.clone(),
            state_on: on,
            state_off: off,
        }
    }
}

impl EntityKind {
    /// Component name used in the discovery topic.
    pub fn discovery_class(&self) -> &'static str {
        match self {
            Self::Sensor(_) => "sensor",
            Self::BinarySensor(_) => "binary_sensor",
            Self::Switch(_) => "switch",
            Self::Light(_) => "light",
            Self::Fan(_) => "fan",
            Self::Number(_) => "number",
            Self::WaterHeater(_) => "water_heater",
        }
    }

    /// The topic the hub sends on/off or value commands to, if this kind has one.
    pub fn command_topic(&self) -> Option<&str> {
        match self {
            Self::Switch(m) => m.command_topic.as_deref(),
            Self::Light(m) => m.command_topic.as_deref(),
            Self::Fan(m) => m.command_topic.as_deref(),
            Self::Number(m) => m.command_topic.as_deref(),
            Self::Sensor(_) | Self::BinarySensor(_) | Self::WaterHeater(_) => None,
        }
    }

    /// Set the command topic. Returns false if this kind accepts no commands.
    pub fn set_command_topic(&mut self, topic: Option<String>) -> bool {
        let slot = match self {
            Self::Switch(m) => &mut m.command_topic,
            Self::Light(m) => &mut m.command_topic,
            Self::Fan(m) => &mut m.command_topic,
            Self::Number(m) => &mut m.command_topic,
            Self::Sensor(_) | Self::BinarySensor(_) | Self::WaterHeater(_) => return false,
        };
        *slot = topic;
        true
    }

    /// On/off payloads with the hub's defaults filled in.
    pub fn on_off_payloads(&self) -> OnOffPayloads {
        match self {
            Self::Switch(m) => {
                let command_on = m.payload_on.clone().unwrap_or_else(|| "ON".to_string());
                let command_off = m.payload_off.clone().unwrap_or_else(|| "OFF".to_string());
                OnOffPayloads {
                    state_on: m.state_on.clone().unwrap_or_else(|| command_on.clone()),
                    state_off: m.state_off.clone().unwrap_or_else(|| command_off.clone()),
                    command_on,
                    command_off,
                }
            }
            Self::Light(m) => OnOffPayloads::symmetric(m.payload_on.as_ref(), m.payload_off.as_ref()),
            Self::Fan(m) => OnOffPayloads::symmetric(m.payload_on.as_ref(), m.payload_off.as_ref()),
            Self::BinarySensor(m) => {
                OnOffPayloads::symmetric(m.payload_on.as_ref(), m.payload_off.as_ref())
            }
            Self::WaterHeater(m) => {
                OnOffPayloads::symmetric(m.payload_on.as_ref(), m.payload_off.as_ref())
            }
            Self::Sensor(_) | Self::Number(_) => OnOffPayloads::symmetric(None, None),
        }
    }
}

macro_rules! impl_from_kind {
    ($($model:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$model> for EntityKind {
                fn from(model: $model) -> Self {
                    Self::$variant(model)
                }
            }
        )*
    };
}

impl_from_kind!(
    SensorModel => Sensor,
    BinarySensorModel => BinarySensor,
    SwitchModel => Switch,
    LightModel => Light,
    FanModel => Fan,
    NumberModel => Number,
    WaterHeaterModel => WaterHeater,
);

/// Attribute bag of one entity.
///
/// `unique_id`, `object_id`, `device` and `state_topic` (plus the kind's
/// command topic) are linkage fields: they are written when the entity is
/// bound to a node and cleared when it is unbound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,

    /// QoS for state publishes and subscriptions
    pub qos: Qos,

    /// Whether state publishes are retained by the broker
    pub retain: bool,

    /// Text encoding of state and command payloads
    pub encoding: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Vec<Availability>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_mode: Option<AvailabilityMode>,

    #[serde(flatten)]
    pub kind: EntityKind,
}

impl EntityModel {
    pub fn new(kind: impl Into<EntityKind>) -> Self {
        Self {
            unique_id: None,
            object_id: None,
            name: None,
            device: None,
            state_topic: None,
            qos: Qos::default(),
            retain: false,
            encoding: DEFAULT_ENCODING.to_string(),
            icon: None,
            availability: None,
            availability_mode: None,
            kind: kind.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn discovery_class(&self) -> &'static str {
        self.kind.discovery_class()
    }

    pub fn command_topic(&self) -> Option<&str> {
        self.kind.command_topic()
    }

    /// True if any linkage field is set.
    pub fn is_linked(&self) -> bool {
        self.unique_id.is_some()
            || self.object_id.is_some()
            || self.device.is_some()
            || self.state_topic.is_some()
            || self.command_topic().is_some()
    }

    /// Discovery document: every set field, without the kind tag.
    pub fn discovery_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Encode an outgoing state string with the configured encoding.
    ///
    /// An empty encoding means raw bytes, which for a string is its UTF-8 form.
    pub fn encode_text(&self, text: &str) -> Result<Vec<u8>, Error> {
        match self.encoding.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "" => Ok(text.as_bytes().to_vec()),
            "ascii" | "us-ascii" if text.is_ascii() => Ok(text.as_bytes().to_vec()),
            _ => Err(Error::UnsupportedEncoding(self.encoding.clone())),
        }
    }

    /// Decode an incoming command payload. Invalid sequences are replaced,
    /// never rejected.
    pub fn decode_text(&self, payload: &[u8]) -> String {
        String::from_utf8_lossy(payload).into_owned()
    }
}
