//! Configuration file parsing and structures.
//!
//! hassnode reads one TOML file describing the broker connection, the node
//! (device) to announce, logging, and the entities to expose under it.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::filter::LevelFilter;

use crate::entity::{Capability, Entity, Level, Probe, Toggle};
use crate::model::{
    BinarySensorDeviceClass, BinarySensorModel, DeviceInfo, EntityKind, EntityModel, LightModel,
    NumberMode, NumberModel, SensorDeviceClass, SensorModel, SensorStateClass, SwitchDeviceClass,
    SwitchModel,
};
use crate::topics::{self, DEFAULT_DISCOVERY_PREFIX};

/// Top-level configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `hassnode::client = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

fn default_port() -> u16 {
    1883
}

fn default_keep_alive_secs() -> u64 {
    30
}

/// MQTT broker connection
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub broker: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Defaults to `hassnode-{node id}`
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_discovery_prefix() -> String {
    DEFAULT_DISCOVERY_PREFIX.to_string()
}

fn default_publish_interval_secs() -> u64 {
    60
}

/// The device announced to the hub
#[derive(Debug, Deserialize)]
pub struct NodeConfig {
    /// Node id used in every topic; defaults to the machine's hostname
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,

    /// Publish discovery documents retained
    #[serde(default)]
    pub retain_discovery: bool,

    /// Seconds between state publications of all entities
    #[serde(default = "default_publish_interval_secs")]
    pub publish_interval_secs: u64,

    #[serde(default)]
    pub device: DeviceInfo,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: None,
            discovery_prefix: default_discovery_prefix(),
            retain_discovery: false,
            publish_interval_secs: default_publish_interval_secs(),
            device: DeviceInfo::default(),
        }
    }
}

impl NodeConfig {
    /// The configured id, or the hostname made safe for use as a topic level.
    pub fn resolved_id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }

        let host = hostname::get()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = sanitize_id(&host);
        if id.is_empty() { "hassnode".to_string() } else { id }
    }
}

/// Lowercase `raw` and replace anything but letters, digits, `-` and `_`.
fn sanitize_id(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// One entity exposed under the node
#[derive(Debug, Clone, Deserialize)]
pub struct EntityConfig {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(flatten)]
    pub kind: EntityKindConfig,
}

/// Kind-specific entity settings, selected by `kind = "..."`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityKindConfig {
    /// Reads its value from a file, e.g. under /sys
    Sensor {
        source: PathBuf,
        #[serde(default)]
        unit: Option<String>,
        #[serde(default)]
        device_class: Option<SensorDeviceClass>,
        #[serde(default)]
        state_class: Option<SensorStateClass>,
    },
    /// Reads `1`/`0`, `true`/`false` or `on`/`off` from a file
    BinarySensor {
        source: PathBuf,
        #[serde(default)]
        device_class: Option<BinarySensorDeviceClass>,
    },
    Switch {
        #[serde(default)]
        initial: bool,
        #[serde(default)]
        device_class: Option<SwitchDeviceClass>,
    },
    Light {
        #[serde(default)]
        initial: bool,
    },
    Number {
        #[serde(default)]
        initial: Option<f64>,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        step: Option<f64>,
        #[serde(default)]
        unit: Option<String>,
        #[serde(default)]
        mode: Option<NumberMode>,
    },
}

/// Read a file and return its trimmed contents.
///
/// Runs synchronously on whichever thread asks for the state, so it suits
/// small files such as sysfs attributes, not slow devices.
fn read_source(path: &Path) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    Ok(contents.trim().to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl EntityConfig {
    /// Create the detached entity this entry describes.
    pub fn build(&self) -> Entity {
        let (kind, capability): (EntityKind, Arc<dyn Capability>) = match &self.kind {
            EntityKindConfig::Sensor {
                source,
                unit,
                device_class,
                state_class,
            } => {
                let source = source.clone();
                (
                    SensorModel {
                        unit_of_measurement: unit.clone(),
                        device_class: *device_class,
                        state_class: *state_class,
                        ..Default::default()
                    }
                    .into(),
                    Arc::new(Probe::new(move || read_source(&source))),
                )
            }
            EntityKindConfig::BinarySensor {
                source,
                device_class,
            } => {
                let source = source.clone();
                (
                    BinarySensorModel {
                        device_class: *device_class,
                        ..Default::default()
                    }
                    .into(),
                    Arc::new(Probe::new(move || {
                        let raw = read_source(&source)?;
                        match parse_flag(&raw) {
                            Some(true) => Ok("ON".to_string()),
                            Some(false) => Ok("OFF".to_string()),
                            None => Err(format!("unexpected binary value {:?}", raw).into()),
                        }
                    })),
                )
            }
            EntityKindConfig::Switch {
                initial,
                device_class,
            } => (
                SwitchModel {
                    device_class: *device_class,
                    ..Default::default()
                }
                .into(),
                Arc::new(Toggle::new(*initial)),
            ),
            EntityKindConfig::Light { initial } => {
                (LightModel::default().into(), Arc::new(Toggle::new(*initial)))
            }
            EntityKindConfig::Number {
                initial,
                min,
                max,
                step,
                unit,
                mode,
            } => {
                let defaults = NumberModel::default();
                let model = NumberModel {
                    min: min.or(defaults.min),
                    max: max.or(defaults.max),
                    step: step.or(defaults.step),
                    unit_of_measurement: unit.clone(),
                    mode: *mode,
                    ..defaults
                };
                let value = model.clamp(initial.unwrap_or(0.0));
                (model.into(), Arc::new(Level::new(value)))
            }
        };

        let mut model = EntityModel::new(kind);
        model.name = self.name.clone();
        model.icon = self.icon.clone();

        Entity::new(self.id.clone(), model, capability)
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        let config: Config = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.validate()?;

        Ok(config)
    }

    /// Check the constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(id) = &self.node.id {
            if !topics::is_valid_segment(id) {
                return Err(ConfigError::Invalid(format!("invalid node id {:?}", id)));
            }
        }

        let prefix = &self.node.discovery_prefix;
        if prefix.is_empty() || prefix.contains(['+', '#']) {
            return Err(ConfigError::Invalid(format!(
                "invalid discovery prefix {:?}",
                prefix
            )));
        }

        if self.node.publish_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "publish_interval_secs must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !topics::is_valid_segment(&entity.id) {
                return Err(ConfigError::Invalid(format!(
                    "invalid entity id {:?}",
                    entity.id
                )));
            }
            if !seen.insert(entity.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate entity id {:?}",
                    entity.id
                )));
            }
            if let EntityKindConfig::Number { min, max, .. } = &entity.kind {
                // An omitted bound takes its default, as in `build`.
                let defaults = NumberModel::default();
                if let (Some(min), Some(max)) = (min.or(defaults.min), max.or(defaults.max)) {
                    if min > max {
                        return Err(ConfigError::Invalid(format!(
                            "entity {:?}: min {} is greater than max {}",
                            entity.id, min, max
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL: &str = r#"
        [mqtt]
        broker = "localhost"
    "#;

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.keep_alive_secs, 30);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.node.discovery_prefix, "homeassistant");
        assert_eq!(config.node.publish_interval_secs, 60);
        assert!(!config.node.retain_discovery);
        assert!(config.entities.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [mqtt]
            broker = "mqtt.lan"
            port = 8883
            client_id = "boiler-room"
            username = "hassnode"
            password = "secret"

            [node]
            id = "boiler1"
            retain_discovery = true

            [node.device]
            name = "Boiler"
            manufacturer = "Protherm"
            sw_version = 3
            identifiers = ["boiler1"]

            [logging]
            level = "debug"

            [logging.overrides]
            rumqttc = "warn"

            [[entities]]
            id = "temp"
            name = "Boiler temperature"
            kind = "sensor"
            source = "/sys/class/thermal/thermal_zone0/temp"
            unit = "°C"
            device_class = "temperature"
            state_class = "measurement"

            [[entities]]
            id = "relay1"
            kind = "switch"
            initial = true

            [[entities]]
            id = "setpoint"
            kind = "number"
            min = 30
            max = 80
            step = 0.5
            mode = "slider"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.mqtt.username.as_deref(), Some("hassnode"));
        assert_eq!(config.node.resolved_id(), "boiler1");
        assert!(config.node.retain_discovery);
        assert_eq!(config.node.device.sw_version.as_deref(), Some("3"));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.overrides["rumqttc"], LogLevel::Warn);

        assert_eq!(config.entities.len(), 3);
        assert!(matches!(
            &config.entities[0].kind,
            EntityKindConfig::Sensor {
                device_class: Some(SensorDeviceClass::Temperature),
                ..
            }
        ));
        assert!(matches!(
            config.entities[1].kind,
            EntityKindConfig::Switch { initial: true, .. }
        ));
        assert!(matches!(
            config.entities[2].kind,
            EntityKindConfig::Number {
                mode: Some(NumberMode::Slider),
                ..
            }
        ));
    }

    fn with_entities(entities: &str) -> Config {
        toml::from_str(&format!("{MINIMAL}\n{entities}")).unwrap()
    }

    #[test]
    fn test_rejects_duplicate_entity_ids() {
        let config = with_entities(
            r#"
            [[entities]]
            id = "relay1"
            kind = "switch"

            [[entities]]
            id = "relay1"
            kind = "light"
            "#,
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate entity id"));
    }

    #[test]
    fn test_rejects_ids_unusable_in_topics() {
        let config = with_entities(
            r#"
            [[entities]]
            id = "relay/1"
            kind = "switch"
            "#,
        );
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.node.id = Some("boiler#1".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.node.id = Some(String::new());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_inverted_number_range() {
        let config = with_entities(
            r#"
            [[entities]]
            id = "setpoint"
            kind = "number"
            min = 80
            max = 30
            "#,
        );
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_range_inverted_by_default_bound() {
        let config = with_entities(
            r#"
            [[entities]]
            id = "valve"
            kind = "number"
            max = 0.5
            "#,
        );
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("valve")));

        let config = with_entities(
            r#"
            [[entities]]
            id = "setpoint"
            kind = "number"
            max = 50
            "#,
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let result: Result<Config, _> = toml::from_str(&format!(
            "{MINIMAL}\n[[entities]]\nid = \"x\"\nkind = \"vacuum\"\n"
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{MINIMAL}").unwrap();
        writeln!(file, "[node]\nid = \"boiler1\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.node.resolved_id(), "boiler1");
    }

    #[test]
    fn test_from_file_errors() {
        let err = Config::from_file("/nonexistent/hassnode.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[mqtt").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{MINIMAL}\n[node]\npublish_interval_secs = 0").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("Boiler-Room.local"), "boiler-room_local");
        assert_eq!(sanitize_id(" pi 4 "), "pi_4");
        assert!(topics::is_valid_segment(&sanitize_id("a/b+c#d")));
    }

    #[test]
    fn test_hostname_fallback_is_valid_segment() {
        let node = NodeConfig::default();
        assert!(topics::is_valid_segment(&node.resolved_id()));
    }

    #[test]
    fn test_build_file_backed_sensor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, "21500\n").unwrap();

        let config = with_entities(&format!(
            r#"
            [[entities]]
            id = "temp"
            name = "Boiler temperature"
            kind = "sensor"
            source = "{}"
            unit = "m°C"
            "#,
            path.display()
        ));
        let entity = config.entities[0].build();

        assert_eq!(entity.id(), "temp");
        assert_eq!(entity.get_state().unwrap(), "21500");
        let model = entity.model();
        assert_eq!(model.discovery_class(), "sensor");
        assert_eq!(model.name.as_deref(), Some("Boiler temperature"));

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(entity.get_state(), Err(crate::Error::Read(_))));
    }

    #[test]
    fn test_build_binary_sensor_maps_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("door");
        std::fs::write(&path, "1\n").unwrap();

        let config = with_entities(&format!(
            r#"
            [[entities]]
            id = "door"
            kind = "binary_sensor"
            source = "{}"
            device_class = "door"
            "#,
            path.display()
        ));
        let entity = config.entities[0].build();
        assert_eq!(entity.get_state().unwrap(), "ON");

        std::fs::write(&path, "off").unwrap();
        assert_eq!(entity.get_state().unwrap(), "OFF");

        std::fs::write(&path, "maybe").unwrap();
        assert!(entity.get_state().is_err());
    }

    #[test]
    fn test_build_actuators() {
        let config = with_entities(
            r#"
            [[entities]]
            id = "relay1"
            kind = "switch"
            initial = true

            [[entities]]
            id = "setpoint"
            kind = "number"
            initial = 95
            max = 80
            "#,
        );

        let relay = config.entities[0].build();
        assert_eq!(relay.model().discovery_class(), "switch");
        assert_eq!(relay.get_state().unwrap(), "ON");

        let setpoint = config.entities[1].build();
        assert_eq!(setpoint.get_state().unwrap(), "80");
        match setpoint.model().kind {
            EntityKind::Number(number) => {
                assert_eq!(number.min, Some(1.0));
                assert_eq!(number.max, Some(80.0));
            }
            other => panic!("expected number, got {other:?}"),
        }
    }
}
