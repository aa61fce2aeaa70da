use serde::Deserialize;
use serde::Serialize;

/// Deserialize a field that can be either a string or an integer.
///
/// Firmware and hardware versions are often written as bare numbers in
/// configuration files (`sw_version = 3`), but the discovery schema defines
/// them as strings.
fn deserialize_string_or_int<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct StringOrInt;

    impl<'de> de::Visitor<'de> for StringOrInt {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("string, integer, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }
    }

    deserializer.deserialize_any(StringOrInt)
}

/// Device descriptor shared by every entity of a node.
///
/// Serialized as the `device` object of each discovery payload, so that the
/// hub groups the entities under one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    /// Link to the device's own configuration page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_url: Option<String>,

    /// Connection tuples, e.g. `("mac", "02:5b:26:a8:dc:12")`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<(String, String)>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_string_or_int"
    )]
    pub hw_version: Option<String>,

    /// List of identifiers for this device
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_area: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_string_or_int"
    )]
    pub sw_version: Option<String>,

    /// Identifier of a device that routes messages for this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via_device: Option<String>,
}
