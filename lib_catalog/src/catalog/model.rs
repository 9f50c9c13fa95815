//! # Rights and Assets Document Models
//!
//! Typed views of the two JSON payloads. Every nested field is optional:
//! a missing key or an explicit `null` deserializes to an empty collection or
//! `None`, so the query code never has to guard individual lookups.
//!
//! Only the fields the queries read are modelled; everything else in the
//! payloads is ignored.

use super::timestamps::{parse_term_timestamp, TimestampError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// # Null As Default
///
/// `#[serde(default)]` only covers absent keys. This deserializer also maps an
/// explicit JSON `null` to `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A string field; any other JSON type reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// A join key: strings are kept, numbers are rendered as their decimal text.
fn lenient_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        _ => Ok(None),
    }
}

/// A timestamp field. Non-string values keep their JSON text so that parsing
/// fails on them and the window is reported instead of the whole document.
fn raw_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Ok(Some(other.to_string())),
    }
}

/// The rights ("vq") payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RightsDocument {
    /// Content items, in document order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<RightsEntry>,
}

/// One content item of the rights payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RightsEntry {
    /// Join key towards [`AssetEntry::content_id`].
    #[serde(default, deserialize_with = "lenient_key")]
    pub content_id: Option<String>,
    /// Licensing terms.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rights: Rights,
    /// Localized titles.
    #[serde(default, deserialize_with = "null_as_default")]
    pub localizable_information: Vec<LocalizedInfo>,
}

/// The `rights` object of an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rights {
    /// Term windows, in document order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub terms: Vec<TermWindow>,
}

/// # Term Window
///
/// A licensing period with its eligible device platforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermWindow {
    /// Eligible devices.
    #[serde(default, deserialize_with = "null_as_default")]
    pub devices: Vec<Device>,
    /// Start of the window, e.g. `2024-01-01T00:00:00Z`.
    #[serde(default, deserialize_with = "raw_timestamp")]
    pub start_date_time: Option<String>,
    /// End of the window, e.g. `2024-12-31T23:59:59Z`.
    #[serde(default, deserialize_with = "raw_timestamp")]
    pub end_date_time: Option<String>,
}

/// A device entry inside a term window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Platform identifier such as `ROKU`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_platform: Option<String>,
}

/// A localized information record of an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedInfo {
    /// The medium-length title.
    #[serde(default, deserialize_with = "lenient_string")]
    pub title_name_medium: Option<String>,
}

/// The assets ("tq") payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetsDocument {
    /// Content items, in document order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<AssetEntry>,
}

/// One content item of the assets payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    /// Join key towards [`RightsEntry::content_id`].
    #[serde(default, deserialize_with = "lenient_key")]
    pub content_id: Option<String>,
    /// Renditions of the item.
    #[serde(default, deserialize_with = "null_as_default")]
    pub assets: Vec<Asset>,
}

/// One rendition of a content item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Format label such as `HD` or `SD`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub video_format: Option<String>,
    /// Delivery endpoints.
    #[serde(default, deserialize_with = "null_as_default")]
    pub endpoints: Vec<Endpoint>,
}

/// A manifest location on a CDN origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Origin / CDN tier identifier.
    #[serde(default, deserialize_with = "lenient_string")]
    pub origin: Option<String>,
    /// Manifest path.
    #[serde(default, deserialize_with = "lenient_string")]
    pub path: Option<String>,
}

impl RightsEntry {
    /// Non-empty localized titles, in document order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.localizable_information
            .iter()
            .filter_map(|info| info.title())
            .filter(|title| !title.is_empty())
    }

    /// Whether any term window lists `platform` among its devices.
    pub fn playable_on(&self, platform: &str) -> bool {
        self.rights.terms.iter().any(|term| term.lists_platform(platform))
    }
}

impl LocalizedInfo {
    /// The title, if present.
    pub fn title(&self) -> Option<&str> {
        self.title_name_medium.as_deref()
    }
}

impl TermWindow {
    /// Whether one of the devices has exactly this platform.
    pub fn lists_platform(&self, platform: &str) -> bool {
        self.devices
            .iter()
            .any(|device| device.device_platform.as_deref() == Some(platform))
    }

    /// Parsed `(start, end)` of the window.
    pub fn bounds(&self) -> Result<(NaiveDateTime, NaiveDateTime), TimestampError> {
        let start = parse_term_timestamp(self.start_date_time.as_deref())?;
        let end = parse_term_timestamp(self.end_date_time.as_deref())?;
        Ok((start, end))
    }
}

impl Asset {
    /// The first endpoint descriptor, the only one inspected for the origin check.
    pub fn first_endpoint(&self) -> Option<&Endpoint> {
        self.endpoints.first()
    }
}

impl AssetsDocument {
    /// Asset entries whose `contentId` equals `content_id`.
    pub fn entries_for<'a>(&'a self, content_id: &'a str) -> impl Iterator<Item = &'a AssetEntry> + 'a {
        self.results
            .iter()
            .filter(move |entry| entry.content_id.as_deref() == Some(content_id))
    }
}
