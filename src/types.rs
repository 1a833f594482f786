use crate::error::{MipError, MipResult};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

//==============================================================================
// Assignment Method
//==============================================================================

/// How a sensitivity label was assigned to a document
///
/// Numeric values match the Office `MsoAssignmentMethod` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentMethod {
    NotSet,
    Standard,
    Privileged,
    Auto,
}

impl AssignmentMethod {
    /// Office enumeration value
    pub fn value(self) -> i64 {
        match self {
            AssignmentMethod::NotSet => -1,
            AssignmentMethod::Standard => 0,
            AssignmentMethod::Privileged => 1,
            AssignmentMethod::Auto => 2,
        }
    }

    /// Name as stored in `MSIP_Label_*_Method` and `LabelInfo.xml`
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentMethod::NotSet => "NotSet",
            AssignmentMethod::Standard => "Standard",
            AssignmentMethod::Privileged => "Privileged",
            AssignmentMethod::Auto => "Auto",
        }
    }

    pub fn from_value(value: i64) -> MipResult<Self> {
        match value {
            -1 => Ok(AssignmentMethod::NotSet),
            0 => Ok(AssignmentMethod::Standard),
            1 => Ok(AssignmentMethod::Privileged),
            2 => Ok(AssignmentMethod::Auto),
            other => Err(MipError::Parse(format!(
                "Unknown assignment method value: {}",
                other
            ))),
        }
    }

    /// Parse either the enumeration name (any case) or its numeric value
    ///
    /// The `Manual` / `Automatic` spellings written by the classic AIP client
    /// map to `Standard` / `Auto`.
    pub fn parse(text: &str) -> MipResult<Self> {
        let trimmed = text.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Self::from_value(value);
        }
        match trimmed.to_lowercase().replace('_', "").as_str() {
            "notset" => Ok(AssignmentMethod::NotSet),
            "standard" | "manual" => Ok(AssignmentMethod::Standard),
            "privileged" => Ok(AssignmentMethod::Privileged),
            "auto" | "automatic" => Ok(AssignmentMethod::Auto),
            _ => Err(MipError::Parse(format!(
                "Unknown assignment method: {}",
                trimmed
            ))),
        }
    }
}

impl fmt::Display for AssignmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AssignmentMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAssignmentMethod {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for AssignmentMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match RawAssignmentMethod::deserialize(deserializer)? {
            RawAssignmentMethod::Number(value) => AssignmentMethod::from_value(value),
            RawAssignmentMethod::Text(text) => AssignmentMethod::parse(&text),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

//==============================================================================
// Label Dates
//==============================================================================

/// Parse a label timestamp
///
/// Accepts RFC 3339 (`2024-03-01T10:20:30Z`), naive ISO-8601 with `T` or a
/// space separator (read as UTC), with or without fractional seconds.
pub fn parse_set_date(text: &str) -> MipResult<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(MipError::Parse(format!("Invalid label date: {}", trimmed)))
}

/// Format a label timestamp the way Office stores `SetDate`
pub fn format_set_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse the boolean spellings found in label properties
pub fn parse_flag(text: &str) -> MipResult<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(MipError::Parse(format!("Invalid boolean: {}", other))),
    }
}

mod set_date_format {
    use super::{format_set_date, parse_set_date};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&format_set_date(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(text) if !text.trim().is_empty() => parse_set_date(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

//==============================================================================
// Label Record
//==============================================================================

/// A Microsoft Information Protection label record
///
/// `label_id` and `label_name` are mandatory; everything else is metadata
/// captured from template documents and stamped back onto targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MipLabel {
    #[serde(rename = "LabelId")]
    pub label_id: String,

    #[serde(rename = "LabelName", alias = "Name")]
    pub label_name: String,

    #[serde(rename = "ActionId", default)]
    pub action_id: Option<String>,

    #[serde(rename = "AssignmentMethod", alias = "Method", default)]
    pub assignment_method: Option<AssignmentMethod>,

    #[serde(rename = "ContentBits", default)]
    pub content_bits: Option<i64>,

    #[serde(rename = "IsEnabled", alias = "Enabled", default)]
    pub is_enabled: Option<bool>,

    #[serde(rename = "Justification", default)]
    pub justification: Option<String>,

    #[serde(rename = "SetDate", default, with = "set_date_format")]
    pub set_date: Option<DateTime<Utc>>,

    #[serde(rename = "SiteId", default)]
    pub site_id: Option<String>,
}

impl MipLabel {
    pub fn new(label_id: impl Into<String>, label_name: impl Into<String>) -> Self {
        Self {
            label_id: label_id.into(),
            label_name: label_name.into(),
            action_id: None,
            assignment_method: None,
            content_bits: None,
            is_enabled: None,
            justification: None,
            set_date: None,
            site_id: None,
        }
    }

    /// Check the label id / label name invariant
    pub fn validate(&self) -> MipResult<()> {
        if self.label_id.trim().is_empty() {
            return Err(MipError::InvalidLabel("LabelId is missing".to_string()));
        }
        if self.label_name.trim().is_empty() {
            return Err(MipError::InvalidLabel(format!(
                "LabelName is missing for label {}",
                self.label_id
            )));
        }
        Ok(())
    }

    /// Populated fields as `(property suffix, string value)` pairs
    ///
    /// Suffixes are the ones Office uses in `MSIP_Label_<id>_<suffix>`
    /// custom properties. The label id is part of the property name and is
    /// not repeated here.
    pub fn custom_property_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(enabled) = self.is_enabled {
            fields.push(("Enabled", enabled.to_string()));
        }
        if let Some(date) = &self.set_date {
            fields.push(("SetDate", format_set_date(date)));
        }
        if let Some(method) = self.assignment_method {
            fields.push(("Method", method.as_str().to_string()));
        }
        fields.push(("Name", self.label_name.clone()));
        if let Some(site_id) = &self.site_id {
            fields.push(("SiteId", site_id.clone()));
        }
        if let Some(action_id) = &self.action_id {
            fields.push(("ActionId", action_id.clone()));
        }
        if let Some(bits) = self.content_bits {
            fields.push(("ContentBits", bits.to_string()));
        }
        if let Some(justification) = &self.justification {
            fields.push(("Justification", justification.clone()));
        }
        fields
    }
}

//==============================================================================
// Label Info (document view)
//==============================================================================

/// Label information as reported by a document
///
/// Unlike [`MipLabel`], every field is optional: an unlabeled document
/// yields an empty `LabelInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelInfo {
    #[serde(rename = "LabelId", skip_serializing_if = "Option::is_none", default)]
    pub label_id: Option<String>,

    #[serde(rename = "LabelName", skip_serializing_if = "Option::is_none", default)]
    pub label_name: Option<String>,

    #[serde(rename = "ActionId", skip_serializing_if = "Option::is_none", default)]
    pub action_id: Option<String>,

    #[serde(
        rename = "AssignmentMethod",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub assignment_method: Option<AssignmentMethod>,

    #[serde(rename = "ContentBits", skip_serializing_if = "Option::is_none", default)]
    pub content_bits: Option<i64>,

    #[serde(rename = "IsEnabled", skip_serializing_if = "Option::is_none", default)]
    pub is_enabled: Option<bool>,

    #[serde(
        rename = "Justification",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub justification: Option<String>,

    #[serde(
        rename = "SetDate",
        skip_serializing_if = "Option::is_none",
        default,
        with = "set_date_format"
    )]
    pub set_date: Option<DateTime<Utc>>,

    #[serde(rename = "SiteId", skip_serializing_if = "Option::is_none", default)]
    pub site_id: Option<String>,
}

impl LabelInfo {
    pub fn is_empty(&self) -> bool {
        *self == LabelInfo::default()
    }

    /// Apply one `MSIP_Label_<id>_<field>` property value
    ///
    /// Returns `false` when the field is not a known label attribute.
    pub fn apply_field(&mut self, field: &str, value: &str) -> MipResult<bool> {
        match field {
            "Name" | "LabelName" => self.label_name = Some(value.to_string()),
            "Method" | "AssignmentMethod" => match AssignmentMethod::parse(value) {
                Ok(method) => self.assignment_method = Some(method),
                Err(e) => warn!(value, error = %e, "Ignoring unrecognised assignment method"),
            },
            "ContentBits" => {
                let bits = value
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| MipError::Parse(format!("Invalid ContentBits '{}': {}", value, e)))?;
                self.content_bits = Some(bits);
            }
            "Enabled" | "IsEnabled" => self.is_enabled = Some(parse_flag(value)?),
            "Justification" => self.justification = Some(value.to_string()),
            "SetDate" => self.set_date = Some(parse_set_date(value)?),
            "SiteId" => self.site_id = Some(value.to_string()),
            "ActionId" => self.action_id = Some(value.to_string()),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Populated scalar attributes as a JSON object
    pub fn dump_info(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    /// Convert into a label record, enforcing the id / name invariant
    pub fn into_label(self) -> MipResult<MipLabel> {
        let label = MipLabel {
            label_id: self.label_id.unwrap_or_default(),
            label_name: self.label_name.unwrap_or_default(),
            action_id: self.action_id,
            assignment_method: self.assignment_method,
            content_bits: self.content_bits,
            is_enabled: self.is_enabled,
            justification: self.justification,
            set_date: self.set_date,
            site_id: self.site_id,
        };
        label.validate()?;
        Ok(label)
    }
}

impl From<MipLabel> for LabelInfo {
    fn from(label: MipLabel) -> Self {
        LabelInfo {
            label_id: Some(label.label_id),
            label_name: Some(label.label_name),
            action_id: label.action_id,
            assignment_method: label.assignment_method,
            content_bits: label.content_bits,
            is_enabled: label.is_enabled,
            justification: label.justification,
            set_date: label.set_date,
            site_id: label.site_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_assignment_method_parse_names_and_values() {
        assert_eq!(AssignmentMethod::parse("Standard").unwrap(), AssignmentMethod::Standard);
        assert_eq!(AssignmentMethod::parse("privileged").unwrap(), AssignmentMethod::Privileged);
        assert_eq!(AssignmentMethod::parse("Not_Set").unwrap(), AssignmentMethod::NotSet);
        assert_eq!(AssignmentMethod::parse("2").unwrap(), AssignmentMethod::Auto);
        assert_eq!(AssignmentMethod::parse("-1").unwrap(), AssignmentMethod::NotSet);
        assert!(AssignmentMethod::parse("7").is_err());
        assert!(AssignmentMethod::parse("Sometimes").is_err());
    }

    #[test]
    fn test_assignment_method_classic_client_spellings() {
        assert_eq!(AssignmentMethod::parse("Manual").unwrap(), AssignmentMethod::Standard);
        assert_eq!(AssignmentMethod::parse("Automatic").unwrap(), AssignmentMethod::Auto);
    }

    #[test]
    fn test_apply_field_tolerates_unknown_method() {
        let mut info = LabelInfo::default();
        assert!(info.apply_field("Method", "Delegated").unwrap());
        assert!(info.assignment_method.is_none());
        assert!(info.apply_field("Method", "Manual").unwrap());
        assert_eq!(info.assignment_method, Some(AssignmentMethod::Standard));
    }

    #[test]
    fn test_parse_set_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap();
        assert_eq!(parse_set_date("2024-03-01T10:20:30Z").unwrap(), expected);
        assert_eq!(parse_set_date("2024-03-01T10:20:30").unwrap(), expected);
        assert_eq!(parse_set_date("2024-03-01 10:20:30").unwrap(), expected);
        assert_eq!(parse_set_date("2024-03-01 10:20:30+00:00").unwrap(), expected);
        assert!(parse_set_date("yesterday").is_err());
    }

    #[test]
    fn test_parse_set_date_fractional_seconds() {
        let parsed = parse_set_date("2024-03-01T10:20:30.123456").unwrap();
        assert_eq!(format_set_date(&parsed), "2024-03-01T10:20:30Z");
    }

    #[test]
    fn test_label_accepts_aliases() {
        let json = r#"{"LabelId": "abc", "Name": "Public", "Method": 1, "Enabled": true}"#;
        let label: MipLabel = serde_json::from_str(json).unwrap();
        assert_eq!(label.label_name, "Public");
        assert_eq!(label.assignment_method, Some(AssignmentMethod::Privileged));
        assert_eq!(label.is_enabled, Some(true));
        assert!(label.set_date.is_none());
    }

    #[test]
    fn test_validate_rejects_missing_name() {
        let label = MipLabel::new("abc", " ");
        assert!(matches!(label.validate(), Err(MipError::InvalidLabel(_))));
        assert!(MipLabel::new("", "Public").validate().is_err());
    }

    #[test]
    fn test_apply_field_ignores_unknown() {
        let mut info = LabelInfo::default();
        assert!(!info.apply_field("Colour", "red").unwrap());
        assert!(info.apply_field("Enabled", "True").unwrap());
        assert_eq!(info.is_enabled, Some(true));
        assert!(info.apply_field("ContentBits", "x").is_err());
    }

    #[test]
    fn test_dump_info_skips_missing_fields() {
        let mut info = LabelInfo::default();
        info.label_id = Some("abc".to_string());
        info.content_bits = Some(0);
        let dump = info.dump_info();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump["LabelId"], "abc");
        assert_eq!(dump["ContentBits"], 0);
    }
}
