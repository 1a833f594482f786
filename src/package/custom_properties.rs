//! Custom document properties (`docProps/custom.xml`)

use super::{xml, OfficePackage};
use crate::error::{MipError, MipResult};
use regex::Regex;
use std::fmt;
use tracing::debug;

pub const CUSTOM_PROPERTIES_PART: &str = "docProps/custom.xml";
pub const CUSTOM_PROPERTIES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.custom-properties+xml";
pub const CUSTOM_PROPERTIES_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/custom-properties";

/// Format id shared by all user-defined custom properties
const FMTID_USER_DEFINED: &str = "{D5CDD505-2E9C-101B-9397-08002B2CF9AE}";

/// A custom property value as stored in its `vt:*` variant element
///
/// The variant kind is kept so that values are written back with the type
/// they were read with.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A single `vt:<kind>` element holding text (`lpwstr`, `i4`, `i8`, `bool`, `filetime`...)
    Scalar { kind: String, text: String },
    /// A compound variant (`vt:vector`, `vt:array`...) kept as its raw XML
    Raw(String),
}

impl PropertyValue {
    /// A string value, written as `vt:lpwstr`
    pub fn text(value: impl Into<String>) -> Self {
        PropertyValue::Scalar {
            kind: "lpwstr".to_string(),
            text: value.into(),
        }
    }

    /// An integer value, written as `vt:i4`
    pub fn integer(value: i32) -> Self {
        PropertyValue::Scalar {
            kind: "i4".to_string(),
            text: value.to_string(),
        }
    }

    /// The `vt:` variant name, `None` for compound values
    pub fn kind(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar { kind, .. } => Some(kind),
            PropertyValue::Raw(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Scalar { kind, text } if is_integer_kind(kind) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Scalar { kind, text } if kind == "bool" => match text.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn to_xml(&self) -> String {
        match self {
            PropertyValue::Scalar { kind, text } => {
                format!("<vt:{}>{}</vt:{}>", kind, xml::escape(text), kind)
            }
            PropertyValue::Raw(raw) => raw.clone(),
        }
    }
}

fn is_integer_kind(kind: &str) -> bool {
    matches!(
        kind,
        "i1" | "i2" | "i4" | "i8" | "int" | "ui1" | "ui2" | "ui4" | "ui8" | "uint"
    )
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Scalar { text, .. } => f.write_str(text),
            PropertyValue::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::text(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::text(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomProperty {
    pub name: String,
    pub value: PropertyValue,
    /// Property set id, the user-defined set unless read otherwise
    pub fmtid: String,
    /// Bookmark or cell the property is linked to
    pub link_target: Option<String>,
}

/// Ordered set of custom document properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomProperties {
    properties: Vec<CustomProperty>,
}

impl CustomProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the custom properties part, `None` when the package has none
    pub fn from_package(package: &OfficePackage) -> MipResult<Option<Self>> {
        match package.part_str(CUSTOM_PROPERTIES_PART)? {
            Some(content) => Ok(Some(Self::parse(&content)?)),
            None => Ok(None),
        }
    }

    pub fn parse(content: &str) -> MipResult<Self> {
        let property = Regex::new(r"(?s)<(?:\w+:)?property\b([^>]*?)(?:/>|>(.*?)</(?:\w+:)?property\s*>)")
            .map_err(|e| MipError::Parse(format!("Regex error: {}", e)))?;
        let scalar = Regex::new(r"(?s)^<(?:\w+:)?(\w+)\b[^>]*?(?:/>|>([^<]*)</(?:\w+:)?(\w+)\s*>)$")
            .map_err(|e| MipError::Parse(format!("Regex error: {}", e)))?;
        let scanner = xml::XmlScanner::new()?;

        let mut properties = Vec::new();
        for caps in property.captures_iter(content) {
            let mut attrs = scanner.attributes(&caps[1]);
            let name = attrs.remove("name").ok_or_else(|| {
                MipError::Parse("Custom property without a name".to_string())
            })?;

            let body = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            let value = match scalar.captures(body) {
                Some(v) if v.get(3).map_or(true, |close| close.as_str() == &v[1]) => {
                    let raw = v.get(2).map(|m| m.as_str()).unwrap_or_default();
                    PropertyValue::Scalar {
                        kind: v[1].to_string(),
                        text: scanner.unescape(raw),
                    }
                }
                _ if body.is_empty() => PropertyValue::text(""),
                _ => PropertyValue::Raw(body.to_string()),
            };

            properties.push(CustomProperty {
                name,
                value,
                fmtid: attrs
                    .remove("fmtid")
                    .unwrap_or_else(|| FMTID_USER_DEFINED.to_string()),
                link_target: attrs.remove("linkTarget"),
            });
        }

        Ok(Self { properties })
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomProperty> {
        self.properties.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Replace the property named `name`, or append it
    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) {
        let value = value.into();
        debug!(name, value = %value, "SetProperty");
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.properties.push(CustomProperty {
                name: name.to_string(),
                value,
                fmtid: FMTID_USER_DEFINED.to_string(),
                link_target: None,
            }),
        }
    }

    /// Remove every property whose name starts with `prefix`
    pub fn remove_prefixed(&mut self, prefix: &str) -> usize {
        let before = self.properties.len();
        self.properties.retain(|p| !p.name.starts_with(prefix));
        before - self.properties.len()
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
        );
        for (index, property) in self.properties.iter().enumerate() {
            let link = property
                .link_target
                .as_deref()
                .map(|target| format!(r#" linkTarget="{}""#, xml::escape(target)))
                .unwrap_or_default();
            out.push_str(&format!(
                r#"<property fmtid="{}" pid="{}" name="{}"{}>{}</property>"#,
                xml::escape(&property.fmtid),
                index + 2,
                xml::escape(&property.name),
                link,
                property.value.to_xml()
            ));
        }
        out.push_str("</Properties>");
        out
    }

    /// Write the part into `package`, registering it when new
    pub fn attach(&self, package: &mut OfficePackage) -> MipResult<()> {
        package.set_part(CUSTOM_PROPERTIES_PART, self.to_xml());
        package.ensure_override(CUSTOM_PROPERTIES_PART, CUSTOM_PROPERTIES_CONTENT_TYPE)?;
        package.ensure_root_relationship(CUSTOM_PROPERTIES_REL_TYPE, CUSTOM_PROPERTIES_PART)?;
        Ok(())
    }
}
