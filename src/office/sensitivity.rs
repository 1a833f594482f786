//! The document's built-in sensitivity label
//!
//! Office keeps the label applied through `Document.SensitivityLabel` in the
//! `docMetadata/LabelInfo.xml` part and mirrors it into `MSIP_Label_*` custom
//! properties. Both are read and written here.

use crate::error::{MipError, MipResult};
use crate::package::{xml, CustomProperties, OfficePackage};
use crate::types::{AssignmentMethod, LabelInfo};
use crate::workbook::{label_info_from_properties, write_label_properties};
use regex::Regex;
use tracing::{debug, warn};

pub const LABEL_INFO_PART: &str = "docMetadata/LabelInfo.xml";
pub const LABEL_INFO_CONTENT_TYPE: &str = "application/vnd.ms-office.classificationlabels+xml";
pub const LABEL_INFO_REL_TYPE: &str =
    "http://schemas.microsoft.com/office/2020/02/relationships/classificationlabels";

const LABEL_LIST_NAMESPACE: &str = "http://schemas.microsoft.com/office/2020/mipLabelMetadata";

/// Reads and assigns the sensitivity label of an open document
pub struct SensitivityLabelManager<'a> {
    document: &'a mut OfficePackage,
}

impl<'a> SensitivityLabelManager<'a> {
    pub fn new(document: &'a mut OfficePackage) -> Self {
        Self { document }
    }

    /// A blank label info to fill in before [`set_label`](Self::set_label)
    pub fn create_label_info(&self) -> LabelInfo {
        LabelInfo::default()
    }

    /// The document's current label, empty when it carries none
    pub fn get_label(&self) -> MipResult<LabelInfo> {
        let stored = match self.document.part_str(LABEL_INFO_PART)? {
            Some(content) => parse_label_list(&content)?,
            None => None,
        };
        let props = CustomProperties::from_package(&*self.document)?;

        let Some(stored) = stored else {
            // Documents labeled by older clients only carry the custom properties
            return Ok(match props {
                Some(props) => label_info_from_properties(&props, None)?.unwrap_or_default(),
                None => LabelInfo::default(),
            });
        };

        let mirrored = match (&props, stored.label_id.as_deref()) {
            (Some(props), Some(id)) => label_info_from_properties(props, Some(id))?,
            _ => None,
        };

        let mut info = mirrored.unwrap_or_default();
        info.label_id = stored.label_id;
        info.is_enabled = stored.is_enabled.or(info.is_enabled);
        info.site_id = stored.site_id.or(info.site_id);
        info.content_bits = stored.content_bits.or(info.content_bits);
        // LabelInfo.xml only knows Standard/Privileged; the mirror keeps the full value
        info.assignment_method = info.assignment_method.or(stored.assignment_method);
        Ok(info)
    }

    /// Assign `info` as the document's label
    ///
    /// The label id and name are required.
    pub fn set_label(&mut self, info: &LabelInfo) -> MipResult<()> {
        let label = info.clone().into_label()?;

        self.document
            .set_part(LABEL_INFO_PART, label_list_xml(info));
        self.document
            .ensure_override(LABEL_INFO_PART, LABEL_INFO_CONTENT_TYPE)?;
        self.document
            .ensure_root_relationship(LABEL_INFO_REL_TYPE, LABEL_INFO_PART)?;

        let mut props = CustomProperties::from_package(&*self.document)?.unwrap_or_default();
        write_label_properties(&mut props, &label);
        props.attach(self.document)?;

        debug!(label_id = %label.label_id, label_name = %label.label_name, "SetLabel");
        Ok(())
    }
}

/// Inspects a [`LabelInfo`]
pub struct LabelInfoManager {
    pub labelinfo: LabelInfo,
}

impl LabelInfoManager {
    pub fn new(labelinfo: LabelInfo) -> Self {
        Self { labelinfo }
    }

    /// All populated attributes of the label info
    pub fn dump_info(&self) -> serde_json::Map<String, serde_json::Value> {
        self.labelinfo.dump_info()
    }
}

fn strip_braces(value: &str) -> String {
    value
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .to_string()
}

/// First label of a `clbl:labelList` that has not been removed
fn parse_label_list(content: &str) -> MipResult<Option<LabelInfo>> {
    let label = Regex::new(r"<(?:\w+:)?label\b[^>]*>")
        .map_err(|e| MipError::Parse(format!("Regex error: {}", e)))?;
    let scanner = xml::XmlScanner::new()?;

    for tag in label.find_iter(content) {
        let attrs = scanner.attributes(tag.as_str());
        if attrs.get("removed").map(String::as_str) == Some("1") {
            continue;
        }
        let Some(id) = attrs.get("id") else {
            continue;
        };

        let mut info = LabelInfo {
            label_id: Some(strip_braces(id)),
            ..LabelInfo::default()
        };
        if let Some(enabled) = attrs.get("enabled") {
            info.is_enabled = Some(enabled.trim() == "1" || enabled.trim() == "true");
        }
        if let Some(method) = attrs.get("method") {
            match AssignmentMethod::parse(method) {
                Ok(parsed) => info.assignment_method = Some(parsed),
                Err(e) => warn!(method = %method, error = %e, "Ignoring unrecognised label method"),
            }
        }
        if let Some(site) = attrs.get("siteId") {
            info.site_id = Some(strip_braces(site));
        }
        if let Some(bits) = attrs.get("contentBits") {
            let parsed = bits
                .trim()
                .parse::<i64>()
                .map_err(|e| MipError::Parse(format!("Invalid contentBits '{}': {}", bits, e)))?;
            info.content_bits = Some(parsed);
        }
        return Ok(Some(info));
    }

    Ok(None)
}

fn label_list_xml(info: &LabelInfo) -> String {
    let mut attrs = vec![(
        "id",
        format!("{{{}}}", strip_braces(info.label_id.as_deref().unwrap_or_default())),
    )];
    attrs.push((
        "enabled",
        if info.is_enabled.unwrap_or(true) { "1" } else { "0" }.to_string(),
    ));
    let method = match info.assignment_method {
        Some(AssignmentMethod::Privileged) => Some("Privileged"),
        Some(AssignmentMethod::Standard) | Some(AssignmentMethod::Auto) => Some("Standard"),
        Some(AssignmentMethod::NotSet) | None => None,
    };
    if let Some(method) = method {
        attrs.push(("method", method.to_string()));
    }
    if let Some(site) = &info.site_id {
        attrs.push(("siteId", format!("{{{}}}", strip_braces(site))));
    }
    attrs.push(("contentBits", info.content_bits.unwrap_or(0).to_string()));
    attrs.push(("removed", "0".to_string()));

    let rendered: Vec<String> = attrs
        .iter()
        .map(|(name, value)| format!(r#"{}="{}""#, name, xml::escape(value)))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<clbl:labelList xmlns:clbl="{}"><clbl:label {} /></clbl:labelList>"#,
        LABEL_LIST_NAMESPACE,
        rendered.join(" ")
    )
}
