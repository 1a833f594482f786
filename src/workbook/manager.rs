//! Sensitivity labels stored as `MSIP_Label_<id>_<field>` custom properties

use crate::error::MipResult;
use crate::office::LABEL_INFO_PART;
use crate::package::{CustomProperties, OfficePackage};
use crate::types::{LabelInfo, MipLabel};
use chrono::{SubsecRound, Utc};
use tracing::debug;
use uuid::Uuid;

/// Prefix shared by all label custom properties
pub const MSIP_PREFIX: &str = "MSIP_Label_";

/// Collect the label stored in `props`
///
/// When `label_id` is given only that label's properties are read. Field
/// suffixes that are not label attributes (`Extended_MSFT_Method`, `Tenant`)
/// are skipped.
pub fn label_info_from_properties(
    props: &CustomProperties,
    label_id: Option<&str>,
) -> MipResult<Option<LabelInfo>> {
    let mut info = LabelInfo::default();
    let mut found = false;

    for prop in props.iter() {
        debug!(name = %prop.name, value = %prop.value, "GetProperty");
        let Some(rest) = prop.name.strip_prefix(MSIP_PREFIX) else {
            continue;
        };
        let Some((id, field)) = rest.split_once('_') else {
            continue;
        };
        if label_id.is_some_and(|wanted| !wanted.eq_ignore_ascii_case(id)) {
            continue;
        }
        if info.apply_field(field, &prop.value.to_string())? {
            info.label_id = Some(id.to_string());
            found = true;
        }
    }

    Ok(found.then_some(info))
}

/// Replace any label properties in `props` with the fields of `label`
pub fn write_label_properties(props: &mut CustomProperties, label: &MipLabel) {
    let removed = props.remove_prefixed(MSIP_PREFIX);
    if removed > 0 {
        debug!(removed, "Removed previous label properties");
    }
    for (field, value) in label.custom_property_fields() {
        props.set(&format!("{}{}_{}", MSIP_PREFIX, label.label_id, field), value);
    }
}

/// Reads and writes the MIP label of a workbook's custom document properties
pub struct MsipManager<'a> {
    package: &'a mut OfficePackage,
}

impl<'a> MsipManager<'a> {
    pub fn new(package: &'a mut OfficePackage) -> Self {
        Self { package }
    }

    /// The label found in the custom properties, `None` if there is none
    pub fn get_label(&self) -> MipResult<Option<MipLabel>> {
        let Some(props) = CustomProperties::from_package(&*self.package)? else {
            return Ok(None);
        };
        match label_info_from_properties(&props, None)? {
            Some(info) => Ok(Some(info.into_label()?)),
            None => Ok(None),
        }
    }

    /// Stamp `label` onto the workbook
    ///
    /// `SetDate` becomes now, `justification` (when given) replaces the
    /// record's, and a fresh `ActionId` is generated if the record has none.
    /// A built-in label (`docMetadata/LabelInfo.xml`) left by an earlier
    /// labeling is removed. Returns the label as written.
    pub fn set_label(
        &mut self,
        label: &MipLabel,
        justification: Option<&str>,
    ) -> MipResult<MipLabel> {
        label.validate()?;

        let mut stamped = label.clone();
        if let Some(text) = justification {
            stamped.justification = Some(text.to_string());
        }
        stamped.set_date = Some(Utc::now().trunc_subsecs(0));
        if stamped.action_id.is_none() {
            stamped.action_id = Some(Uuid::new_v4().to_string());
        }

        let mut props = CustomProperties::from_package(&*self.package)?.unwrap_or_default();
        write_label_properties(&mut props, &stamped);
        props.attach(self.package)?;
        if self.package.detach_part(LABEL_INFO_PART)? {
            debug!("Removed previous built-in label");
        }

        debug!(label_id = %stamped.label_id, label_name = %stamped.label_name, "Label set");
        Ok(stamped)
    }
}
