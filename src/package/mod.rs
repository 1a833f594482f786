//! OOXML package access
//!
//! Office documents (.docx, .xlsx) are zip containers of XML parts. This
//! module keeps every part of a container in memory so that label metadata
//! can be read and rewritten without touching the rest of the document:
//! - `[Content_Types].xml` overrides for new parts
//! - `_rels/.rels` root relationships for new parts
//! - `docProps/custom.xml` custom document properties

pub mod custom_properties;
pub mod xml;

pub use custom_properties::{CustomProperties, CustomProperty, PropertyValue};

use crate::error::{MipError, MipResult};
use regex::Regex;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const ROOT_RELS_PART: &str = "_rels/.rels";

const EMPTY_RELATIONSHIPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
);

/// Largest buffer reserved up front from a part's declared size
const MAX_PART_PREALLOCATION: usize = 1 << 20;

/// Buffer size to reserve for a part whose zip header declares `declared` bytes
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared)
        .unwrap_or(MAX_PART_PREALLOCATION)
        .min(MAX_PART_PREALLOCATION)
}

/// An OOXML container held in memory, parts kept in archive order
#[derive(Debug, Clone, Default)]
pub struct OfficePackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl OfficePackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a package from disk
    pub fn open<P: AsRef<Path>>(path: P) -> MipResult<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Read a package from its zip bytes
    pub fn from_bytes(bytes: &[u8]) -> MipResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::with_capacity(initial_capacity(entry.size()));
            entry.read_to_end(&mut data)?;
            parts.push((name, data));
        }

        debug!(parts = parts.len(), "Loaded OOXML package");
        Ok(Self { parts })
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|(part, _)| part == name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(part, _)| part == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Part content as UTF-8 text
    pub fn part_str(&self, name: &str) -> MipResult<Option<String>> {
        match self.part(name) {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| MipError::Parse(format!("Part {} is not UTF-8: {}", name, e))),
            None => Ok(None),
        }
    }

    /// Insert or replace a part
    pub fn set_part(&mut self, name: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        match self.parts.iter_mut().find(|(part, _)| part == name) {
            Some(entry) => entry.1 = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        let index = self.parts.iter().position(|(part, _)| part == name)?;
        Some(self.parts.remove(index).1)
    }

    /// Remove a part together with its content type override and root relationship
    ///
    /// Returns whether the part was present.
    pub fn detach_part(&mut self, part_name: &str) -> MipResult<bool> {
        let part_name = part_name.trim_start_matches('/');
        let removed = self.remove_part(part_name).is_some();
        let scanner = xml::XmlScanner::new()?;

        if let Some(types) = self.part_str(CONTENT_TYPES_PART)? {
            let overrides = Regex::new(r"<Override\b[^>]*?/>")
                .map_err(|e| MipError::Parse(format!("Regex error: {}", e)))?;
            let updated = overrides.replace_all(&types, |caps: &regex::Captures| {
                let attrs = scanner.attributes(&caps[0]);
                match attrs.get("PartName") {
                    Some(name) if name.trim_start_matches('/') == part_name => String::new(),
                    _ => caps[0].to_string(),
                }
            });
            if updated != types {
                self.set_part(CONTENT_TYPES_PART, updated.into_owned());
            }
        }

        if let Some(rels) = self.part_str(ROOT_RELS_PART)? {
            let relationships = Regex::new(r"<Relationship\b[^>]*?/>")
                .map_err(|e| MipError::Parse(format!("Regex error: {}", e)))?;
            let updated = relationships.replace_all(&rels, |caps: &regex::Captures| {
                let attrs = scanner.attributes(&caps[0]);
                match attrs.get("Target") {
                    Some(target) if target.trim_start_matches('/') == part_name => String::new(),
                    _ => caps[0].to_string(),
                }
            });
            if updated != rels {
                self.set_part(ROOT_RELS_PART, updated.into_owned());
            }
        }

        if removed {
            debug!(part = part_name, "Detached part");
        }
        Ok(removed)
    }

    /// Make sure `[Content_Types].xml` declares `content_type` for `part_name`
    ///
    /// `part_name` is the package-relative name without a leading slash.
    pub fn ensure_override(&mut self, part_name: &str, content_type: &str) -> MipResult<()> {
        let types = self.part_str(CONTENT_TYPES_PART)?.ok_or_else(|| {
            MipError::Parse(format!("Package has no {}", CONTENT_TYPES_PART))
        })?;

        let absolute = format!("/{}", part_name.trim_start_matches('/'));
        if types.contains(&format!("PartName=\"{}\"", absolute)) {
            return Ok(());
        }

        let close = types
            .rfind("</Types>")
            .ok_or_else(|| MipError::Parse(format!("Malformed {}", CONTENT_TYPES_PART)))?;
        let mut updated = types.clone();
        updated.insert_str(
            close,
            &format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                xml::escape(&absolute),
                xml::escape(content_type)
            ),
        );
        debug!(part = %absolute, content_type, "Added content type override");
        self.set_part(CONTENT_TYPES_PART, updated);
        Ok(())
    }

    /// Make sure `_rels/.rels` holds a relationship of `rel_type` to `target`
    ///
    /// Returns the relationship id, reusing an existing one of the same type.
    pub fn ensure_root_relationship(&mut self, rel_type: &str, target: &str) -> MipResult<String> {
        let rels = self
            .part_str(ROOT_RELS_PART)?
            .unwrap_or_else(|| EMPTY_RELATIONSHIPS.to_string());

        let relationship = Regex::new(r"<Relationship\b[^>]*>")
            .map_err(|e| MipError::Parse(format!("Regex error: {}", e)))?;
        let scanner = xml::XmlScanner::new()?;

        let mut next_id = 1u32;
        for tag in relationship.find_iter(&rels) {
            let attrs = scanner.attributes(tag.as_str());
            if attrs.get("Type").map(String::as_str) == Some(rel_type) {
                return Ok(attrs.get("Id").cloned().unwrap_or_default());
            }
            if let Some(n) = attrs
                .get("Id")
                .and_then(|id| id.strip_prefix("rId"))
                .and_then(|n| n.parse::<u32>().ok())
            {
                next_id = next_id.max(n + 1);
            }
        }

        let id = format!("rId{}", next_id);
        let entry = format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id,
            xml::escape(rel_type),
            xml::escape(target)
        );

        let updated = match rels.rfind("</Relationships>") {
            Some(close) => {
                let mut updated = rels.clone();
                updated.insert_str(close, &entry);
                updated
            }
            None => {
                // Self-closing root element
                let open = rels
                    .rfind("/>")
                    .ok_or_else(|| MipError::Parse(format!("Malformed {}", ROOT_RELS_PART)))?;
                format!("{}>{}</Relationships>", &rels[..open], entry)
            }
        };

        debug!(id = %id, rel_type, target, "Added root relationship");
        self.set_part(ROOT_RELS_PART, updated);
        Ok(id)
    }

    /// Serialize the package as zip bytes
    pub fn to_bytes(&self) -> MipResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write the package to disk, replacing any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> MipResult<()> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path.as_ref(), bytes)?;
        debug!(path = %path.as_ref().display(), "Saved OOXML package");
        Ok(())
    }
}
