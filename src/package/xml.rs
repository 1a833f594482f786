//! Small XML helpers for the machine-written OOXML parts we touch

use crate::error::{MipError, MipResult};
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Escape text for use in element content or a double-quoted attribute
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Entity and attribute patterns, compiled once and reused for a whole part
pub struct XmlScanner {
    entity: Regex,
    attribute: Regex,
}

impl XmlScanner {
    pub fn new() -> MipResult<Self> {
        let entity = Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);")
            .map_err(|e| MipError::Parse(format!("Regex error: {}", e)))?;
        let attribute = Regex::new(r#"([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .map_err(|e| MipError::Parse(format!("Regex error: {}", e)))?;
        Ok(Self { entity, attribute })
    }

    /// Resolve the predefined entities and numeric character references
    ///
    /// References that do not name a valid character are left as written.
    pub fn unescape(&self, text: &str) -> String {
        if !text.contains('&') {
            return text.to_string();
        }

        self.entity
            .replace_all(text, |caps: &Captures| {
                let name = &caps[1];
                match name {
                    "amp" => "&".to_string(),
                    "lt" => "<".to_string(),
                    "gt" => ">".to_string(),
                    "quot" => "\"".to_string(),
                    "apos" => "'".to_string(),
                    _ => {
                        let code = if let Some(hex) = name.strip_prefix("#x") {
                            u32::from_str_radix(hex, 16).ok()
                        } else {
                            name[1..].parse::<u32>().ok()
                        };
                        code.and_then(char::from_u32)
                            .map(String::from)
                            .unwrap_or_else(|| caps[0].to_string())
                    }
                }
            })
            .into_owned()
    }

    /// Attributes of a start tag, keyed by their qualified name
    pub fn attributes(&self, tag: &str) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        for caps in self.attribute.captures_iter(tag) {
            let raw = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            attrs.insert(caps[1].to_string(), self.unescape(raw));
        }
        attrs
    }
}
