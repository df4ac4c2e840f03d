//! Document templates with named `<<slot>>` substitution points.
//!
//! Templates are parsed once at startup into literal/slot segments and kept in
//! an immutable [`TemplateRegistry`] shared by all requests. Filling walks the
//! segments once, so slot values are never re-scanned for markers.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::render::sanitize::Latex;

const SLOT_OPEN: &str = "<<";
const SLOT_CLOSE: &str = ">>";

const SB2NOV_SOURCE: &str = include_str!("../../templates/sb2nov.tex");
pub const DEFAULT_TEMPLATE_ID: &str = "sb2nov";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template '{template}' uses unknown slot '{slot}'")]
    UnknownSlot { template: String, slot: String },

    #[error("template '{template}' has an unterminated slot at byte {offset}")]
    Unterminated { template: String, offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Accent colour as six hex digits.
    Accent,
    /// Escaped full name, for PDF metadata.
    Name,
    /// Name, headline and contact line.
    Heading,
    /// All body sections in display order.
    Sections,
}

impl Slot {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "accent" => Some(Slot::Accent),
            "name" => Some(Slot::Name),
            "heading" => Some(Slot::Heading),
            "sections" => Some(Slot::Sections),
            _ => None,
        }
    }
}

pub type SlotMap = HashMap<Slot, Latex>;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Slot(Slot),
}

#[derive(Debug, Clone)]
pub struct Template {
    id: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(id: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        let id = id.into();
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(SLOT_OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + SLOT_OPEN.len()..];
            let Some(end) = after_open.find(SLOT_CLOSE) else {
                return Err(TemplateError::Unterminated {
                    template: id,
                    offset: offset + start,
                });
            };
            let name = after_open[..end].trim();
            let slot = Slot::from_name(name).ok_or_else(|| TemplateError::UnknownSlot {
                template: id.clone(),
                slot: name.to_string(),
            })?;
            segments.push(Segment::Slot(slot));

            let consumed = start + SLOT_OPEN.len() + end + SLOT_CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { id, segments })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Substitutes every slot from `values`; a slot with no value renders empty.
    pub fn fill(&self, values: &SlotMap) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    if let Some(value) = values.get(slot) {
                        out.push_str(value.as_str());
                    }
                }
            }
        }
        out
    }
}

/// Immutable set of templates, keyed by lower-case id.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Arc<Template>>,
}

impl TemplateRegistry {
    /// Only the templates compiled into the binary.
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut registry = Self::default();
        registry.insert(Template::parse(DEFAULT_TEMPLATE_ID, SB2NOV_SOURCE)?);
        Ok(registry)
    }

    /// Built-in templates plus every `*.tex` file in `dir`. A file whose stem
    /// matches a built-in id replaces it.
    pub fn load(dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut registry = Self::builtin()?;
        let Some(dir) = dir else {
            return Ok(registry);
        };

        let entries = std::fs::read_dir(dir).map_err(io_error(dir))?;
        for entry in entries {
            let path = entry.map_err(io_error(dir))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("tex") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path).map_err(io_error(&path))?;
            let template = Template::parse(id.to_ascii_lowercase(), &source)?;
            info!("Loaded template '{}' from {}", template.id(), path.display());
            registry.insert(template);
        }

        Ok(registry)
    }

    pub fn insert(&mut self, template: Template) {
        self.templates
            .insert(template.id.to_ascii_lowercase(), Arc::new(template));
    }

    /// Case-insensitive lookup.
    pub fn get(&self, id: &str) -> Option<Arc<Template>> {
        self.templates.get(&id.trim().to_ascii_lowercase()).cloned()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TemplateError {
    let path = path.to_path_buf();
    move |source| TemplateError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(pairs: &[(Slot, &str)]) -> SlotMap {
        pairs
            .iter()
            .map(|(slot, text)| (*slot, Latex::text(text)))
            .collect()
    }

    #[test]
    fn test_parse_and_fill() {
        let t = Template::parse("t", r"\title{<<name>>} body: << sections >>.").unwrap();
        let out = t.fill(&slots(&[(Slot::Name, "Ann"), (Slot::Sections, "S")]));
        assert_eq!(out, r"\title{Ann} body: S.");
    }

    #[test]
    fn test_missing_value_renders_empty() {
        let t = Template::parse("t", "[<<heading>>]").unwrap();
        assert_eq!(t.fill(&SlotMap::new()), "[]");
    }

    #[test]
    fn test_slot_markers_in_values_are_not_rescanned() {
        let t = Template::parse("t", "<<name>>|<<sections>>").unwrap();
        let out = t.fill(&slots(&[(Slot::Name, "<<sections>>"), (Slot::Sections, "body")]));
        assert_eq!(out, "<<sections>>|body");
    }

    #[test]
    fn test_unknown_slot_rejected() {
        let err = Template::parse("t", "<<photo>>").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownSlot { ref slot, .. } if slot == "photo"));
    }

    #[test]
    fn test_unterminated_slot_rejected() {
        let err = Template::parse("t", "abc <<name").unwrap_err();
        assert!(matches!(err, TemplateError::Unterminated { offset: 4, .. }));
    }

    #[test]
    fn test_builtin_registry_has_sb2nov() {
        let registry = TemplateRegistry::builtin().unwrap();
        assert_eq!(registry.ids(), vec!["sb2nov"]);
        assert!(registry.get("SB2NOV").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_builtin_template_uses_every_slot() {
        let registry = TemplateRegistry::builtin().unwrap();
        let template = registry.get(DEFAULT_TEMPLATE_ID).unwrap();
        for slot in [Slot::Accent, Slot::Name, Slot::Heading, Slot::Sections] {
            assert!(
                template.segments.contains(&Segment::Slot(slot)),
                "{slot:?} missing from built-in template"
            );
        }
    }

    #[test]
    fn test_load_from_directory_adds_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Compact.tex"), "compact <<sections>>").unwrap();
        std::fs::write(dir.path().join("sb2nov.tex"), "override <<heading>>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "<<ignored>>").unwrap();

        let registry = TemplateRegistry::load(Some(dir.path())).unwrap();
        assert_eq!(registry.ids(), vec!["compact", "sb2nov"]);

        let sb2nov = registry.get("sb2nov").unwrap();
        assert_eq!(sb2nov.fill(&slots(&[(Slot::Heading, "H")])), "override H");
    }

    #[test]
    fn test_load_rejects_bad_template_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.tex"), "<<nope>>").unwrap();
        assert!(TemplateRegistry::load(Some(dir.path())).is_err());
    }

    #[test]
    fn test_load_missing_directory_is_io_error() {
        let err = TemplateRegistry::load(Some(Path::new("/definitely/not/here"))).unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }));
    }
}
