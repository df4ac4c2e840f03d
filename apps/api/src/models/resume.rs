use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Body of `POST /render`.
///
/// Required strings use `#[serde(default)]` so a missing key surfaces as a
/// field-level validation error instead of an opaque JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub template_id: String,
    #[validate(nested)]
    pub options: Option<RenderOptions>,
    #[serde(default)]
    #[validate(nested)]
    pub data: ResumeDocument,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Accent colour for section headings, `RRGGBB` with an optional leading `#`.
    #[validate(custom(function = "validate_accent_color"))]
    pub color: Option<String>,
    pub show_links: Option<bool>,
    #[validate(custom(function = "validate_section_order"))]
    pub section_order: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResumeDocument {
    #[serde(default)]
    #[validate(nested)]
    pub basics: Basics,
    pub summary: Option<String>,
    #[validate(nested)]
    pub experience: Option<Vec<ExperienceItem>>,
    #[validate(nested)]
    pub education: Option<Vec<EducationItem>>,
    #[validate(nested)]
    pub projects: Option<Vec<ProjectItem>>,
    #[validate(nested)]
    pub skills: Option<Skills>,
    #[validate(nested)]
    pub extras: Option<Vec<ExtraSection>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Basics {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(nested)]
    pub links: Option<Vec<LinkItem>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LinkItem {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub label: String,
    #[serde(default)]
    #[validate(url(message = "must be a valid URL"))]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceItem {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub company: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub position: String,
    pub location: Option<String>,
    /// Usually `YYYY-MM`; anything else is displayed verbatim.
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub start_date: String,
    /// `None` means the position is current.
    pub end_date: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub institution: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub degree: String,
    pub area: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProjectItem {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(url(message = "must be a valid URL"))]
    pub link: Option<String>,
    pub description: Option<String>,
    pub bullets: Option<Vec<String>>,
    pub tech: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Skills {
    #[serde(default)]
    #[validate(nested)]
    pub groups: Vec<SkillGroup>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SkillGroup {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub label: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// A free-form section such as "Awards" or "Certifications".
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ExtraSection {
    #[serde(default, rename = "type")]
    #[validate(custom(function = "not_blank"))]
    pub kind: String,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<ExtraItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ExtraItem {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub label: String,
    pub value: Option<String>,
    pub dates: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Summary,
    Experience,
    Education,
    Projects,
    Skills,
    Extras,
}

impl SectionKind {
    pub const DEFAULT_ORDER: [SectionKind; 6] = [
        SectionKind::Summary,
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Projects,
        SectionKind::Skills,
        SectionKind::Extras,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "summary" => Some(SectionKind::Summary),
            "experience" => Some(SectionKind::Experience),
            "education" => Some(SectionKind::Education),
            "projects" => Some(SectionKind::Projects),
            "skills" => Some(SectionKind::Skills),
            "extras" => Some(SectionKind::Extras),
            _ => None,
        }
    }
}

impl RenderOptions {
    pub fn show_links(&self) -> bool {
        self.show_links.unwrap_or(true)
    }

    /// Hex digits of the accent colour, upper-cased and without `#`.
    pub fn accent_hex(&self) -> Option<String> {
        self.color
            .as_deref()
            .map(|c| c.trim_start_matches('#').to_ascii_uppercase())
    }

    /// Requested sections first, then the remaining ones in default order.
    /// Unknown names are skipped; validation rejects them before this runs.
    pub fn section_order(&self) -> Vec<SectionKind> {
        let mut order: Vec<SectionKind> = Vec::with_capacity(SectionKind::DEFAULT_ORDER.len());
        for name in self.section_order.iter().flatten() {
            if let Some(kind) = SectionKind::from_name(name) {
                if !order.contains(&kind) {
                    order.push(kind);
                }
            }
        }
        for kind in SectionKind::DEFAULT_ORDER {
            if !order.contains(&kind) {
                order.push(kind);
            }
        }
        order
    }
}

/// Required strings must carry something other than whitespace.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if !value.trim().is_empty() {
        return Ok(());
    }
    let mut err = ValidationError::new("required");
    err.message = Some(Cow::from("is required"));
    Err(err)
}

fn validate_accent_color(color: &str) -> Result<(), ValidationError> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(());
    }
    let mut err = ValidationError::new("hex_color");
    err.message = Some(Cow::from("must be a hex colour such as #1F4E79"));
    Err(err)
}

fn validate_section_order(names: &[String]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        let Some(kind) = SectionKind::from_name(name) else {
            let mut err = ValidationError::new("unknown_section");
            err.message = Some(Cow::from(format!(
                "unknown section '{name}' (expected summary, experience, education, projects, skills or extras)"
            )));
            return Err(err);
        };
        if !seen.insert(kind) {
            let mut err = ValidationError::new("duplicate_section");
            err.message = Some(Cow::from(format!("section '{name}' is listed twice")));
            return Err(err);
        }
    }
    Ok(())
}
