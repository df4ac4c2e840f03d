//! Builds the LaTeX fragments for each template slot from a validated document.
//!
//! Every user-supplied leaf goes through [`Latex::text`] or [`Latex::url`].
//! Absent, blank, or empty values produce no output at all: no empty
//! `itemize` (a compile error in LaTeX), no bare section headings.

use chrono::NaiveDate;

use crate::models::resume::{
    Basics, EducationItem, ExperienceItem, ExtraSection, ProjectItem, RenderOptions,
    ResumeDocument, SectionKind, SkillGroup,
};
use crate::render::sanitize::{latex, Latex};
use crate::render::template::{Slot, SlotMap};

const DEFAULT_ACCENT: &str = "000000";
const PRESENT: &str = "Present";

/// Fills every slot for `doc`.
pub fn build_slots(doc: &ResumeDocument, options: &RenderOptions) -> SlotMap {
    let accent = match options.accent_hex() {
        // Validation guarantees six hex digits.
        Some(hex) => Latex::text(&hex),
        None => Latex::markup(DEFAULT_ACCENT),
    };

    let sections: Vec<Latex> = options
        .section_order()
        .into_iter()
        .map(|kind| section(doc, kind, options))
        .filter(|s| !s.is_empty())
        .collect();

    let mut slots = SlotMap::new();
    slots.insert(Slot::Accent, accent);
    slots.insert(Slot::Name, Latex::text(doc.basics.name.trim()));
    slots.insert(Slot::Heading, heading(&doc.basics, options));
    slots.insert(Slot::Sections, Latex::join(&sections, "\n"));
    slots
}

fn section(doc: &ResumeDocument, kind: SectionKind, options: &RenderOptions) -> Latex {
    match kind {
        SectionKind::Summary => summary(doc.summary.as_deref()),
        SectionKind::Experience => experience(doc.experience.as_deref().unwrap_or_default()),
        SectionKind::Education => education(doc.education.as_deref().unwrap_or_default()),
        SectionKind::Projects => projects(
            doc.projects.as_deref().unwrap_or_default(),
            options.show_links(),
        ),
        SectionKind::Skills => skills(
            doc.skills
                .as_ref()
                .map(|s| s.groups.as_slice())
                .unwrap_or_default(),
        ),
        SectionKind::Extras => extras(doc.extras.as_deref().unwrap_or_default()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Heading
// ────────────────────────────────────────────────────────────────────────────

fn heading(basics: &Basics, options: &RenderOptions) -> Latex {
    let mut lines = vec![latex!(
        r"\textbf{{\Huge \scshape {}}}",
        Latex::text(basics.name.trim())
    )];

    if let Some(headline) = present(&basics.headline) {
        lines.push(latex!(r"\small {}", Latex::text(headline)));
    }

    let mut contact = Vec::new();
    if let Some(location) = present(&basics.location) {
        contact.push(Latex::text(location));
    }
    if let Some(phone) = present(&basics.phone) {
        contact.push(Latex::text(phone));
    }
    if let Some(email) = present(&basics.email) {
        contact.push(latex!(
            r"\href{{mailto:{}}}{{\underline{{{}}}}}",
            Latex::url(email),
            Latex::text(email)
        ));
    }
    if options.show_links() {
        for link in basics.links.iter().flatten() {
            contact.push(latex!(
                r"\href{{{}}}{{\underline{{{}}}}}",
                Latex::url(link.url.trim()),
                Latex::text(link.label.trim())
            ));
        }
    }
    if !contact.is_empty() {
        lines.push(latex!(r"\small {}", Latex::join(&contact, r" $|$ ")));
    }

    latex!(
        "\\begin{{center}}\n    {}\n\\end{{center}}",
        Latex::join(&lines, " \\\\ \\vspace{1pt}\n    ")
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Body sections
// ────────────────────────────────────────────────────────────────────────────

fn summary(text: Option<&str>) -> Latex {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => latex!("\\section{{Summary}}\n\\small{{{}}}\n", Latex::text(text)),
        None => Latex::empty(),
    }
}

fn experience(items: &[ExperienceItem]) -> Latex {
    let entries: Vec<Latex> = items
        .iter()
        .map(|item| {
            let dates = date_range(Some(item.start_date.as_str()), Some(item.end_date.as_deref()));
            let mut entry = subheading(
                Latex::text(item.position.trim()),
                dates,
                Latex::text(item.company.trim()),
                optional_text(&item.location),
            );
            entry.push(&item_list(item.bullets.iter()));
            entry
        })
        .collect();

    titled_list(Latex::markup("Experience"), &entries)
}

fn education(items: &[EducationItem]) -> Latex {
    let entries: Vec<Latex> = items
        .iter()
        .map(|item| {
            let degree = match present(&item.area) {
                Some(area) => latex!(
                    "{}, {}",
                    Latex::text(item.degree.trim()),
                    Latex::text(area)
                ),
                None => Latex::text(item.degree.trim()),
            };
            let dates = date_range(item.start_date.as_deref(), item.end_date.as_deref().map(Some));
            let mut entry = subheading(
                Latex::text(item.institution.trim()),
                optional_text(&item.location),
                degree,
                dates,
            );
            entry.push(&item_list(item.notes.iter().flatten()));
            entry
        })
        .collect();

    titled_list(Latex::markup("Education"), &entries)
}

fn projects(items: &[ProjectItem], show_links: bool) -> Latex {
    let entries: Vec<Latex> = items
        .iter()
        .map(|item| {
            let tech: Vec<Latex> = item
                .tech
                .iter()
                .flatten()
                .filter_map(|t| non_blank(t))
                .map(Latex::text)
                .collect();
            let title = if tech.is_empty() {
                latex!(r"\textbf{{{}}}", Latex::text(item.name.trim()))
            } else {
                latex!(
                    r"\textbf{{{}}} $|$ \emph{{{}}}",
                    Latex::text(item.name.trim()),
                    Latex::join(&tech, ", ")
                )
            };
            let link = match present(&item.link) {
                Some(url) if show_links => latex!(
                    r"\href{{{}}}{{\underline{{{}}}}}",
                    Latex::url(url),
                    Latex::text(url)
                ),
                _ => Latex::empty(),
            };

            let mut entry = latex!(
                "    \\resumeProjectHeading\n      {{{}}}{{{}}}\n",
                title,
                link
            );
            let lines = item
                .description
                .iter()
                .chain(item.bullets.iter().flatten());
            entry.push(&item_list(lines));
            entry
        })
        .collect();

    titled_list(Latex::markup("Projects"), &entries)
}

fn skills(groups: &[SkillGroup]) -> Latex {
    let lines: Vec<Latex> = groups
        .iter()
        .map(|group| {
            let items: Vec<Latex> = group
                .items
                .iter()
                .filter_map(|i| non_blank(i))
                .map(Latex::text)
                .collect();
            if items.is_empty() {
                latex!(r"\textbf{{{}}}", Latex::text(group.label.trim()))
            } else {
                latex!(
                    r"\textbf{{{}}}{{: {}}}",
                    Latex::text(group.label.trim()),
                    Latex::join(&items, ", ")
                )
            }
        })
        .collect();

    if lines.is_empty() {
        return Latex::empty();
    }

    latex!(
        "\\section{{Skills}}\n \\begin{{itemize}}[leftmargin=0.15in, label={{}}]\n    \\small{{\\item{{\n     {}\n    }}}}\n \\end{{itemize}}\n",
        Latex::join(&lines, " \\\\\n     ")
    )
}

fn extras(sections: &[ExtraSection]) -> Latex {
    let rendered: Vec<Latex> = sections
        .iter()
        .map(|section| {
            let entries: Vec<Latex> = section
                .items
                .iter()
                .map(|item| {
                    let title = match present(&item.value) {
                        Some(value) => latex!(
                            r"\textbf{{{}}}: {}",
                            Latex::text(item.label.trim()),
                            Latex::text(value)
                        ),
                        None => latex!(r"\textbf{{{}}}", Latex::text(item.label.trim())),
                    };
                    latex!(
                        "    \\resumeProjectHeading\n      {{{}}}{{{}}}\n",
                        title,
                        optional_text(&item.dates)
                    )
                })
                .collect();
            titled_list(Latex::text(section.kind.trim()), &entries)
        })
        .filter(|s| !s.is_empty())
        .collect();

    Latex::join(&rendered, "\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Shared building blocks
// ────────────────────────────────────────────────────────────────────────────

/// `\section{title}` around a sub-heading list; nothing when `entries` is empty.
fn titled_list(title: Latex, entries: &[Latex]) -> Latex {
    if entries.is_empty() {
        return Latex::empty();
    }
    latex!(
        "\\section{{{}}}\n  \\resumeSubHeadingListStart\n{}  \\resumeSubHeadingListEnd\n",
        title,
        Latex::join(entries, "")
    )
}

fn subheading(top_left: Latex, top_right: Latex, bottom_left: Latex, bottom_right: Latex) -> Latex {
    latex!(
        "    \\resumeSubheading\n      {{{}}}{{{}}}\n      {{{}}}{{{}}}\n",
        top_left,
        top_right,
        bottom_left,
        bottom_right
    )
}

/// Bullet list of the non-blank lines; nothing when all are blank.
fn item_list<'a>(lines: impl Iterator<Item = &'a String>) -> Latex {
    let items: Vec<Latex> = lines
        .filter_map(|l| non_blank(l))
        .map(|l| latex!("        \\resumeItem{{{}}}\n", Latex::text(l)))
        .collect();
    if items.is_empty() {
        return Latex::empty();
    }
    latex!(
        "      \\resumeItemListStart\n{}      \\resumeItemListEnd\n",
        Latex::join(&items, "")
    )
}

/// `start -- end` with blank parts dropped.
///
/// `end` is `None` when the source has no end field at all and `Some(None)`
/// when it is explicitly open-ended, which displays as "Present".
fn date_range(start: Option<&str>, end: Option<Option<&str>>) -> Latex {
    let start = start.and_then(non_blank).map(display_date);
    let end = match end {
        Some(Some(date)) => non_blank(date).map(display_date),
        Some(None) => Some(Latex::markup(PRESENT)),
        None => None,
    };
    let parts: Vec<Latex> = start.into_iter().chain(end).collect();
    Latex::join(&parts, " -- ")
}

/// `YYYY-MM` becomes `Mon YYYY`; anything else is shown as written.
fn display_date(raw: &str) -> Latex {
    match NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        Ok(date) => Latex::text(&date.format("%b %Y").to_string()),
        Err(_) => Latex::text(raw),
    }
}

fn optional_text(value: &Option<String>) -> Latex {
    present(value).map(Latex::text).unwrap_or_default()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().and_then(non_blank)
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
