//! LaTeX escaping for untrusted text.
//!
//! Escaping is a single pass over the input: every character maps to its
//! display form exactly once, so the braces emitted by `\textbackslash{}`
//! are never themselves escaped. Input is always literal text; a user string
//! that happens to look like markup (`\%`, `\textbf{x}`) is displayed as typed.
//!
//! [`Latex`] is the only type the template filler accepts. It can be built
//! from escaped user text or from `'static` markup written in this crate.

use std::fmt;

/// Characters that survive [`escape_url`] untouched.
pub const URL_SAFE: [char; 5] = [':', '/', '.', '?', '-'];

/// Escapes `input` for use as LaTeX body text.
pub fn escape_latex(input: &str) -> String {
    escape_with(input, &[])
}

/// Escapes `input` for use inside `\href{...}`: same table as
/// [`escape_latex`], but `: / . ? -` are guaranteed to pass through.
pub fn escape_url(input: &str) -> String {
    escape_with(input, &URL_SAFE)
}

fn escape_with(input: &str, keep: &[char]) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    let mut pending_space = false;

    for c in input.chars() {
        if c.is_control() {
            // Newlines would end a macro argument with \par.
            pending_space = true;
            continue;
        }
        if pending_space {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
        }
        if keep.contains(&c) {
            out.push(c);
            continue;
        }
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '%' | '$' | '#' | '&' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    out
}

/// A fragment of LaTeX that is safe to splice into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Latex(String);

impl Latex {
    /// Escaped user text.
    pub fn text(input: &str) -> Self {
        Latex(escape_latex(input))
    }

    /// Escaped user URL.
    pub fn url(input: &str) -> Self {
        Latex(escape_url(input))
    }

    /// Markup written in this crate.
    pub fn markup(source: &'static str) -> Self {
        Latex(source.to_string())
    }

    pub fn empty() -> Self {
        Latex(String::new())
    }

    /// Joins fragments with a markup separator.
    pub fn join<'a, I>(parts: I, separator: &'static str) -> Self
    where
        I: IntoIterator<Item = &'a Latex>,
    {
        let mut out = String::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                out.push_str(separator);
            }
            out.push_str(&part.0);
        }
        Latex(out)
    }

    pub fn push(&mut self, other: &Latex) {
        self.0.push_str(&other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Output of [`latex!`]; every argument was already a `Latex`.
    pub(crate) fn from_composed(source: String) -> Self {
        Latex(source)
    }
}

impl fmt::Display for Latex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `format!` for LaTeX: the format string is literal markup and every
/// argument must be a [`Latex`] fragment. Use positional `{}` only.
macro_rules! latex {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::render::sanitize::Latex::from_composed(format!(
            $fmt $(, $crate::render::sanitize::Latex::as_str(&$arg))*
        ))
    };
}

pub(crate) use latex;
