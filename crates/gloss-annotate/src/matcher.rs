//! Term boundary matching over serialized markup.
//!
//! A term matches case-insensitively when it is delimited on the left by the
//! start of the text, whitespace, `>` or punctuation, and on the right by the
//! end of the text, whitespace, `<` or punctuation. A match is rejected when
//! the text after its right boundary shows the match is still tag material: a
//! `>` appearing before any `<` (inside an attribute region), or a closing-tag
//! `</` before any `>` (inside a child element). A term directly followed by
//! a tag (`Glossary<br>`) is rejected the same way.
//!
//! Boundary characters are kept verbatim and the right one is not consumed,
//! so it can serve as the left boundary of the next occurrence.
//!
//! Terms are applied in catalog order, each on the output of the previous
//! one. Wrap fragments produced for an earlier term are therefore visible to
//! later terms; only the tag-material guard keeps them from being rewrapped.

use std::borrow::Cow;
use std::ops::Range;

use gloss_terms::{Term, TermCatalog};
use regex::{Regex, RegexBuilder};

/// Entity written in place of U+00A0 before matching.
const NBSP_ENTITY: &str = "&nbsp;";

/// Output of [`TermMatcher::parse`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Parsed {
    /// Text with matched terms replaced by their wrap fragments.
    pub text: String,
    /// Number of replacements made across all terms.
    pub replacements: usize,
}

/// Compiled boundary pattern for a single term name.
#[derive(Debug)]
pub struct TermPattern {
    regex: Regex,
}

impl TermPattern {
    /// Compile the pattern for `name`.
    ///
    /// The name is HTML-text escaped first, since it is matched against
    /// serialized markup where `&`, `<` and `>` appear as entities.
    pub fn new(name: &str) -> Result<Self, regex::Error> {
        let literal = regex::escape(&html_escape::encode_text(name));
        let regex = RegexBuilder::new(&format!(
            r"(^|[\s>[:punct:]])({literal})($|[\s<[:punct:]])"
        ))
        .case_insensitive(true)
        .build()?;
        Ok(Self { regex })
    }

    /// Whether the pattern matches anywhere, ignoring the markup guard.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Byte range of the next accepted occurrence starting at or after `from`.
    ///
    /// The boundary characters are not part of the range. `from` must lie on a
    /// char boundary.
    pub fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
        let mut pos = from;
        while pos <= text.len() {
            let caps = self.regex.captures_at(text, pos)?;
            let whole = caps.get(0)?;
            let term = caps.get(2)?;

            if !inside_markup(&text[whole.end()..]) {
                return Some(term.range());
            }

            pos = whole.start()
                + text[whole.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
        }
        None
    }
}

/// Whether the text following a match marks it as tag material.
fn inside_markup(rest: &str) -> bool {
    match rest.find(['<', '>']) {
        Some(i) if rest.as_bytes()[i] == b'>' => true,
        Some(i) => rest[i + 1..].starts_with('/'),
        None => false,
    }
}

/// Rewrite U+00A0 to its entity so it survives reparsing unchanged.
fn normalize_nbsp(text: &str) -> Cow<'_, str> {
    if text.contains('\u{a0}') {
        Cow::Owned(text.replace('\u{a0}', NBSP_ENTITY))
    } else {
        Cow::Borrowed(text)
    }
}

/// Patterns for a whole catalog, compiled once per run.
#[derive(Debug)]
pub struct TermMatcher<'a> {
    patterns: Vec<(&'a Term, TermPattern)>,
}

impl<'a> TermMatcher<'a> {
    /// Compile patterns for every term, preserving catalog order.
    ///
    /// Terms with a blank name are never matched.
    pub fn new(terms: &'a TermCatalog) -> Self {
        let patterns = terms
            .iter()
            .filter(|term| !term.name.trim().is_empty())
            .filter_map(|term| match TermPattern::new(&term.name) {
                Ok(pattern) => Some((term, pattern)),
                Err(e) => {
                    tracing::warn!(term = %term.name, error = %e, "Skipping term with unusable pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Number of usable terms.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no term can match.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Replace term occurrences in `text`.
    ///
    /// At most `max_per_term` occurrences of each term are replaced, the first
    /// ones encountered; zero or a negative cap replaces nothing. `render`
    /// receives the term and the literally matched text (original casing) and
    /// returns the fragment to splice in. Returning `None` leaves that
    /// occurrence as it was without counting it against the cap.
    pub fn parse<F>(&self, text: &str, max_per_term: i64, mut render: F) -> Parsed
    where
        F: FnMut(&Term, &str) -> Option<String>,
    {
        let mut text = normalize_nbsp(text).into_owned();
        let mut replacements = 0;

        let cap = usize::try_from(max_per_term).unwrap_or(0);
        if cap == 0 {
            return Parsed { text, replacements };
        }

        for (term, pattern) in &self.patterns {
            if !pattern.is_match(&text) {
                continue;
            }
            if let Some((replaced, count)) = replace_term(&text, term, pattern, cap, &mut render) {
                text = replaced;
                replacements += count;
            }
        }

        Parsed { text, replacements }
    }
}

/// Replace up to `cap` occurrences of one term.
///
/// Returns `None` when nothing was replaced.
fn replace_term<F>(
    text: &str,
    term: &Term,
    pattern: &TermPattern,
    cap: usize,
    render: &mut F,
) -> Option<(String, usize)>
where
    F: FnMut(&Term, &str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;
    let mut count = 0;

    while count < cap
        && let Some(range) = pattern.find_at(text, pos)
    {
        pos = range.end;
        if let Some(wrapped) = render(term, &text[range.clone()]) {
            out.push_str(&text[last..range.start]);
            out.push_str(&wrapped);
            last = range.end;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    out.push_str(&text[last..]);
    Some((out, count))
}

/// Parse `text` against `terms` with a one-off matcher.
pub fn parse<F>(text: &str, terms: &TermCatalog, max_per_term: i64, render: F) -> Parsed
where
    F: FnMut(&Term, &str) -> Option<String>,
{
    TermMatcher::new(terms).parse(text, max_per_term, render)
}
