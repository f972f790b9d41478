//! Unicode normalization for extracted PDF text.
//!
//! PDF text layers are full of typographic characters that break downstream
//! LaTeX rendering or make string matching brittle: en/em dashes, non-breaking
//! hyphens, soft hyphens, zero-width joiners and ligature glyphs. This module
//! folds them to plain equivalents while leaving language-specific letters
//! (`ß`, umlauts, accents) untouched.

/// Characters removed outright (soft hyphen, zero-width space/joiners, BOM).
const INVISIBLE: [char; 5] = ['\u{00AD}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Check whether a character is Unicode dash punctuation (or the minus sign).
///
/// Covers the general category `Pd` members that appear in PDF text layers.
///
/// # Examples
///
/// ```
/// use pdf_remarks::text::is_dash;
///
/// assert!(is_dash('\u{2014}'));
/// assert!(is_dash('-'));
/// assert!(!is_dash('ß'));
/// ```
pub fn is_dash(c: char) -> bool {
    matches!(
        c,
        '-' | '\u{058A}'
            | '\u{05BE}'
            | '\u{1400}'
            | '\u{1806}'
            | '\u{2010}'..='\u{2015}'
            | '\u{2212}'
            | '\u{2E17}'
            | '\u{2E1A}'
            | '\u{2E3A}'
            | '\u{2E3B}'
            | '\u{2E40}'
            | '\u{301C}'
            | '\u{3030}'
            | '\u{30A0}'
            | '\u{FE31}'
            | '\u{FE32}'
            | '\u{FE58}'
            | '\u{FE63}'
            | '\u{FF0D}'
    )
}

fn is_space_like(c: char) -> bool {
    matches!(c, '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}')
        || c.is_whitespace()
}

fn ligature(c: char) -> Option<&'static str> {
    match c {
        '\u{FB00}' => Some("ff"),
        '\u{FB01}' => Some("fi"),
        '\u{FB02}' => Some("fl"),
        '\u{FB03}' => Some("ffi"),
        '\u{FB04}' => Some("ffl"),
        '\u{FB05}' | '\u{FB06}' => Some("st"),
        _ => None,
    }
}

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compatibility folding without touching dashes or line structure.
///
/// Drops invisible characters, expands Latin ligatures and turns
/// non-breaking or typographic spaces into plain spaces. Newlines and tabs
/// are kept.
pub fn fold_compatibility(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if INVISIBLE.contains(&c) {
            continue;
        }
        if let Some(expanded) = ligature(c) {
            out.push_str(expanded);
        } else if !c.is_ascii() && is_space_like(c) {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// Normalize anchor or paragraph text.
///
/// - invisible characters are dropped
/// - every dash variant becomes `-`
/// - non-breaking and typographic spaces become ` `, runs collapse, ends trim
/// - Latin ligatures expand (`ﬁ` → `fi`)
/// - everything else, including `ß`, is preserved verbatim
///
/// The transform is applied per character, so a substring of the input at
/// word boundaries stays a substring of the output.
///
/// # Examples
///
/// ```
/// use pdf_remarks::text::normalize;
///
/// assert_eq!(normalize("Straße \u{2014} ﬁnal"), "Straße - final");
/// assert_eq!(normalize("Zeilen\u{00AD}umbruch"), "Zeilenumbruch");
/// ```
pub fn normalize(text: &str) -> String {
    let folded: String = fold_compatibility(text)
        .chars()
        .map(|c| if is_dash(c) { '-' } else { c })
        .collect();
    collapse_whitespace(&folded)
}
