//! LaTeX output: escaping, the colloquium letter and compilation.

use crate::annotations::CategoryStats;
use crate::error::{Error, Result};
use crate::rewrite::{Language, RewrittenComment, ThesisMetadata};
use crate::text::{fold_compatibility, is_dash};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Engine used by [`compile_latex`] unless told otherwise.
pub const DEFAULT_LATEX_ENGINE: &str = "lualatex";

/// Separator between questions: two LaTeX line breaks.
pub const QUESTION_SEPARATOR: &str = " \\\\\n\\\\\n";

/// Source remarks beyond which the summary notes missing citations.
pub const SOURCE_REMARK_THRESHOLD: usize = 4;

/// Language remarks beyond which the summary notes many language errors.
pub const LANGUAGE_REMARK_THRESHOLD: usize = 5;

/// Make text safe for LaTeX.
///
/// Invisible characters are dropped and ligatures expanded, `ß` becomes
/// `{\ss}`, German quotes become TeX quotes and `& % $ # _ ~ ^` are
/// escaped. Dashes become `{-}` when `preserve_latex` is set (the text may
/// contain LaTeX commands, which are kept, and an already escaped special
/// is left alone) and `-` otherwise, where braces and backslashes are
/// escaped as well.
///
/// # Examples
///
/// ```
/// use pdf_remarks::converters::escape_for_latex;
///
/// assert_eq!(escape_for_latex("Maß & Zahl", false), "Ma{\\ss} \\& Zahl");
/// assert_eq!(escape_for_latex("\\textbf{50%}", true), "\\textbf{50\\%}");
/// assert_eq!(escape_for_latex("a{b}", false), "a\\{b\\}");
/// ```
pub fn escape_for_latex(text: &str, preserve_latex: bool) -> String {
    let folded = fold_compatibility(text);
    let mut out = String::with_capacity(folded.len() + 16);
    let mut prev: Option<char> = None;

    for c in folded.chars() {
        let escaped_already = preserve_latex && prev == Some('\\');
        match c {
            'ß' => out.push_str("{\\ss}"),
            '&' | '%' | '$' | '#' | '_' if escaped_already => out.push(c),
            '&' | '%' | '$' | '#' | '_' => {
                out.push('\\');
                out.push(c);
            },
            '\u{201E}' => out.push_str("``"),
            '\u{201C}' => out.push_str("''"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '{' | '}' if !preserve_latex => {
                out.push('\\');
                out.push(c);
            },
            '\\' if !preserve_latex => out.push_str("\\textbackslash{}"),
            c if is_dash(c) => out.push_str(if preserve_latex { "{-}" } else { "-" }),
            c => out.push(c),
        }
        prev = Some(c);
    }
    out
}

/// Join rewritten comments into the question block of the letter.
///
/// Each comment is prefixed with `Seite N:` or `page N:` (1-based page).
pub fn concatenate_questions(comments: &[RewrittenComment], language: Language) -> String {
    comments
        .iter()
        .map(|c| format!("{} {}: {}", language.page_label(), c.request.page_number(), c.text))
        .collect::<Vec<_>>()
        .join(QUESTION_SEPARATOR)
}

/// Append remarks about frequent missing sources or language errors.
pub fn summary_with_remarks(summary: &str, stats: &CategoryStats) -> String {
    let mut out = summary.to_string();
    if stats.source > SOURCE_REMARK_THRESHOLD {
        log::info!("{} missing-source remarks", stats.source);
        out.push_str("\\\\Häufig fehlen Quellenangaben.");
    }
    if stats.language > LANGUAGE_REMARK_THRESHOLD {
        log::info!("{} language remarks", stats.language);
        out.push_str("\\\\Viele sprachliche Fehler.");
    }
    out
}

/// Colloquium protocol letter to the examination board.
#[derive(Debug, Clone, PartialEq)]
pub struct ColloquiumLetter {
    /// Addressee
    pub recipient: String,
    /// Subject line
    pub subject: String,
    /// Thesis title
    pub title: String,
    /// Author with matriculation number
    pub author: String,
    /// Thesis summary (LaTeX)
    pub summary: String,
    /// First examiner, also the sender
    pub first_examiner: String,
    /// Second examiner
    pub second_examiner: String,
    /// Sender e-mail address
    pub first_examiner_mail: String,
    /// Question block (LaTeX)
    pub questions: String,
    /// Place of issue
    pub place: String,
    /// Date, `\today` by default
    pub date: String,
}

impl ColloquiumLetter {
    /// Build the letter from extracted metadata.
    pub fn from_metadata(metadata: &ThesisMetadata, summary: String, questions: String) -> Self {
        let author = metadata.author.clone().unwrap_or_else(|| "Unknown".to_string());
        let matriculation = metadata
            .matriculation_number
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let kind = metadata.bachelor_master.as_deref().unwrap_or("Arbeit");
        let mail = format!(
            "{}.{}@th-koeln.de",
            metadata.first_examiner_christian.as_deref().unwrap_or_default(),
            metadata.first_examiner_family.as_deref().unwrap_or_default()
        );

        Self {
            recipient: "Prüfungsausschuss der TH Köln".to_string(),
            subject: format!("Bewertung {} von {}", kind, author),
            title: metadata.title.clone().unwrap_or_default(),
            author: format!("{}, Matr.-Nr. {}", author, matriculation),
            summary,
            first_examiner: metadata.first_examiner.clone().unwrap_or_else(|| "Unbekannt".to_string()),
            second_examiner: metadata.second_examiner.clone().unwrap_or_else(|| "Unbekannt".to_string()),
            first_examiner_mail: mail.to_lowercase(),
            questions,
            place: "Gummersbach".to_string(),
            date: "\\today".to_string(),
        }
    }

    /// Set the place of issue.
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    /// Set the date (LaTeX text).
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Render the complete `.tex` document.
    pub fn render(&self) -> String {
        let first = escape_for_latex(&self.first_examiner, false);
        let second = escape_for_latex(&self.second_examiner, false);

        format!(
            r#"\documentclass[11pt,ngerman,parskip=full]{{scrlttr2}}
\usepackage{{fontspec}}
\setmainfont{{Latin Modern Roman}}
\usepackage[ngerman]{{babel}}
\usepackage{{geometry}}
\geometry{{a4paper, top=25mm, left=25mm, right=25mm, bottom=30mm}}

% Sender
\setkomavar{{fromname}}{{{first}}}
\setkomavar{{fromaddress}}{{Steinmüllerallee 1\\51643 Gummersbach}}
\setkomavar{{fromemail}}{{{mail}}}
\setkomavar{{place}}{{{place}}}
\setkomavar{{date}}{{{date}}}
\setkomavar{{signature}}{{{first}}}
\setkomavar{{subject}}{{{subject}}}

% Footer
\setkomavar{{firstfoot}}{{%
  \parbox[t]{{\textwidth}}{{\footnotesize
    Technische Hochschule Köln, Campus Gummersbach \\
    Sitz des Präsidiums: Claudiusstrasse 1, 50678 Köln \\
    www.th-koeln.de
  }}
}}

\begin{{document}}

\begin{{letter}}{{{recipient}}}

\opening{{Sehr geehrte Damen und Herren,}}

Bewertung folgender Thesis:\\

\textbf{{Titel:}} {title} \\[1ex]
\textbf{{Autor:}} {author} \\[2ex]

\textbf{{Zusammenfassung der Thesis:}} \\

{summary}


\textbf{{Protokoll des Kolloquiums:}}\\[1ex]

\textbf{{Fragen {first}:}}\\

{questions}\\


\textbf{{Fragen {second}:}}\\

\textbf{{Vortrag:}} xx Minuten\\

Folien waren:
\begin{{itemize}}
\item sehr gut
\item gut
\item befriedigend
\item ausreichend
\end{{itemize}}

Vortrag war:
\begin{{itemize}}
\item sehr gut (überzeugend, flüssig, in der Zeit)
\item gut
\item befriedigend
\item ausreichend
\end{{itemize}}

Demo:
\begin{{itemize}}
\item ja, live
\item ja, live, aber fehlerhaft/nicht so gut
\item ja, Video
\item nein
\item nicht möglich
\end{{itemize}}

Fragen konnten beantwortet werden:
\begin{{itemize}}
\item sehr gut
\item sehr gut, manche gut
\item gut
\item gut, manche nicht so gut
\item viele nicht so gut oder gar nicht
\end{{itemize}}

Dauer des Kolloquiums: 45 Minuten

\closing{{Mit freundlichen Grü{{\ss}}en}}

\end{{letter}}

\end{{document}}
"#,
            first = first,
            second = second,
            mail = escape_for_latex(&self.first_examiner_mail, false),
            place = escape_for_latex(&self.place, false),
            date = self.date,
            subject = escape_for_latex(&self.subject, false),
            recipient = escape_for_latex(&self.recipient, false),
            title = escape_for_latex(&self.title, false),
            author = escape_for_latex(&self.author, false),
            summary = self.summary,
            questions = self.questions,
        )
    }

    /// Write the rendered letter.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        log::info!("LaTeX file created: {}", path.display());
        Ok(())
    }
}

/// Compile a `.tex` file and return the path of the produced PDF.
///
/// Runs `engine` (usually `lualatex`) in non-stop mode with the output
/// directory set to `output_dir`, or the directory of `tex_path`.
///
/// # Errors
///
/// [`Error::Latex`] when the engine cannot be started or exits with failure.
pub fn compile_latex(tex_path: &Path, output_dir: Option<&Path>, engine: &str) -> Result<PathBuf> {
    let output_dir = output_dir
        .or_else(|| tex_path.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    log::info!("Compiling {} with {}", tex_path.display(), engine);
    let output = Command::new(engine)
        .arg("-interaction=nonstopmode")
        .arg(format!("-output-directory={}", output_dir.display()))
        .arg(tex_path)
        .output()
        .map_err(|e| Error::Latex(format!("could not run {}: {}", engine, e)))?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let tail: Vec<&str> = stdout.lines().rev().take(10).collect();
        return Err(Error::Latex(format!(
            "{} exited with {}: {}",
            engine,
            output.status,
            tail.into_iter().rev().collect::<Vec<_>>().join("\n")
        )));
    }

    let stem = tex_path
        .file_stem()
        .ok_or_else(|| Error::Latex(format!("{} has no file name", tex_path.display())))?;
    Ok(output_dir.join(stem).with_extension("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentKind;
    use crate::locator::Confidence;
    use crate::packager::RewriteRequest;

    fn comment(page: usize, text: &str) -> RewrittenComment {
        RewrittenComment {
            request: RewriteRequest {
                order: page,
                page,
                line_number: 1,
                anchor_text: "x".to_string(),
                paragraph_context: String::new(),
                raw_comment: "?".to_string(),
                kind: DocumentKind::Thesis,
                confidence: Confidence::Estimated,
            },
            text: text.to_string(),
        }
    }

    #[test]
    fn test_escape_specials() {
        assert_eq!(escape_for_latex("50% of $5 #1 a_b", true), "50\\% of \\$5 \\#1 a\\_b");
        assert_eq!(escape_for_latex("~^", false), "\\textasciitilde{}\\textasciicircum{}");
    }

    #[test]
    fn test_escape_quotes_and_dashes() {
        assert_eq!(escape_for_latex("\u{201E}gut\u{201C} \u{2013} ja", true), "``gut'' {-} ja");
        assert_eq!(escape_for_latex("E-Mail \u{2014} ok", false), "E-Mail - ok");
    }

    #[test]
    fn test_escape_keeps_existing_escapes_in_preserve_mode() {
        assert_eq!(escape_for_latex("10\\% und \\textit{x}", true), "10\\% und \\textit{x}");
        assert_eq!(escape_for_latex("a\\b", false), "a\\textbackslash{}b");
    }

    #[test]
    fn test_escape_drops_invisible() {
        assert_eq!(escape_for_latex("Trenn\u{00AD}strich", true), "Trennstrich");
    }

    #[test]
    fn test_concatenate_questions() {
        let comments = vec![comment(0, "Warum?"), comment(4, "Wie?")];
        assert_eq!(
            concatenate_questions(&comments, Language::German),
            "Seite 1: Warum? \\\\\n\\\\\nSeite 5: Wie?"
        );
        assert!(concatenate_questions(&comments, Language::English).starts_with("page 1: "));
        assert_eq!(concatenate_questions(&[], Language::German), "");
    }

    #[test]
    fn test_summary_remarks() {
        let stats = CategoryStats { source: 5, language: 5 };
        let summary = summary_with_remarks("Kurz.", &stats);
        assert_eq!(summary, "Kurz.\\\\Häufig fehlen Quellenangaben.");
        let stats = CategoryStats { source: 0, language: 6 };
        assert!(summary_with_remarks("", &stats).ends_with("Viele sprachliche Fehler."));
    }

    #[test]
    fn test_letter_from_metadata() {
        let meta = ThesisMetadata {
            author: Some("Erika Muster".to_string()),
            matriculation_number: Some("1234567".to_string()),
            title: Some("Analyse & Bewertung".to_string()),
            first_examiner: Some("Prof. Dr. Max Beispiel".to_string()),
            first_examiner_christian: Some("Max".to_string()),
            first_examiner_family: Some("Beispiel".to_string()),
            second_examiner: None,
            bachelor_master: Some("Master".to_string()),
        };
        let letter = ColloquiumLetter::from_metadata(&meta, "Summary.".to_string(), "Seite 1: Q".to_string());
        assert_eq!(letter.subject, "Bewertung Master von Erika Muster");
        assert_eq!(letter.first_examiner_mail, "max.beispiel@th-koeln.de");
        assert_eq!(letter.second_examiner, "Unbekannt");

        let tex = letter.render();
        assert!(tex.starts_with("\\documentclass[11pt,ngerman,parskip=full]{scrlttr2}"));
        assert!(tex.contains("\\textbf{Titel:} Analyse \\& Bewertung"));
        assert!(tex.contains("\\textbf{Autor:} Erika Muster, Matr.-Nr. 1234567"));
        assert!(tex.contains("\\textbf{Fragen Prof. Dr. Max Beispiel:}\\\\\n\nSeite 1: Q\\\\"));
        assert!(tex.contains("\\closing{Mit freundlichen Grü{\\ss}en}"));
    }

    #[test]
    fn test_compile_missing_engine() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("letter.tex");
        std::fs::write(&tex, "\\documentclass{article}").unwrap();
        let err = compile_latex(&tex, None, "pdf-remarks-no-such-engine").unwrap_err();
        assert!(matches!(err, Error::Latex(_)));
    }
}
