//! Prompt texts for the language model.

use crate::config::DocumentKind;
use crate::packager::RewriteRequest;

fn or_placeholder(text: &str) -> &str {
    if text.trim().is_empty() {
        "(not available)"
    } else {
        text
    }
}

/// Prompt that turns a terse remark into a question or review comment.
pub fn rewrite_prompt(request: &RewriteRequest) -> String {
    let paragraph = or_placeholder(&request.paragraph_context);
    let highlighted = or_placeholder(&request.anchor_text);
    let comment = request.raw_comment.as_str();

    match request.kind {
        DocumentKind::Thesis => format!(
            "You are given a paragraph from a thesis, the highlighted words a reader \
             commented on, and the reader's rough comment.\n\n\
             Rewrite the comment into a clear, polite and specific question that refers \
             to the highlighted text and makes sense in the context of the paragraph.\n\n\
             IMPORTANT:\n\
             - Detect the language of the original comment.\n\
             - Answer in the SAME language (usually German, sometimes English).\n\
             - The result is inserted into a LaTeX document: use plain LaTeX text, no markdown.\n\
             - Return only the rewritten question.\n\n\
             Paragraph:\n{}\n\n\
             Highlighted text:\n{}\n\n\
             Original comment:\n{}\n\n\
             Rewritten question (same language as the comment):\n",
            paragraph, highlighted, comment
        ),
        DocumentKind::PeerReview => format!(
            "You are reviewing an academic paper.\n\
             Rewrite the rough reviewer comment below into a clear, polite and constructive \
             remark addressed to the authors. Keep the meaning but use a professional review \
             style. Always write in English and return only the remark.\n\n\
             Paragraph (if available):\n{}\n\n\
             Highlighted text (if available):\n{}\n\n\
             Original comment:\n{}\n\n\
             Rewritten comment (Markdown):\n",
            paragraph, highlighted, comment
        ),
    }
}

/// Prompt that asks whether a text sample is German or English.
pub fn language_prompt(sample: &str) -> String {
    format!(
        "Decide whether the following text is written in German or English.\n\
         Respond with exactly one word: \"German\" or \"English\".\n\n\
         Text:\n{}\n",
        sample
    )
}

/// Prompt for a LaTeX-formatted thesis summary.
pub fn summary_prompt(text: &str, language: &str) -> String {
    format!(
        "You are given the first pages of a thesis submitted to a university.\n\
         Write a concise summary in {}.\n\n\
         The summary is inserted directly into a LaTeX document:\n\
         - Use plain LaTeX text, not markdown.\n\
         - Separate sentences with line breaks (`\\\\`).\n\
         - An itemized list (`\\begin{{itemize}} ... \\end{{itemize}}`) is fine; then do not end items with `\\\\`.\n\
         - Do not use characters that break LaTeX (unescaped #, $, %, &, _, {{, }}).\n\n\
         Cover the main topic, the research questions or goals, the methods and the key \
         results if the text contains them.\n\n\
         Text:\n{}\n\n\
         LaTeX-formatted summary:\n",
        language, text
    )
}

/// Prompt for thesis metadata as JSON.
pub fn metadata_prompt(text: &str, language: &str) -> String {
    format!(
        "You are given the first pages of a thesis submitted to a university. \
         It is written in {}.\n\
         Extract, if available: the author's full name, the matriculation number \
         (Matrikelnr.), the thesis title, the first examiner (Erstprüfer) with christian \
         and family name, the second examiner (Zweitprüfer), and whether it is a \
         'Bachelor' or 'Master' thesis.\n\n\
         Return a single JSON object with the keys \"author\", \"matriculation_number\", \
         \"title\", \"first_examiner\", \"first_examiner_christian\", \
         \"first_examiner_family\", \"second_examiner\", \"bachelor_master\".\n\
         Use null for anything missing. Do not add any other text.\n\n\
         Document text:\n{}\n",
        language, text
    )
}
