//! Per-page text extraction and normalization.
//!
//! `pdf_extract` lays text out with newlines and runs of spaces that follow
//! the drawing order of the content stream rather than any logical row
//! structure. Pages are normalized into a single line of space-separated
//! tokens before pattern matching, so a record whose fields were drawn as
//! separate text objects still reads as one contiguous row.

use std::panic::{self, AssertUnwindSafe};

use crate::PdfError;

/// Extracts the text layer of a PDF, returning one `String` per page.
///
/// `pdf_extract` can panic on malformed input rather than returning an
/// error, so panics are caught and reported as [`PdfError::Extraction`].
///
/// # Errors
///
/// Returns [`PdfError::Extraction`] if the document cannot be parsed.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, PdfError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(PdfError::Extraction(format!(
            "failed to extract text from PDF: {e}"
        ))),
        Err(_) => Err(PdfError::Extraction(
            "PDF extraction panicked (malformed or encrypted document)".to_owned(),
        )),
    }
}

/// Collapses every whitespace run (newlines, tabs, non-breaking spaces)
/// into a single space and trims the result.
#[must_use]
pub fn normalize_page_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Finds the first occurrence of `needle` in `text`, ignoring case and
/// whitespace the same way doctor names are matched, and returns the byte
/// range it covers in `text`.
#[must_use]
pub fn find_loose(text: &str, needle: &str) -> Option<(usize, usize)> {
    let wanted: Vec<char> = needle
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    if wanted.is_empty() {
        return None;
    }

    let haystack: Vec<(usize, char)> = text
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .flat_map(|(i, c)| c.to_lowercase().map(move |l| (i, l)))
        .collect();

    haystack
        .windows(wanted.len())
        .find(|window| window.iter().map(|(_, c)| *c).eq(wanted.iter().copied()))
        .map(|window| {
            let (start, _) = window[0];
            let (last, _) = window[window.len() - 1];
            let end = last + text[last..].chars().next().map_or(0, char::len_utf8);
            (start, end)
        })
}

/// Finds the first loose occurrence of `needle` in `text` (see
/// [`find_loose`]) and returns its byte offset together with up to
/// `radius` characters of surrounding context.
#[must_use]
pub fn context_around<'a>(
    text: &'a str,
    needle: &str,
    radius: usize,
) -> Option<(usize, &'a str)> {
    let (index, after) = find_loose(text, needle)?;

    let start = text[..index]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    let end = text[after..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| after + i);

    Some((index, &text[start..end]))
}
