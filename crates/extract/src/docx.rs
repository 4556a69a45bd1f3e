//! `.docx` extraction: body paragraphs of `word/document.xml`.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::DocxError(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::DocxError(format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::DocxError(format!("{DOCUMENT_PART}: {e}")))?;

    let paragraphs = body_paragraphs(&xml)?;
    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Text of every `w:body/w:p`, in document order, empty ones included.
///
/// Only runs that belong to the paragraph itself count (directly or through a
/// `w:hyperlink`); tables, text boxes and drawings nested deeper are skipped.
fn body_paragraphs(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractionError::DocxError(format!("malformed {DOCUMENT_PART}: {e}")))?;

        match event {
            Event::Start(e) => {
                stack.push(e.local_name().as_ref().to_vec());
                if is_body_paragraph(&stack) {
                    current = Some(String::new());
                }
            }
            Event::Empty(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"p" if is_body(&stack) => paragraphs.push(String::new()),
                    b"tab" if in_run(&stack) => push_text(&mut current, "\t"),
                    b"br" | b"cr" if in_run(&stack) => push_text(&mut current, "\n"),
                    _ => {}
                }
            }
            Event::Text(t) => {
                if in_run_text(&stack) {
                    let text = t.unescape().map_err(|e| {
                        ExtractionError::DocxError(format!("malformed {DOCUMENT_PART}: {e}"))
                    })?;
                    push_text(&mut current, &text);
                }
            }
            Event::End(_) => {
                if is_body_paragraph(&stack) {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_text(current: &mut Option<String>, text: &str) {
    if let Some(p) = current.as_mut() {
        p.push_str(text);
    }
}

fn names(stack: &[Vec<u8>]) -> Vec<&[u8]> {
    stack.iter().map(|n| n.as_slice()).collect()
}

/// Stack is exactly `document/body`.
fn is_body(stack: &[Vec<u8>]) -> bool {
    names(stack) == [b"document".as_slice(), b"body"]
}

/// Stack is exactly `document/body/p`.
fn is_body_paragraph(stack: &[Vec<u8>]) -> bool {
    names(stack) == [b"document".as_slice(), b"body", b"p"]
}

/// Stack is a run of a body paragraph: `document/body/p[/hyperlink]/r`.
fn in_run(stack: &[Vec<u8>]) -> bool {
    let n = names(stack);
    n == [b"document".as_slice(), b"body", b"p", b"r"]
        || n == [b"document".as_slice(), b"body", b"p", b"hyperlink", b"r"]
}

/// Stack is a `w:t` inside a body paragraph run.
fn in_run_text(stack: &[Vec<u8>]) -> bool {
    match stack.split_last() {
        Some((last, parent)) => last.as_slice() == b"t" && in_run(parent),
        None => false,
    }
}
