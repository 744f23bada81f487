use std::io::Cursor;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::OcrError;
use crate::geom::ScreenPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct OcrWord {
    pub offset: usize,
    pub left: i32,
    pub top: i32,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct HocrDocument {
    pub text: String,
    pub text_len: usize,
    pub line_starts: Vec<usize>,
    pub words: Vec<OcrWord>,
}

pub fn parse_hocr(
    markup: &str,
    origin: ScreenPoint,
    resize_factor: u32,
) -> Result<HocrDocument, OcrError> {
    let mut reader = Reader::from_reader(Cursor::new(markup.as_bytes()));
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut doc = HocrDocument::default();
    let mut block_has_content = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                depth += 1;
                handle_element(&start, origin, resize_factor, &mut doc, &mut block_has_content)?;
            }
            Ok(Event::Empty(start)) => {
                handle_element(&start, origin, resize_factor, &mut doc, &mut block_has_content)?;
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(text)) => {
                if depth > 0 {
                    let decoded = text.unescape()?;
                    append_char_data(decoded.as_ref(), &mut doc, &mut block_has_content);
                }
            }
            Ok(Event::CData(cdata)) => {
                if depth > 0 {
                    let decoded = String::from_utf8_lossy(cdata.as_ref());
                    append_char_data(decoded.as_ref(), &mut doc, &mut block_has_content);
                }
            }
            Ok(_) => {}
            Err(err) => return Err(OcrError::Parse(err)),
        }
        buf.clear();
    }

    Ok(doc)
}

fn handle_element(
    element: &BytesStart,
    origin: ScreenPoint,
    resize_factor: u32,
    doc: &mut HocrDocument,
    block_has_content: &mut bool,
) -> Result<(), OcrError> {
    match element.name().as_ref() {
        b"p" | b"div" => *block_has_content = false,
        b"span" => match attr_value(element, "class")?.as_deref() {
            Some("ocr_line") => doc.line_starts.push(doc.text_len),
            Some("ocr_word") => {
                let title = attr_value(element, "title")?.ok_or_else(|| {
                    OcrError::MalformedMarkup("word span has no title attribute".to_string())
                })?;
                let (left, top) = parse_bbox_title(&title)?;
                let divisor = resize_factor.max(1) as i32;
                doc.words.push(OcrWord {
                    offset: doc.text_len,
                    left: origin.x + left / divisor,
                    top: origin.y + top / divisor,
                });
            }
            _ => {}
        },
        _ => {}
    }
    Ok(())
}

fn attr_value(element: &BytesStart, name: &str) -> Result<Option<String>, OcrError> {
    let Some(attr) = element
        .try_get_attribute(name)
        .map_err(quick_xml::Error::from)?
    else {
        return Ok(None);
    };
    let value = attr.unescape_value()?;
    Ok(Some(value.into_owned()))
}

// The title attribute carries "<prefix> <left> <top> <right> <bottom>" in
// engine pixel units; only the top-left corner matters for review positions.
fn parse_bbox_title(title: &str) -> Result<(i32, i32), OcrError> {
    let tokens: Vec<&str> = title.split_whitespace().collect();
    if tokens.len() != 5 {
        return Err(OcrError::MalformedMarkup(format!(
            "word title is not a five-token bbox: {title:?}"
        )));
    }
    let mut coords = [0i32; 4];
    for (slot, token) in coords.iter_mut().zip(&tokens[1..]) {
        *slot = token.parse().map_err(|_| {
            OcrError::MalformedMarkup(format!("bbox coordinate is not an integer: {token:?}"))
        })?;
    }
    Ok((coords[0], coords[1]))
}

// The reader hands over whole text nodes, so the collapsing policy is applied
// per whitespace / non-whitespace run within each chunk.
fn append_char_data(data: &str, doc: &mut HocrDocument, block_has_content: &mut bool) {
    let mut rest = data;
    while let Some(first) = rest.chars().next() {
        let in_whitespace = first.is_whitespace();
        let run_end = rest
            .find(|ch: char| ch.is_whitespace() != in_whitespace)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(run_end);
        if in_whitespace {
            // Whitespace before any block content is stripped; the rest
            // collapses to one space, including runs spanning elements.
            if *block_has_content && !doc.text.ends_with(' ') {
                doc.text.push(' ');
                doc.text_len += 1;
            }
        } else {
            *block_has_content = true;
            doc.text.push_str(run);
            doc.text_len += run.chars().count();
        }
        rest = tail;
    }
}
