//! Flat XML record files
//!
//! Reads every element named `row_element`, at any depth, as one record
//! whose child elements are tag/value pairs. Writes records as
//! `<Records><Record><Tag>value</Tag>...</Record></Records>`.

use crate::core::reference::RawRecord;
use crate::domain::{FormbridgeError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Read all `row_element` records from a file
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not well-formed XML.
pub fn read_records(path: &Path, row_element: &str) -> Result<Vec<RawRecord>> {
    let file =
        File::open(path).map_err(|e| FormbridgeError::Io(format!("{}: {e}", path.display())))?;
    parse_records(BufReader::new(file), row_element)
        .map_err(|e| FormbridgeError::Xml(format!("{}: {e}", path.display())))
}

/// Parse `row_element` records from any buffered reader
pub fn parse_records<R: BufRead>(source: R, row_element: &str) -> Result<Vec<RawRecord>> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let row_tag = row_element.as_bytes();
    let mut records = Vec::new();
    let mut buf = Vec::new();

    // Some(record) while inside a row; the field being read and its text
    let mut current: Option<RawRecord> = None;
    let mut field: Option<(String, String)> = None;
    let mut depth_in_row = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if current.is_none() {
                    if e.local_name().as_ref() == row_tag {
                        current = Some(RawRecord::new());
                        depth_in_row = 0;
                    }
                } else {
                    depth_in_row += 1;
                    if depth_in_row == 1 {
                        let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        field = Some((tag, String::new()));
                    }
                }
            }
            Event::Empty(e) => {
                if let Some(record) = current.as_mut() {
                    if depth_in_row == 0 {
                        let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        record.insert(tag, "");
                    }
                } else if e.local_name().as_ref() == row_tag {
                    records.push(RawRecord::new());
                }
            }
            Event::Text(e) => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    if depth_in_row == 0 {
                        if let Some(record) = current.take() {
                            records.push(record);
                        }
                    } else {
                        if depth_in_row == 1 {
                            if let (Some(record), Some((tag, value))) =
                                (current.as_mut(), field.take())
                            {
                                record.insert(tag, value.trim());
                            }
                        }
                        depth_in_row -= 1;
                    }
                }
            }
            Event::Eof => {
                if current.is_some() {
                    return Err(FormbridgeError::Xml(format!(
                        "unexpected end of document inside <{row_element}>"
                    )));
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(records)
}

/// Write records to `path`, replacing any existing file
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_records(path: &Path, records: &[Vec<(String, String)>]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    render_records(&mut out, records)?;
    out.flush()?;
    Ok(())
}

/// Render records as an indented `Records` document
pub fn render_records<W: Write>(sink: W, records: &[Vec<(String, String)>]) -> Result<()> {
    let mut writer = Writer::new_with_indent(sink, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("Records")))?;

    for record in records {
        writer.write_event(Event::Start(BytesStart::new("Record")))?;
        for (tag, value) in record {
            writer.write_event(Event::Start(BytesStart::new(tag.as_str())))?;
            if !value.is_empty() {
                writer.write_event(Event::Text(BytesText::new(value)))?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Record")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Records")))?;
    Ok(())
}
