//! FictionBook 2 covers.
//!
//! The title page declares its cover as `<coverpage><image href="#id"/>`
//! and the image itself sits in a base64 `<binary id="id">` element at the
//! end of the document. DOCTYPE declarations are skipped, never resolved.

use crate::error::{ErrorKind, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::ResultExt;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Binary currently being collected.
struct Binary {
    id: String,
    data: String,
}

/// Returns the decoded cover image, or empty bytes if the document doesn't
/// declare one (or declares one that isn't there).
pub(crate) fn cover(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut cover_id: Option<String> = None;
    // Binaries that turn up before the description are held on to.
    let mut early: HashMap<String, String> = HashMap::new();
    let mut current: Option<Binary> = None;

    loop {
        let event = reader.read_event_into(&mut buf).or_raise(|| ErrorKind::MalformedFb2)?;
        match event {
            Event::Start(element) => {
                let name = element.local_name().as_ref().to_vec();
                if name == b"image" && cover_id.is_none() && in_coverpage(&path) {
                    cover_id = attribute(&element, b"href").map(|href| href.trim_start_matches('#').to_string());
                }
                if name == b"binary" {
                    current = attribute(&element, b"id").map(|id| Binary { id, data: String::new() });
                }
                path.push(name);
            },
            Event::Empty(element) => {
                if element.local_name().as_ref() == b"image" && cover_id.is_none() && in_coverpage(&path) {
                    cover_id = attribute(&element, b"href").map(|href| href.trim_start_matches('#').to_string());
                }
            },
            Event::Text(text) => {
                if let Some(binary) = current.as_mut() {
                    binary.data.push_str(&String::from_utf8_lossy(&text));
                }
            },
            Event::End(_) => {
                if path.pop().as_deref() == Some(b"binary".as_slice())
                    && let Some(binary) = current.take()
                {
                    match cover_id.as_deref() {
                        Some(id) if id == binary.id => return decode(&binary),
                        Some(_) => {},
                        None => {
                            early.insert(binary.id, binary.data);
                        },
                    }
                }
            },
            Event::Eof => break,
            // DOCTYPE, comments, processing instructions, CDATA
            _ => {},
        }
        buf.clear();
    }

    match cover_id.and_then(|id| early.remove_entry(&id)) {
        Some((id, data)) => decode(&Binary { id, data }),
        None => Ok(Vec::new()),
    }
}

fn in_coverpage(path: &[Vec<u8>]) -> bool {
    path.last().is_some_and(|parent| parent == b"coverpage")
}

fn decode(binary: &Binary) -> Result<Vec<u8>> {
    let compact: String = binary.data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact).or_raise(|| ErrorKind::InvalidBinary(binary.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(coverpage: &str, binaries: &str) -> String {
        format!(
            r##"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE FictionBook [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink">
  <description>
    <title-info>
      <book-title>Test</book-title>
      {coverpage}
    </title-info>
  </description>
  <body><section><p>Once upon a time.</p><image l:href="#inline.png"/></section></body>
  {binaries}
</FictionBook>"##
        )
    }

    #[test]
    fn test_cover_is_decoded() {
        let xml = document(
            r##"<coverpage><image l:href="#cover.jpg"/></coverpage>"##,
            r#"<binary id="inline.png" content-type="image/png">AAAA</binary>
               <binary id="cover.jpg" content-type="image/jpeg">
                 SGVsbG8s
                 IGNvdmVy
               </binary>"#,
        );
        assert_eq!(cover(xml.as_bytes()).unwrap(), b"Hello, cover");
    }

    #[test]
    fn test_plain_href_attribute() {
        let xml = document(
            r##"<coverpage><image href="#c"/></coverpage>"##,
            r#"<binary id="c" content-type="image/jpeg">Y292ZXI=</binary>"#,
        );
        assert_eq!(cover(xml.as_bytes()).unwrap(), b"cover");
    }

    #[test]
    fn test_no_coverpage() {
        let xml = document("", r#"<binary id="inline.png">AAAA</binary>"#);
        assert!(cover(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_body_images_are_not_covers() {
        // Only `inline.png` exists, and it's referenced from the body only.
        let xml = document(
            r##"<coverpage><image l:href="#missing.jpg"/></coverpage>"##,
            r#"<binary id="inline.png">AAAA</binary>"#,
        );
        assert!(cover(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_binary_before_description() {
        let xml = r##"<FictionBook xmlns:l="http://www.w3.org/1999/xlink">
            <binary id="c">Y292ZXI=</binary>
            <description><title-info><coverpage><image l:href="#c"/></coverpage></title-info></description>
        </FictionBook>"##;
        assert_eq!(cover(xml.as_bytes()).unwrap(), b"cover");
    }

    #[test]
    fn test_invalid_base64() {
        let xml = document(
            r##"<coverpage><image l:href="#c"/></coverpage>"##,
            r#"<binary id="c">not*base64!</binary>"#,
        );
        let err = cover(xml.as_bytes()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidBinary(id) if id == "c"));
    }

    #[test]
    fn test_malformed_xml() {
        let err = cover(b"<FictionBook><description></FictionBook>").unwrap_err();
        assert_eq!(*err, ErrorKind::MalformedFb2);
    }
}
