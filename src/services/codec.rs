//! Bidirectional converter between the XML metadata document and the
//! in-memory `MetaData` record.
//!
//! The decoder is deliberately forgiving: tag names match case-insensitively,
//! unknown tags are skipped, and a document that cannot be parsed at all is
//! reported as "no metadata", never as an error.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::models::MetaData;

/// Decodes an uploaded metadata document. Returns `None` for input that is
/// not well-formed XML or contains no element at all.
pub fn decode(text: &str) -> Option<MetaData> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current_tag = String::new();
    // Element text arrives in fragments: entity references split it into
    // separate Text and GeneralRef events. Accumulate until the end tag.
    let mut text = String::new();
    let mut saw_element = false;
    let mut meta = MetaData::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                saw_element = true;
                current_tag = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                text.clear();
            }
            Ok(Event::Text(e)) => {
                if let Ok(t) = e.decode() {
                    text.push_str(&t);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(c)) = e.resolve_char_ref() {
                    text.push(c);
                } else if let Some(s) = quick_xml::escape::resolve_predefined_entity(
                    &String::from_utf8_lossy(e.as_ref()),
                ) {
                    text.push_str(s);
                }
                // Unknown entities are dropped like any other unusable input.
            }
            Ok(Event::End(_)) => {
                if !text.is_empty() {
                    commit_field(&mut meta, &current_tag, &text);
                }
                current_tag.clear();
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => (),
        }
        buf.clear();
    }

    if saw_element { Some(meta) } else { None }
}

fn commit_field(meta: &mut MetaData, tag: &str, text: &str) {
    match tag {
        "creationtime" => {
            meta.creation_time = DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|t| t.with_timezone(&Utc));
        }
        "cameramake" => meta.camera_make = Some(text.to_string()),
        "cameramodel" => meta.camera_model = Some(text.to_string()),
        "orientation" => meta.orientation = text.parse().ok(),
        "horizontalppi" => meta.horizontal_ppi = text.parse().ok(),
        "verticalppi" => meta.vertical_ppi = text.parse().ok(),
        "shutterspeed" => meta.shutter_speed = text.parse().ok(),
        "colorspace" => meta.color_space = Some(text.to_string()),
        _ => (),
    }
}

/// Serializes a record back to the document shape the decoder accepts.
/// Absent fields are omitted rather than written as empty elements.
pub fn encode(meta: &MetaData) -> String {
    try_encode(meta).unwrap_or_default()
}

fn try_encode(meta: &MetaData) -> std::io::Result<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("MetaData")))?;

    if let Some(t) = meta.creation_time {
        write_field(
            &mut writer,
            "creationTime",
            &t.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
    }
    if let Some(v) = &meta.camera_make {
        write_field(&mut writer, "cameraMake", v)?;
    }
    if let Some(v) = &meta.camera_model {
        write_field(&mut writer, "cameraModel", v)?;
    }
    if let Some(v) = meta.orientation {
        write_field(&mut writer, "orientation", &v.to_string())?;
    }
    if let Some(v) = meta.horizontal_ppi {
        write_field(&mut writer, "horizontalPpi", &v.to_string())?;
    }
    if let Some(v) = meta.vertical_ppi {
        write_field(&mut writer, "verticalPpi", &v.to_string())?;
    }
    if let Some(v) = meta.shutter_speed {
        write_field(&mut writer, "shutterSpeed", &v.to_string())?;
    }
    if let Some(v) = &meta.color_space {
        write_field(&mut writer, "colorSpace", v)?;
    }

    writer.write_event(Event::End(BytesEnd::new("MetaData")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_field(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn full_metadata() -> MetaData {
        MetaData {
            creation_time: Some(Utc.with_ymd_and_hms(2021, 6, 1, 12, 30, 0).unwrap()),
            camera_make: Some("Canon".to_string()),
            camera_model: Some("EOS R5".to_string()),
            orientation: Some(1),
            horizontal_ppi: Some(300),
            vertical_ppi: Some(300),
            shutter_speed: Some(0.008),
            color_space: Some("sRGB".to_string()),
        }
    }

    #[test]
    fn test_round_trip_with_all_fields() {
        let meta = full_metadata();
        let xml = encode(&meta);
        let decoded = decode(&xml).expect("encoded document must decode");
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_round_trip_with_xml_special_characters() {
        let meta = MetaData {
            camera_make: Some("AT&T".to_string()),
            camera_model: Some("<EOS-R5>".to_string()),
            color_space: Some("'sRGB'".to_string()),
            ..MetaData::default()
        };
        let decoded = decode(&encode(&meta)).expect("encoded document must decode");
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_decode_resolves_entity_references() {
        let xml = "<MetaData><cameraMake>AT&amp;T</cameraMake>\
                   <cameraModel>&lt;X100&gt;</cameraModel>\
                   <colorSpace>a&#x41;a</colorSpace></MetaData>";
        let meta = decode(xml).unwrap();
        assert_eq!(meta.camera_make.as_deref(), Some("AT&T"));
        assert_eq!(meta.camera_model.as_deref(), Some("<X100>"));
        assert_eq!(meta.color_space.as_deref(), Some("aAa"));
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        let xml = "<METADATA><CAMERAMAKE>Nikon</CAMERAMAKE><OrIeNtAtIoN>6</OrIeNtAtIoN></METADATA>";
        let meta = decode(xml).unwrap();
        assert_eq!(meta.camera_make.as_deref(), Some("Nikon"));
        assert_eq!(meta.orientation, Some(6));
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let xml = "<MetaData><lensModel>50mm</lensModel><cameraModel>X100</cameraModel></MetaData>";
        let meta = decode(xml).unwrap();
        assert_eq!(meta.camera_model.as_deref(), Some("X100"));
        assert_eq!(meta.camera_make, None);
    }

    #[test]
    fn test_decode_rejects_non_xml() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("not xml at all"), None);
        assert_eq!(decode(r#"{"cameraMake": "Canon"}"#), None);
    }

    #[test]
    fn test_decode_leaves_unparseable_numbers_absent() {
        let xml = "<MetaData><orientation>sideways</orientation></MetaData>";
        let meta = decode(xml).unwrap();
        assert_eq!(meta.orientation, None);
    }

    #[test]
    fn test_decode_empty_document_is_all_absent() {
        let meta = decode("<MetaData></MetaData>").unwrap();
        assert_eq!(meta, MetaData::default());
    }

    #[test]
    fn test_encode_omits_absent_fields() {
        let meta = MetaData {
            camera_make: Some("Sony".to_string()),
            ..MetaData::default()
        };
        let xml = encode(&meta);
        assert!(xml.contains("<cameraMake>Sony</cameraMake>"));
        assert!(!xml.contains("orientation"));
        assert!(!xml.contains("creationTime"));
    }
}
