/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Dictionary-driven message assembly and serialization.
//!
//! [`Assembler`] takes a [`Scratch`] of caller-supplied field and group
//! values and orders them against a resolved dictionary layout, producing
//! a [`Message`] ready for serialization. `populate_header`,
//! `populate_trailer`, and `populate_message_body` each handle one
//! section in isolation; `create_message` drives all three, auto-setting
//! MsgType(35) in the scratch for the duration of the call and restoring
//! whatever was there before.
//!
//! BeginString(8), BodyLength(9), and CheckSum(10) are never read from
//! scratch: they are framing fields the encoder computes at serialization
//! time, so the assembler skips them even if the session dictionary's
//! header/trailer element list names them.
//!
//! [`serialize`] is the other half: it walks a [`Message`]'s header, body,
//! and trailer in installed order, writes repeating groups recursively
//! (count tag followed by each instance's elements), and recomputes
//! BodyLength(9) and CheckSum(10) rather than trusting any framing-tag
//! values already present in the sections. A `Message` produced by
//! [`Assembler`] carries none (they are skipped on the way in); one
//! produced by [`crate::parser::Parser`] does carry them, and `serialize`
//! skips those occurrences too so they are never written twice.

use crate::checksum::{calculate_checksum, format_checksum};
use crate::encoder::SOH;
use bytes::{BufMut, BytesMut};
use ironfix_core::runtime::{Message, MessageElement, Scratch, Section};
use ironfix_dictionary::{resolve, DictionaryError, DxRegistry, ResolvedElement};
use std::collections::HashSet;

/// Fields the assembler never reads from scratch and the serializer never
/// writes from a section directly: they are computed at serialization time.
const FRAMING_TAGS: [u32; 3] = [8, 9, 10];

/// Errors that can occur while assembling a message from scratch values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    /// No dictionary is registered under the requested name.
    #[error("unknown dictionary: {0}")]
    UnknownDictionary(String),
    /// The application dictionary has no definition for the requested MsgType.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
    /// A required field or group was absent from scratch.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// Tag of the missing field or group count tag.
        tag: u32,
    },
    /// The dictionary itself failed to resolve (component cycle, unknown reference).
    #[error("dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),
}

/// Orders scratch values against a resolved dictionary layout.
pub struct Assembler<'a> {
    dictionaries: &'a DxRegistry,
}

impl<'a> Assembler<'a> {
    /// Creates an assembler bound to the given dictionary registry.
    #[must_use]
    pub fn new(dictionaries: &'a DxRegistry) -> Self {
        Self { dictionaries }
    }

    /// Populates the header section from `scratch`, using `session_dict_name`'s
    /// header element list. BeginString and BodyLength are skipped.
    ///
    /// # Errors
    /// Returns [`AssembleError::UnknownDictionary`], a wrapped
    /// [`DictionaryError`], or [`AssembleError::MissingRequiredField`].
    pub fn populate_header(&self, session_dict_name: &str, scratch: &Scratch) -> Result<Section, AssembleError> {
        let dict = self
            .dictionaries
            .get(session_dict_name)
            .ok_or_else(|| AssembleError::UnknownDictionary(session_dict_name.to_string()))?;
        let resolved = resolve(&dict, &dict.header)?;
        populate_section(&resolved, scratch, &FRAMING_TAGS, false)
    }

    /// Populates the trailer section from `scratch`, using `session_dict_name`'s
    /// trailer element list. CheckSum is skipped.
    ///
    /// # Errors
    /// Returns [`AssembleError::UnknownDictionary`], a wrapped
    /// [`DictionaryError`], or [`AssembleError::MissingRequiredField`].
    pub fn populate_trailer(&self, session_dict_name: &str, scratch: &Scratch) -> Result<Section, AssembleError> {
        let dict = self
            .dictionaries
            .get(session_dict_name)
            .ok_or_else(|| AssembleError::UnknownDictionary(session_dict_name.to_string()))?;
        let resolved = resolve(&dict, &dict.trailer)?;
        populate_section(&resolved, scratch, &FRAMING_TAGS, false)
    }

    /// Populates the message body from `scratch`, using `app_dict_name`'s
    /// definition of `msg_type`. Scratch values that match no element of
    /// the message's definition are appended at the tail, in the order
    /// they were set, as user-defined fields.
    ///
    /// # Errors
    /// Returns [`AssembleError::UnknownDictionary`],
    /// [`AssembleError::UnknownMessageType`], a wrapped [`DictionaryError`],
    /// or [`AssembleError::MissingRequiredField`].
    pub fn populate_message_body(
        &self,
        app_dict_name: &str,
        msg_type: &str,
        scratch: &Scratch,
    ) -> Result<Section, AssembleError> {
        let dict = self
            .dictionaries
            .get(app_dict_name)
            .ok_or_else(|| AssembleError::UnknownDictionary(app_dict_name.to_string()))?;
        let message_def = dict
            .get_message(msg_type)
            .ok_or_else(|| AssembleError::UnknownMessageType(msg_type.to_string()))?;
        let resolved = resolve(&dict, &message_def.elements)?;
        populate_section(&resolved, scratch, &[], true)
    }

    /// Builds a complete message: header, body, and trailer, resolved
    /// against `session_dict_name` and `app_dict_name` respectively.
    /// MsgType(35) is set in `scratch` for the duration of the call (so
    /// both header and body see it) and restored to its prior value
    /// (or removed, if it had none) before returning.
    ///
    /// # Errors
    /// Returns [`AssembleError::UnknownDictionary`],
    /// [`AssembleError::UnknownMessageType`], a wrapped [`DictionaryError`],
    /// or [`AssembleError::MissingRequiredField`].
    pub fn create_message(
        &self,
        session_dict_name: &str,
        app_dict_name: &str,
        msg_type: &str,
        scratch: &mut Scratch,
    ) -> Result<Message, AssembleError> {
        let prior_msg_type = scratch.remove_field(35);
        scratch.set_field(35, msg_type);

        let result = (|| {
            let header = self.populate_header(session_dict_name, scratch)?;
            let body = self.populate_message_body(app_dict_name, msg_type, scratch)?;
            let trailer = self.populate_trailer(session_dict_name, scratch)?;
            Ok(Message { header, body, trailer })
        })();

        match prior_msg_type {
            Some(value) => scratch.set_field(35, value),
            None => {
                scratch.remove_field(35);
            }
        }

        result
    }
}

/// Walks `resolved` in order, pulling each element's value from `scratch`.
/// Tags in `skip` are never read (the encoder fills them in). When
/// `append_unconsumed` is set, scratch values matching no resolved
/// element are appended at the tail, in scratch insertion order.
fn populate_section(
    resolved: &[ResolvedElement],
    scratch: &Scratch,
    skip: &[u32],
    append_unconsumed: bool,
) -> Result<Section, AssembleError> {
    let mut section = Section::new();
    let mut consumed: HashSet<u32> = HashSet::new();

    for element in resolved {
        let tag = element.tag();
        if skip.contains(&tag) {
            consumed.insert(tag);
            continue;
        }
        match element {
            ResolvedElement::Field(field) => {
                if let Some(value) = scratch.field(field.tag) {
                    section.push_field(field.tag, value);
                    consumed.insert(field.tag);
                } else if field.required {
                    return Err(AssembleError::MissingRequiredField { tag: field.tag });
                }
            }
            ResolvedElement::Group(group) => {
                if let Some(instance) = scratch.group(group.count_tag) {
                    section.push_group(instance.clone());
                    consumed.insert(group.count_tag);
                } else if group.required {
                    return Err(AssembleError::MissingRequiredField { tag: group.count_tag });
                }
            }
        }
    }

    if append_unconsumed {
        for tag in scratch.unconsumed(&consumed) {
            if let Some(value) = scratch.field(tag) {
                section.push_field(tag, value);
            } else if let Some(instance) = scratch.group(tag) {
                section.push_group(instance.clone());
            }
        }
    }

    Ok(section)
}

/// Serializes `message` to wire bytes under `begin_string`: header, then
/// body, then trailer, each walked in installed order, with BeginString(8),
/// BodyLength(9), and CheckSum(10) recomputed rather than read from the
/// sections.
#[must_use]
pub fn serialize(message: &Message, begin_string: &str) -> BytesMut {
    let mut body = BytesMut::with_capacity(256);
    write_section(&mut body, &message.header, &FRAMING_TAGS);
    write_section(&mut body, &message.body, &[]);
    write_section(&mut body, &message.trailer, &FRAMING_TAGS);

    let mut out = BytesMut::with_capacity(body.len() + 32);
    out.put_slice(b"8=");
    out.put_slice(begin_string.as_bytes());
    out.put_u8(SOH);
    out.put_slice(b"9=");
    let mut len_buf = itoa::Buffer::new();
    out.put_slice(len_buf.format(body.len()).as_bytes());
    out.put_u8(SOH);
    out.put_slice(&body);

    let checksum = calculate_checksum(&out);
    out.put_slice(b"10=");
    out.put_slice(&format_checksum(checksum));
    out.put_u8(SOH);
    out
}

/// Writes every element of `section` in order, skipping tags in `skip`.
fn write_section(out: &mut BytesMut, section: &Section, skip: &[u32]) {
    for element in &section.elements {
        write_element(out, element, skip);
    }
}

/// Writes one element: a plain field, or a group's count tag followed by
/// each instance's elements in order (recursing for nested groups).
/// Elements inside a group instance are never subject to `skip` — framing
/// tags cannot legally occur inside a group body.
fn write_element(out: &mut BytesMut, element: &MessageElement, skip: &[u32]) {
    match element {
        MessageElement::Field(field) => {
            if skip.contains(&field.tag) {
                return;
            }
            put_field(out, field.tag, &field.value);
        }
        MessageElement::Group(group) => {
            if skip.contains(&group.count_tag) {
                return;
            }
            put_field(out, group.count_tag, &group.instances.len().to_string());
            for instance in &group.instances {
                for inner in instance {
                    write_element(out, inner, &[]);
                }
            }
        }
    }
}

/// Writes one `tag=value` field followed by an SOH delimiter.
fn put_field(out: &mut BytesMut, tag: u32, value: &str) {
    let mut tag_buf = itoa::Buffer::new();
    out.put_slice(tag_buf.format(tag).as_bytes());
    out.put_u8(b'=');
    out.put_slice(value.as_bytes());
    out.put_u8(SOH);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironfix_core::runtime::GroupInstance;
    use ironfix_dictionary::{
        ComponentDef, Dictionary, ElementRef, FieldDef, FieldType, GroupDef, MessageCategory, MessageDef, Version,
    };

    fn fix44_dictionary() -> Dictionary {
        let mut dict = Dictionary::new(Version::Fix44);
        dict.add_field(FieldDef::new(8, "BeginString", FieldType::String));
        dict.add_field(FieldDef::new(9, "BodyLength", FieldType::Length));
        dict.add_field(FieldDef::new(35, "MsgType", FieldType::String));
        dict.add_field(FieldDef::new(49, "SenderCompID", FieldType::String));
        dict.add_field(FieldDef::new(56, "TargetCompID", FieldType::String));
        dict.add_field(FieldDef::new(10, "CheckSum", FieldType::String));
        dict.add_field(FieldDef::new(11, "ClOrdID", FieldType::String));
        dict.add_field(FieldDef::new(55, "Symbol", FieldType::String));
        dict.add_field(FieldDef::new(453, "NoPartyIDs", FieldType::NumInGroup));
        dict.add_field(FieldDef::new(448, "PartyID", FieldType::String));
        dict.add_field(FieldDef::new(802, "NoPartySubIDs", FieldType::NumInGroup));
        dict.add_field(FieldDef::new(523, "PartySubID", FieldType::String));
        dict.add_component(ComponentDef {
            name: "Parties".to_string(),
            elements: vec![ElementRef::Group(GroupDef {
                count_tag: 453,
                name: "NoPartyIDs".into(),
                delimiter_tag: 448,
                required: false,
                elements: vec![
                    ElementRef::Field {
                        tag: 448,
                        name: "PartyID".into(),
                        required: true,
                    },
                    ElementRef::Group(GroupDef {
                        count_tag: 802,
                        name: "NoPartySubIDs".into(),
                        delimiter_tag: 523,
                        required: false,
                        elements: vec![ElementRef::Field {
                            tag: 523,
                            name: "PartySubID".into(),
                            required: true,
                        }],
                    }),
                ],
            })],
        });

        dict.header = vec![
            ElementRef::Field { tag: 8, name: "BeginString".into(), required: true },
            ElementRef::Field { tag: 9, name: "BodyLength".into(), required: true },
            ElementRef::Field { tag: 35, name: "MsgType".into(), required: true },
            ElementRef::Field { tag: 49, name: "SenderCompID".into(), required: true },
            ElementRef::Field { tag: 56, name: "TargetCompID".into(), required: true },
        ];
        dict.trailer = vec![ElementRef::Field { tag: 10, name: "CheckSum".into(), required: true }];

        dict.add_message(MessageDef {
            msg_type: "D".to_string(),
            name: "NewOrderSingle".to_string(),
            category: MessageCategory::App,
            elements: vec![
                ElementRef::Field { tag: 11, name: "ClOrdID".into(), required: true },
                ElementRef::Component { name: "Parties".into(), required: false },
                ElementRef::Field { tag: 55, name: "Symbol".into(), required: true },
            ],
        });

        dict
    }

    fn registry_with(dict: Dictionary) -> DxRegistry {
        let registry = DxRegistry::new();
        registry.insert("FIX.4.4", dict).unwrap();
        registry
    }

    #[test]
    fn test_create_message_orders_fields_and_restores_msg_type() {
        let registry = registry_with(fix44_dictionary());
        let assembler = Assembler::new(&registry);

        let mut scratch = Scratch::new();
        scratch.set_field(49, "SENDER");
        scratch.set_field(56, "TARGET");
        scratch.set_field(55, "IBM");
        scratch.set_field(11, "ORDER1");

        let message = assembler.create_message("FIX.4.4", "FIX.4.4", "D", &mut scratch).unwrap();
        assert_eq!(message.header.get(35), Some("D"));
        assert_eq!(message.header.get(49), Some("SENDER"));
        assert_eq!(message.body.get(11), Some("ORDER1"));
        assert_eq!(message.body.get(55), Some("IBM"));
        assert!(message.trailer.is_empty());

        // MsgType must not leak back into scratch after assembly.
        assert_eq!(scratch.field(35), None);
    }

    #[test]
    fn test_populate_message_body_includes_group_and_unconsumed_tags() {
        let registry = registry_with(fix44_dictionary());
        let assembler = Assembler::new(&registry);

        let mut scratch = Scratch::new();
        scratch.set_field(11, "ORDER1");
        scratch.set_group(GroupInstance {
            count_tag: 453,
            instances: vec![vec![ironfix_core::runtime::MessageElement::Field(
                ironfix_core::runtime::FieldInstance::new(448, "ALICE"),
            )]],
        });
        scratch.set_field(55, "IBM");
        scratch.set_field(5904, "custom-value");

        let body = assembler.populate_message_body("FIX.4.4", "D", &scratch).unwrap();
        assert_eq!(body.get(11), Some("ORDER1"));
        assert!(body.get_group(453).is_some());
        assert_eq!(body.get(55), Some("IBM"));
        assert_eq!(body.get(5904), Some("custom-value"));
        // Unconsumed tag must come after the resolved elements.
        assert_eq!(body.elements.last().unwrap().tag(), 5904);
    }

    #[test]
    fn test_populate_message_body_missing_required_field() {
        let registry = registry_with(fix44_dictionary());
        let assembler = Assembler::new(&registry);
        let scratch = Scratch::new();
        assert!(matches!(
            assembler.populate_message_body("FIX.4.4", "D", &scratch),
            Err(AssembleError::MissingRequiredField { tag: 11 })
        ));
    }

    #[test]
    fn test_populate_header_skips_framing_fields() {
        let registry = registry_with(fix44_dictionary());
        let assembler = Assembler::new(&registry);
        let mut scratch = Scratch::new();
        scratch.set_field(49, "SENDER");
        scratch.set_field(56, "TARGET");
        scratch.set_field(35, "D");
        let header = assembler.populate_header("FIX.4.4", &scratch).unwrap();
        assert!(header.get(8).is_none());
        assert!(header.get(9).is_none());
        assert_eq!(header.get(35), Some("D"));
    }

    #[test]
    fn test_unknown_message_type() {
        let registry = registry_with(fix44_dictionary());
        let assembler = Assembler::new(&registry);
        let scratch = Scratch::new();
        assert!(matches!(
            assembler.populate_message_body("FIX.4.4", "Z", &scratch),
            Err(AssembleError::UnknownMessageType(_))
        ));
    }

    fn matcher() -> ironfix_dictionary::VxMatcher {
        let record = ironfix_dictionary::VersionRecord {
            name: "fix44".to_string(),
            layer: ironfix_dictionary::Layer::Combined,
            begin_string: "FIX.4.4".to_string(),
            appl_ver_id: None,
            rules: vec![ironfix_dictionary::MatchRule {
                name: "bs".to_string(),
                pairs: vec![ironfix_dictionary::MatchPair { tag: 8, value: "FIX.4.4".to_string() }],
            }],
            dictionaries: vec!["FIX.4.4".to_string()],
        };
        ironfix_dictionary::VxMatcher::from_records(vec![record])
    }

    #[test]
    fn test_serialize_then_parse_round_trips_without_group() {
        let registry = registry_with(fix44_dictionary());
        let assembler = Assembler::new(&registry);

        let mut scratch = Scratch::new();
        scratch.set_field(49, "SENDER");
        scratch.set_field(56, "TARGET");
        scratch.set_field(11, "ORDER1");
        scratch.set_field(55, "IBM");

        let message = assembler.create_message("FIX.4.4", "FIX.4.4", "D", &mut scratch).unwrap();
        let bytes = serialize(&message, "FIX.4.4");

        let matcher = matcher();
        let parser = crate::parser::Parser::new(&matcher, &registry);
        match parser.parse(&bytes) {
            crate::parser::ParseOutcome::MsgComplete { message: parsed, bytes_consumed } => {
                assert_eq!(bytes_consumed, bytes.len());
                assert_eq!(parsed.header.get(49), Some("SENDER"));
                assert_eq!(parsed.header.get(56), Some("TARGET"));
                assert_eq!(parsed.body.get(11), Some("ORDER1"));
                assert_eq!(parsed.body.get(55), Some("IBM"));
                assert!(parsed.trailer.get(10).is_some());

                // Re-serializing the parsed message (whose header/trailer now
                // carry BeginString/BodyLength/CheckSum as ordinary fields)
                // must reproduce the same bytes: framing tags already present
                // in a section are skipped, not duplicated.
                assert_eq!(serialize(&parsed, "FIX.4.4"), bytes);
            }
            other => panic!("expected MsgComplete, got {other:?}"),
        }
    }

    #[test]
    fn test_serialize_then_parse_round_trips_with_nested_group() {
        let registry = registry_with(fix44_dictionary());
        let assembler = Assembler::new(&registry);

        let mut scratch = Scratch::new();
        scratch.set_field(49, "SENDER");
        scratch.set_field(56, "TARGET");
        scratch.set_field(11, "ORDER1");
        scratch.set_field(55, "IBM");
        scratch.set_group(GroupInstance {
            count_tag: 453,
            instances: vec![
                vec![
                    MessageElement::Field(ironfix_core::runtime::FieldInstance::new(448, "ALICE")),
                    MessageElement::Group(GroupInstance {
                        count_tag: 802,
                        instances: vec![vec![MessageElement::Field(
                            ironfix_core::runtime::FieldInstance::new(523, "SUB1"),
                        )]],
                    }),
                ],
                vec![MessageElement::Field(ironfix_core::runtime::FieldInstance::new(448, "BOB"))],
            ],
        });

        let message = assembler.create_message("FIX.4.4", "FIX.4.4", "D", &mut scratch).unwrap();
        let bytes = serialize(&message, "FIX.4.4");

        let matcher = matcher();
        let parser = crate::parser::Parser::new(&matcher, &registry);
        match parser.parse(&bytes) {
            crate::parser::ParseOutcome::MsgComplete { message: parsed, .. } => {
                let group = parsed.body.get_group(453).expect("NoPartyIDs group present");
                assert_eq!(group.instances.len(), 2);
                let nested = group.instances[0]
                    .iter()
                    .find_map(|e| match e {
                        MessageElement::Group(g) if g.count_tag == 802 => Some(g),
                        _ => None,
                    })
                    .expect("nested NoPartySubIDs group present");
                assert_eq!(nested.instances.len(), 1);
                assert_eq!(serialize(&parsed, "FIX.4.4"), bytes);
            }
            other => panic!("expected MsgComplete, got {other:?}"),
        }
    }
}
