/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Dictionary-driven message parser.
//!
//! [`Decoder`] turns a byte buffer into a flat, wire-ordered field list
//! without knowing what any of the tags mean. [`Parser`] takes that one
//! step further: given a session version registry and an application
//! dictionary registry, it resolves the message's protocol version,
//! walks the resolved element list of header, body, and trailer, and
//! builds a structured [`Message`] with repeating groups reconstructed
//! as [`GroupInstance`] nodes.
//!
//! The six-way [`ParseOutcome`] distinguishes a buffer that simply needs
//! more bytes ([`ParseOutcome::MsgExhausted`]) from one that will never
//! parse ([`ParseOutcome::MsgMalformed`]), and an unrecognized protocol
//! version ([`ParseOutcome::MsgUnkSxProtocol`] /
//! [`ParseOutcome::MsgUnkAxProtocol`]) from a recognized one that is
//! missing mandatory structure ([`ParseOutcome::MsgIncomplete`]).

use crate::decoder::Decoder;
use ironfix_core::error::DecodeError;
use ironfix_core::field::FieldRef;
use ironfix_core::runtime::{GroupInstance, Message, MessageElement, Section};
use ironfix_dictionary::{resolve, DxRegistry, ResolvedElement, ResolvedGroup, VxMatcher};

/// Why a message could never be parsed, regardless of how much more
/// data arrives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    /// BeginString did not start with `8=`.
    #[error("invalid begin string")]
    BadBeginString,
    /// BodyLength was present but not a valid integer.
    #[error("invalid body length")]
    BadBodyLength,
    /// CheckSum did not match the calculated value.
    #[error("bad checksum: calculated {calculated}, declared {declared}")]
    BadChecksum {
        /// Checksum computed over the received bytes.
        calculated: u8,
        /// Checksum declared in the CheckSum(10) field.
        declared: u8,
    },
    /// A field value was not valid UTF-8.
    #[error("invalid utf-8 at tag {tag}")]
    InvalidUtf8 {
        /// Tag of the offending field.
        tag: u32,
    },
    /// The application dictionary has no definition for the message's MsgType.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
    /// A repeating group's count field was not a valid integer.
    #[error("invalid group count at tag {count_tag}")]
    InvalidGroupCount {
        /// Tag of the group's count field.
        count_tag: u32,
    },
    /// Any other structural decode failure that can never resolve itself
    /// with more bytes.
    #[error("malformed message: {0}")]
    Other(String),
}

/// Why a message matched a known protocol version but still cannot be
/// turned into a complete [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IncompleteReason {
    /// No dictionary is registered under the name the matched version record names.
    #[error("no dictionary registered for {0}")]
    MissingDictionary(String),
    /// MsgType(35) was absent from the header.
    #[error("missing msg type field")]
    MissingMsgType,
}

/// The outcome of attempting to parse one message from a buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// A complete, structurally valid message was parsed.
    MsgComplete {
        /// The parsed message.
        message: Box<Message>,
        /// Number of bytes consumed from the start of the buffer.
        bytes_consumed: usize,
    },
    /// The buffer does not yet contain a complete message; the caller
    /// should read more bytes and retry.
    MsgExhausted,
    /// The buffer can never parse into a valid message regardless of
    /// how many more bytes arrive.
    MsgMalformed(MalformedReason),
    /// The protocol version was recognized but the message violates a
    /// structural invariant (e.g. a mandatory header field is absent).
    MsgIncomplete(IncompleteReason),
    /// BeginString(8) did not match any registered session-layer version.
    MsgUnkSxProtocol,
    /// The header fields did not match any registered application-layer version.
    MsgUnkAxProtocol,
}

/// Parses FIX messages against a session version matcher and an
/// application dictionary registry.
pub struct Parser<'a> {
    session_matcher: &'a VxMatcher,
    dictionaries: &'a DxRegistry,
}

impl<'a> Parser<'a> {
    /// Creates a parser bound to the given session matcher and dictionary registry.
    #[must_use]
    pub fn new(session_matcher: &'a VxMatcher, dictionaries: &'a DxRegistry) -> Self {
        Self {
            session_matcher,
            dictionaries,
        }
    }

    /// Attempts to parse one message from the front of `buf`.
    pub fn parse(&self, buf: &[u8]) -> ParseOutcome {
        let mut decoder = Decoder::new(buf);
        let raw = match decoder.decode() {
            Ok(raw) => raw,
            Err(DecodeError::Incomplete | DecodeError::MissingBodyLength | DecodeError::MissingMsgType) => {
                return ParseOutcome::MsgExhausted;
            }
            Err(DecodeError::InvalidBeginString) => {
                return ParseOutcome::MsgMalformed(MalformedReason::BadBeginString);
            }
            Err(DecodeError::InvalidBodyLength) => {
                return ParseOutcome::MsgMalformed(MalformedReason::BadBodyLength);
            }
            Err(DecodeError::ChecksumMismatch { calculated, declared }) => {
                return ParseOutcome::MsgMalformed(MalformedReason::BadChecksum { calculated, declared });
            }
            Err(DecodeError::InvalidUtf8(_)) => {
                return ParseOutcome::MsgMalformed(MalformedReason::InvalidUtf8 { tag: 0 });
            }
            Err(other) => return ParseOutcome::MsgMalformed(MalformedReason::Other(other.to_string())),
        };

        let fields: Vec<FieldRef<'_>> = raw.fields().copied().collect();
        let lookup = |tag: u32| fields.iter().find(|f| f.tag == tag).and_then(|f| f.as_str().ok());

        let Some(session_record) = self.session_matcher.get_sx_version(&lookup) else {
            return ParseOutcome::MsgUnkSxProtocol;
        };
        let Some(app_record) = self.session_matcher.get_ax_version(&lookup) else {
            return ParseOutcome::MsgUnkAxProtocol;
        };

        let Some(session_dict_name) = session_record.dictionaries.first() else {
            return ParseOutcome::MsgIncomplete(IncompleteReason::MissingDictionary(session_record.name.clone()));
        };
        let Some(session_dict) = self.dictionaries.get(session_dict_name) else {
            return ParseOutcome::MsgIncomplete(IncompleteReason::MissingDictionary(session_dict_name.clone()));
        };
        let Some(app_dict_name) = app_record.dictionaries.first() else {
            return ParseOutcome::MsgIncomplete(IncompleteReason::MissingDictionary(app_record.name.clone()));
        };
        let Some(app_dict) = self.dictionaries.get(app_dict_name) else {
            return ParseOutcome::MsgIncomplete(IncompleteReason::MissingDictionary(app_dict_name.clone()));
        };

        let Some(msg_type) = lookup(35) else {
            return ParseOutcome::MsgIncomplete(IncompleteReason::MissingMsgType);
        };
        let Some(message_def) = app_dict.get_message(msg_type) else {
            return ParseOutcome::MsgMalformed(MalformedReason::UnknownMessageType(msg_type.to_string()));
        };

        let header_resolved = match resolve(&session_dict, &session_dict.header) {
            Ok(r) => r,
            Err(reason) => {
                return ParseOutcome::MsgMalformed(MalformedReason::Other(format!(
                    "header resolution failed for {session_dict_name}: {reason}"
                )));
            }
        };
        let trailer_resolved = match resolve(&session_dict, &session_dict.trailer) {
            Ok(r) => r,
            Err(reason) => {
                return ParseOutcome::MsgMalformed(MalformedReason::Other(format!(
                    "trailer resolution failed for {session_dict_name}: {reason}"
                )));
            }
        };
        let body_resolved = match resolve(&app_dict, &message_def.elements) {
            Ok(r) => r,
            Err(_) => return ParseOutcome::MsgMalformed(MalformedReason::UnknownMessageType(msg_type.to_string())),
        };

        let header_len = header_resolved.len();
        let body_len = body_resolved.len();
        let mut combined = header_resolved;
        combined.extend(body_resolved);
        combined.extend(trailer_resolved);

        let (header, body, mut trailer) = match walk(&combined, header_len, body_len, &fields) {
            Ok(sections) => sections,
            Err(reason) => return ParseOutcome::MsgMalformed(reason),
        };

        // CheckSum itself is stripped by the low-level decoder (it is
        // consumed for validation, not returned as a field); re-attach it
        // to the trailer now that we know it was verified.
        let checksum = crate::checksum::calculate_checksum(&raw.buffer()[..raw.body_range().end]);
        let checksum_str = crate::checksum::format_checksum(checksum);
        trailer.push_field(10, String::from_utf8_lossy(&checksum_str).into_owned());

        ParseOutcome::MsgComplete {
            message: Box::new(Message { header, body, trailer }),
            bytes_consumed: raw.len(),
        }
    }
}

fn section_index(idx: usize, header_len: usize, body_len: usize) -> SectionKind {
    if idx < header_len {
        SectionKind::Header
    } else if idx < header_len + body_len {
        SectionKind::Body
    } else {
        SectionKind::Trailer
    }
}

#[derive(Clone, Copy)]
enum SectionKind {
    Header,
    Body,
    Trailer,
}

fn pick<'s>(
    kind: SectionKind,
    header: &'s mut Section,
    body: &'s mut Section,
    trailer: &'s mut Section,
) -> &'s mut Section {
    match kind {
        SectionKind::Header => header,
        SectionKind::Body => body,
        SectionKind::Trailer => trailer,
    }
}

/// Walks `combined` (the resolved element list of header ++ body ++
/// trailer, in that order) against the wire-ordered `tokens`, attaching
/// each token to whichever of the three sections its resolved position
/// falls in. Tokens that match no resolved element are attached to the
/// section of the current scan position as user-defined fields, at
/// their wire position, without aborting the parse.
fn walk(
    combined: &[ResolvedElement],
    header_len: usize,
    body_len: usize,
    tokens: &[FieldRef<'_>],
) -> Result<(Section, Section, Section), MalformedReason> {
    let mut header = Section::new();
    let mut body = Section::new();
    let mut trailer = Section::new();
    let mut pos = 0usize;
    let mut ti = 0usize;

    while ti < tokens.len() {
        let tok = tokens[ti];
        let value = tok
            .as_str()
            .map_err(|_| MalformedReason::InvalidUtf8 { tag: tok.tag })?;

        if let Some(found) = combined[pos..].iter().position(|e| e.tag() == tok.tag) {
            let idx = pos + found;
            match &combined[idx] {
                ResolvedElement::Field(f) => {
                    let kind = section_index(idx, header_len, body_len);
                    pick(kind, &mut header, &mut body, &mut trailer).push_field(f.tag, value);
                    ti += 1;
                    pos = idx + 1;
                }
                ResolvedElement::Group(g) => {
                    let (instance, consumed) = parse_group(g, &tokens[ti..])?;
                    let kind = section_index(idx, header_len, body_len);
                    pick(kind, &mut header, &mut body, &mut trailer).push_group(instance);
                    ti += consumed;
                    pos = idx + 1;
                }
            }
        } else {
            let kind = section_index(pos.min(combined.len().saturating_sub(1)), header_len, body_len);
            pick(kind, &mut header, &mut body, &mut trailer).push_field(tok.tag, value);
            ti += 1;
        }
    }

    Ok((header, body, trailer))
}

/// Parses one repeating group occurrence starting at `tokens[0]`, which
/// must be the group's count field itself.
fn parse_group(group: &ResolvedGroup, tokens: &[FieldRef<'_>]) -> Result<(GroupInstance, usize), MalformedReason> {
    let count_tok = tokens[0];
    let count_str = count_tok
        .as_str()
        .map_err(|_| MalformedReason::InvalidUtf8 { tag: count_tok.tag })?;
    let count: u32 = count_str
        .parse()
        .map_err(|_| MalformedReason::InvalidGroupCount { count_tag: group.count_tag })?;

    let mut consumed = 1usize;
    let mut instances = Vec::new();
    for _ in 0..count {
        if consumed >= tokens.len() || tokens[consumed].tag != group.delimiter_tag {
            // The buffer ran out, or the next tag is not this group's
            // delimiter: the group terminates early. This is recoverable
            // — the enclosing walk re-offers the tag at `consumed`.
            break;
        }
        let (instance_elems, used) = parse_group_instance(&group.body, &tokens[consumed..], group.delimiter_tag)?;
        instances.push(instance_elems);
        consumed += used;
    }

    if instances.len() as u32 != count {
        tracing::warn!(
            count_tag = group.count_tag,
            expected = count,
            actual = instances.len(),
            "repeating group instance count did not match declared count; continuing with actual instances"
        );
    }

    Ok((
        GroupInstance {
            count_tag: group.count_tag,
            instances,
        },
        consumed,
    ))
}

/// Parses one group instance's worth of elements starting at the
/// instance's delimiter tag, stopping at the next occurrence of
/// `delimiter_tag` or at the first tag that does not belong to `body`.
fn parse_group_instance(
    body: &[ResolvedElement],
    tokens: &[FieldRef<'_>],
    delimiter_tag: u32,
) -> Result<(Vec<MessageElement>, usize), MalformedReason> {
    let mut elements = Vec::new();
    let mut ti = 0usize;
    let mut pos = 0usize;

    while ti < tokens.len() {
        let tok = tokens[ti];
        if ti > 0 && tok.tag == delimiter_tag {
            break;
        }
        let value = tok
            .as_str()
            .map_err(|_| MalformedReason::InvalidUtf8 { tag: tok.tag })?;

        if let Some(found) = body[pos..].iter().position(|e| e.tag() == tok.tag) {
            let idx = pos + found;
            match &body[idx] {
                ResolvedElement::Field(f) => {
                    elements.push(MessageElement::Field(ironfix_core::runtime::FieldInstance::new(f.tag, value)));
                    ti += 1;
                    pos = idx + 1;
                }
                ResolvedElement::Group(inner) => {
                    let (inner_instance, used) = parse_group(inner, &tokens[ti..])?;
                    elements.push(MessageElement::Group(inner_instance));
                    ti += used;
                    pos = idx + 1;
                }
            }
        } else {
            // Tag belongs to neither this group's body nor its
            // delimiter: the instance (and the enclosing group) ends
            // here, and the tag is re-offered to the caller.
            break;
        }
    }

    Ok((elements, ti))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironfix_dictionary::{
        Dictionary, ElementRef, FieldDef, FieldType, GroupDef, Layer, MatchPair, MatchRule, MessageCategory,
        MessageDef, Version, VersionRecord, VxMatcher,
    };

    fn fix44_dictionary() -> Dictionary {
        let mut dict = Dictionary::new(Version::Fix44);
        dict.add_field(FieldDef::new(8, "BeginString", FieldType::String));
        dict.add_field(FieldDef::new(9, "BodyLength", FieldType::Length));
        dict.add_field(FieldDef::new(35, "MsgType", FieldType::String));
        dict.add_field(FieldDef::new(49, "SenderCompID", FieldType::String));
        dict.add_field(FieldDef::new(56, "TargetCompID", FieldType::String));
        dict.add_field(FieldDef::new(34, "MsgSeqNum", FieldType::SeqNum));
        dict.add_field(FieldDef::new(52, "SendingTime", FieldType::UtcTimestamp));
        dict.add_field(FieldDef::new(10, "CheckSum", FieldType::String));
        dict.add_field(FieldDef::new(11, "ClOrdID", FieldType::String));
        dict.add_field(FieldDef::new(55, "Symbol", FieldType::String));
        dict.add_field(FieldDef::new(54, "Side", FieldType::Char));
        dict.add_field(FieldDef::new(38, "OrderQty", FieldType::Qty));
        dict.add_field(FieldDef::new(40, "OrdType", FieldType::Char));
        dict.add_field(FieldDef::new(453, "NoPartyIDs", FieldType::NumInGroup));
        dict.add_field(FieldDef::new(448, "PartyID", FieldType::String));
        dict.add_field(FieldDef::new(447, "PartyIDSource", FieldType::Char));

        dict.header = vec![
            ElementRef::Field { tag: 8, name: "BeginString".into(), required: true },
            ElementRef::Field { tag: 9, name: "BodyLength".into(), required: true },
            ElementRef::Field { tag: 35, name: "MsgType".into(), required: true },
            ElementRef::Field { tag: 49, name: "SenderCompID".into(), required: true },
            ElementRef::Field { tag: 56, name: "TargetCompID".into(), required: true },
            ElementRef::Field { tag: 34, name: "MsgSeqNum".into(), required: true },
            ElementRef::Field { tag: 52, name: "SendingTime".into(), required: true },
        ];
        dict.trailer = vec![ElementRef::Field { tag: 10, name: "CheckSum".into(), required: true }];

        dict.add_message(MessageDef {
            msg_type: "D".to_string(),
            name: "NewOrderSingle".to_string(),
            category: MessageCategory::App,
            elements: vec![
                ElementRef::Field { tag: 11, name: "ClOrdID".into(), required: true },
                ElementRef::Group(GroupDef {
                    count_tag: 453,
                    name: "NoPartyIDs".into(),
                    delimiter_tag: 448,
                    required: false,
                    elements: vec![
                        ElementRef::Field { tag: 448, name: "PartyID".into(), required: true },
                        ElementRef::Field { tag: 447, name: "PartyIDSource".into(), required: false },
                    ],
                }),
                ElementRef::Field { tag: 55, name: "Symbol".into(), required: true },
                ElementRef::Field { tag: 54, name: "Side".into(), required: true },
                ElementRef::Field { tag: 38, name: "OrderQty".into(), required: true },
                ElementRef::Field { tag: 40, name: "OrdType".into(), required: true },
            ],
        });

        dict
    }

    fn matcher() -> VxMatcher {
        let record = VersionRecord {
            name: "fix44".to_string(),
            layer: Layer::Combined,
            begin_string: "FIX.4.4".to_string(),
            appl_ver_id: None,
            rules: vec![MatchRule {
                name: "bs".to_string(),
                pairs: vec![MatchPair { tag: 8, value: "FIX.4.4".to_string() }],
            }],
            dictionaries: vec!["FIX.4.4".to_string()],
        };
        VxMatcher::from_records(vec![record])
    }

    fn registry(dict: Dictionary) -> DxRegistry {
        let registry = DxRegistry::new();
        registry.insert("FIX.4.4", dict).unwrap();
        registry
    }

    fn build_message(body_fields: &str) -> Vec<u8> {
        let mut body = String::new();
        body.push_str("35=D\x0149=SENDER\x0156=TARGET\x0134=1\x0152=20260101-00:00:00\x01");
        body.push_str(body_fields);
        let body_len = body.len();
        let mut out = format!("8=FIX.4.4\x019={body_len}\x01");
        out.push_str(&body);
        let checksum = crate::checksum::calculate_checksum(out.as_bytes());
        let checksum_str = crate::checksum::format_checksum(checksum);
        out.push_str("10=");
        out.push_str(std::str::from_utf8(&checksum_str).unwrap());
        out.push('\x01');
        out.into_bytes()
    }

    #[test]
    fn test_parse_complete_message_without_group() {
        let dict = fix44_dictionary();
        let matcher = matcher();
        let registry = registry(dict);
        let parser = Parser::new(&matcher, &registry);

        let msg = build_message("11=ORDER1\x0155=IBM\x0154=1\x0138=100\x0140=2\x01");
        match parser.parse(&msg) {
            ParseOutcome::MsgComplete { message, bytes_consumed } => {
                assert_eq!(bytes_consumed, msg.len());
                assert_eq!(message.header.get(49), Some("SENDER"));
                assert_eq!(message.body.get(11), Some("ORDER1"));
                assert_eq!(message.body.get(55), Some("IBM"));
                assert_eq!(message.trailer.get(10).map(str::len), Some(3));
            }
            other => panic!("expected MsgComplete, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_complete_message_with_repeating_group() {
        let dict = fix44_dictionary();
        let matcher = matcher();
        let registry = registry(dict);
        let parser = Parser::new(&matcher, &registry);

        let msg = build_message(
            "11=ORDER1\x01453=2\x01448=ALICE\x01447=D\x01448=BOB\x0155=IBM\x0154=1\x0138=100\x0140=2\x01",
        );
        match parser.parse(&msg) {
            ParseOutcome::MsgComplete { message, .. } => {
                let group = message.body.get_group(453).expect("group present");
                assert_eq!(group.instances.len(), 2);
                assert_eq!(group.instances[0].len(), 2);
                assert_eq!(group.instances[1].len(), 1);
            }
            other => panic!("expected MsgComplete, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_incomplete_buffer_is_exhausted() {
        let dict = fix44_dictionary();
        let matcher = matcher();
        let registry = registry(dict);
        let parser = Parser::new(&matcher, &registry);

        let msg = b"8=FIX.4.4\x019=50\x0135=D\x01";
        assert_eq!(parser.parse(msg), ParseOutcome::MsgExhausted);
    }

    #[test]
    fn test_parse_unknown_session_version() {
        let dict = fix44_dictionary();
        let matcher = matcher();
        let registry = registry(dict);
        let parser = Parser::new(&matcher, &registry);

        let mut body = String::new();
        body.push_str("35=D\x0149=SENDER\x0156=TARGET\x0134=1\x0152=20260101-00:00:00\x0111=ORDER1\x0155=IBM\x0154=1\x0138=100\x0140=2\x01");
        let body_len = body.len();
        let mut out = format!("8=FIX.5.0\x019={body_len}\x01");
        out.push_str(&body);
        let checksum = crate::checksum::calculate_checksum(out.as_bytes());
        out.push_str("10=");
        out.push_str(std::str::from_utf8(&crate::checksum::format_checksum(checksum)).unwrap());
        out.push('\x01');

        assert_eq!(parser.parse(out.as_bytes()), ParseOutcome::MsgUnkSxProtocol);
    }

    #[test]
    fn test_parse_bad_checksum_is_malformed() {
        let dict = fix44_dictionary();
        let matcher = matcher();
        let registry = registry(dict);
        let parser = Parser::new(&matcher, &registry);

        let mut msg = build_message("11=ORDER1\x0155=IBM\x0154=1\x0138=100\x0140=2\x01");
        let len = msg.len();
        msg[len - 2] = b'9';
        match parser.parse(&msg) {
            ParseOutcome::MsgMalformed(MalformedReason::BadChecksum { .. }) => {}
            other => panic!("expected MsgMalformed(BadChecksum), got {other:?}"),
        }
    }
}
