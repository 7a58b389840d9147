/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Structural validation of a decoded message against its dictionary layout.
//!
//! Where `ironfix_tagvalue::Parser` reconstructs a message for normal
//! processing, the validator re-walks the same source fields against the
//! expected header/body/trailer layout and produces a per-field diagnosis —
//! every field is tagged with a [`ValidationCode`] rather than silently
//! dropped or passed through. It is the stricter, diagnostic-oriented pass a
//! session enables under `SessionConfig::strict_validation`.

use ironfix_core::field::FieldRef;
use ironfix_dictionary::{resolve, Dictionary, DictionaryError, ResolvedElement, ResolvedGroup};
use std::collections::HashMap;

/// Per-field or per-group result of validating one element against the
/// expected layout. Mirrors the style of
/// [`crate::sequence::SequenceResult`]: a plain result enum, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    /// The field was found at (or filled into) its expected position.
    Present,
    /// An expected field never arrived.
    Missing,
    /// The field arrived, but only after a required field ahead of it in
    /// the expected layout had already been marked `Missing`.
    OutOfSequence,
    /// The tag does not appear anywhere in the expected layout.
    UserDefined,
    /// The field's value could not be decoded (e.g. invalid UTF-8).
    Invalid,
    /// A repeating group's count field was found and its instances parsed.
    GroupPresent,
    /// A repeating group's count field never arrived.
    GroupMissing,
    /// A repeating group's count field was present but not a valid integer.
    GroupInvalid,
}

/// One validated field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldResult {
    /// The field's tag.
    pub tag: u32,
    /// The field's value, if it was present and decodable on the wire.
    pub value: Option<String>,
    /// Whether this tag is required at this position.
    pub required: bool,
    /// The validation outcome.
    pub code: ValidationCode,
}

/// One validated repeating group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    /// The group's count tag.
    pub count_tag: u32,
    /// Whether the group is required at this position.
    pub required: bool,
    /// The validation outcome for the group as a whole.
    pub code: ValidationCode,
    /// One validated element list per group instance found on the wire.
    pub instances: Vec<Vec<ValidationElement>>,
}

/// A validated header, body, or trailer element: either a plain field or a
/// repeating group with its own instance sub-trees.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationElement {
    /// A validated field.
    Field(FieldResult),
    /// A validated repeating group.
    Group(GroupResult),
}

/// The full result of validating one message: header, body, and trailer
/// element trees, each preserving source order at the leaves.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    /// Validated header elements.
    pub header: Vec<ValidationElement>,
    /// Validated body elements.
    pub body: Vec<ValidationElement>,
    /// Validated trailer elements.
    pub trailer: Vec<ValidationElement>,
}

impl ValidationReport {
    /// Returns true if every field and group in the report validated as
    /// `Present`/`GroupPresent` — no `Missing`, `Invalid`, `GroupMissing`,
    /// or `GroupInvalid` codes anywhere in the tree. `OutOfSequence` and
    /// `UserDefined` do not fail the check: the former is a recoverable
    /// protocol-layer concern, the latter is expected for custom tags.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        fn elements_ok(elements: &[ValidationElement]) -> bool {
            elements.iter().all(|e| match e {
                ValidationElement::Field(f) => {
                    !matches!(f.code, ValidationCode::Missing | ValidationCode::Invalid)
                }
                ValidationElement::Group(g) => {
                    !matches!(g.code, ValidationCode::GroupMissing | ValidationCode::GroupInvalid)
                        && g.instances.iter().all(|i| elements_ok(i))
                }
            })
        }
        elements_ok(&self.header) && elements_ok(&self.body) && elements_ok(&self.trailer)
    }
}

/// Validates decoded fields against a session dictionary's header/trailer
/// and an application dictionary's message body layout.
pub struct Validator<'a> {
    session_dict: &'a Dictionary,
    app_dict: &'a Dictionary,
}

impl<'a> Validator<'a> {
    /// Creates a validator bound to the given session and application
    /// dictionaries.
    #[must_use]
    pub fn new(session_dict: &'a Dictionary, app_dict: &'a Dictionary) -> Self {
        Self { session_dict, app_dict }
    }

    /// Validates one message's flat, wire-ordered field list (as produced
    /// by `ironfix_tagvalue::Decoder`) against `msg_type`'s expected
    /// layout.
    ///
    /// # Errors
    /// Returns a [`DictionaryError`] if a component/group reference in
    /// either dictionary fails to resolve. An unknown `msg_type` is not an
    /// error here: the body layout is simply empty, so every body field
    /// surfaces as `UserDefined`.
    pub fn validate(&self, msg_type: &str, fields: &[FieldRef<'_>]) -> Result<ValidationReport, DictionaryError> {
        let header = resolve(self.session_dict, &self.session_dict.header)?;
        let trailer = resolve(self.session_dict, &self.session_dict.trailer)?;
        let body = match self.app_dict.get_message(msg_type) {
            Some(def) => resolve(self.app_dict, &def.elements)?,
            None => Vec::new(),
        };

        let header_len = header.len();
        let body_len = body.len();
        let mut combined = header;
        combined.extend(body);
        combined.extend(trailer);

        let (elements, _consumed) = walk(&combined, fields, None);

        let mut header = Vec::with_capacity(header_len);
        let mut body = Vec::with_capacity(body_len);
        let mut trailer = Vec::new();
        for (pos, elem) in elements {
            if pos < header_len {
                header.push(elem);
            } else if pos < header_len + body_len {
                body.push(elem);
            } else {
                trailer.push(elem);
            }
        }
        Ok(ValidationReport { header, body, trailer })
    }
}

/// Walks `elements` against `tokens`, following spec §4.5's placeholder
/// algorithm: a field that arrives before its expected position leaves a
/// `Missing` placeholder behind it, later filled (and marked
/// `OutOfSequence`) if it eventually arrives; a tag absent from `elements`
/// entirely is `UserDefined`; a tag that matches a [`ResolvedElement::Group`]
/// decodes its count and recurses into `parse_group`.
///
/// When `boundary` is `Some(delimiter_tag)`, this call is walking one group
/// instance rather than a top-level container: it stops (without
/// classifying the offending token) at the first repeat of `delimiter_tag`
/// after the first token, or at the first tag absent from `elements` at
/// all, leaving that token for the caller — the instance, and possibly the
/// enclosing group, ends there. This mirrors the same recoverable
/// termination rule `ironfix_tagvalue::parser` uses for group decoding.
///
/// Returns the validated elements paired with the position in `elements`
/// each one corresponds to — `Missing`/`Present`/`Group` entries carry
/// their true position; `UserDefined`/`Invalid` entries (which have no
/// position in `elements`) carry the current scan position as the nearest
/// approximation, used by the top-level caller to decide which of
/// header/body/trailer an unrecognized tag belongs to — plus the number of
/// tokens consumed.
fn walk(
    elements: &[ResolvedElement],
    tokens: &[FieldRef<'_>],
    boundary: Option<u32>,
) -> (Vec<(usize, ValidationElement)>, usize) {
    let mut results: Vec<(usize, ValidationElement)> = Vec::new();
    let mut pending: HashMap<u32, usize> = HashMap::new();
    let mut saw_required_missing = false;
    let mut expected_pos = 0usize;
    let mut ti = 0usize;

    while ti < tokens.len() {
        let tok = tokens[ti];

        if let Some(delimiter) = boundary {
            if ti > 0 && tok.tag == delimiter {
                break;
            }
        }

        let Ok(value) = tok.as_str() else {
            results.push((
                expected_pos,
                ValidationElement::Field(FieldResult {
                    tag: tok.tag,
                    value: None,
                    required: false,
                    code: ValidationCode::Invalid,
                }),
            ));
            ti += 1;
            continue;
        };
        let value = value.to_owned();

        if let Some(&result_idx) = pending.get(&tok.tag) {
            let code = if saw_required_missing {
                ValidationCode::OutOfSequence
            } else {
                ValidationCode::Present
            };
            if let Some((_, ValidationElement::Field(f))) = results.get_mut(result_idx) {
                f.value = Some(value);
                f.code = code;
            }
            pending.remove(&tok.tag);
            ti += 1;
            continue;
        }

        if let Some(found) = elements[expected_pos..].iter().position(|e| e.tag() == tok.tag) {
            let idx = expected_pos + found;
            for skip_idx in expected_pos..idx {
                emit_missing(skip_idx, &elements[skip_idx], &mut results, &mut pending, &mut saw_required_missing);
            }
            match &elements[idx] {
                ResolvedElement::Field(f) => {
                    results.push((
                        idx,
                        ValidationElement::Field(FieldResult {
                            tag: f.tag,
                            value: Some(value),
                            required: f.required,
                            code: ValidationCode::Present,
                        }),
                    ));
                }
                ResolvedElement::Group(g) => {
                    let (group_result, used) = parse_group(g, &tokens[ti..]);
                    results.push((idx, ValidationElement::Group(group_result)));
                    ti += used;
                    expected_pos = idx + 1;
                    continue;
                }
            }
            expected_pos = idx + 1;
            ti += 1;
        } else if boundary.is_some() {
            break;
        } else {
            results.push((
                expected_pos,
                ValidationElement::Field(FieldResult {
                    tag: tok.tag,
                    value: Some(value),
                    required: false,
                    code: ValidationCode::UserDefined,
                }),
            ));
            ti += 1;
        }
    }

    for idx in expected_pos..elements.len() {
        emit_missing(idx, &elements[idx], &mut results, &mut pending, &mut saw_required_missing);
    }

    (results, ti)
}

/// Pushes `element` (found at `idx` in the expected layout) as a
/// `Missing`/`GroupMissing` placeholder, and for plain fields records its
/// position so a later out-of-order arrival can still be matched back to
/// it.
fn emit_missing(
    idx: usize,
    element: &ResolvedElement,
    results: &mut Vec<(usize, ValidationElement)>,
    pending: &mut HashMap<u32, usize>,
    saw_required_missing: &mut bool,
) {
    match element {
        ResolvedElement::Field(f) => {
            if f.required {
                *saw_required_missing = true;
            }
            let result_idx = results.len();
            results.push((
                idx,
                ValidationElement::Field(FieldResult {
                    tag: f.tag,
                    value: None,
                    required: f.required,
                    code: ValidationCode::Missing,
                }),
            ));
            pending.insert(f.tag, result_idx);
        }
        ResolvedElement::Group(g) => {
            if g.required {
                *saw_required_missing = true;
            }
            results.push((
                idx,
                ValidationElement::Group(GroupResult {
                    count_tag: g.count_tag,
                    required: g.required,
                    code: ValidationCode::GroupMissing,
                    instances: Vec::new(),
                }),
            ));
        }
    }
}

/// `tokens[0]` must be the group's count field. Decodes the count, then
/// recurses into one `walk` call per instance bounded by `group`'s
/// delimiter tag, matching spec §4.5's "clone the group's body N times
/// into a sub-template, and recurse."
fn parse_group(group: &ResolvedGroup, tokens: &[FieldRef<'_>]) -> (GroupResult, usize) {
    let count_tok = tokens[0];
    let count_str = count_tok.as_str().ok();
    let Some(count) = count_str.and_then(|s| s.parse::<u32>().ok()) else {
        return (
            GroupResult {
                count_tag: group.count_tag,
                required: group.required,
                code: ValidationCode::GroupInvalid,
                instances: Vec::new(),
            },
            1,
        );
    };

    let mut consumed = 1usize;
    let mut instances = Vec::new();
    for _ in 0..count {
        if consumed >= tokens.len() || tokens[consumed].tag != group.delimiter_tag {
            tracing::warn!(
                count_tag = group.count_tag,
                expected = count,
                actual = instances.len(),
                "repeating group instance count did not match declared count during validation"
            );
            break;
        }
        let (elems, used) = walk(&group.body, &tokens[consumed..], Some(group.delimiter_tag));
        instances.push(elems.into_iter().map(|(_, e)| e).collect());
        consumed += used;
    }

    (
        GroupResult {
            count_tag: group.count_tag,
            required: group.required,
            code: ValidationCode::GroupPresent,
            instances,
        },
        consumed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironfix_core::field::FieldRef;
    use ironfix_dictionary::{Dictionary, ElementRef, FieldDef, FieldType, GroupDef, MessageCategory, MessageDef, Version};

    fn field<'a>(tag: u32, value: &'a str) -> FieldRef<'a> {
        FieldRef::new(tag, value.as_bytes())
    }

    fn session_dict() -> Dictionary {
        let mut dict = Dictionary::new(Version::Fix44);
        dict.add_field(FieldDef::new(8, "BeginString", FieldType::String));
        dict.add_field(FieldDef::new(9, "BodyLength", FieldType::Length));
        dict.add_field(FieldDef::new(35, "MsgType", FieldType::String));
        dict.add_field(FieldDef::new(49, "SenderCompID", FieldType::String));
        dict.add_field(FieldDef::new(56, "TargetCompID", FieldType::String));
        dict.add_field(FieldDef::new(34, "MsgSeqNum", FieldType::SeqNum));
        dict.add_field(FieldDef::new(10, "CheckSum", FieldType::String));
        dict.header = vec![
            ElementRef::Field { tag: 8, name: "BeginString".into(), required: true },
            ElementRef::Field { tag: 9, name: "BodyLength".into(), required: true },
            ElementRef::Field { tag: 35, name: "MsgType".into(), required: true },
            ElementRef::Field { tag: 49, name: "SenderCompID".into(), required: true },
            ElementRef::Field { tag: 56, name: "TargetCompID".into(), required: true },
            ElementRef::Field { tag: 34, name: "MsgSeqNum".into(), required: true },
        ];
        dict.trailer = vec![ElementRef::Field { tag: 10, name: "CheckSum".into(), required: true }];
        dict
    }

    fn app_dict_with_order() -> Dictionary {
        let mut dict = Dictionary::new(Version::Fix44);
        dict.add_field(FieldDef::new(11, "ClOrdID", FieldType::String));
        dict.add_field(FieldDef::new(55, "Symbol", FieldType::String));
        dict.add_field(FieldDef::new(54, "Side", FieldType::Char));
        dict.add_field(FieldDef::new(453, "NoPartyIDs", FieldType::NumInGroup));
        dict.add_field(FieldDef::new(448, "PartyID", FieldType::String));
        dict.add_message(MessageDef {
            msg_type: "D".to_string(),
            name: "NewOrderSingle".to_string(),
            category: MessageCategory::App,
            elements: vec![
                ElementRef::Field { tag: 11, name: "ClOrdID".into(), required: true },
                ElementRef::Field { tag: 55, name: "Symbol".into(), required: true },
                ElementRef::Field { tag: 54, name: "Side".into(), required: true },
                ElementRef::Group(GroupDef {
                    count_tag: 453,
                    name: "NoPartyIDs".into(),
                    delimiter_tag: 448,
                    required: false,
                    elements: vec![ElementRef::Field { tag: 448, name: "PartyID".into(), required: true }],
                }),
            ],
        });
        dict
    }

    #[test]
    fn test_validate_all_present_is_well_formed() {
        let session = session_dict();
        let app = app_dict_with_order();
        let validator = Validator::new(&session, &app);

        let fields = [
            field(8, "FIX.4.4"),
            field(9, "0"),
            field(35, "D"),
            field(49, "SENDER"),
            field(56, "TARGET"),
            field(34, "1"),
            field(11, "ORD1"),
            field(55, "MSFT"),
            field(54, "1"),
            field(10, "000"),
        ];

        let report = validator.validate("D", &fields).unwrap();
        assert!(report.is_well_formed());
    }

    #[test]
    fn test_validate_missing_required_header_field() {
        let session = session_dict();
        let app = app_dict_with_order();
        let validator = Validator::new(&session, &app);

        // TargetCompID(56) never arrives.
        let fields = [
            field(8, "FIX.4.4"),
            field(9, "0"),
            field(35, "D"),
            field(49, "SENDER"),
            field(34, "1"),
            field(11, "ORD1"),
            field(55, "MSFT"),
            field(54, "1"),
            field(10, "000"),
        ];

        let report = validator.validate("D", &fields).unwrap();
        assert!(!report.is_well_formed());
        let missing = report
            .header
            .iter()
            .any(|e| matches!(e, ValidationElement::Field(f) if f.tag == 56 && f.code == ValidationCode::Missing));
        assert!(missing);
    }

    #[test]
    fn test_validate_out_of_order_field_is_out_of_sequence() {
        let session = session_dict();
        let app = app_dict_with_order();
        let validator = Validator::new(&session, &app);

        // Side(54) arrives before Symbol(55): Symbol is skipped as Missing,
        // then filled in later out of order.
        let fields = [
            field(8, "FIX.4.4"),
            field(9, "0"),
            field(35, "D"),
            field(49, "SENDER"),
            field(56, "TARGET"),
            field(34, "1"),
            field(11, "ORD1"),
            field(54, "1"),
            field(55, "MSFT"),
            field(10, "000"),
        ];

        let report = validator.validate("D", &fields).unwrap();
        let symbol = report
            .body
            .iter()
            .find(|e| matches!(e, ValidationElement::Field(f) if f.tag == 55))
            .unwrap();
        assert!(matches!(symbol, ValidationElement::Field(f) if f.code == ValidationCode::OutOfSequence));
    }

    #[test]
    fn test_validate_custom_tag_is_user_defined() {
        let session = session_dict();
        let app = app_dict_with_order();
        let validator = Validator::new(&session, &app);

        let fields = [
            field(8, "FIX.4.4"),
            field(9, "0"),
            field(35, "D"),
            field(49, "SENDER"),
            field(56, "TARGET"),
            field(34, "1"),
            field(11, "ORD1"),
            field(55, "MSFT"),
            field(54, "1"),
            field(9999, "custom"),
            field(10, "000"),
        ];

        let report = validator.validate("D", &fields).unwrap();
        let custom = report
            .body
            .iter()
            .find(|e| matches!(e, ValidationElement::Field(f) if f.tag == 9999));
        assert!(matches!(custom, Some(ValidationElement::Field(f)) if f.code == ValidationCode::UserDefined));
    }

    #[test]
    fn test_validate_group_present_with_instances() {
        let session = session_dict();
        let app = app_dict_with_order();
        let validator = Validator::new(&session, &app);

        let fields = [
            field(8, "FIX.4.4"),
            field(9, "0"),
            field(35, "D"),
            field(49, "SENDER"),
            field(56, "TARGET"),
            field(34, "1"),
            field(11, "ORD1"),
            field(55, "MSFT"),
            field(54, "1"),
            field(453, "2"),
            field(448, "BROKER1"),
            field(448, "BROKER2"),
            field(10, "000"),
        ];

        let report = validator.validate("D", &fields).unwrap();
        let group = report
            .body
            .iter()
            .find(|e| matches!(e, ValidationElement::Group(g) if g.count_tag == 453))
            .unwrap();
        match group {
            ValidationElement::Group(g) => {
                assert_eq!(g.code, ValidationCode::GroupPresent);
                assert_eq!(g.instances.len(), 2);
                for instance in &g.instances {
                    assert!(instance
                        .iter()
                        .all(|e| matches!(e, ValidationElement::Field(f) if f.code == ValidationCode::Present)));
                }
            }
            ValidationElement::Field(_) => panic!("expected a group element"),
        }
    }

    #[test]
    fn test_validate_non_integer_group_count_is_invalid() {
        let session = session_dict();
        let app = app_dict_with_order();
        let validator = Validator::new(&session, &app);

        let fields = [
            field(8, "FIX.4.4"),
            field(9, "0"),
            field(35, "D"),
            field(49, "SENDER"),
            field(56, "TARGET"),
            field(34, "1"),
            field(11, "ORD1"),
            field(55, "MSFT"),
            field(54, "1"),
            field(453, "abc"),
            field(10, "000"),
        ];

        let report = validator.validate("D", &fields).unwrap();
        let group = report
            .body
            .iter()
            .find(|e| matches!(e, ValidationElement::Group(g) if g.count_tag == 453))
            .unwrap();
        assert!(matches!(group, ValidationElement::Group(g) if g.code == ValidationCode::GroupInvalid));
    }
}
