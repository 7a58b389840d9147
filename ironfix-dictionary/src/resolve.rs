/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Resolution of a dictionary container's element list: component
//! references are inlined in place, fields are looked up by tag, and
//! repeating groups are left as a single node carrying their own resolved
//! body list.
//!
//! Resolution is pure: the same `(dictionary, elements)` pair always
//! produces an identical [`ResolvedElement`] list, so callers may memoize
//! per dictionary and container.

use crate::error::DictionaryError;
use crate::schema::{Dictionary, ElementRef, FieldType};

/// One entry of a resolved, flattened element list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedElement {
    /// A resolved field occupying one position in the container.
    Field(ResolvedField),
    /// A resolved repeating group, still carrying its own resolved body.
    Group(ResolvedGroup),
}

impl ResolvedElement {
    /// Returns the tag that identifies this element's position: the
    /// field's own tag, or a group's count tag.
    #[must_use]
    pub fn tag(&self) -> u32 {
        match self {
            Self::Field(f) => f.tag,
            Self::Group(g) => g.count_tag,
        }
    }

    /// Returns whether this element is required at this position.
    #[must_use]
    pub fn required(&self) -> bool {
        match self {
            Self::Field(f) => f.required,
            Self::Group(g) => g.required,
        }
    }
}

/// A resolved field reference: tag, name, type, and required-flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// Field tag.
    pub tag: u32,
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Whether the field is required at this position.
    pub required: bool,
}

/// A resolved repeating group: count tag, delimiter tag, and a resolved
/// body element list (one instance's worth).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGroup {
    /// Tag of the count field (NumInGroup).
    pub count_tag: u32,
    /// Group name.
    pub name: String,
    /// Tag of the first field of each instance.
    pub delimiter_tag: u32,
    /// Whether the group is required at this position.
    pub required: bool,
    /// Resolved element list describing one group instance.
    pub body: Vec<ResolvedElement>,
}

/// Resolves a container's element list against a dictionary: component
/// references are inlined, fields are looked up, groups recurse into their
/// own body.
///
/// # Errors
/// Returns [`DictionaryError::UnknownField`] or
/// [`DictionaryError::UnknownComponent`] if a reference does not resolve,
/// or [`DictionaryError::Cycle`] if component expansion would recurse
/// infinitely (this should already have been rejected by
/// [`Dictionary::validate`](crate::schema::Dictionary::validate) at load
/// time, but `resolve` re-checks so it is safe to call directly).
pub fn resolve(
    dict: &Dictionary,
    elements: &[ElementRef],
) -> Result<Vec<ResolvedElement>, DictionaryError> {
    let mut stack = Vec::new();
    resolve_into(dict, elements, &mut stack)
}

fn resolve_into(
    dict: &Dictionary,
    elements: &[ElementRef],
    stack: &mut Vec<String>,
) -> Result<Vec<ResolvedElement>, DictionaryError> {
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        match element {
            ElementRef::Field {
                tag,
                required,
                name,
            } => {
                let field = dict
                    .get_field(*tag)
                    .ok_or(DictionaryError::UnknownField { tag: *tag })?;
                out.push(ResolvedElement::Field(ResolvedField {
                    tag: *tag,
                    name: if field.name.is_empty() {
                        name.clone()
                    } else {
                        field.name.clone()
                    },
                    field_type: field.field_type,
                    required: *required,
                }));
            }
            ElementRef::Group(group) => {
                let body = resolve_into(dict, &group.elements, stack)?;
                out.push(ResolvedElement::Group(ResolvedGroup {
                    count_tag: group.count_tag,
                    name: group.name.clone(),
                    delimiter_tag: group.delimiter_tag,
                    required: group.required,
                    body,
                }));
            }
            ElementRef::Component { name, .. } => {
                if stack.iter().any(|s| s == name) {
                    return Err(DictionaryError::Cycle {
                        component: name.clone(),
                    });
                }
                let component = dict
                    .get_component(name)
                    .ok_or_else(|| DictionaryError::UnknownComponent { name: name.clone() })?;
                stack.push(name.clone());
                let inlined = resolve_into(dict, &component.elements, stack)?;
                stack.pop();
                // A component reference's own `required` flag is container-level
                // only; each inlined element keeps its intrinsic required flag.
                out.extend(inlined);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ComponentDef, FieldDef, GroupDef, Version};

    fn dict_with_instrument_component() -> Dictionary {
        let mut dict = Dictionary::new(Version::Fix44);
        dict.add_field(FieldDef::new(55, "Symbol", FieldType::String));
        dict.add_field(FieldDef::new(48, "SecurityID", FieldType::String));
        dict.add_field(FieldDef::new(454, "NoSecurityAltID", FieldType::NumInGroup));
        dict.add_field(FieldDef::new(455, "SecurityAltID", FieldType::String));
        dict.add_component(ComponentDef {
            name: "Instrument".to_string(),
            elements: vec![
                ElementRef::Field {
                    tag: 55,
                    name: "Symbol".into(),
                    required: true,
                },
                ElementRef::Group(GroupDef {
                    count_tag: 454,
                    name: "NoSecurityAltID".into(),
                    delimiter_tag: 455,
                    required: false,
                    elements: vec![ElementRef::Field {
                        tag: 455,
                        name: "SecurityAltID".into(),
                        required: true,
                    }],
                }),
            ],
        });
        dict
    }

    #[test]
    fn test_resolve_inlines_component_and_keeps_group_unexpanded() {
        let dict = dict_with_instrument_component();
        let elements = vec![
            ElementRef::Field {
                tag: 48,
                name: "SecurityID".into(),
                required: false,
            },
            ElementRef::Component {
                name: "Instrument".into(),
                required: true,
            },
        ];
        let resolved = resolve(&dict, &elements).unwrap();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].tag(), 48);
        assert_eq!(resolved[1].tag(), 55);
        match &resolved[2] {
            ResolvedElement::Group(g) => {
                assert_eq!(g.count_tag, 454);
                assert_eq!(g.delimiter_tag, 455);
                assert_eq!(g.body.len(), 1);
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let dict = dict_with_instrument_component();
        let elements = vec![ElementRef::Component {
            name: "Instrument".into(),
            required: true,
        }];
        let a = resolve(&dict, &elements).unwrap();
        let b = resolve(&dict, &elements).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_unknown_field() {
        let dict = Dictionary::new(Version::Fix44);
        let elements = vec![ElementRef::Field {
            tag: 1,
            name: "Account".into(),
            required: false,
        }];
        assert!(matches!(
            resolve(&dict, &elements),
            Err(DictionaryError::UnknownField { tag: 1 })
        ));
    }
}
