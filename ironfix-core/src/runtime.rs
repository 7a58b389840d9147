/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Runtime message model: the structured form the parser produces and the
//! assembler consumes, as opposed to [`crate::message::RawMessage`]'s flat
//! zero-copy field list or [`crate::message::OwnedMessage`]'s storage form.
//!
//! A [`Message`] carries header, body, and trailer as ordered
//! [`Section`]s of [`MessageElement`]s so that serialization is
//! deterministic and dictionary-conformant even when the caller populates
//! fields out of order; repeating groups are represented as
//! [`GroupInstance`] nodes rather than flattened.

use std::collections::BTreeMap;

/// A single field occurrence: a tag and its value as it appears on the
/// wire (all FIX field values are strings; typed conversion is a codec
/// service layered on top, see [`crate::field::FieldRef`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInstance {
    /// Field tag.
    pub tag: u32,
    /// Field value, exactly as it appears on the wire.
    pub value: String,
}

impl FieldInstance {
    /// Creates a new field instance.
    #[must_use]
    pub fn new(tag: u32, value: impl Into<String>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }
}

/// A repeating group occurrence: the count tag plus one ordered element
/// list per repetition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupInstance {
    /// Tag of the count field (NumInGroup) that introduced this group.
    pub count_tag: u32,
    /// One entry per repetition, each an ordered element list.
    pub instances: Vec<Vec<MessageElement>>,
}

/// One entry of a section's ordered element list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageElement {
    /// A plain field occurrence.
    Field(FieldInstance),
    /// A repeating group occurrence.
    Group(GroupInstance),
}

impl MessageElement {
    /// Returns the tag identifying this element: the field's tag, or the
    /// group's count tag.
    #[must_use]
    pub fn tag(&self) -> u32 {
        match self {
            Self::Field(f) => f.tag,
            Self::Group(g) => g.count_tag,
        }
    }
}

/// An ordered collection of [`MessageElement`]s making up one section
/// (header, body, or trailer) of a runtime [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    /// Elements in wire/insertion order.
    pub elements: Vec<MessageElement>,
}

impl Section {
    /// Creates an empty section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plain field.
    pub fn push_field(&mut self, tag: u32, value: impl Into<String>) {
        self.elements.push(MessageElement::Field(FieldInstance::new(tag, value)));
    }

    /// Appends a group.
    pub fn push_group(&mut self, group: GroupInstance) {
        self.elements.push(MessageElement::Group(group));
    }

    /// Returns the first top-level field value for `tag`, if present.
    /// Does not look inside groups.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            MessageElement::Field(f) if f.tag == tag => Some(f.value.as_str()),
            _ => None,
        })
    }

    /// Returns the first top-level group for `count_tag`, if present.
    #[must_use]
    pub fn get_group(&self, count_tag: u32) -> Option<&GroupInstance> {
        self.elements.iter().find_map(|e| match e {
            MessageElement::Group(g) if g.count_tag == count_tag => Some(g),
            _ => None,
        })
    }

    /// Returns true if no elements have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A runtime FIX message: header, body, and trailer, each an ordered
/// collection carrying the tag sequence exactly as parsed or assembled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// Header section (BeginString, BodyLength, MsgType, and session-layer fields).
    pub header: Section,
    /// Application or admin message body.
    pub body: Section,
    /// Trailer section (CheckSum and any signature fields).
    pub trailer: Section,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `tag` across header, then body, then trailer, returning
    /// the first match.
    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.header
            .get(tag)
            .or_else(|| self.body.get(tag))
            .or_else(|| self.trailer.get(tag))
    }

    /// Returns the MsgType(35) value from the header, if present.
    #[must_use]
    pub fn msg_type(&self) -> Option<&str> {
        self.header.get(35)
    }
}

/// Scratch map from tag to field/group value used by the assembler while
/// collecting caller-supplied values before they are ordered against a
/// resolved dictionary layout.
#[derive(Debug, Clone, Default)]
pub struct Scratch {
    fields: BTreeMap<u32, String>,
    groups: BTreeMap<u32, GroupInstance>,
    /// Insertion order of tags, so unknown (non-dictionary) tags can be
    /// appended at the tail in the order the caller set them.
    order: Vec<u32>,
}

impl Scratch {
    /// Creates an empty scratch map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value, recording insertion order on first write.
    pub fn set_field(&mut self, tag: u32, value: impl Into<String>) {
        if self.fields.insert(tag, value.into()).is_none() && !self.groups.contains_key(&tag) {
            self.order.push(tag);
        }
    }

    /// Sets a group value, recording insertion order on first write.
    pub fn set_group(&mut self, group: GroupInstance) {
        let tag = group.count_tag;
        if self.groups.insert(tag, group).is_none() && !self.fields.contains_key(&tag) {
            self.order.push(tag);
        }
    }

    /// Returns the field value for `tag`, if set.
    #[must_use]
    pub fn field(&self, tag: u32) -> Option<&str> {
        self.fields.get(&tag).map(String::as_str)
    }

    /// Returns the group for `count_tag`, if set.
    #[must_use]
    pub fn group(&self, count_tag: u32) -> Option<&GroupInstance> {
        self.groups.get(&count_tag)
    }

    /// Returns tags set but not consumed by `consumed`, in insertion order —
    /// used to append unknown/unordered tags at the tail of a section.
    #[must_use]
    pub fn unconsumed(&self, consumed: &std::collections::HashSet<u32>) -> Vec<u32> {
        self.order
            .iter()
            .copied()
            .filter(|tag| !consumed.contains(tag))
            .collect()
    }

    /// Removes a field, used when restoring MsgType to its scratch prior
    /// value after body population per the assembler's `createMessage`
    /// contract.
    pub fn remove_field(&mut self, tag: u32) -> Option<String> {
        self.fields.remove(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_get_field_and_group() {
        let mut section = Section::new();
        section.push_field(35, "D");
        section.push_group(GroupInstance {
            count_tag: 454,
            instances: vec![vec![MessageElement::Field(FieldInstance::new(455, "ISIN"))]],
        });
        assert_eq!(section.get(35), Some("D"));
        assert!(section.get_group(454).is_some());
        assert_eq!(section.get(999), None);
    }

    #[test]
    fn test_message_get_checks_all_sections() {
        let mut message = Message::new();
        message.header.push_field(8, "FIX.4.4");
        message.body.push_field(11, "ORDER1");
        message.trailer.push_field(10, "128");
        assert_eq!(message.get(8), Some("FIX.4.4"));
        assert_eq!(message.get(11), Some("ORDER1"));
        assert_eq!(message.get(10), Some("128"));
        assert_eq!(message.msg_type(), None);
    }

    #[test]
    fn test_scratch_preserves_insertion_order_for_unconsumed_tags() {
        let mut scratch = Scratch::new();
        scratch.set_field(11, "A");
        scratch.set_field(5904, "custom");
        scratch.set_field(21, "1");
        let consumed: std::collections::HashSet<u32> = [11, 21].into_iter().collect();
        assert_eq!(scratch.unconsumed(&consumed), vec![5904]);
    }
}
