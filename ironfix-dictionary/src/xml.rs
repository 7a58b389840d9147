/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! XML dictionary and version-registry loaders.
//!
//! Dictionary documents follow the familiar QuickFIX-style layout:
//! `<fix><fields><field tag= name= type=>[<enum value= label=/>...]</field>
//! </fields><components>...</components><messages><message type= name=
//! category=>...</message></messages><header>...</header><trailer>...
//! </trailer></fix>`. Elements inside header/trailer/messages/components
//! are `<field name= required=/>`, `<group name= required=>...</group>`, or
//! `<component name= required=/>`.
//!
//! Version registry documents: `<versions><version name= layer= bs= id=>
//! <rules><rule name=><match tag= value=/>...</rule>...</rules>
//! <dictionaries><dictionary name=/>...</dictionaries></version>...
//! </versions>`.

use crate::error::{DictionaryError, RegistryError};
use crate::registry::{Layer, MatchPair, MatchRule, VersionRecord};
use crate::schema::{ComponentDef, Dictionary, ElementRef, FieldDef, FieldType, GroupDef, MessageCategory, MessageDef, Version};
use roxmltree::{Document, Node};
use std::collections::HashMap;

/// Loads a dictionary from a QuickFIX-style XML document.
///
/// The loader processes `<fields>` first (so later sections can look tags
/// up by name), then `<components>`, then `<messages>`, then `<header>`/
/// `<trailer>` — mirroring the dependency order components and messages
/// are defined in. The resulting dictionary is validated before being
/// returned, so a caller never observes an unresolved reference or cycle.
///
/// # Errors
/// Returns [`DictionaryError::InvalidDocument`] if the XML is not
/// well-formed or a required attribute is missing, or a validation error
/// from [`Dictionary::validate`](crate::schema::Dictionary::validate).
pub fn load_dictionary_xml(version: Version, xml: &str) -> Result<Dictionary, DictionaryError> {
    let doc = Document::parse(xml).map_err(|e| DictionaryError::InvalidDocument(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "fix" {
        return Err(DictionaryError::InvalidDocument(
            "root element must be <fix>".to_string(),
        ));
    }

    let mut dict = Dictionary::new(version);

    if let Some(fields_node) = child(root, "fields") {
        for field_node in children(fields_node, "field") {
            dict.add_field(import_field(field_node)?);
        }
    }

    if let Some(components_node) = child(root, "components") {
        for component_node in children(components_node, "component") {
            let name = attr(component_node, "name")?;
            let elements = import_elements(component_node, &dict)?;
            dict.add_component(ComponentDef { name, elements });
        }
    }

    if let Some(messages_node) = child(root, "messages") {
        for message_node in children(messages_node, "message") {
            let msg_type = attr(message_node, "msgtype").or_else(|_| attr(message_node, "type"))?;
            let name = attr(message_node, "name")?;
            let category = match attr(message_node, "msgcat")
                .or_else(|_| attr(message_node, "category"))?
                .to_lowercase()
                .as_str()
            {
                "admin" => MessageCategory::Admin,
                _ => MessageCategory::App,
            };
            let elements = import_elements(message_node, &dict)?;
            dict.add_message(MessageDef {
                msg_type,
                name,
                category,
                elements,
            });
        }
    }

    if let Some(header_node) = child(root, "header") {
        dict.header = import_elements(header_node, &dict)?;
    }
    if let Some(trailer_node) = child(root, "trailer") {
        dict.trailer = import_elements(trailer_node, &dict)?;
    }

    dict.validate()
        .map_err(|e| DictionaryError::InvalidDocument(e.to_string()))?;
    Ok(dict)
}

fn import_field(node: Node) -> Result<FieldDef, DictionaryError> {
    let tag: u32 = attr(node, "number")
        .or_else(|_| attr(node, "tag"))?
        .parse()
        .map_err(|_| DictionaryError::InvalidDocument("field tag must be numeric".to_string()))?;
    let name = attr(node, "name")?;
    let field_type: FieldType = attr(node, "type")?.parse().unwrap_or(FieldType::String);

    let mut values = HashMap::new();
    for enum_node in children(node, "value").chain(children(node, "enum")) {
        if let (Ok(value), Ok(label)) = (attr(enum_node, "enum").or_else(|_| attr(enum_node, "value")), attr(enum_node, "description").or_else(|_| attr(enum_node, "label"))) {
            values.insert(value, label);
        }
    }

    let mut field = FieldDef::new(tag, name, field_type);
    if !values.is_empty() {
        field = field.with_values(values);
    }
    Ok(field)
}

/// Imports the ordered element list of a container node (`<message>`,
/// `<component>`, `<group>`, `<header>`, `<trailer>`), resolving `<field>`
/// tags by name against `dict`'s already-loaded fields.
fn import_elements(node: Node, dict: &Dictionary) -> Result<Vec<ElementRef>, DictionaryError> {
    let mut elements = Vec::new();
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "field" => elements.push(import_field_ref(child, dict)?),
            "group" => elements.push(ElementRef::Group(import_group(child, dict)?)),
            "component" => {
                let name = attr(child, "name")?;
                let required = attr(child, "required").map(|r| r == "Y").unwrap_or(false);
                elements.push(ElementRef::Component { name, required });
            }
            _ => {}
        }
    }
    Ok(elements)
}

fn import_field_ref(node: Node, dict: &Dictionary) -> Result<ElementRef, DictionaryError> {
    let name = attr(node, "name")?;
    let required = attr(node, "required").map(|r| r == "Y").unwrap_or(false);
    let tag = dict
        .get_field_by_name(&name)
        .map(|f| f.tag)
        .ok_or_else(|| DictionaryError::InvalidDocument(format!("unknown field name: {name}")))?;
    Ok(ElementRef::Field {
        tag,
        name,
        required,
    })
}

fn import_group(node: Node, dict: &Dictionary) -> Result<GroupDef, DictionaryError> {
    let name = attr(node, "name")?;
    let required = attr(node, "required").map(|r| r == "Y").unwrap_or(false);
    let count_tag = dict
        .get_field_by_name(&name)
        .map(|f| f.tag)
        .ok_or_else(|| DictionaryError::InvalidDocument(format!("unknown group count field: {name}")))?;

    let elements = import_elements(node, dict)?;
    let delimiter_tag = elements
        .first()
        .map(ElementRef::tag_of)
        .ok_or_else(|| DictionaryError::InvalidDocument(format!("group {name} has no body")))?;

    Ok(GroupDef {
        count_tag,
        name,
        delimiter_tag,
        required,
        elements,
    })
}

impl ElementRef {
    fn tag_of(element: &ElementRef) -> u32 {
        match element {
            ElementRef::Field { tag, .. } => *tag,
            ElementRef::Group(g) => g.count_tag,
            ElementRef::Component { .. } => 0,
        }
    }
}

/// Loads version records from a registry XML document, in document order
/// (the order [`crate::registry::VxMatcher`] scans records in).
///
/// # Errors
/// Returns [`RegistryError::InvalidDocument`] if the XML is not well-formed
/// or a required attribute is missing.
pub fn load_version_registry_xml(xml: &str) -> Result<Vec<VersionRecord>, RegistryError> {
    let doc = Document::parse(xml).map_err(|e| RegistryError::InvalidDocument(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "versions" {
        return Err(RegistryError::InvalidDocument(
            "root element must be <versions>".to_string(),
        ));
    }

    let mut records = Vec::new();
    for version_node in children(root, "version") {
        let name = reg_attr(version_node, "name")?;
        let layer = match reg_attr(version_node, "layer")?.to_lowercase().as_str() {
            "session" => Layer::Session,
            "application" => Layer::Application,
            _ => Layer::Combined,
        };
        let begin_string = reg_attr(version_node, "bs")?;
        let appl_ver_id = version_node.attribute("id").map(str::to_string);

        let mut rules = Vec::new();
        if let Some(rules_node) = child(version_node, "rules") {
            for rule_node in children(rules_node, "rule") {
                let rule_name = reg_attr(rule_node, "name")?;
                let mut pairs = Vec::new();
                for match_node in children(rule_node, "match") {
                    let tag: u32 = reg_attr(match_node, "tag")?
                        .parse()
                        .map_err(|_| RegistryError::InvalidDocument("match tag must be numeric".to_string()))?;
                    let value = reg_attr(match_node, "value")?;
                    pairs.push(MatchPair { tag, value });
                }
                rules.push(MatchRule {
                    name: rule_name,
                    pairs,
                });
            }
        }

        let mut dictionaries = Vec::new();
        if let Some(dicts_node) = child(version_node, "dictionaries") {
            for dict_node in children(dicts_node, "dictionary") {
                dictionaries.push(reg_attr(dict_node, "name")?);
            }
        }

        records.push(VersionRecord {
            name,
            layer,
            begin_string,
            appl_ver_id,
            rules,
            dictionaries,
        });
    }

    Ok(records)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn attr(node: Node, name: &str) -> Result<String, DictionaryError> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| DictionaryError::InvalidDocument(format!("missing attribute {name} on <{}>", node.tag_name().name())))
}

fn reg_attr(node: Node, name: &str) -> Result<String, RegistryError> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| RegistryError::InvalidDocument(format!("missing attribute {name} on <{}>", node.tag_name().name())))
}
