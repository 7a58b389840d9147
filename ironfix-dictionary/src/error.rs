/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for dictionary loading, resolution, and registry lookups.

use thiserror::Error;

/// Errors produced while loading or validating a [`crate::Dictionary`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    /// An element list referenced a tag with no matching field definition.
    #[error("unknown field reference: tag {tag}")]
    UnknownField {
        /// The referenced tag.
        tag: u32,
    },

    /// An element list referenced a component with no matching definition.
    #[error("unknown component reference: {name}")]
    UnknownComponent {
        /// The referenced component name.
        name: String,
    },

    /// A component, directly or transitively, references itself.
    #[error("circular component reference: {component}")]
    Cycle {
        /// The component name at which the cycle was detected.
        component: String,
    },

    /// The same tag appears twice within one container's element list.
    #[error("duplicate tag {tag} in container {container}")]
    DuplicateTag {
        /// The duplicated tag.
        tag: u32,
        /// The container (message, component, or group name) in which it repeats.
        container: String,
    },

    /// A dictionary-wide invariant (e.g. header/trailer shape) was violated.
    #[error("missing mandatory element: {field}")]
    MissingMandatory {
        /// Description of the missing invariant.
        field: String,
    },

    /// The dictionary XML was not well-formed or missing a required attribute.
    #[error("invalid dictionary document: {0}")]
    InvalidDocument(String),
}

/// Errors produced by [`crate::registry::DxRegistry`] and
/// [`crate::registry::VxRegistry`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No entry is registered under the given name.
    #[error("unknown registry entry: {0}")]
    UnknownName(String),

    /// An entry is already registered under the given name.
    #[error("duplicate registry entry: {0}")]
    DuplicateName(String),

    /// The version registry XML was not well-formed or missing a required attribute.
    #[error("invalid version registry document: {0}")]
    InvalidDocument(String),
}
