// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Orchestration element tree.
//!
//! An orchestration is a generic labelled tree: every element has a type
//! tag, an ordered name/value property list and ordered child elements.

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

/// Type tag of a metamodel element.
///
/// Unknown tags parse into [`ElementKind::Other`] so that a tree from a newer
/// designer version still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    MetaModel,
    Module,
    ServiceDeclaration,
    ServiceBody,
    MessageDeclaration,
    VariableDeclaration,
    CorrelationDeclaration,
    PortDeclaration,
    ServiceLinkDeclaration,
    Call,
    Exec,
    Construct,
    Task,
    VariableAssignment,
    MessageAssignment,
    Transform,
    Receive,
    Send,
    Suspend,
    Terminate,
    Scope,
    Parallel,
    ParallelBranch,
    Decision,
    DecisionBranch,
    While,
    Until,
    Group,
    CallRules,
    Listen,
    ListenBranch,
    Delay,
    Throw,
    Catch,
    Compensate,
    StatementRef,
    #[strum(serialize = "DNFPredicateGroup")]
    DnfPredicateGroup,
    #[strum(serialize = "DNFPredicate")]
    DnfPredicate,
    Parameter,
    MessageRef,
    MessagePartRef,
    LogicalBindingAttribute,
    PhysicalBindingAttribute,
    DirectBindingAttribute,
    PortType,
    OperationDeclaration,
    MultipartMessageType,
    PartDeclaration,
    CorrelationType,
    ServiceLinkType,
    RoleDeclaration,
    #[strum(default)]
    Other(String),
}

impl ElementKind {
    /// The element type tag as written in the source tree.
    pub fn tag(&self) -> &str {
        match self {
            ElementKind::Other(tag) => tag,
            known => known.into(),
        }
    }

    /// Type definitions and reference/metadata elements.
    ///
    /// These are resolved by cross-reference lookup and never walked as
    /// workflow objects.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            ElementKind::StatementRef
                | ElementKind::DnfPredicateGroup
                | ElementKind::DnfPredicate
                | ElementKind::Parameter
                | ElementKind::MessageRef
                | ElementKind::MessagePartRef
                | ElementKind::LogicalBindingAttribute
                | ElementKind::PhysicalBindingAttribute
                | ElementKind::DirectBindingAttribute
                | ElementKind::PortType
                | ElementKind::OperationDeclaration
                | ElementKind::MultipartMessageType
                | ElementKind::PartDeclaration
                | ElementKind::CorrelationType
                | ElementKind::ServiceLinkType
                | ElementKind::RoleDeclaration
        )
    }
}

impl From<String> for ElementKind {
    fn from(tag: String) -> Self {
        tag.parse().unwrap_or(ElementKind::Other(tag))
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.tag().to_string()
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A single name/value property of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementProperty {
    pub name: String,
    pub value: String,
}

/// One labelled node of an orchestration element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaModelElement {
    /// Element type tag
    #[serde(rename = "type")]
    pub kind: ElementKind,

    /// Object id, referenced by statement references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,

    /// Role of this element inside its parent (e.g. `ServiceBody_Statement`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_link: Option<String>,

    /// Ordered name/value properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ElementProperty>,

    /// Ordered child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<MetaModelElement>,
}

impl MetaModelElement {
    /// Create an element with no properties or children.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            oid: None,
            parent_link: None,
            properties: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Set the object id.
    pub fn with_oid(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    /// Append a property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(ElementProperty {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a child element.
    pub fn with_element(mut self, element: MetaModelElement) -> Self {
        self.elements.push(element);
        self
    }

    /// First property value with the given name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// The `Name` property.
    pub fn name(&self) -> Option<&str> {
        self.property("Name").filter(|n| !n.is_empty())
    }

    /// Interpret a property as a boolean (`True`/`true`/`1`).
    pub fn bool_property(&self, name: &str) -> bool {
        self.property(name)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }

    /// Child elements of a given kind.
    pub fn children_of_kind<'a>(
        &'a self,
        kind: &'a ElementKind,
    ) -> impl Iterator<Item = &'a MetaModelElement> + 'a {
        self.elements.iter().filter(move |e| &e.kind == kind)
    }

    /// Depth-first search for the first element of a given kind.
    pub fn find_descendant(&self, kind: &ElementKind) -> Option<&MetaModelElement> {
        for child in &self.elements {
            if &child.kind == kind {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(kind) {
                return Some(found);
            }
        }
        None
    }
}
