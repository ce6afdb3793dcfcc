// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Resource registry: key-indexed store of parsed source resources.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

use super::definitions::{
    BindingFileDefinition, CorrelationTypeDefinition, MultipartMessageTypeDefinition,
    OrchestrationDefinition, PortTypeDefinition, SchemaDefinition, ServiceLinkTypeDefinition,
};
use super::ports::{
    ApplicationDefinition, PipelineDefinition, ReceivePortDefinition, SendPortDefinition,
};

/// Type tag of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ResourceKind {
    Application,
    Orchestration,
    PortType,
    ServiceLinkType,
    CorrelationType,
    Schema,
    MultipartMessageType,
    Pipeline,
    ReceivePort,
    SendPort,
    BindingFile,
}

/// Typed source object carried by a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SourceObject {
    Application(ApplicationDefinition),
    Orchestration(OrchestrationDefinition),
    PortType(PortTypeDefinition),
    ServiceLinkType(ServiceLinkTypeDefinition),
    CorrelationType(CorrelationTypeDefinition),
    Schema(SchemaDefinition),
    MultipartMessageType(MultipartMessageTypeDefinition),
    Pipeline(PipelineDefinition),
    ReceivePort(ReceivePortDefinition),
    SendPort(SendPortDefinition),
    BindingFile(BindingFileDefinition),
}

impl SourceObject {
    pub fn kind(&self) -> ResourceKind {
        match self {
            SourceObject::Application(_) => ResourceKind::Application,
            SourceObject::Orchestration(_) => ResourceKind::Orchestration,
            SourceObject::PortType(_) => ResourceKind::PortType,
            SourceObject::ServiceLinkType(_) => ResourceKind::ServiceLinkType,
            SourceObject::CorrelationType(_) => ResourceKind::CorrelationType,
            SourceObject::Schema(_) => ResourceKind::Schema,
            SourceObject::MultipartMessageType(_) => ResourceKind::MultipartMessageType,
            SourceObject::Pipeline(_) => ResourceKind::Pipeline,
            SourceObject::ReceivePort(_) => ResourceKind::ReceivePort,
            SourceObject::SendPort(_) => ResourceKind::SendPort,
            SourceObject::BindingFile(_) => ResourceKind::BindingFile,
        }
    }
}

/// Relationship kinds between resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    Parent,
    Child,
    ReferencesTo,
    ReferencedBy,
}

/// A typed edge to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub target_key: String,
}

/// A parsed source resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Globally unique resource key
    pub key: String,

    /// Display or qualified name
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,

    /// The typed source object
    pub source: SourceObject,
}

macro_rules! source_accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        /// Typed access to the source object.
        pub fn $fn_name(&self) -> Option<&$ty> {
            match &self.source {
                SourceObject::$variant(def) => Some(def),
                _ => None,
            }
        }
    };
}

impl Resource {
    pub fn new(key: impl Into<String>, name: impl Into<String>, source: SourceObject) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            relationships: Vec::new(),
            source,
        }
    }

    /// Add a relationship.
    pub fn with_relationship(
        mut self,
        kind: RelationshipKind,
        target_key: impl Into<String>,
    ) -> Self {
        self.relationships.push(Relationship {
            kind,
            target_key: target_key.into(),
        });
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.source.kind()
    }

    source_accessor!(as_application, Application, ApplicationDefinition);
    source_accessor!(as_orchestration, Orchestration, OrchestrationDefinition);
    source_accessor!(as_port_type, PortType, PortTypeDefinition);
    source_accessor!(as_service_link_type, ServiceLinkType, ServiceLinkTypeDefinition);
    source_accessor!(as_correlation_type, CorrelationType, CorrelationTypeDefinition);
    source_accessor!(as_schema, Schema, SchemaDefinition);
    source_accessor!(
        as_multipart_message_type,
        MultipartMessageType,
        MultipartMessageTypeDefinition
    );
    source_accessor!(as_pipeline, Pipeline, PipelineDefinition);
    source_accessor!(as_receive_port, ReceivePort, ReceivePortDefinition);
    source_accessor!(as_send_port, SendPort, SendPortDefinition);
    source_accessor!(as_binding_file, BindingFile, BindingFileDefinition);
}

/// Key-indexed store of source resources.
///
/// Resources keep their insertion order; lookups by key go through an index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Resource>", into = "Vec<Resource>")]
pub struct ResourceRegistry {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl From<Vec<Resource>> for ResourceRegistry {
    fn from(resources: Vec<Resource>) -> Self {
        let mut registry = ResourceRegistry::new();
        for resource in resources {
            registry.add(resource);
        }
        registry
    }
}

impl From<ResourceRegistry> for Vec<Resource> {
    fn from(registry: ResourceRegistry) -> Self {
        registry.resources
    }
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. A resource with the same key replaces the old one.
    pub fn add(&mut self, resource: Resource) {
        match self.index.get(&resource.key) {
            Some(&i) => self.resources[i] = resource,
            None => {
                self.index.insert(resource.key.clone(), self.resources.len());
                self.resources.push(resource);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn find_resource_by_key(&self, key: &str) -> Option<&Resource> {
        self.index.get(key).map(|&i| &self.resources[i])
    }

    /// All resources of a type, in insertion order.
    pub fn find_resources_by_type(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind() == kind)
    }

    /// Resources of a type reachable from `resource` over one relationship kind.
    pub fn find_related_resources_by_type(
        &self,
        resource: &Resource,
        relationship: RelationshipKind,
        kind: ResourceKind,
    ) -> Vec<&Resource> {
        resource
            .relationships
            .iter()
            .filter(|r| r.kind == relationship)
            .filter_map(|r| self.find_resource_by_key(&r.target_key))
            .filter(|r| r.kind() == kind)
            .collect()
    }

    /// Find a resource of a type by exact (qualified) name.
    pub fn find_resource_by_name(&self, kind: ResourceKind, name: &str) -> Option<&Resource> {
        self.find_resources_by_type(kind).find(|r| r.name == name)
    }
}
