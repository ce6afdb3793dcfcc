// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Source-side model: the parsed integration application.

pub mod definitions;
pub mod metamodel;
pub mod ports;
pub mod predicate;
pub mod resource;

pub use definitions::{
    BindingFileDefinition, CorrelationTypeDefinition, MessagePartDefinition, MessageSlot,
    MultipartMessageTypeDefinition, OperationDefinition, OperationKind, OrchestrationDefinition,
    PortBinding, PortTypeDefinition, RoleDefinition, SchemaDefinition, ServiceBinding,
    ServiceLinkTypeDefinition,
};
pub use metamodel::{ElementKind, ElementProperty, MetaModelElement};
pub use ports::{
    ApplicationDefinition, ComponentKind, PipelineComponent, PipelineDefinition,
    PipelineDirection, ReceiveLocationDefinition, ReceivePortDefinition, SendPortDefinition,
};
pub use predicate::{Comparison, DnfPredicate, PredicateGroup};
pub use resource::{
    Relationship, RelationshipKind, Resource, ResourceKind, ResourceRegistry, SourceObject,
};
