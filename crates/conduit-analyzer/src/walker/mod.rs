// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Orchestration tree walker.
//!
//! Converts an orchestration's element tree into a [`WorkflowDefinition`].
//! Each element kind has its own handler; handlers return the nodes they
//! create as a [`WalkOutput`] and the caller places them into the enclosing
//! scope. Declarations and type elements are resolved by cross-reference and
//! never recursed into.

pub mod activities;
pub mod declarations;

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, info};

use conduit_model::key::child_key;
use conduit_model::source::{
    ElementKind, MetaModelElement, OrchestrationDefinition, ResourceRegistry,
};
use conduit_model::workflow::{
    WorkflowActivity, WorkflowChannel, WorkflowDefinition, WorkflowMessage, WorkflowObject,
    WorkflowObjectType, WorkflowVariable,
};

use crate::config::AnalysisConfig;
use crate::context::AnalysisContext;
use crate::error::AnalysisError;

/// Nodes produced by one element handler.
#[derive(Debug)]
pub enum WalkOutput {
    /// Nothing produced
    Skip,
    /// An activity, with any channels declared inside it
    Activity {
        activity: WorkflowActivity,
        channels: Vec<WorkflowChannel>,
    },
    Message(WorkflowMessage),
    Variable(WorkflowVariable),
    Channels(Vec<WorkflowChannel>),
    /// Transparent element: its children belong to the enclosing scope
    Scope(ScopeItems),
}

/// Nodes collected for one scope.
#[derive(Debug, Default)]
pub struct ScopeItems {
    pub messages: Vec<WorkflowMessage>,
    pub variables: Vec<WorkflowVariable>,
    pub channels: Vec<WorkflowChannel>,
    pub activities: Vec<WorkflowActivity>,
}

impl ScopeItems {
    /// Place a handler's output into this scope.
    pub fn absorb(&mut self, output: WalkOutput) {
        match output {
            WalkOutput::Skip => {}
            WalkOutput::Activity { activity, channels } => {
                self.activities.push(activity);
                self.channels.extend(channels);
            }
            WalkOutput::Message(message) => self.messages.push(message),
            WalkOutput::Variable(variable) => self.variables.push(variable),
            WalkOutput::Channels(channels) => self.channels.extend(channels),
            WalkOutput::Scope(items) => {
                self.messages.extend(items.messages);
                self.variables.extend(items.variables);
                self.channels.extend(items.channels);
                self.activities.extend(items.activities);
            }
        }
    }
}

/// Context threaded through the walk of one orchestration.
pub struct WalkContext<'a> {
    pub resources: &'a ResourceRegistry,
    pub config: &'a AnalysisConfig,
    errors: Vec<AnalysisError>,
    /// Child keys already handed out, per parent key
    used_keys: HashMap<String, HashSet<String>>,
}

impl<'a> WalkContext<'a> {
    pub fn new(resources: &'a ResourceRegistry, config: &'a AnalysisConfig) -> Self {
        Self {
            resources,
            config,
            errors: Vec::new(),
            used_keys: HashMap::new(),
        }
    }

    /// Report a problem; the walk continues with the next sibling.
    pub fn report(&mut self, err: AnalysisError) {
        debug!(error = %err, "Walker error");
        self.errors.push(err);
    }

    /// Errors reported so far.
    pub fn into_errors(self) -> Vec<AnalysisError> {
        self.errors
    }

    /// Build the workflow definition of an orchestration.
    pub fn build(&mut self, orchestration: &OrchestrationDefinition) -> WorkflowDefinition {
        let mut definition = WorkflowDefinition::new(&orchestration.name, &orchestration.full_name);
        let root_key = definition.key().to_string();
        self.used_keys.clear();

        let mut items = ScopeItems::default();
        let output = self.visit(&orchestration.model, &root_key, &root_key);
        items.absorb(output);

        definition.messages = items.messages;
        definition.variables = items.variables;
        definition.channels = items.channels;
        definition.activities.activities = items.activities;
        definition
    }

    /// Walk child elements, keying each under `parent_key`.
    ///
    /// Transparent scopes share their parent's key, so keys are kept unique
    /// across every walk under the same parent.
    pub fn walk_children(&mut self, parent_key: &str, elements: &[MetaModelElement]) -> ScopeItems {
        let mut items = ScopeItems::default();
        for (index, element) in elements.iter().enumerate() {
            if element.kind.is_metadata() {
                continue;
            }
            let used = self.used_keys.entry(parent_key.to_string()).or_default();
            let key = element_key(parent_key, element, index, used);
            let output = self.visit(element, parent_key, &key);
            items.absorb(output);
        }
        items
    }

    /// Dispatch one element to its handler.
    fn visit(&mut self, element: &MetaModelElement, parent_key: &str, key: &str) -> WalkOutput {
        match &element.kind {
            ElementKind::MetaModel
            | ElementKind::Module
            | ElementKind::ServiceDeclaration
            | ElementKind::ServiceBody => {
                WalkOutput::Scope(self.walk_children(parent_key, &element.elements))
            }

            ElementKind::MessageDeclaration => declarations::message(self, element, key),
            ElementKind::VariableDeclaration => declarations::variable(self, element, key),
            ElementKind::CorrelationDeclaration => declarations::correlation(self, element, key),
            ElementKind::PortDeclaration => declarations::port(self, element, key),
            ElementKind::ServiceLinkDeclaration => declarations::service_link(self, element, key),

            ElementKind::Call => activities::invoke(self, element, key, false),
            ElementKind::Exec => activities::invoke(self, element, key, true),
            ElementKind::Construct => activities::construct(self, element, key),
            ElementKind::Task
            | ElementKind::Scope
            | ElementKind::Parallel
            | ElementKind::ParallelBranch
            | ElementKind::Decision
            | ElementKind::DecisionBranch
            | ElementKind::While
            | ElementKind::Until
            | ElementKind::Group
            | ElementKind::CallRules
            | ElementKind::Listen
            | ElementKind::ListenBranch
            | ElementKind::Catch
            | ElementKind::Compensate => activities::group(self, element, key),
            ElementKind::VariableAssignment | ElementKind::MessageAssignment => {
                activities::code_expression(self, element, key)
            }
            ElementKind::Transform => activities::transform(self, element, key),
            ElementKind::Receive => activities::receive(self, element, key),
            ElementKind::Send => activities::send(self, element, key),
            ElementKind::Suspend => activities::suspend(self, element, key),
            ElementKind::Terminate => activities::terminate(self, element, key),
            ElementKind::Delay | ElementKind::Throw | ElementKind::Other(_) => {
                activities::unknown(self, element, key)
            }

            // Resolved by the declaration or activity that owns them
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
            | ElementKind::RoleDeclaration => WalkOutput::Skip,
        }
    }

    /// Create the workflow object for an element, copying its properties.
    pub fn object(
        &self,
        element: &MetaModelElement,
        key: &str,
        object_type: WorkflowObjectType,
    ) -> WorkflowObject {
        let mut object = WorkflowObject::new(element_name(element), key, object_type);
        for property in &element.properties {
            if self.config.is_ignored_property(&property.name) {
                continue;
            }
            object
                .properties
                .insert_once(property.name.clone(), Value::String(property.value.clone()));
        }
        object
    }
}

/// Display name of an element: its `Name` property, else its type tag.
pub fn element_name(element: &MetaModelElement) -> String {
    element
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| element.kind.tag().to_string())
}

/// Deterministic key of a child element.
///
/// The sibling index is appended when the element has no name or its name
/// collides with an earlier sibling. The suffix is bumped until the key is
/// unused.
fn element_key(
    parent_key: &str,
    element: &MetaModelElement,
    index: usize,
    used: &mut HashSet<String>,
) -> String {
    let base = element_name(element);
    let mut key = child_key(parent_key, &base);
    if element.name().is_none() || used.contains(&key) {
        let mut suffix = index;
        loop {
            key = child_key(parent_key, &format!("{} {}", base, suffix));
            if !used.contains(&key) {
                break;
            }
            suffix += 1;
        }
    }
    used.insert(key.clone());
    key
}

/// Build the workflow model of one orchestration.
///
/// Walker errors are recorded on the context; the definition is returned with
/// whatever could be built.
pub fn build_workflow_model(
    ctx: &mut AnalysisContext,
    orchestration: &OrchestrationDefinition,
) -> WorkflowDefinition {
    info!(workflow = %orchestration.full_name, "Building workflow model");
    let (definition, errors) = {
        let mut walk = WalkContext::new(&ctx.resources, &ctx.config);
        let definition = walk.build(orchestration);
        (definition, walk.into_errors())
    };
    for err in errors {
        ctx.record_error(err, None);
    }
    debug!(
        workflow = %definition.name(),
        channels = definition.channels.len(),
        activities = definition.activities.activities.len(),
        "Workflow model built"
    );
    definition
}
