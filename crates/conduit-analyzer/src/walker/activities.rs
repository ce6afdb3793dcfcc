// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Handlers for activity elements.

use std::str::FromStr;

use conduit_model::source::{
    Comparison, DnfPredicate, ElementKind, MetaModelElement, PredicateGroup,
};
use conduit_model::workflow::{
    ActivityKind, InvokeWorkflowActivity, MessageExchangeActivity, ParameterDirection,
    WorkflowActivity, WorkflowActivityContainer, WorkflowChannel, WorkflowObjectType,
    WorkflowParameter,
};

use super::{WalkContext, WalkOutput, element_name};
use crate::error::AnalysisError;

/// Wrap an activity with no nested channels.
fn activity(
    walk: &WalkContext<'_>,
    element: &MetaModelElement,
    key: &str,
    object_type: WorkflowObjectType,
    kind: ActivityKind,
) -> WalkOutput {
    let object = walk.object(element, key, object_type);
    WalkOutput::Activity {
        activity: WorkflowActivity::new(object, element.oid.clone(), kind),
        channels: Vec::new(),
    }
}

/// Read a required, non-empty property, reporting it when absent.
fn required<'e>(
    walk: &mut WalkContext<'_>,
    element: &'e MetaModelElement,
    property: &str,
) -> Option<&'e str> {
    let value = element.property(property).filter(|v| !v.is_empty());
    if value.is_none() {
        walk.report(AnalysisError::missing(element_name(element), property));
    }
    value
}

/// Split a container's walked children into the container and bubbled-up channels.
fn scope_container(
    walk: &mut WalkContext<'_>,
    element: &MetaModelElement,
    key: &str,
) -> (WorkflowActivityContainer, Vec<WorkflowChannel>) {
    let items = walk.walk_children(key, &element.elements);
    let container = WorkflowActivityContainer {
        messages: items.messages,
        variables: items.variables,
        activities: items.activities,
    };
    (container, items.channels)
}

/// `Call` and `Exec`: invoke another workflow.
pub fn invoke(
    walk: &mut WalkContext<'_>,
    element: &MetaModelElement,
    key: &str,
    is_async: bool,
) -> WalkOutput {
    let Some(invokee) = required(walk, element, "Invokee") else {
        return WalkOutput::Skip;
    };
    let invokee = invokee.to_string();

    let mut parameters = Vec::new();
    for parameter in element.children_of_kind(&ElementKind::Parameter) {
        let Some(name) = parameter.name() else {
            walk.report(AnalysisError::missing(element_name(element), "parameter Name"));
            continue;
        };
        let direction = match parameter.property("Direction").filter(|d| !d.is_empty()) {
            None => ParameterDirection::default(),
            Some(value) => ParameterDirection::from_str(value).unwrap_or_else(|_| {
                walk.report(AnalysisError::unsupported(
                    element_name(element),
                    "parameter direction",
                    value,
                ));
                ParameterDirection::default()
            }),
        };
        parameters.push(WorkflowParameter {
            name: name.to_string(),
            parameter_type: parameter.property("Type").map(str::to_string),
            direction,
        });
    }

    let kind = ActivityKind::InvokeWorkflow(InvokeWorkflowActivity {
        invokee,
        is_async,
        parameters,
        channel_key: None,
    });
    activity(walk, element, key, WorkflowObjectType::InvokeWorkflow, kind)
}

/// `Construct`: builds messages with its nested assignments and transforms.
pub fn construct(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let mut constructed_messages = Vec::new();
    for reference in element.children_of_kind(&ElementKind::MessageRef) {
        match reference.property("Ref").filter(|r| !r.is_empty()) {
            Some(name) => constructed_messages.push(name.to_string()),
            None => walk.report(AnalysisError::mismatch(
                element_name(element),
                "message reference without a Ref",
            )),
        }
    }

    let (body, channels) = scope_container(walk, element, key);
    let activity = WorkflowActivity::new(
        walk.object(element, key, WorkflowObjectType::MessageConstruction),
        element.oid.clone(),
        ActivityKind::MessageConstruction {
            constructed_messages,
            body,
        },
    );
    WalkOutput::Activity { activity, channels }
}

/// Scopes, branches, loops and the like.
pub fn group(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let (container, channels) = scope_container(walk, element, key);
    let activity = WorkflowActivity::new(
        walk.object(element, key, WorkflowObjectType::ActivityGroup),
        element.oid.clone(),
        ActivityKind::Group(container),
    );
    WalkOutput::Activity { activity, channels }
}

pub fn code_expression(
    walk: &mut WalkContext<'_>,
    element: &MetaModelElement,
    key: &str,
) -> WalkOutput {
    let kind = ActivityKind::CodeExpression {
        expression: element.property("Expression").map(str::to_string),
    };
    activity(walk, element, key, WorkflowObjectType::CodeExpression, kind)
}

pub fn transform(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let kind = ActivityKind::MessageTransform {
        map_name: element.property("ClassName").map(str::to_string),
    };
    activity(walk, element, key, WorkflowObjectType::MessageTransform, kind)
}

/// Read the port, operation and message of a receive or send.
fn message_exchange(
    walk: &mut WalkContext<'_>,
    element: &MetaModelElement,
) -> Option<MessageExchangeActivity> {
    let port_name = required(walk, element, "PortName");
    let operation_name = required(walk, element, "OperationName");
    let message_name = required(walk, element, "MessageName");
    Some(MessageExchangeActivity {
        port_name: port_name?.to_string(),
        operation_name: operation_name?.to_string(),
        message_name: message_name?.to_string(),
        ..Default::default()
    })
}

/// Filter predicate of an activating receive, in disjunctive normal form.
fn predicate(walk: &mut WalkContext<'_>, element: &MetaModelElement) -> Option<DnfPredicate> {
    let mut groups = Vec::new();
    for group in element.children_of_kind(&ElementKind::DnfPredicateGroup) {
        let mut comparisons = Vec::new();
        for leaf in group.children_of_kind(&ElementKind::DnfPredicate) {
            let (Some(left), Some(operator)) = (
                leaf.property("LHS").filter(|l| !l.is_empty()),
                leaf.property("Operator").filter(|o| !o.is_empty()),
            ) else {
                walk.report(AnalysisError::mismatch(
                    element_name(element),
                    "filter predicate without a property or operator",
                ));
                continue;
            };
            comparisons.push(Comparison::new(left, operator, leaf.property("RHS")));
        }
        if !comparisons.is_empty() {
            groups.push(PredicateGroup { comparisons });
        }
    }
    let predicate = DnfPredicate { groups };
    (!predicate.is_empty()).then_some(predicate)
}

pub fn receive(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let Some(mut exchange) = message_exchange(walk, element) else {
        return WalkOutput::Skip;
    };
    exchange.activate = element.bool_property("Activate");
    exchange.predicate = predicate(walk, element);
    activity(walk, element, key, WorkflowObjectType::Receive, ActivityKind::Receive(exchange))
}

pub fn send(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let Some(exchange) = message_exchange(walk, element) else {
        return WalkOutput::Skip;
    };
    activity(walk, element, key, WorkflowObjectType::Send, ActivityKind::Send(exchange))
}

pub fn suspend(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let kind = ActivityKind::Suspend {
        reason: element.property("ErrorMessage").map(str::to_string),
    };
    activity(walk, element, key, WorkflowObjectType::Suspend, kind)
}

pub fn terminate(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let kind = ActivityKind::Terminate {
        reason: element.property("ErrorMessage").map(str::to_string),
    };
    activity(walk, element, key, WorkflowObjectType::Terminate, kind)
}

/// Elements with no dedicated handler keep their tag.
///
/// Their children are still walked, so exchanges nested under an unlisted
/// shape are bound and routed.
pub fn unknown(walk: &mut WalkContext<'_>, element: &MetaModelElement, key: &str) -> WalkOutput {
    let (body, channels) = scope_container(walk, element, key);
    let activity = WorkflowActivity::new(
        walk.object(element, key, WorkflowObjectType::Unknown),
        element.oid.clone(),
        ActivityKind::Unknown {
            element: element.kind.tag().to_string(),
            body,
        },
    );
    WalkOutput::Activity { activity, channels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use conduit_model::source::ResourceRegistry;

    fn receive_element() -> MetaModelElement {
        MetaModelElement::new(ElementKind::Receive)
            .with_oid("r1")
            .with_property("Name", "ReceiveOrder")
            .with_property("PortName", "ReceivePort")
            .with_property("OperationName", "Submit")
            .with_property("MessageName", "Order")
            .with_property("Activate", "True")
            .with_element(
                MetaModelElement::new(ElementKind::DnfPredicateGroup)
                    .with_element(
                        MetaModelElement::new(ElementKind::DnfPredicate)
                            .with_property("LHS", "Contoso.Region")
                            .with_property("Operator", "Equals")
                            .with_property("RHS", "EU"),
                    )
                    .with_element(
                        MetaModelElement::new(ElementKind::DnfPredicate)
                            .with_property("LHS", "Contoso.Priority")
                            .with_property("Operator", "Exists"),
                    ),
            )
    }

    #[test]
    fn test_receive_reads_predicate() {
        let resources = ResourceRegistry::new();
        let config = AnalysisConfig::default();
        let mut walk = WalkContext::new(&resources, &config);
        let output = receive(&mut walk, &receive_element(), "wf.receiveorder");
        let WalkOutput::Activity { activity, .. } = output else {
            panic!("expected an activity");
        };
        let exchange = activity.message_exchange().unwrap();
        assert!(exchange.activate);
        let predicate = exchange.predicate.as_ref().unwrap();
        assert_eq!(predicate.groups.len(), 1);
        assert_eq!(predicate.groups[0].comparisons[1].right, None);
        assert_eq!(activity.object_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_send_without_port_is_skipped() {
        let resources = ResourceRegistry::new();
        let config = AnalysisConfig::default();
        let mut walk = WalkContext::new(&resources, &config);
        let element = MetaModelElement::new(ElementKind::Send)
            .with_property("Name", "SendAck")
            .with_property("OperationName", "Submit")
            .with_property("MessageName", "Ack");
        assert!(matches!(send(&mut walk, &element, "wf.sendack"), WalkOutput::Skip));
        let errors = walk.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("PortName"));
    }

    #[test]
    fn test_invoke_reads_parameters() {
        let resources = ResourceRegistry::new();
        let config = AnalysisConfig::default();
        let mut walk = WalkContext::new(&resources, &config);
        let element = MetaModelElement::new(ElementKind::Exec)
            .with_property("Name", "StartShipping")
            .with_property("Invokee", "Contoso.Shipping")
            .with_element(
                MetaModelElement::new(ElementKind::Parameter)
                    .with_property("Name", "Order")
                    .with_property("Type", "Contoso.Order")
                    .with_property("Direction", "Out"),
            )
            .with_element(
                MetaModelElement::new(ElementKind::Parameter)
                    .with_property("Name", "Flag")
                    .with_property("Direction", "Sideways"),
            );
        let output = invoke(&mut walk, &element, "wf.startshipping", true);
        let WalkOutput::Activity { activity, .. } = output else {
            panic!("expected an activity");
        };
        let ActivityKind::InvokeWorkflow(invoke) = &activity.kind else {
            panic!("expected an invoke");
        };
        assert!(invoke.is_async);
        assert_eq!(invoke.invokee, "Contoso.Shipping");
        assert_eq!(invoke.parameters[0].direction, ParameterDirection::Out);
        assert_eq!(invoke.parameters[1].direction, ParameterDirection::In);
        assert_eq!(walk.into_errors().len(), 1);
    }

    #[test]
    fn test_construct_collects_body_and_messages() {
        let resources = ResourceRegistry::new();
        let config = AnalysisConfig::default();
        let mut walk = WalkContext::new(&resources, &config);
        let element = MetaModelElement::new(ElementKind::Construct)
            .with_property("Name", "BuildAck")
            .with_element(
                MetaModelElement::new(ElementKind::MessageRef).with_property("Ref", "Ack"),
            )
            .with_element(
                MetaModelElement::new(ElementKind::MessageAssignment)
                    .with_property("Name", "Assign")
                    .with_property("Expression", "Ack = Order;"),
            );
        let output = construct(&mut walk, &element, "wf.buildack");
        let WalkOutput::Activity { activity, .. } = output else {
            panic!("expected an activity");
        };
        assert_eq!(activity.message_name(), Some("Ack"));
        let body = activity.container().unwrap();
        assert_eq!(body.activities.len(), 1);
        assert_eq!(body.activities[0].key(), "wf.buildack.assign");
    }
}
