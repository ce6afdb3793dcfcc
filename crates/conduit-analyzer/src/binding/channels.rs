// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Binding of message-exchange activities to workflow channels.
//!
//! Every receive, send, invoke, suspend and terminate activity is resolved
//! to its channel. Binding sets the channel direction, classifies the
//! message and, for activating receives, builds the message box
//! subscription. Other activity kinds are not bound.

use tracing::debug;

use conduit_model::key::{child_key, short_name};
use conduit_model::source::{MessageSlot, OperationDefinition, ResourceKind};
use conduit_model::target::{FilterGroup, MessagingObjectMut, Subscription, SubscriptionFilter};
use conduit_model::workflow::{
    ActivityKind, ChannelBindingKind, ChannelDirection, InvokeWorkflowActivity,
    MessageExchangeActivity, WorkflowChannel, WorkflowDefinition, WorkflowMessageType,
};

use super::subscription::{
    MESSAGE_TYPE_PROPERTY, RECEIVE_PORT_ID_PROPERTY, equals, predicate_group,
};
use crate::context::AnalysisContext;
use crate::error::AnalysisError;

/// Name of the channel shared by suspend and terminate activities.
pub const SUSPEND_CHANNEL_NAME: &str = "Suspend";

/// An activity waiting to be bound, copied out of the definition.
enum PendingBinding {
    Receive {
        key: String,
        exchange: MessageExchangeActivity,
    },
    Send {
        key: String,
        exchange: MessageExchangeActivity,
    },
    Invoke {
        key: String,
        invoke: InvokeWorkflowActivity,
    },
    Suspend,
}

/// Bind every message-exchange activity of a definition to its channel.
pub fn bind_channels(ctx: &mut AnalysisContext, definition: &mut WorkflowDefinition) {
    let mut pending = Vec::new();
    definition.for_each_activity(&mut |activity| {
        let key = activity.key().to_string();
        match &activity.kind {
            ActivityKind::Receive(exchange) => pending.push(PendingBinding::Receive {
                key,
                exchange: exchange.clone(),
            }),
            ActivityKind::Send(exchange) => pending.push(PendingBinding::Send {
                key,
                exchange: exchange.clone(),
            }),
            ActivityKind::InvokeWorkflow(invoke) => pending.push(PendingBinding::Invoke {
                key,
                invoke: invoke.clone(),
            }),
            ActivityKind::Suspend { .. } | ActivityKind::Terminate { .. } => {
                pending.push(PendingBinding::Suspend)
            }
            ActivityKind::Group(_)
            | ActivityKind::CodeExpression { .. }
            | ActivityKind::MessageConstruction { .. }
            | ActivityKind::MessageTransform { .. }
            | ActivityKind::Unknown { .. } => {}
        }
    });

    debug!(workflow = %definition.name(), activities = pending.len(), "Binding channels");
    for binding in pending {
        match binding {
            PendingBinding::Receive { key, exchange } => {
                bind_exchange(ctx, definition, &key, &exchange, true)
            }
            PendingBinding::Send { key, exchange } => {
                bind_exchange(ctx, definition, &key, &exchange, false)
            }
            PendingBinding::Invoke { key, invoke } => bind_invoke(ctx, definition, &key, &invoke),
            PendingBinding::Suspend => bind_suspend(definition),
        }
    }
}

/// Direction of a channel from the exchanged message's slot.
pub fn channel_direction(is_receive: bool, slot: MessageSlot, two_way: bool) -> ChannelDirection {
    match (is_receive, slot, two_way) {
        (true, MessageSlot::Request, false) => ChannelDirection::Receive,
        (true, MessageSlot::Request, true) => ChannelDirection::ReceiveResponse,
        (true, MessageSlot::Response | MessageSlot::Fault, _) => ChannelDirection::RequestReply,
        (false, MessageSlot::Request, false) => ChannelDirection::Send,
        (false, MessageSlot::Request, true) => ChannelDirection::RequestReply,
        (false, MessageSlot::Response | MessageSlot::Fault, _) => ChannelDirection::ReceiveResponse,
    }
}

/// Pick the slot an exchanged message fills.
///
/// When the type fills both the request and the response slot, a send on a
/// channel already bound `ReceiveResponse` is the reply, and so is a receive
/// on a channel already bound `RequestReply`. Otherwise the first slot wins.
fn exchanged_slot(
    slots: &[MessageSlot],
    is_receive: bool,
    bound: Option<ChannelDirection>,
) -> Option<MessageSlot> {
    let replying = matches!(
        (is_receive, bound),
        (false, Some(ChannelDirection::ReceiveResponse))
            | (true, Some(ChannelDirection::RequestReply))
    );
    if replying && slots.contains(&MessageSlot::Response) {
        return Some(MessageSlot::Response);
    }
    slots.first().copied()
}

fn message_kind(slot: MessageSlot) -> WorkflowMessageType {
    match slot {
        MessageSlot::Request => WorkflowMessageType::Request,
        MessageSlot::Response => WorkflowMessageType::Response,
        MessageSlot::Fault => WorkflowMessageType::Fault,
    }
}

fn resolve_operation<'r>(
    ctx: &'r AnalysisContext,
    channel: &WorkflowChannel,
) -> Option<&'r OperationDefinition> {
    ctx.resources
        .find_resource_by_name(ResourceKind::PortType, &channel.port_type)
        .and_then(|r| r.as_port_type())
        .and_then(|pt| pt.operation(&channel.operation_name))
}

fn bind_exchange(
    ctx: &mut AnalysisContext,
    definition: &mut WorkflowDefinition,
    activity_key: &str,
    exchange: &MessageExchangeActivity,
    is_receive: bool,
) {
    let Some(channel) = definition.find_channel(&exchange.port_name, &exchange.operation_name)
    else {
        ctx.record_error(
            AnalysisError::unresolved(
                activity_key,
                "channel",
                format!("{}.{}", exchange.port_name, exchange.operation_name),
            ),
            None,
        );
        return;
    };
    let channel_key = channel.key().to_string();
    let bound_direction = channel.direction;

    let Some(operation) = resolve_operation(ctx, channel) else {
        let operation = format!("{}.{}", channel.port_type, channel.operation_name);
        ctx.record_error(AnalysisError::unresolved(activity_key, "operation", operation), None);
        return;
    };
    let two_way = operation.is_two_way();

    let Some(message) = definition.resolve_message(activity_key, &exchange.message_name) else {
        ctx.record_error(
            AnalysisError::unresolved(activity_key, "message", exchange.message_name.as_str()),
            None,
        );
        return;
    };
    let slots = operation.slots_for(&message.declared_type);
    let Some(slot) = exchanged_slot(&slots, is_receive, bound_direction) else {
        let err = AnalysisError::mismatch(
            activity_key,
            format!(
                "message '{}' of type '{}' is not used by operation '{}'",
                message.name(),
                message.declared_type,
                operation.name
            ),
        );
        ctx.record_error(err, None);
        return;
    };
    let message_key = message.key().to_string();
    let message_name = message.name().to_string();

    let direction = channel_direction(is_receive, slot, two_way);
    let Some(channel) = definition.find_channel_by_key_mut(&channel_key) else {
        return;
    };
    if let Err(existing) = channel.set_direction(direction) {
        let err = AnalysisError::mismatch(
            activity_key,
            format!(
                "channel '{}' is bound as {} and cannot also be bound as {}",
                channel_key, existing, direction
            ),
        );
        ctx.record_error(err, None);
    }
    if is_receive {
        channel.messages_in.insert(message_name);
    } else {
        channel.messages_out.insert(message_name);
    }

    let message_type = match definition.find_message_by_key_mut(&message_key) {
        Some(message) => {
            message.classify(message_kind(slot));
            message.effective_message_type().map(str::to_string)
        }
        None => None,
    };

    if let Some(exchange) = definition
        .find_activity_mut(activity_key)
        .and_then(|a| a.message_exchange_mut())
    {
        exchange.channel_key = Some(channel_key.clone());
        if !is_receive && let Some(message_type) = &message_type {
            exchange
                .promoted_properties
                .entry(MESSAGE_TYPE_PROPERTY.to_string())
                .or_insert_with(|| message_type.clone());
        }
    }

    if is_receive && exchange.activate {
        if let Some(channel) = definition.find_channel_by_key_mut(&channel_key) {
            channel.activator = true;
        }
        subscribe(ctx, definition, &channel_key, exchange, message_type.as_deref());
    }
}

/// Build the subscription of an activating receive and attach it to the
/// channel and the message box topic.
fn subscribe(
    ctx: &mut AnalysisContext,
    definition: &mut WorkflowDefinition,
    channel_key: &str,
    exchange: &MessageExchangeActivity,
    message_type: Option<&str>,
) {
    let owner = definition.key().to_string();
    let Some(channel) = definition.find_channel_by_key(channel_key) else {
        return;
    };

    let mut all = FilterGroup::and();
    if matches!(
        channel.binding,
        ChannelBindingKind::Logical | ChannelBindingKind::Physical
    ) {
        match receive_port_key(ctx, &definition.full_name, &exchange.port_name) {
            Some(port_key) => all.filters.push(equals(RECEIVE_PORT_ID_PROPERTY, &port_key)),
            None => ctx.record_error(
                AnalysisError::unresolved(
                    &owner,
                    "bound receive port",
                    exchange.port_name.as_str(),
                ),
                None,
            ),
        }
    }

    match (&exchange.predicate, message_type) {
        (Some(predicate), _) => {
            let mut errors = Vec::new();
            all.groups.push(predicate_group(&owner, predicate, &mut errors));
            for err in errors {
                ctx.record_error(err, None);
            }
        }
        (None, Some(message_type)) => all.filters.push(equals(MESSAGE_TYPE_PROPERTY, message_type)),
        (None, None) => ctx.record_error(
            AnalysisError::missing(
                &owner,
                format!("message type for subscription '{}'", channel_key),
            ),
            None,
        ),
    }

    let filter = SubscriptionFilter::new(all);
    let subscription = Subscription::new(
        channel_key,
        ctx.config.durable_subscriptions,
        ctx.config.ordered_subscriptions,
    )
    .with_filter(filter.clone());

    if let Some(channel) = definition.find_channel_by_key_mut(channel_key) {
        match &mut channel.subscription {
            Some(existing) => {
                existing.add_filter(filter);
            }
            None => channel.subscription = Some(subscription.clone()),
        }
    }

    let topic = ctx.message_box_key();
    let Some(topic_key) = ctx.require_shared_channel(topic, &owner) else {
        return;
    };
    attach_to_topic(ctx, &topic_key, subscription);
}

/// Upsert a subscription into a topic channel by name.
pub fn attach_to_topic(ctx: &mut AnalysisContext, topic_key: &str, subscription: Subscription) {
    let subscriptions = match ctx.target.find_messaging_object_mut(topic_key) {
        Some(MessagingObjectMut::Channel(channel)) => channel.subscriptions_mut(),
        _ => None,
    };
    let Some(subscriptions) = subscriptions else {
        ctx.record_error(
            AnalysisError::mismatch(topic_key, "message box channel is not a topic"),
            None,
        );
        return;
    };
    match subscriptions.iter_mut().find(|s| s.name == subscription.name) {
        Some(existing) => {
            for filter in subscription.filters {
                existing.add_filter(filter);
            }
        }
        None => subscriptions.push(subscription),
    }
}

/// Resource key of the physical receive port a logical port is bound to.
fn receive_port_key(ctx: &AnalysisContext, service: &str, logical_port: &str) -> Option<String> {
    let port_name = ctx
        .resources
        .find_resources_by_type(ResourceKind::BindingFile)
        .filter_map(|r| r.as_binding_file())
        .find_map(|b| b.port_binding(service, logical_port))
        .and_then(|binding| binding.receive_port.clone())?;
    ctx.resources
        .find_resource_by_name(ResourceKind::ReceivePort, &port_name)
        .map(|r| r.key.clone())
}

fn bind_invoke(
    ctx: &mut AnalysisContext,
    definition: &mut WorkflowDefinition,
    activity_key: &str,
    invoke: &InvokeWorkflowActivity,
) {
    let channel_key = child_key(&child_key(definition.key(), &invoke.invokee), "trigger");
    if definition.find_channel_by_key(&channel_key).is_none() {
        let name = short_name(&invoke.invokee);
        definition.channels.push(WorkflowChannel::trigger(name, &channel_key));
    }

    let direction = if invoke.is_async {
        ChannelDirection::FireForget
    } else {
        ChannelDirection::RequestReply
    };
    if let Some(channel) = definition.find_channel_by_key_mut(&channel_key) {
        if let Err(existing) = channel.set_direction(direction) {
            let err = AnalysisError::mismatch(
                activity_key,
                format!(
                    "workflow '{}' is invoked both as {} and as {}",
                    invoke.invokee, existing, direction
                ),
            );
            ctx.record_error(err, None);
        }
        if channel.parameters.is_empty() {
            channel.parameters = invoke.parameters.clone();
        }
    }

    if let Some(ActivityKind::InvokeWorkflow(activity)) =
        definition.find_activity_mut(activity_key).map(|a| &mut a.kind)
    {
        activity.channel_key = Some(channel_key);
    }
}

fn bind_suspend(definition: &mut WorkflowDefinition) {
    if definition.channels.iter().any(WorkflowChannel::is_publish_subscribe) {
        return;
    }
    let key = child_key(definition.key(), SUSPEND_CHANNEL_NAME);
    let mut channel = WorkflowChannel::publish_subscribe(SUSPEND_CHANNEL_NAME, key);
    channel.direction = Some(ChannelDirection::Send);
    definition.channels.push(channel);
}
