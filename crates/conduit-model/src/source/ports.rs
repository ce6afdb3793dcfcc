// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Receive ports, send ports and pipelines.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::predicate::DnfPredicate;

/// Kind of a pipeline component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum ComponentKind {
    Decoder,
    Disassembler,
    Validator,
    PartyResolver,
    PreAssembler,
    Assembler,
    Encoder,
    Custom,
}

/// One component of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineComponent {
    pub name: String,

    pub kind: ComponentKind,

    /// Component splits interchanges into individual messages
    #[serde(default)]
    pub handles_batches: bool,
}

/// Whether a pipeline is used on the receive or send side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineDirection {
    Receive,
    Send,
}

/// An ordered chain of message processing components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinition {
    pub name: String,

    pub direction: PipelineDirection,

    #[serde(default)]
    pub components: Vec<PipelineComponent>,
}

/// A physical location of a receive port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveLocationDefinition {
    pub name: String,

    /// Transport adapter name (e.g. `FILE`, `HTTP`)
    pub adapter: String,

    /// Resource key of the receive pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_pipeline: Option<String>,

    /// Resource key of the send pipeline (two-way ports)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_pipeline: Option<String>,
}

/// A receive port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePortDefinition {
    pub name: String,

    #[serde(default)]
    pub two_way: bool,

    #[serde(default)]
    pub locations: Vec<ReceiveLocationDefinition>,

    /// Maps applied to inbound messages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inbound_maps: Vec<String>,

    /// Maps applied to responses (two-way ports)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbound_maps: Vec<String>,
}

/// A send port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPortDefinition {
    pub name: String,

    #[serde(default)]
    pub two_way: bool,

    pub adapter: String,

    /// Resource key of the transmit (send) pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmit_pipeline: Option<String>,

    /// Resource key of the receive pipeline for responses (two-way ports)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_pipeline: Option<String>,

    /// Subscription filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<DnfPredicate>,

    /// Maps applied to outbound messages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outbound_maps: Vec<String>,

    #[serde(default)]
    pub ordered_delivery: bool,
}

/// A source application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
