// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Conversion ratings and per-entity report messages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Confidence that an entity converts without manual work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum ConversionRating {
    FullConversion,
    FullConversionWithFidelityLoss,
    PartialConversion,
    NoAutomaticConversion,
    /// Not rated yet
    #[default]
    NoRating,
}

impl ConversionRating {
    fn rank(self) -> Option<u8> {
        match self {
            ConversionRating::FullConversion => Some(0),
            ConversionRating::FullConversionWithFidelityLoss => Some(1),
            ConversionRating::PartialConversion => Some(2),
            ConversionRating::NoAutomaticConversion => Some(3),
            ConversionRating::NoRating => None,
        }
    }

    /// Lower the rating to at most `limit`.
    ///
    /// A rating already at or below `limit` is kept; an unrated entity takes
    /// `limit`.
    pub fn downgrade_to(self, limit: ConversionRating) -> ConversionRating {
        match (self.rank(), limit.rank()) {
            (_, None) => self,
            (None, Some(_)) => limit,
            (Some(current), Some(max)) if current >= max => self,
            _ => limit,
        }
    }
}

/// Severity of a report message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

/// A message attached to a produced entity for the migration report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    pub severity: Severity,
    pub message: String,
}

impl ReportMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}
