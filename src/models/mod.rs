//! Domain enums shared between entities, commands and handlers.
//!
//! Statuses are persisted as plain strings; these enums are the single
//! allow-list used when parsing client input, so an unknown value is rejected
//! before anything touches the database.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::errors::ServiceError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Unqualified,
    Converted,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Preparing,
    Shipped,
    Completed,
    Cancelled,
    PendingCompletion,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Call,
    Meeting,
    Task,
    FollowUp,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Call,
    Email,
    Whatsapp,
    Visit,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStage {
    Open,
    Won,
    Lost,
}

/// Parses a client-supplied status string against the enum allow-list.
///
/// Accepts `pending-completion` as well as `pending_completion`; anything
/// outside the enum is a validation error.
pub fn parse_status<T: FromStr>(kind: &str, raw: &str) -> Result<T, ServiceError> {
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    T::from_str(&normalized)
        .map_err(|_| ServiceError::ValidationError(format!("Unknown {} value: {}", kind, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips_through_strings() {
        for status in [
            OrderStatus::New,
            OrderStatus::Preparing,
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
            OrderStatus::PendingCompletion,
        ] {
            let parsed: OrderStatus = parse_status("order", &status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn hyphenated_spelling_is_accepted() {
        let parsed: OrderStatus = parse_status("order", "pending-completion").unwrap();
        assert_eq!(parsed, OrderStatus::PendingCompletion);
    }

    #[test]
    fn bogus_status_is_rejected() {
        assert!(parse_status::<OrderStatus>("order", "bogus").is_err());
        assert!(parse_status::<PaymentStatus>("payment", "partial").is_err());
    }
}
