use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter as StrumEnumIter, EnumString};
use uuid::Uuid;

/// Order lifecycle state. `Draft` is the only state reachable without an
/// explicit submission; at most one draft exists per supplier at any time
/// (enforced by a partial unique index on the orders table).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    StrumEnumIter,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Draft,
    New,
    Sent,
    Receiving,
    Archived,
}

impl OrderState {
    /// Forward transitions of the order workflow. Same-state transitions are
    /// treated as no-ops by the lifecycle manager, not listed here.
    pub fn can_transition_to(self, target: OrderState) -> bool {
        matches!(
            (self, target),
            (OrderState::Draft, OrderState::New)
                | (OrderState::New, OrderState::Sent)
                | (OrderState::Sent, OrderState::Receiving)
                | (OrderState::Receiving, OrderState::Archived)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub supplier_id: Uuid,
    pub order_date: NaiveDate,

    /// Stored as the snake_case string of [`OrderState`].
    pub state: String,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn state(&self) -> Result<OrderState, strum::ParseError> {
        self.state.parse()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_strings() {
        for state in [
            OrderState::Draft,
            OrderState::New,
            OrderState::Sent,
            OrderState::Receiving,
            OrderState::Archived,
        ] {
            let parsed: OrderState = state.to_string().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn workflow_moves_strictly_forward() {
        assert!(OrderState::Draft.can_transition_to(OrderState::New));
        assert!(OrderState::New.can_transition_to(OrderState::Sent));
        assert!(OrderState::Sent.can_transition_to(OrderState::Receiving));
        assert!(OrderState::Receiving.can_transition_to(OrderState::Archived));

        assert!(!OrderState::Draft.can_transition_to(OrderState::Archived));
        assert!(!OrderState::Archived.can_transition_to(OrderState::Draft));
        assert!(!OrderState::Sent.can_transition_to(OrderState::New));
    }
}
