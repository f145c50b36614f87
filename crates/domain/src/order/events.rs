//! Order domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{ContactDetails, DeliveryInfo, OrderItem, OrderStatus, PaymentInfo};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Checkout created the order in `Pending` with its first item set.
    OrderPlaced(OrderPlacedData),

    /// The whole item set was swapped for new items.
    ItemsReplaced(ItemsReplacedData),

    StatusChanged(StatusChangedData),

    DeliveryUpdated(DeliveryUpdatedData),

    PaymentUpdated(PaymentUpdatedData),

    /// A return was opened against the order.
    ReturnLinked(ReturnLinkChangedData),

    /// A link written for a return that was never persisted was undone.
    ReturnUnlinked(ReturnLinkChangedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::ItemsReplaced(_) => "ItemsReplaced",
            OrderEvent::StatusChanged(_) => "StatusChanged",
            OrderEvent::DeliveryUpdated(_) => "DeliveryUpdated",
            OrderEvent::PaymentUpdated(_) => "PaymentUpdated",
            OrderEvent::ReturnLinked(_) => "ReturnLinked",
            OrderEvent::ReturnUnlinked(_) => "ReturnUnlinked",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: AggregateId,

    /// None for guest checkout.
    pub user_id: Option<UserId>,

    pub items: Vec<OrderItem>,
    pub contact: ContactDetails,
    pub message: Option<String>,
    pub delivery: DeliveryInfo,
    pub payment: PaymentInfo,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsReplacedData {
    pub items: Vec<OrderItem>,
    pub replaced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedData {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryUpdatedData {
    pub delivery: DeliveryInfo,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdatedData {
    pub payment: PaymentInfo,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLinkChangedData {
    pub return_id: AggregateId,
    pub at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn order_placed(
        order_id: AggregateId,
        user_id: Option<UserId>,
        items: Vec<OrderItem>,
        contact: ContactDetails,
        message: Option<String>,
        delivery: DeliveryInfo,
        payment: PaymentInfo,
    ) -> Self {
        OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            user_id,
            items,
            contact,
            message,
            delivery,
            payment,
            placed_at: Utc::now(),
        })
    }

    pub fn items_replaced(items: Vec<OrderItem>) -> Self {
        OrderEvent::ItemsReplaced(ItemsReplacedData {
            items,
            replaced_at: Utc::now(),
        })
    }

    pub fn status_changed(from: OrderStatus, to: OrderStatus) -> Self {
        OrderEvent::StatusChanged(StatusChangedData {
            from,
            to,
            changed_at: Utc::now(),
        })
    }

    pub fn delivery_updated(delivery: DeliveryInfo) -> Self {
        OrderEvent::DeliveryUpdated(DeliveryUpdatedData {
            delivery,
            updated_at: Utc::now(),
        })
    }

    pub fn payment_updated(payment: PaymentInfo) -> Self {
        OrderEvent::PaymentUpdated(PaymentUpdatedData {
            payment,
            updated_at: Utc::now(),
        })
    }

    pub fn return_linked(return_id: AggregateId) -> Self {
        OrderEvent::ReturnLinked(ReturnLinkChangedData {
            return_id,
            at: Utc::now(),
        })
    }

    pub fn return_unlinked(return_id: AggregateId) -> Self {
        OrderEvent::ReturnUnlinked(ReturnLinkChangedData {
            return_id,
            at: Utc::now(),
        })
    }

    /// When the event happened.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(data) => data.placed_at,
            OrderEvent::ItemsReplaced(data) => data.replaced_at,
            OrderEvent::StatusChanged(data) => data.changed_at,
            OrderEvent::DeliveryUpdated(data) => data.updated_at,
            OrderEvent::PaymentUpdated(data) => data.updated_at,
            OrderEvent::ReturnLinked(data) | OrderEvent::ReturnUnlinked(data) => data.at,
        }
    }
}
