//! Order command inputs.
//!
//! These carry already-resolved data: product prices have been snapshotted
//! into `OrderItem`s and method/user references have been checked by the
//! caller.

use common::UserId;

use super::{ContactDetails, DeliveryInfo, OrderItem, OrderStatus, PaymentInfo};

/// Checkout data for a new order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: Option<UserId>,
    pub items: Vec<OrderItem>,
    pub contact: ContactDetails,
    pub message: Option<String>,
    pub delivery: DeliveryInfo,
    pub payment: PaymentInfo,
}

/// A partial order update. Any combination of fields may be set.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    /// Replaces the whole item set.
    pub items: Option<Vec<OrderItem>>,
    pub status: Option<OrderStatus>,
    pub delivery: Option<DeliveryInfo>,
    pub payment: Option<PaymentInfo>,
}

impl OrderChanges {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn items(items: Vec<OrderItem>) -> Self {
        Self {
            items: Some(items),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryInfo) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn with_payment(mut self, payment: PaymentInfo) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_none()
            && self.status.is_none()
            && self.delivery.is_none()
            && self.payment.is_none()
    }
}
