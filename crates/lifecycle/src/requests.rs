//! Inputs of the exposed operations, before prices and references are
//! resolved.

use common::{AggregateId, ProductId, UserId};
use domain::{DeliveryInfo, OrderStatus, PaymentInfo, ReturnStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl ItemRequest {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Checkout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    /// None for guest checkout.
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub items: Vec<ItemRequest>,
    pub full_name: String,
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub message: Option<String>,
    pub delivery: DeliveryInfo,
    pub payment: PaymentInfo,
}

/// Partial order update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Replaces the whole item set.
    #[serde(default)]
    pub items: Option<Vec<ItemRequest>>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub delivery: Option<DeliveryInfo>,
    #[serde(default)]
    pub payment: Option<PaymentInfo>,
}

impl OrderUpdate {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn items(items: Vec<ItemRequest>) -> Self {
        Self {
            items: Some(items),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReturn {
    pub order_id: AggregateId,
    #[serde(default)]
    pub message: String,
}

/// Partial return update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnUpdate {
    #[serde(default)]
    pub status: Option<ReturnStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ReturnUpdate {
    pub fn status(status: ReturnStatus) -> Self {
        Self {
            status: Some(status),
            message: None,
        }
    }
}
