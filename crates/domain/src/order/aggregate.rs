//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, Money, ProductId, UserId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{
    ContactDetails, DeliveryInfo, ItemId, OrderChanges, OrderError, OrderEvent, OrderItem,
    OrderStatus, PaymentInfo, PlaceOrder, events::OrderPlacedData,
};

/// Order aggregate root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    user_id: Option<UserId>,
    items: Vec<OrderItem>,
    status: OrderStatus,
    contact: Option<ContactDetails>,
    message: Option<String>,
    delivery: Option<DeliveryInfo>,
    payment: Option<PaymentInfo>,

    /// The return opened against this order, if any.
    return_id: Option<AggregateId>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Order {
    type Event = OrderEvent;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        self.updated_at = event.occurred_at();
        match event {
            OrderEvent::OrderPlaced(data) => self.apply_order_placed(data),
            OrderEvent::ItemsReplaced(data) => self.items = data.items,
            OrderEvent::StatusChanged(data) => self.status = data.to,
            OrderEvent::DeliveryUpdated(data) => self.delivery = Some(data.delivery),
            OrderEvent::PaymentUpdated(data) => self.payment = Some(data.payment),
            OrderEvent::ReturnLinked(data) => self.return_id = Some(data.return_id),
            OrderEvent::ReturnUnlinked(data) => {
                if self.return_id == Some(data.return_id) {
                    self.return_id = None;
                }
            }
        }
    }
}

// Query methods
impl Order {
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the ids of the current items, sorted.
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<_> = self.items.iter().map(|item| item.item_id).collect();
        ids.sort();
        ids
    }

    /// Total ordered quantity of one product across all lines.
    pub fn quantity_of(&self, product_id: &ProductId) -> u64 {
        self.items
            .iter()
            .filter(|item| &item.product_id == product_id)
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    pub fn total_amount(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    pub fn contact(&self) -> Option<&ContactDetails> {
        self.contact.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn delivery(&self) -> Option<&DeliveryInfo> {
        self.delivery.as_ref()
    }

    pub fn payment(&self) -> Option<&PaymentInfo> {
        self.payment.as_ref()
    }

    pub fn return_id(&self) -> Option<AggregateId> {
        self.return_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order currently keeps its items out of stock.
    pub fn holds_inventory(&self) -> bool {
        self.id.is_some() && self.status.holds_inventory()
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order in `Pending`.
    pub fn place(
        &self,
        order_id: AggregateId,
        command: PlaceOrder,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }

        validate_items(&command.items)?;
        if command.contact.full_name.trim().is_empty() {
            return Err(OrderError::MissingField("full name"));
        }
        if command.contact.email.trim().is_empty() {
            return Err(OrderError::MissingField("contact email"));
        }

        Ok(vec![OrderEvent::order_placed(
            order_id,
            command.user_id,
            command.items,
            command.contact,
            command.message,
            command.delivery,
            command.payment,
        )])
    }

    /// Decides the events for a partial update.
    ///
    /// Items come before the status change so that replaying the stream sees
    /// the new items already in place when the status moves. Fields equal to
    /// the current value produce no event; re-saving the same status is a
    /// no-op.
    pub fn update(&self, changes: OrderChanges) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;

        let mut events = Vec::new();

        if let Some(items) = changes.items {
            validate_items(&items)?;
            events.push(OrderEvent::items_replaced(items));
        }

        if let Some(delivery) = changes.delivery
            && self.delivery.as_ref() != Some(&delivery)
        {
            events.push(OrderEvent::delivery_updated(delivery));
        }

        if let Some(payment) = changes.payment
            && self.payment != Some(payment)
        {
            events.push(OrderEvent::payment_updated(payment));
        }

        if let Some(status) = changes.status
            && status != self.status
        {
            events.push(OrderEvent::status_changed(self.status, status));
        }

        Ok(events)
    }

    /// Links a return to this order. An order has at most one return.
    pub fn link_return(&self, return_id: AggregateId) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;

        if let Some(existing) = self.return_id {
            return Err(OrderError::ReturnAlreadyLinked {
                return_id: existing,
            });
        }

        Ok(vec![OrderEvent::return_linked(return_id)])
    }

    /// Removes the link to `return_id`; a no-op if it is not the linked one.
    pub fn unlink_return(&self, return_id: AggregateId) -> Vec<OrderEvent> {
        if self.return_id == Some(return_id) {
            vec![OrderEvent::return_unlinked(return_id)]
        } else {
            vec![]
        }
    }

    fn ensure_placed(&self) -> Result<(), OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        Ok(())
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::NoItems);
    }
    if let Some(item) = items.iter().find(|item| item.quantity == 0) {
        return Err(OrderError::InvalidQuantity {
            product_id: item.product_id.clone(),
            quantity: item.quantity,
        });
    }
    Ok(())
}

// Event application
impl Order {
    fn apply_order_placed(&mut self, data: OrderPlacedData) {
        self.id = Some(data.order_id);
        self.user_id = data.user_id;
        self.items = data.items;
        self.status = OrderStatus::Pending;
        self.contact = Some(data.contact);
        self.message = data.message;
        self.delivery = Some(data.delivery);
        self.payment = Some(data.payment);
        self.created_at = data.placed_at;
        self.updated_at = data.placed_at;
    }
}
