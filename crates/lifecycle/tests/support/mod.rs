#![allow(dead_code)]

use common::{MethodId, Money, ProductId, UserId};
use domain::{DeliveryInfo, InMemoryDirectory, Method, PaymentInfo, User};
use inventory::{InMemoryInventory, Product};
use lifecycle::{ItemRequest, LifecycleConfig, NewOrder, OrderLifecycle};

pub struct Fixture {
    pub lifecycle: OrderLifecycle,
    pub inventory: InMemoryInventory,
    pub directory: InMemoryDirectory,
    pub courier: MethodId,
    pub card: MethodId,
    pub user: UserId,
}

pub async fn fixture(stock: &[(&str, u64)]) -> Fixture {
    fixture_with(stock, LifecycleConfig::default()).await
}

pub async fn fixture_with(stock: &[(&str, u64)], config: LifecycleConfig) -> Fixture {
    let inventory = inventory_with(stock);
    let (directory, courier, card, user) = directory().await;
    let lifecycle = lifecycle::in_memory(inventory.clone(), directory.clone(), config);

    Fixture {
        lifecycle,
        inventory,
        directory,
        courier,
        card,
        user,
    }
}

pub fn inventory_with(stock: &[(&str, u64)]) -> InMemoryInventory {
    InMemoryInventory::with_products(stock.iter().map(|(sku, units)| {
        Product::new(*sku, format!("Product {sku}"), Money::from_cents(1000), *units)
    }))
}

pub async fn directory() -> (InMemoryDirectory, MethodId, MethodId, UserId) {
    let directory = InMemoryDirectory::new();
    let courier = Method::delivery("Courier");
    let card = Method::payment("Card");
    let user = User {
        id: UserId::new(),
        email: "shopper@example.com".to_string(),
    };
    let ids = (courier.id, card.id, user.id);
    directory.add_method(courier).await;
    directory.add_method(card).await;
    directory.add_user(user).await;
    (directory, ids.0, ids.1, ids.2)
}

impl Fixture {
    pub fn new_order(&self, items: &[(&str, u32)]) -> NewOrder {
        new_order(self.courier, self.card, items)
    }

    pub async fn stock(&self, sku: &str) -> u64 {
        self.inventory.stock(&ProductId::new(sku)).await.unwrap()
    }

    /// Asserts `initial - held == current` for every product.
    pub async fn assert_ledger_matches_orders(&self, initial: &[(&str, u64)]) {
        let held = self.lifecycle.held_quantities().await.unwrap();
        for (sku, start) in initial {
            let product_id = ProductId::new(*sku);
            let held = held.get(&product_id).copied().unwrap_or(0);
            assert_eq!(
                start - held,
                self.stock(sku).await,
                "ledger drifted for {sku}"
            );
        }
    }
}

pub fn new_order(courier: MethodId, card: MethodId, items: &[(&str, u32)]) -> NewOrder {
    NewOrder {
        user_id: None,
        items: items
            .iter()
            .map(|(sku, quantity)| ItemRequest::new(*sku, *quantity))
            .collect(),
        full_name: "Dana Scully".to_string(),
        contact_email: "dana@example.com".to_string(),
        contact_phone: "555-0142".to_string(),
        message: None,
        delivery: DeliveryInfo {
            method_id: courier,
            address: "4 Elm Street".to_string(),
            city: "Annapolis".to_string(),
            postal_code: "21401".to_string(),
            country: "US".to_string(),
        },
        payment: PaymentInfo { method_id: card },
    }
}
