//! Order and return streams persisted through the repository.

use std::sync::Arc;

use common::{AggregateId, MethodId, Money, UserId};
use domain::{
    Aggregate, ContactDetails, DeliveryInfo, DomainError, Order, OrderChanges, OrderError,
    OrderItem, OrderStatus, PaymentInfo, PlaceOrder, Repository, Return, ReturnChanges,
    ReturnStatus,
};
use event_store::{EventStore, InMemoryEventStore, Version};

fn repositories() -> (Repository<Order>, Repository<Return>, InMemoryEventStore) {
    let store = InMemoryEventStore::new();
    let shared: Arc<dyn EventStore> = Arc::new(store.clone());
    (
        Repository::new(Arc::clone(&shared)),
        Repository::new(shared),
        store,
    )
}

fn checkout(items: Vec<OrderItem>) -> PlaceOrder {
    PlaceOrder {
        user_id: Some(UserId::new()),
        items,
        contact: ContactDetails::new("Katherine Johnson", "kj@example.com", "555-0199"),
        message: Some("ring twice".to_string()),
        delivery: DeliveryInfo {
            method_id: MethodId::new(),
            address: "3 Orbit Lane".to_string(),
            city: "Hampton".to_string(),
            postal_code: "23666".to_string(),
            country: "US".to_string(),
        },
        payment: PaymentInfo {
            method_id: MethodId::new(),
        },
    }
}

async fn place(repo: &Repository<Order>) -> AggregateId {
    let order_id = AggregateId::new();
    let events = Order::default()
        .place(
            order_id,
            checkout(vec![OrderItem::new("SKU-001", 2, Money::from_cents(1500))]),
        )
        .unwrap();
    repo.append(order_id, Version::initial(), &events)
        .await
        .unwrap();
    order_id
}

mod order_stream {
    use super::*;

    #[tokio::test]
    async fn order_round_trips_through_the_journal() {
        let (orders, _, _) = repositories();
        let order_id = place(&orders).await;

        let order = orders.load_existing(order_id).await.unwrap().unwrap();
        assert_eq!(order.id(), Some(order_id));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_amount().cents(), 3000);
        assert_eq!(order.message(), Some("ring twice"));
        assert_eq!(order.version(), Version::first());
    }

    #[tokio::test]
    async fn updates_append_in_order() {
        let (orders, _, store) = repositories();
        let order_id = place(&orders).await;
        let order = orders.load(order_id).await.unwrap();

        let events = order
            .update(
                OrderChanges::items(vec![OrderItem::new("SKU-002", 1, Money::from_cents(700))])
                    .with_status(OrderStatus::Confirmed),
            )
            .unwrap();
        let expected = order.preview(&events);
        let version = orders
            .append(order_id, order.version(), &events)
            .await
            .unwrap();
        assert_eq!(version, Version::new(3));

        let reloaded = orders.load(order_id).await.unwrap();
        assert_eq!(reloaded.status(), expected.status());
        assert_eq!(reloaded.items(), expected.items());
        assert_eq!(reloaded.version(), expected.version());

        let types: Vec<_> = store
            .get_events_for_aggregate(order_id)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(types, ["OrderPlaced", "ItemsReplaced", "StatusChanged"]);
    }

    #[tokio::test]
    async fn racing_writers_conflict() {
        let (orders, _, _) = repositories();
        let order_id = place(&orders).await;

        let first = orders.load(order_id).await.unwrap();
        let second = orders.load(order_id).await.unwrap();

        let events = first
            .update(OrderChanges::status(OrderStatus::Cancelled))
            .unwrap();
        orders
            .append(order_id, first.version(), &events)
            .await
            .unwrap();

        let events = second
            .update(OrderChanges::status(OrderStatus::Open))
            .unwrap();
        let err = orders
            .append(order_id, second.version(), &events)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let order = orders.load(order_id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn invalid_update_is_an_order_error() {
        let (orders, _, _) = repositories();
        let order_id = place(&orders).await;
        let order = orders.load(order_id).await.unwrap();

        let err: DomainError = order.update(OrderChanges::items(vec![])).unwrap_err().into();
        assert!(matches!(err, DomainError::Order(OrderError::NoItems)));
        assert!(!err.is_conflict());
    }

    #[tokio::test]
    async fn ids_lists_orders_only() {
        let (orders, returns, _) = repositories();
        let first = place(&orders).await;
        let second = place(&orders).await;

        assert_eq!(orders.ids().await.unwrap(), vec![first, second]);
        assert!(returns.ids().await.unwrap().is_empty());
    }
}

mod return_stream {
    use super::*;

    #[tokio::test]
    async fn return_links_to_order() {
        let (orders, returns, _) = repositories();
        let order_id = place(&orders).await;
        let return_id = AggregateId::new();

        let events = Return::default()
            .request(return_id, order_id, "too small")
            .unwrap();
        returns
            .append(return_id, Version::initial(), &events)
            .await
            .unwrap();

        let order = orders.load(order_id).await.unwrap();
        let events = order.link_return(return_id).unwrap();
        orders
            .append(order_id, order.version(), &events)
            .await
            .unwrap();

        let ret = returns.load_existing(return_id).await.unwrap().unwrap();
        assert_eq!(ret.order_id(), Some(order_id));
        assert_eq!(ret.status(), ReturnStatus::Open);
        assert_eq!(
            orders.load(order_id).await.unwrap().return_id(),
            Some(return_id)
        );
    }

    #[tokio::test]
    async fn return_status_changes_replay() {
        let (_, returns, _) = repositories();
        let return_id = AggregateId::new();
        let events = Return::default()
            .request(return_id, AggregateId::new(), "broken")
            .unwrap();
        returns
            .append(return_id, Version::initial(), &events)
            .await
            .unwrap();

        for status in [ReturnStatus::Accepted, ReturnStatus::Completed] {
            let ret = returns.load(return_id).await.unwrap();
            let events = ret
                .update(ReturnChanges {
                    status: Some(status),
                    message: None,
                })
                .unwrap();
            returns
                .append(return_id, ret.version(), &events)
                .await
                .unwrap();
        }

        let ret = returns.load(return_id).await.unwrap();
        assert_eq!(ret.status(), ReturnStatus::Completed);
        assert_eq!(ret.version(), Version::new(3));
        assert_eq!(ret.status().forced_order_status(), OrderStatus::Refunded);
    }
}
