//! Order and return unit of work.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use common::{AggregateId, MethodId, ProductId, UserId};
use domain::{
    Aggregate, ContactDetails, MethodDirectory, MethodKind, Order, OrderChanges, OrderEvent,
    OrderItem, OrderStatus, PlaceOrder, Repository, Return, ReturnChanges, UserDirectory,
};
use event_store::{EventStore, Version};
use inventory::{InventoryLedger, Product, ProductCatalog, Shortfall, StockLine, merge_lines};
use tracing::Instrument;

use crate::config::LifecycleConfig;
use crate::error::{LifecycleError, Result};
use crate::reaction::{self, StockReaction};
use crate::requests::{ItemRequest, NewOrder, NewReturn, OrderUpdate, ReturnUpdate};

/// An order write as committed: the state it was decided against and the
/// state it produced.
#[derive(Debug, Clone)]
pub struct OrderWrite {
    pub previous: Order,
    pub updated: Order,
}

impl OrderWrite {
    fn changed(&self) -> bool {
        self.previous.version() != self.updated.version()
    }
}

/// Runs every order and return write as one unit of work.
///
/// A write loads the current order, decides its events, asks the reaction
/// engine which stock to move, then runs the steps in a fixed order:
///
/// 1. reserve (all-or-nothing; a shortfall rejects the write)
/// 2. append with the loaded version
/// 3. release
///
/// A failed append releases what step 1 took; on a version conflict the
/// whole unit is retried from a fresh load. Failures after step 2 cannot be
/// undone and surface as `InconsistentReaction`.
///
/// Every public write runs on its own task: dropping the caller's future
/// (client disconnect, timeout) does not stop a unit of work half-way.
#[derive(Clone)]
pub struct OrderLifecycle {
    orders: Repository<Order>,
    returns: Repository<Return>,
    ledger: Arc<dyn InventoryLedger>,
    catalog: Arc<dyn ProductCatalog>,
    methods: Arc<dyn MethodDirectory>,
    users: Arc<dyn UserDirectory>,
    config: LifecycleConfig,
}

impl OrderLifecycle {
    pub fn new(
        store: Arc<dyn EventStore>,
        ledger: Arc<dyn InventoryLedger>,
        catalog: Arc<dyn ProductCatalog>,
        methods: Arc<dyn MethodDirectory>,
        users: Arc<dyn UserDirectory>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            orders: Repository::new(Arc::clone(&store)),
            returns: Repository::new(store),
            ledger,
            catalog,
            methods,
            users,
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Places an order in `Pending` and reserves its items.
    #[tracing::instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_order(&self, request: NewOrder) -> Result<Order> {
        let this = self.clone();
        detached(async move { this.place_order(request).await }).await
    }

    async fn place_order(&self, request: NewOrder) -> Result<Order> {
        let start = Instant::now();

        if let Some(user_id) = request.user_id {
            self.ensure_user(user_id).await?;
        }
        self.ensure_method(request.delivery.method_id, MethodKind::Delivery)
            .await?;
        self.ensure_method(request.payment.method_id, MethodKind::Payment)
            .await?;
        let items = self.price_items(&request.items).await?;

        let order_id = AggregateId::new();
        let events = Order::default().place(
            order_id,
            PlaceOrder {
                user_id: request.user_id,
                items,
                contact: ContactDetails::new(
                    request.full_name,
                    request.contact_email,
                    request.contact_phone,
                ),
                message: request.message,
                delivery: request.delivery,
                payment: request.payment,
            },
        )?;
        let order = Order::default().preview(&events);
        let stock = reaction::on_order_inserted(&order);

        self.reserve(order_id, &stock.reserve).await?;
        if let Err(err) = self
            .orders
            .append(order_id, Version::initial(), &events)
            .await
        {
            self.compensate(order_id, &stock.reserve).await?;
            return Err(err.into());
        }

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_write_duration_seconds", "operation" => "create_order")
            .record(start.elapsed().as_secs_f64());
        tracing::info!(%order_id, total = %order.total_amount(), "order placed");
        Ok(order)
    }

    /// Applies any combination of item replacement, status, delivery and
    /// payment changes.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_order(&self, order_id: AggregateId, update: OrderUpdate) -> Result<Order> {
        let this = self.clone();
        detached(async move { this.change_order(order_id, update).await }).await
    }

    async fn change_order(&self, order_id: AggregateId, update: OrderUpdate) -> Result<Order> {
        let start = Instant::now();

        if let Some(delivery) = &update.delivery {
            self.ensure_method(delivery.method_id, MethodKind::Delivery)
                .await?;
        }
        if let Some(payment) = &update.payment {
            self.ensure_method(payment.method_id, MethodKind::Payment)
                .await?;
        }
        let items = match &update.items {
            Some(requests) => Some(self.price_items(requests).await?),
            None => None,
        };

        let changes = OrderChanges {
            items,
            status: update.status,
            delivery: update.delivery,
            payment: update.payment,
        };
        let write = self
            .write_order(order_id, |order| Ok(order.update(changes.clone())?))
            .await?;

        if write.changed() {
            metrics::counter!("orders_updated_total").increment(1);
            metrics::histogram!("order_write_duration_seconds", "operation" => "update_order")
                .record(start.elapsed().as_secs_f64());
            tracing::info!(
                %order_id,
                from = %write.previous.status(),
                to = %write.updated.status(),
                "order updated"
            );
        }
        Ok(write.updated)
    }

    /// Opens a return against an order, links it and forces the order to
    /// `Refunded`.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_return(&self, request: NewReturn) -> Result<Return> {
        let this = self.clone();
        detached(async move { this.open_return(request).await }).await
    }

    async fn open_return(&self, request: NewReturn) -> Result<Return> {
        let order_id = request.order_id;
        let return_id = AggregateId::new();
        let return_events = Return::default().request(return_id, order_id, request.message)?;

        let write = self
            .write_order(order_id, |order| {
                let mut events = order.link_return(return_id)?;
                events.extend(order.update(OrderChanges::status(OrderStatus::Refunded))?);
                Ok(events)
            })
            .await?;

        if let Err(err) = self
            .returns
            .append(return_id, Version::initial(), &return_events)
            .await
        {
            self.undo_order_write(order_id, &write, Some(return_id))
                .await?;
            return Err(err.into());
        }

        metrics::counter!("returns_created_total").increment(1);
        tracing::info!(%return_id, %order_id, "return opened");
        Ok(Return::default().preview(&return_events))
    }

    /// Updates a return's status and/or message.
    ///
    /// A status change forces the linked order into the status the new
    /// return status implies; an unchanged status or a message-only update
    /// leaves the order alone.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_return(&self, return_id: AggregateId, update: ReturnUpdate) -> Result<Return> {
        let this = self.clone();
        detached(async move { this.change_return(return_id, update).await }).await
    }

    async fn change_return(&self, return_id: AggregateId, update: ReturnUpdate) -> Result<Return> {
        let changes = ReturnChanges {
            status: update.status,
            message: update.message,
        };

        let mut attempt = 0;
        loop {
            let current = self
                .returns
                .load_existing(return_id)
                .await?
                .ok_or(LifecycleError::ReturnNotFound(return_id))?;
            let events = current.update(changes.clone())?;
            if events.is_empty() {
                return Ok(current);
            }

            let forced = match current.status_change(&events) {
                Some((_, to)) => {
                    let order_id = current
                        .order_id()
                        .ok_or(LifecycleError::ReturnNotFound(return_id))?;
                    let status = to.forced_order_status();
                    let write = self
                        .write_order(order_id, |order| {
                            Ok(order.update(OrderChanges::status(status))?)
                        })
                        .await?;
                    Some((order_id, write))
                }
                None => None,
            };

            match self
                .returns
                .append(return_id, current.version(), &events)
                .await
            {
                Ok(_) => {
                    let updated = current.preview(&events);
                    metrics::counter!("returns_updated_total").increment(1);
                    tracing::info!(%return_id, status = %updated.status(), "return updated");
                    return Ok(updated);
                }
                Err(err) => {
                    if let Some((order_id, write)) = &forced {
                        self.undo_order_write(*order_id, write, None).await?;
                    }
                    if !err.is_conflict() {
                        return Err(err.into());
                    }
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(LifecycleError::Conflict {
                            aggregate_id: return_id,
                            attempts: attempt,
                        });
                    }
                    tracing::warn!(%return_id, attempt, "return write conflict, retrying");
                }
            }
        }
    }

    pub async fn get_order(&self, order_id: AggregateId) -> Result<Order> {
        self.orders
            .load_existing(order_id)
            .await?
            .ok_or(LifecycleError::OrderNotFound(order_id))
    }

    pub async fn get_return(&self, return_id: AggregateId) -> Result<Return> {
        self.returns
            .load_existing(return_id)
            .await?
            .ok_or(LifecycleError::ReturnNotFound(return_id))
    }

    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product> {
        self.catalog
            .product(product_id)
            .await?
            .ok_or_else(|| LifecycleError::ProductNotFound(product_id.clone()))
    }

    /// Administrative create-or-restock. Sets the available stock directly.
    #[tracing::instrument(skip(self, product), fields(product_id = %product.id, stock = product.stock))]
    pub async fn put_product(&self, product: Product) -> Result<Product> {
        self.catalog.put_product(product.clone()).await?;
        tracing::info!("product stock set");
        Ok(product)
    }

    /// Sum of the quantities every order currently keeps out of stock, per
    /// product. Used to reconcile the ledger against the journal.
    pub async fn held_quantities(&self) -> Result<BTreeMap<ProductId, u64>> {
        let mut held = BTreeMap::new();
        for order_id in self.orders.ids().await? {
            let order = self.orders.load(order_id).await?;
            for (product_id, quantity) in reaction::held_quantities(&order) {
                *held.entry(product_id).or_insert(0) += quantity;
            }
        }
        Ok(held)
    }

    /// Loads, decides, reacts and commits one order write, retrying on
    /// version conflicts.
    async fn write_order<F>(&self, order_id: AggregateId, decide: F) -> Result<OrderWrite>
    where
        F: Fn(&Order) -> Result<Vec<OrderEvent>> + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            let previous = self
                .orders
                .load_existing(order_id)
                .await?
                .ok_or(LifecycleError::OrderNotFound(order_id))?;
            let events = decide(&previous)?;
            if events.is_empty() {
                let updated = previous.clone();
                return Ok(OrderWrite { previous, updated });
            }

            let updated = previous.preview(&events);
            let stock = reaction::on_order_updated(&previous, &updated, self.config.item_replacement);

            self.reserve(order_id, &stock.reserve).await?;
            match self
                .orders
                .append(order_id, previous.version(), &events)
                .await
            {
                Ok(_) => {
                    self.release_committed(order_id, &stock).await?;
                    return Ok(OrderWrite { previous, updated });
                }
                Err(err) => {
                    self.compensate(order_id, &stock.reserve).await?;
                    if !err.is_conflict() {
                        return Err(err.into());
                    }
                    metrics::counter!("order_write_conflicts_total").increment(1);
                    attempt += 1;
                    if attempt > self.config.max_retries {
                        return Err(LifecycleError::Conflict {
                            aggregate_id: order_id,
                            attempts: attempt,
                        });
                    }
                    tracing::warn!(%order_id, attempt, "order write conflict, retrying");
                }
            }
        }
    }

    /// Puts an order back the way `write` found it: unlinks `return_id` if
    /// given and restores the previous status.
    async fn undo_order_write(
        &self,
        order_id: AggregateId,
        write: &OrderWrite,
        return_id: Option<AggregateId>,
    ) -> Result<()> {
        if !write.changed() && return_id.is_none() {
            return Ok(());
        }

        let status = write.previous.status();
        let result = self
            .write_order(order_id, |order| {
                let mut events = match return_id {
                    Some(return_id) => order.unlink_return(return_id),
                    None => Vec::new(),
                };
                events.extend(order.update(OrderChanges::status(status))?);
                Ok(events)
            })
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => Err(self.inconsistent(
                order_id,
                format!("could not restore order to {status}: {err}"),
            )),
        }
    }

    /// Pre-checks and then atomically reserves `lines`.
    async fn reserve(&self, order_id: AggregateId, lines: &[StockLine]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        if !self.ledger.can_fulfill(lines).await? {
            let shortfalls = self.shortfalls(lines).await?;
            if !shortfalls.is_empty() {
                return Err(self.rejected(order_id, shortfalls));
            }
        }

        match self.ledger.reserve(lines).await {
            Ok(()) => Ok(()),
            Err(err) => match LifecycleError::from(err) {
                LifecycleError::InsufficientStock(shortfalls) => {
                    Err(self.rejected(order_id, shortfalls))
                }
                other => Err(other),
            },
        }
    }

    async fn shortfalls(&self, lines: &[StockLine]) -> Result<Vec<Shortfall>> {
        let mut shortfalls = Vec::new();
        for line in merge_lines(lines) {
            let available = self.ledger.stock_of(&line.product_id).await?;
            if available < line.quantity {
                shortfalls.push(Shortfall {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }
        }
        Ok(shortfalls)
    }

    fn rejected(&self, order_id: AggregateId, shortfalls: Vec<Shortfall>) -> LifecycleError {
        metrics::counter!("stock_reservations_rejected_total").increment(1);
        let err = LifecycleError::InsufficientStock(shortfalls);
        tracing::warn!(%order_id, error = %err, "stock reservation rejected");
        err
    }

    /// Gives back a reservation whose write did not commit.
    async fn compensate(&self, order_id: AggregateId, reserved: &[StockLine]) -> Result<()> {
        if reserved.is_empty() {
            return Ok(());
        }
        self.ledger.release(reserved).await.map_err(|err| {
            self.inconsistent(order_id, format!("compensating release failed: {err}"))
        })
    }

    async fn release_committed(&self, order_id: AggregateId, stock: &StockReaction) -> Result<()> {
        if stock.release.is_empty() {
            return Ok(());
        }
        self.ledger.release(&stock.release).await.map_err(|err| {
            self.inconsistent(order_id, format!("release after commit failed: {err}"))
        })
    }

    fn inconsistent(&self, aggregate_id: AggregateId, reason: String) -> LifecycleError {
        metrics::counter!("inconsistent_reactions_total").increment(1);
        tracing::error!(%aggregate_id, %reason, "inconsistent stock reaction");
        LifecycleError::InconsistentReaction {
            aggregate_id,
            reason,
        }
    }

    /// Snapshots the live price of every requested product into new items.
    async fn price_items(&self, requests: &[ItemRequest]) -> Result<Vec<OrderItem>> {
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            let product = self.get_product(&request.product_id).await?;
            items.push(OrderItem::new(product.id, request.quantity, product.price));
        }
        Ok(items)
    }

    async fn ensure_method(&self, method_id: MethodId, expected: MethodKind) -> Result<()> {
        let method = self
            .methods
            .method(method_id)
            .await?
            .ok_or(LifecycleError::MethodNotFound(method_id))?;
        if method.kind != expected {
            return Err(LifecycleError::WrongMethodKind {
                method_id,
                expected,
            });
        }
        Ok(())
    }

    async fn ensure_user(&self, user_id: UserId) -> Result<()> {
        self.users
            .user(user_id)
            .await?
            .ok_or(LifecycleError::UserNotFound(user_id))?;
        Ok(())
    }
}

/// Runs `work` to completion on its own task, in the caller's span.
///
/// Dropping the returned future does not cancel `work`.
async fn detached<T, F>(work: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(work.in_current_span()).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(err) => Err(LifecycleError::Interrupted(err.to_string())),
    }
}

/// Builds a lifecycle over in-memory journal, inventory and directory.
pub fn in_memory(
    inventory: inventory::InMemoryInventory,
    directory: domain::InMemoryDirectory,
    config: LifecycleConfig,
) -> OrderLifecycle {
    let inventory = Arc::new(inventory);
    let directory = Arc::new(directory);
    OrderLifecycle::new(
        Arc::new(event_store::InMemoryEventStore::new()),
        inventory.clone(),
        inventory,
        directory.clone(),
        directory,
        config,
    )
}
