//! Stock reaction engine.
//!
//! Compares an order before and after a write and says which stock to
//! reserve and which to release. Pure: the caller runs the ledger calls
//! inside its unit of work.

use std::collections::BTreeMap;

use common::ProductId;
use domain::{Order, StockEffect};
use inventory::{StockLine, merge_lines};

use crate::config::ItemReplacement;

/// Ledger calls needed to keep stock consistent with one order write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockReaction {
    /// Taken before the write is committed.
    pub reserve: Vec<StockLine>,
    /// Given back after the write is committed.
    pub release: Vec<StockLine>,
}

impl StockReaction {
    pub fn is_empty(&self) -> bool {
        self.reserve.is_empty() && self.release.is_empty()
    }
}

/// A newly placed order reserves all its items.
pub fn on_order_inserted(order: &Order) -> StockReaction {
    StockReaction {
        reserve: item_lines(order),
        release: Vec::new(),
    }
}

pub fn on_order_updated(
    previous: &Order,
    updated: &Order,
    policy: ItemReplacement,
) -> StockReaction {
    match policy {
        ItemReplacement::NetDelta => net_delta(previous, updated),
        ItemReplacement::ReserveNew => reserve_new(previous, updated),
    }
}

/// The order's items as merged stock lines.
pub fn item_lines(order: &Order) -> Vec<StockLine> {
    let lines: Vec<_> = order
        .items()
        .iter()
        .map(|item| StockLine::new(item.product_id.clone(), u64::from(item.quantity)))
        .collect();
    merge_lines(&lines)
}

/// What the order keeps out of stock, per product.
pub fn held_quantities(order: &Order) -> BTreeMap<ProductId, u64> {
    if !order.holds_inventory() {
        return BTreeMap::new();
    }
    item_lines(order)
        .into_iter()
        .map(|line| (line.product_id, line.quantity))
        .collect()
}

fn net_delta(previous: &Order, updated: &Order) -> StockReaction {
    let before = held_quantities(previous);
    let after = held_quantities(updated);

    let mut reaction = StockReaction::default();
    for (product_id, &held_after) in &after {
        let held_before = before.get(product_id).copied().unwrap_or(0);
        if held_after > held_before {
            reaction
                .reserve
                .push(StockLine::new(product_id.clone(), held_after - held_before));
        }
    }
    for (product_id, &held_before) in &before {
        let held_after = after.get(product_id).copied().unwrap_or(0);
        if held_before > held_after {
            reaction
                .release
                .push(StockLine::new(product_id.clone(), held_before - held_after));
        }
    }
    reaction
}

fn reserve_new(previous: &Order, updated: &Order) -> StockReaction {
    let mut reserve = Vec::new();
    let mut release = Vec::new();

    if previous.item_ids() != updated.item_ids() {
        reserve.extend(item_lines(updated));
    }

    match previous.status().transition_effect(updated.status()) {
        StockEffect::Reserve => reserve.extend(item_lines(updated)),
        StockEffect::Release => release.extend(item_lines(updated)),
        StockEffect::NoChange => {}
    }

    net_out(&reserve, &release)
}

/// Collapses reserve and release lines into one net movement per product.
fn net_out(reserve: &[StockLine], release: &[StockLine]) -> StockReaction {
    let mut net: BTreeMap<ProductId, i128> = BTreeMap::new();
    for line in merge_lines(reserve) {
        *net.entry(line.product_id).or_insert(0) += i128::from(line.quantity);
    }
    for line in merge_lines(release) {
        *net.entry(line.product_id).or_insert(0) -= i128::from(line.quantity);
    }

    let mut reaction = StockReaction::default();
    for (product_id, quantity) in net {
        let amount = u64::try_from(quantity.unsigned_abs()).unwrap_or(u64::MAX);
        if quantity > 0 {
            reaction.reserve.push(StockLine::new(product_id, amount));
        } else if quantity < 0 {
            reaction.release.push(StockLine::new(product_id, amount));
        }
    }
    reaction
}
