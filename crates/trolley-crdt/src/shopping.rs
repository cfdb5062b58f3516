//! Replicated shopping lists.
//!
//! A list is an add-wins set of item ids plus, per item, a pair of causal
//! counters (wanted quantity, acquired quantity). Every edit returns a delta
//! list that can be shipped to other replicas and joined there.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::counter::CCounter;
use crate::kernel::DotKernel;
use crate::traits::DeltaCrdt;

/// Errors from list edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("item {0:?} is not on the list")]
    UnknownItem(String),
}

/// One item and its counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    id: String,
    name: String,
    quantity: CCounter,
    acquired: CCounter,
}

impl ShoppingItem {
    pub fn new(replica_id: &str, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity: CCounter::new(replica_id),
            acquired: CCounter::new(replica_id),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity.read()
    }

    pub fn acquired(&self) -> i64 {
        self.acquired.read()
    }

    /// Moves the wanted quantity to `target`.
    pub fn set_quantity(&mut self, target: i64) -> Self {
        let delta = self.quantity.inc(target.saturating_sub(self.quantity.read()));
        self.delta_with(delta, self.acquired_delta_base())
    }

    /// Moves the acquired quantity to `target`.
    pub fn set_acquired(&mut self, target: i64) -> Self {
        let delta = self.acquired.inc(target.saturating_sub(self.acquired.read()));
        self.delta_with(self.quantity_delta_base(), delta)
    }

    /// Zeroes both counters as far as this replica has observed them.
    pub fn reset(&mut self) -> Self {
        let quantity = self.quantity.reset();
        let acquired = self.acquired.reset();
        self.delta_with(quantity, acquired)
    }

    fn quantity_delta_base(&self) -> CCounter {
        CCounter::new(self.quantity.replica_id())
    }

    fn acquired_delta_base(&self) -> CCounter {
        CCounter::new(self.acquired.replica_id())
    }

    fn delta_with(&self, quantity: CCounter, acquired: CCounter) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            quantity,
            acquired,
        }
    }

    /// Same state, edited from now on as `replica_id`.
    fn with_replica_id(self, replica_id: &str) -> Self {
        Self {
            quantity: self.quantity.with_replica_id(replica_id),
            acquired: self.acquired.with_replica_id(replica_id),
            ..self
        }
    }

    pub fn to_proto(&self) -> trolley_proto::ShoppingListItem {
        trolley_proto::ShoppingListItem {
            id: self.id.clone(),
            name: self.name.clone(),
            total_quantity: clamp_i32(self.quantity()),
            acquired_quantity: clamp_i32(self.acquired()),
        }
    }
}

impl DeltaCrdt for ShoppingItem {
    fn join(&mut self, other: &Self) {
        if self.name.is_empty() {
            self.name = other.name.clone();
        }
        self.quantity.join(&other.quantity);
        self.acquired.join(&other.acquired);
    }
}

/// A shopping list replica.
///
/// ```rust
/// use trolley_crdt::{DeltaCrdt, ShoppingList};
///
/// let mut phone = ShoppingList::new("phone", "weekly", "Weekly shop");
/// let mut laptop = ShoppingList::new("laptop", "weekly", "Weekly shop");
///
/// let delta = phone.add_item("milk", "Milk", 2);
/// laptop.join(&delta);
/// let delta = laptop.set_acquired("milk", 1).unwrap();
/// phone.join(&delta);
///
/// let milk = phone.item("milk").unwrap();
/// assert_eq!((milk.quantity(), milk.acquired()), (2, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingList {
    id: String,
    name: String,
    replica_id: String,
    members: DotKernel<String>,
    items: BTreeMap<String, ShoppingItem>,
}

impl ShoppingList {
    pub fn new(replica_id: impl Into<String>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            replica_id: replica_id.into(),
            members: DotKernel::new(),
            items: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn replica_id(&self) -> &str {
        &self.replica_id
    }

    fn empty_delta(&self) -> Self {
        Self::new(self.replica_id.clone(), self.id.clone(), self.name.clone())
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.members.values().any(|(_, member)| member == item_id)
    }

    /// The visible item `item_id`.
    pub fn item(&self, item_id: &str) -> Option<&ShoppingItem> {
        if self.contains(item_id) {
            self.items.get(item_id)
        } else {
            None
        }
    }

    /// Visible items, ordered by id.
    pub fn items(&self) -> impl Iterator<Item = &ShoppingItem> {
        self.items
            .values()
            .filter(|item| self.contains(item.id()))
    }

    /// Puts `item_id` on the list with the given wanted quantity. Adding an
    /// item that is already present updates its quantity.
    pub fn add_item(&mut self, item_id: &str, name: &str, quantity: i64) -> Self {
        let mut delta = self.empty_delta();

        let owned = item_id.to_string();
        let replica_id = self.replica_id.clone();
        delta.members = self
            .members
            .remove_where(|dot, member| member == item_id && dot.replica_id() == replica_id);
        delta.members.join(&self.members.add(&replica_id, owned.clone()));

        let item = self
            .items
            .entry(owned.clone())
            .or_insert_with(|| ShoppingItem::new(&replica_id, item_id, name));
        if item.name.is_empty() {
            item.name = name.to_string();
        }
        delta.items.insert(owned, item.set_quantity(quantity));
        delta
    }

    /// Takes `item_id` off the list and zeroes its counters.
    pub fn remove_item(&mut self, item_id: &str) -> Self {
        let mut delta = self.empty_delta();
        delta.members = self.members.remove_where(|_, member| member == item_id);
        if let Some(item) = self.items.get_mut(item_id) {
            delta.items.insert(item_id.to_string(), item.reset());
        }
        delta
    }

    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> Result<Self, ListError> {
        let item_delta = self.visible_item_mut(item_id)?.set_quantity(quantity);
        Ok(self.delta_for_item(item_delta))
    }

    pub fn set_acquired(&mut self, item_id: &str, acquired: i64) -> Result<Self, ListError> {
        let item_delta = self.visible_item_mut(item_id)?.set_acquired(acquired);
        Ok(self.delta_for_item(item_delta))
    }

    fn visible_item_mut(&mut self, item_id: &str) -> Result<&mut ShoppingItem, ListError> {
        if !self.contains(item_id) {
            return Err(ListError::UnknownItem(item_id.to_string()));
        }
        self.items
            .get_mut(item_id)
            .ok_or_else(|| ListError::UnknownItem(item_id.to_string()))
    }

    fn delta_for_item(&self, item_delta: ShoppingItem) -> Self {
        let mut delta = self.empty_delta();
        delta.items.insert(item_delta.id.clone(), item_delta);
        delta
    }

    /// Wire form of the visible state.
    pub fn snapshot(&self) -> trolley_proto::ShoppingList {
        trolley_proto::ShoppingList {
            id: self.id.clone(),
            name: self.name.clone(),
            items: self.items().map(ShoppingItem::to_proto).collect(),
        }
    }
}

impl DeltaCrdt for ShoppingList {
    fn join(&mut self, other: &Self) {
        if self.name.is_empty() {
            self.name = other.name.clone();
        }
        self.members.join(&other.members);
        for (item_id, incoming) in &other.items {
            match self.items.get_mut(item_id) {
                Some(item) => item.join(incoming),
                None => {
                    let adopted = incoming.clone().with_replica_id(&self.replica_id);
                    self.items.insert(item_id.clone(), adopted);
                }
            }
        }
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
