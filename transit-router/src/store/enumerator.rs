//! Cursor over one ordering of a connection store.

use crate::domain::{Connection, ConnectionId};

use super::connection_store::{ConnectionStore, Permutation, SortOrder};

/// A movable position within one ordering of a [`ConnectionStore`].
///
/// A fresh enumerator sits before the first record; [`move_next`](Self::move_next)
/// advances onto it. It also implements [`Iterator`], yielding the records
/// after the current position.
#[derive(Debug, Clone)]
pub struct Enumerator<'a> {
    store: &'a ConnectionStore,
    order: SortOrder,
    permutation: Option<&'a Permutation>,
    /// `None` means before the first record.
    position: Option<usize>,
}

impl<'a> Enumerator<'a> {
    pub(crate) fn new(
        store: &'a ConnectionStore,
        order: SortOrder,
        permutation: Option<&'a Permutation>,
    ) -> Self {
        Self {
            store,
            order,
            permutation,
            position: None,
        }
    }

    /// The ordering this enumerator walks.
    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Current position within the ordering, if on a record.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    fn id_at(&self, position: usize) -> ConnectionId {
        match self.permutation {
            Some(permutation) => ConnectionId(permutation.order[position]),
            None => ConnectionId(position as u32),
        }
    }

    fn position_of(&self, id: ConnectionId) -> usize {
        match self.permutation {
            Some(permutation) => permutation.rank[id.index()] as usize,
            None => id.index(),
        }
    }

    /// Id of the current record.
    pub fn current_id(&self) -> Option<ConnectionId> {
        self.position.map(|position| self.id_at(position))
    }

    /// The current record.
    pub fn current(&self) -> Option<&'a Connection> {
        let store = self.store;
        self.current_id().and_then(|id| store.get(id))
    }

    /// Advance to the next record. Returns false (leaving the position
    /// unchanged) at the end of the ordering.
    pub fn move_next(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.store.len() {
            self.position = Some(next);
            true
        } else {
            false
        }
    }

    /// Step back to the previous record. Returns false (leaving the position
    /// unchanged) on the first record or before it.
    pub fn move_previous(&mut self) -> bool {
        match self.position {
            Some(p) if p > 0 => {
                self.position = Some(p - 1);
                true
            }
            _ => false,
        }
    }

    /// Jump to the record with the given id. Returns false for unknown ids.
    pub fn move_to(&mut self, id: ConnectionId) -> bool {
        if id.index() >= self.store.len() {
            return false;
        }
        self.position = Some(self.position_of(id));
        true
    }

    /// Jump to the first record departing at or after `time`.
    ///
    /// Binary search; only meaningful in [`SortOrder::Departure`], and returns
    /// false in every other ordering. Also returns false (leaving the
    /// position unchanged) when no record departs that late.
    pub fn move_to_departure_time(&mut self, time: u32) -> bool {
        let Some(permutation) = self.permutation.filter(|_| self.order == SortOrder::Departure)
        else {
            return false;
        };

        let connections = self.store.connections();
        let first = permutation
            .order
            .partition_point(|&id| connections[id as usize].departure_time() < time);

        if first < permutation.order.len() {
            self.position = Some(first);
            true
        } else {
            false
        }
    }

    /// Jump to the connection preceding the current one on the same trip.
    ///
    /// Returns false (leaving the position unchanged) if the current record
    /// is the first leg of its trip, is a pseudo-connection, or the store's
    /// departure ordering has not been built.
    pub fn move_to_previous_connection(&mut self) -> bool {
        let previous = self
            .current_id()
            .and_then(|id| self.store.previous_on_trip(id));

        match previous {
            Some(id) => self.move_to(id),
            None => false,
        }
    }
}

impl<'a> Iterator for Enumerator<'a> {
    type Item = (ConnectionId, &'a Connection);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.move_next() {
            return None;
        }
        let id = self.current_id()?;
        let store = self.store;
        store.get(id).map(|connection| (id, connection))
    }
}
