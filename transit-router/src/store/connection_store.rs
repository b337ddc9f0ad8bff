//! Append-only connection storage with permutation orderings.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::domain::{Connection, ConnectionId, InvalidConnection, RouteId, StopId, TripId};

use super::enumerator::Enumerator;

/// A total ordering of the store's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Insertion order (connection id ascending). Always available.
    Insertion,
    /// Departure time ascending, then arrival time, then id. Zero-duration
    /// hops of one trip at the same instant are kept in travel order.
    Departure,
    /// Arrival time ascending, then departure time, then id.
    Arrival,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Insertion => f.write_str("insertion"),
            SortOrder::Departure => f.write_str("departure"),
            SortOrder::Arrival => f.write_str("arrival"),
        }
    }
}

/// Errors from the connection store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record failed validation
    #[error(transparent)]
    InvalidConnection(#[from] InvalidConnection),

    /// An ordering was requested before `sort` built it
    #[error("connections are not sorted by {0} order")]
    NotSorted(SortOrder),

    /// No record with this id
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// Reading or writing a persisted store failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted store ended before its header said it would
    #[error("truncated store: expected {expected} connections, found {found}")]
    Truncated { expected: u32, found: u32 },
}

/// An index permutation over the records, with its inverse.
#[derive(Debug, Clone)]
pub(crate) struct Permutation {
    /// `order[position]` is a connection id.
    pub(crate) order: Vec<u32>,
    /// `rank[id]` is the position of that id in `order`.
    pub(crate) rank: Vec<u32>,
}

impl Permutation {
    fn build(
        connections: &[Connection],
        mut order: Vec<u32>,
        key: impl Fn(&Connection) -> (u32, u32),
    ) -> Self {
        // Stable sort over ascending ids keeps id as the final tie-break.
        order.sort_by_key(|&id| key(&connections[id as usize]));
        Self::from_order(order)
    }

    fn from_order(order: Vec<u32>) -> Self {
        let mut rank = vec![0u32; order.len()];
        for (position, &id) in order.iter().enumerate() {
            rank[id as usize] = position as u32;
        }

        Self { order, rank }
    }
}

/// Put the zero-duration hops of each trip that share one instant in travel
/// order, wherever their ids would otherwise place them.
fn chain_instant_hops(connections: &[Connection], order: &mut [u32]) {
    let times = |id: u32| {
        let connection = &connections[id as usize];
        (connection.departure_time(), connection.arrival_time())
    };

    let mut start = 0;
    while start < order.len() {
        let (instant, first_arrival) = times(order[start]);
        let mut end = start + 1;
        while end < order.len() && times(order[end]) == (instant, instant) {
            end += 1;
        }
        if end - start > 1 && first_arrival == instant {
            chain_group(connections, &mut order[start..end]);
        }
        start = end;
    }
}

fn chain_group(connections: &[Connection], group: &mut [u32]) {
    let feeds = |a: u32, b: u32| {
        let (a, b) = (&connections[a as usize], &connections[b as usize]);
        !a.is_pseudo() && a.trip() == b.trip() && a.arrival_stop() == b.departure_stop()
    };

    // A cycle of hops has no travel order; the bound ends the search for one.
    for _ in 0..group.len() * group.len() {
        let misplaced = (0..group.len()).find_map(|i| {
            (i + 1..group.len())
                .find(|&j| feeds(group[j], group[i]))
                .map(|j| (i, j))
        });
        match misplaced {
            Some((i, j)) => group[i..=j].rotate_right(1),
            None => return,
        }
    }
}

/// Owns all connection records in insertion order.
///
/// Orderings are built by [`sort`](Self::sort) and stay fixed until the next
/// `sort`. Adding a record discards every built ordering, so a scan can never
/// observe an ordering that is missing records. Scans only ever borrow the
/// store immutably, so any number of them may share one store.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStore {
    connections: Vec<Connection>,
    by_departure: Option<Permutation>,
    by_arrival: Option<Permutation>,
    /// Previous connection on the same trip in departure order, by id.
    /// Built together with the departure ordering.
    previous_on_trip: Option<Vec<Option<ConnectionId>>>,
    stop_count: usize,
}

impl ConnectionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            connections: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Append a connection without a route.
    pub fn add(
        &mut self,
        departure_stop: StopId,
        arrival_stop: StopId,
        trip: TripId,
        departure_time: u32,
        arrival_time: u32,
    ) -> Result<ConnectionId, InvalidConnection> {
        let connection = Connection::new(
            departure_stop,
            arrival_stop,
            trip,
            None,
            departure_time,
            arrival_time,
        )?;
        Ok(self.push(connection))
    }

    /// Append a connection belonging to `route`.
    pub fn add_on_route(
        &mut self,
        departure_stop: StopId,
        arrival_stop: StopId,
        trip: TripId,
        route: RouteId,
        departure_time: u32,
        arrival_time: u32,
    ) -> Result<ConnectionId, InvalidConnection> {
        let connection = Connection::new(
            departure_stop,
            arrival_stop,
            trip,
            Some(route),
            departure_time,
            arrival_time,
        )?;
        Ok(self.push(connection))
    }

    /// Append a pseudo-connection (a free walking transfer).
    pub fn add_pseudo(
        &mut self,
        departure_stop: StopId,
        arrival_stop: StopId,
        departure_time: u32,
        arrival_time: u32,
    ) -> Result<ConnectionId, InvalidConnection> {
        let connection =
            Connection::pseudo(departure_stop, arrival_stop, departure_time, arrival_time)?;
        Ok(self.push(connection))
    }

    /// Append an already validated connection.
    pub fn push(&mut self, connection: Connection) -> ConnectionId {
        let id = ConnectionId(self.connections.len() as u32);

        let highest_stop = connection
            .departure_stop()
            .index()
            .max(connection.arrival_stop().index());
        self.stop_count = self.stop_count.max(highest_stop + 1);

        self.connections.push(connection);
        self.by_departure = None;
        self.by_arrival = None;
        self.previous_on_trip = None;

        id
    }

    /// Build (or rebuild) an ordering. Idempotent.
    pub fn sort(&mut self, order: SortOrder) {
        let ids: Vec<u32> = (0..self.connections.len() as u32).collect();

        match order {
            SortOrder::Insertion => {}
            SortOrder::Departure => {
                let mut order = Permutation::build(&self.connections, ids, |c| {
                    (c.departure_time(), c.arrival_time())
                })
                .order;
                chain_instant_hops(&self.connections, &mut order);
                let permutation = Permutation::from_order(order);
                self.previous_on_trip = Some(self.link_trips(&permutation.order));
                self.by_departure = Some(permutation);
            }
            SortOrder::Arrival => {
                self.by_arrival = Some(Permutation::build(&self.connections, ids, |c| {
                    (c.arrival_time(), c.departure_time())
                }));
            }
        }

        debug!(%order, connections = self.connections.len(), "sorted connections");
    }

    /// For every connection, find the one preceding it on the same trip.
    fn link_trips(&self, departure_order: &[u32]) -> Vec<Option<ConnectionId>> {
        let mut previous = vec![None; self.connections.len()];
        let mut last_seen: HashMap<TripId, ConnectionId> = HashMap::new();

        for &id in departure_order {
            let connection = &self.connections[id as usize];
            if connection.is_pseudo() {
                continue;
            }
            let id = ConnectionId(id);
            previous[id.index()] = last_seen.insert(connection.trip(), id);
        }

        previous
    }

    /// Returns true if the given ordering is available.
    pub fn is_sorted(&self, order: SortOrder) -> bool {
        match order {
            SortOrder::Insertion => true,
            SortOrder::Departure => self.by_departure.is_some(),
            SortOrder::Arrival => self.by_arrival.is_some(),
        }
    }

    /// Positions of the given ordering, or `None` for insertion order.
    pub(crate) fn permutation(&self, order: SortOrder) -> Result<Option<&Permutation>, StoreError> {
        match order {
            SortOrder::Insertion => Ok(None),
            SortOrder::Departure => self
                .by_departure
                .as_ref()
                .map(Some)
                .ok_or(StoreError::NotSorted(order)),
            SortOrder::Arrival => self
                .by_arrival
                .as_ref()
                .map(Some)
                .ok_or(StoreError::NotSorted(order)),
        }
    }

    /// Create an enumerator over the given ordering, positioned before the first record.
    pub fn enumerator(&self, order: SortOrder) -> Result<Enumerator<'_>, StoreError> {
        Ok(Enumerator::new(self, order, self.permutation(order)?))
    }

    /// Returns the connection preceding `id` on the same trip, in departure order.
    ///
    /// Returns `None` for the first leg of a trip, for pseudo-connections, and
    /// when the departure ordering has not been built.
    pub fn previous_on_trip(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.previous_on_trip
            .as_ref()
            .and_then(|previous| previous.get(id.index()).copied().flatten())
    }

    /// Get a connection by id.
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.index())
    }

    /// Get a connection by id, failing for unknown ids.
    pub fn connection(&self, id: ConnectionId) -> Result<&Connection, StoreError> {
        self.get(id).ok_or(StoreError::UnknownConnection(id))
    }

    /// All records in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// One more than the highest stop id referenced by any record.
    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    /// Highest departure time of any record, or 0 when empty.
    pub fn max_departure_time(&self) -> u32 {
        self.connections
            .iter()
            .map(Connection::departure_time)
            .max()
            .unwrap_or(0)
    }
}
