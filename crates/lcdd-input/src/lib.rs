//! Key reservation table and routing (§4.7).

use indexmap::IndexMap;
use lcdd_model::{ClientId, KeyReservation, Owner};

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("key already reserved")]
    AlreadyReserved,
    #[error("key not reserved")]
    NotReserved,
}

/// Who a routed key event should go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult {
    Exclusive(ClientId),
    Shared(Vec<ClientId>),
    Server,
    Dropped,
}

/// Maps key name -> its reservations, preserving insertion order per key so
/// `Shared` delivery order is deterministic in tests.
#[derive(Default)]
pub struct KeyTable {
    table: IndexMap<String, Vec<KeyReservation>>,
}

impl KeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the server's own navigation-key reservations at startup
    /// (§4.7: "installed at startup as shared with owner = server").
    pub fn install_server_defaults(&mut self, keys: &[&str]) {
        for key in keys {
            self.table
                .entry(key.to_string())
                .or_default()
                .push(KeyReservation::new(*key, false, Owner::Server));
        }
    }

    pub fn reserve(&mut self, key: &str, exclusive: bool, owner: Owner) -> Result<(), InputError> {
        let entry = self.table.entry(key.to_string()).or_default();
        if exclusive {
            if !entry.is_empty() {
                return Err(InputError::AlreadyReserved);
            }
        } else if entry.iter().any(|r| r.exclusive) {
            return Err(InputError::AlreadyReserved);
        }
        entry.push(KeyReservation::new(key, exclusive, owner));
        Ok(())
    }

    pub fn release(&mut self, key: &str, owner: Owner) -> Result<(), InputError> {
        let Some(entry) = self.table.get_mut(key) else {
            return Err(InputError::NotReserved);
        };
        let before = entry.len();
        entry.retain(|r| r.owner != owner);
        let released = entry.len() != before;
        if entry.is_empty() {
            self.table.shift_remove(key);
        }
        if released {
            Ok(())
        } else {
            Err(InputError::NotReserved)
        }
    }

    /// Releases every reservation held by `owner`, across all keys — used on
    /// client disconnect (§4.4) and when a `key_add`-populated screen is
    /// destroyed.
    pub fn release_all_for_owner(&mut self, owner: Owner) {
        self.table.retain(|_, reservations| {
            reservations.retain(|r| r.owner != owner);
            !reservations.is_empty()
        });
    }

    /// §4.5's per-screen `key_add` hint: auto-reserve as shared so the owning
    /// client receives the key while the screen exists. Idempotent: adding
    /// the same key twice for the same owner is a no-op, not an error.
    pub fn reserve_for_screen(&mut self, key: &str, owner: ClientId) {
        let entry = self.table.entry(key.to_string()).or_default();
        if !entry.iter().any(|r| r.owner == Owner::Client(owner)) {
            entry.push(KeyReservation::new(key, false, Owner::Client(owner)));
        }
    }

    pub fn release_for_screen(&mut self, key: &str, owner: ClientId) {
        let _ = self.release(key, Owner::Client(owner));
    }

    /// §4.7 routing steps 2-5 (step 1, menu interception, is the caller's
    /// job — it has to know whether the menu is open).
    pub fn route(&self, key: &str) -> RouteResult {
        let Some(reservations) = self.table.get(key) else {
            return RouteResult::Dropped;
        };
        if let Some(excl) = reservations.iter().find(|r| r.exclusive) {
            return match excl.owner {
                Owner::Client(c) => RouteResult::Exclusive(c),
                Owner::Server => RouteResult::Server,
            };
        }
        let clients: Vec<ClientId> = reservations
            .iter()
            .filter_map(|r| match r.owner {
                Owner::Client(c) => Some(c),
                Owner::Server => None,
            })
            .collect();
        if !clients.is_empty() {
            return RouteResult::Shared(clients);
        }
        if reservations.iter().any(|r| r.owner == Owner::Server) {
            return RouteResult::Server;
        }
        RouteResult::Dropped
    }
}
