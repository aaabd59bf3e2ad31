use std::sync::atomic::{AtomicU64, Ordering};

/// A connected socket's identity. Generated by the server loop, never by a
/// client, so it can't collide with anything a peer sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    /// Reserved id for server-owned constructs (the menu root, navigation
    /// key reservations) that need a `ClientId` but aren't a socket peer.
    /// Real clients are minted starting at 1 by [`ClientIdGen`].
    pub const SERVER: ClientId = ClientId(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Hands out unique `ClientId`s for the lifetime of the process. Kept
/// outside `Server` so tests can mint ids without constructing a server.
#[derive(Debug, Default)]
pub struct ClientIdGen(AtomicU64);

impl ClientIdGen {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> ClientId {
        ClientId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// A screen id as chosen by the owning client (`screen_add <sid>`), unique
/// only within that client's screen set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(pub String);

impl ScreenId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for ScreenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A widget id as chosen by the client, unique only within the `Screen` (or
/// frame inner-screen) it was added to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub String);

impl WidgetId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A menu item id, unique only within its parent menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MenuItemId(pub String);

impl MenuItemId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for MenuItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

slotmap::new_key_type! {
    /// Arena slot for a widget inside one `Screen`. Never exposed to clients
    /// — the client-facing name is `WidgetId`; this is the cycle-free handle
    /// the arena uses internally (see the module doc on `screen`).
    pub struct WidgetSlot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_gen_yields_unique_increasing_ids() {
        let gen = ClientIdGen::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }
}
