use crate::ids::ClientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Client(ClientId),
    Server,
}

/// A declared claim on a named key (§3/§4.7). The reservation table itself
/// (`KeyTable`, exclusive/shared rules, routing) lives in `lcdd-input`; this
/// type is just the data record it stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReservation {
    pub key: String,
    pub exclusive: bool,
    pub owner: Owner,
}

impl KeyReservation {
    pub fn new(key: impl Into<String>, exclusive: bool, owner: Owner) -> Self {
        Self {
            key: key.into(),
            exclusive,
            owner,
        }
    }
}
