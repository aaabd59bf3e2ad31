//! Client/Screen/Widget/KeyReservation/MenuItem object model (§3).
//!
//! Ownership is expressed structurally: a `Client` owns its `Screen`s in an
//! `IndexMap`, a `Screen` owns its widgets in a `slotmap` arena, and a
//! `FRAME` widget owns its inner `Screen` inline. Nothing here reaches back
//! up the tree, which keeps the frame/inner-screen shape acyclic.

mod client;
mod error;
mod ids;
mod key;
mod menu;
mod priority;
mod screen;
mod widget;

pub use client::{Client, ClientState};
pub use error::ModelError;
pub use ids::{ClientId, ClientIdGen, MenuItemId, ScreenId, WidgetId, WidgetSlot};
pub use key::{KeyReservation, Owner};
pub use menu::{MenuItem, MenuItemKind};
pub use priority::Priority;
pub use screen::{BacklightPolicy, HeartbeatPolicy, Screen, DEFAULT_DURATION_FRAMES};
pub use widget::{NumDigit, ScrollDirection, Widget};
