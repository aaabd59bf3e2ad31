use crate::ids::{ClientId, ScreenId};
use crate::screen::Screen;
use crate::ModelError;
use indexmap::IndexMap;
use lcdd_wire::LineWriter;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    New,
    Active,
    Gone,
}

/// One connected protocol peer (§3). Owns its screens exclusively: dropping
/// a `Client` drops every `Screen` it holds, which in turn drops their
/// widgets — plain Rust ownership does the cascade for us.
pub struct Client {
    pub id: ClientId,
    pub state: ClientState,
    pub name: Option<String>,
    pub screens: IndexMap<ScreenId, Screen>,
    pub reserved_keys: HashSet<String>,
    pub out: LineWriter,
    pub menu_root: Option<crate::menu::MenuItem>,
}

impl Client {
    pub fn new(id: ClientId, out_capacity: usize) -> Self {
        Self {
            id,
            state: ClientState::New,
            name: None,
            screens: IndexMap::new(),
            reserved_keys: HashSet::new(),
            out: LineWriter::new(out_capacity),
            menu_root: None,
        }
    }

    pub fn add_screen(&mut self, id: ScreenId, screen: Screen) -> Result<(), ModelError> {
        if self.screens.contains_key(&id) {
            return Err(ModelError::DuplicateId);
        }
        self.screens.insert(id, screen);
        Ok(())
    }

    pub fn remove_screen(&mut self, id: &ScreenId) -> Option<Screen> {
        self.screens.shift_remove(id)
    }

    pub fn screen(&self, id: &ScreenId) -> Option<&Screen> {
        self.screens.get(id)
    }

    pub fn screen_mut(&mut self, id: &ScreenId) -> Option<&mut Screen> {
        self.screens.get_mut(id)
    }
}
