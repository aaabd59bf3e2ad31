use crate::ids::{ClientId, MenuItemId};
use indexmap::IndexMap;

/// Per-variant configuration for a `MenuItem` (§3/§4.8).
#[derive(Debug, Clone)]
pub enum MenuItemKind {
    Action,
    Checkbox { checked: bool },
    Ring { choices: Vec<String>, index: usize },
    Slider { min: i32, max: i32, step: i32, value: i32 },
    Numeric { min: i32, max: i32, value: i32 },
    Alpha { value: String },
    Ip { value: String },
    /// A submenu; `children` holds the subtree.
    Menu,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub owner: ClientId,
    pub text: String,
    pub kind: MenuItemKind,
    pub children: IndexMap<MenuItemId, MenuItem>,
    pub next_override: Option<String>,
    pub prev_override: Option<String>,
}

impl MenuItem {
    pub fn new(id: MenuItemId, owner: ClientId, text: impl Into<String>, kind: MenuItemKind) -> Self {
        Self {
            id,
            owner,
            text: text.into(),
            kind,
            children: IndexMap::new(),
            next_override: None,
            prev_override: None,
        }
    }

    pub fn add_child(&mut self, child: MenuItem) -> Result<(), crate::ModelError> {
        if self.children.contains_key(&child.id) {
            return Err(crate::ModelError::DuplicateId);
        }
        self.children.insert(child.id.clone(), child);
        Ok(())
    }

    pub fn remove_child(&mut self, id: &MenuItemId) -> Option<MenuItem> {
        self.children.shift_remove(id)
    }

    pub fn find_mut(&mut self, id: &MenuItemId) -> Option<&mut MenuItem> {
        if &self.id == id {
            return Some(self);
        }
        for child in self.children.values_mut() {
            if let Some(found) = child.find_mut(id) {
                return Some(found);
            }
        }
        None
    }
}
