//! Menu subsystem (§4.8): a tree of `MenuItem`s per client plus one
//! server-owned root, toggled into view as a synthetic `INPUT`-priority
//! screen rendered through the ordinary pipeline.

use lcdd_model::{ClientId, MenuItem, MenuItemId, MenuItemKind, ModelError, Priority, Screen, Widget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEventKind {
    Update,
    Select,
    Enter,
    Leave,
    Plus,
    Minus,
}

impl MenuEventKind {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            MenuEventKind::Update => "update",
            MenuEventKind::Select => "select",
            MenuEventKind::Enter => "enter",
            MenuEventKind::Leave => "leave",
            MenuEventKind::Plus => "plus",
            MenuEventKind::Minus => "minus",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEvent {
    pub kind: MenuEventKind,
    pub owner: ClientId,
    pub id: MenuItemId,
    pub value: String,
}

/// The server-wide menu tree plus the cursor into it that's currently on
/// screen. `stack` is the path of entered submenu ids from the root.
pub struct MenuSystem {
    root: MenuItem,
    open: bool,
    stack: Vec<MenuItemId>,
    selected: Vec<usize>,
}

impl MenuSystem {
    pub fn new() -> Self {
        Self {
            root: MenuItem::new(MenuItemId::new("__root__"), ClientId::SERVER, "Menu", MenuItemKind::Menu),
            open: false,
            stack: Vec::new(),
            selected: vec![0],
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flips the menu's visibility; returns the new state. Closing resets
    /// navigation back to the root level.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        if !self.open {
            self.stack.clear();
            self.selected = vec![0];
        }
        self.open
    }

    pub fn add_item(&mut self, parent: &MenuItemId, item: MenuItem) -> Result<(), ModelError> {
        let target = self.root.find_mut(parent).ok_or(ModelError::UnknownMenu)?;
        target.add_child(item)
    }

    /// `menu_add_item` with no parent targets the root.
    pub fn add_root_item(&mut self, item: MenuItem) -> Result<(), ModelError> {
        self.root.add_child(item)
    }

    pub fn remove_item(&mut self, parent: &MenuItemId, id: &MenuItemId) -> Result<MenuItem, ModelError> {
        let target = self.root.find_mut(parent).ok_or(ModelError::UnknownMenu)?;
        target.remove_child(id).ok_or(ModelError::UnknownMenu)
    }

    /// `menu_del_item` with no parent: removes a top-level item.
    pub fn remove_root_item(&mut self, id: &MenuItemId) -> Result<MenuItem, ModelError> {
        self.root.remove_child(id).ok_or(ModelError::UnknownMenu)
    }

    pub fn find_mut(&mut self, id: &MenuItemId) -> Option<&mut MenuItem> {
        self.root.find_mut(id)
    }

    fn current_level(&self) -> &MenuItem {
        let mut node = &self.root;
        for id in &self.stack {
            if let Some(child) = node.children.get(id) {
                node = child;
            } else {
                break;
            }
        }
        node
    }

    /// Move the on-screen selection up/down within the current level,
    /// wrapping.
    pub fn move_selection(&mut self, delta: i32) {
        let count = self.current_level().children.len();
        if count == 0 {
            return;
        }
        let depth = self.stack.len();
        if self.selected.len() <= depth {
            self.selected.resize(depth + 1, 0);
        }
        let cur = self.selected[depth] as i32;
        let next = (cur + delta).rem_euclid(count as i32) as usize;
        self.selected[depth] = next;
    }

    fn selected_id(&self) -> Option<MenuItemId> {
        let depth = self.stack.len();
        let idx = *self.selected.get(depth)?;
        self.current_level().children.get_index(idx).map(|(id, _)| id.clone())
    }

    /// `Enter`/select on the highlighted row: descends into a submenu, or
    /// emits a `select`/`plus` event for a leaf control.
    pub fn activate(&mut self) -> Option<MenuEvent> {
        let id = self.selected_id()?;
        let owner = self.current_level().children.get(&id)?.owner;
        let is_menu = matches!(self.current_level().children.get(&id)?.kind, MenuItemKind::Menu);
        if is_menu {
            self.stack.push(id.clone());
            self.selected.push(0);
            Some(MenuEvent { kind: MenuEventKind::Enter, owner, id, value: String::new() })
        } else {
            Some(MenuEvent { kind: MenuEventKind::Select, owner, id, value: String::new() })
        }
    }

    /// Back out of the current submenu one level, emitting `leave` for the
    /// submenu item itself.
    pub fn back(&mut self) -> Option<MenuEvent> {
        let id = self.stack.pop()?;
        self.selected.pop();
        let owner = self.root.find_mut(&id)?.owner;
        Some(MenuEvent { kind: MenuEventKind::Leave, owner, id, value: String::new() })
    }

    /// Render the currently-open level as a synthetic screen at
    /// `Priority::Input` (§4.8), reusing the ordinary renderer pipeline.
    pub fn render_screen(&self, width: u16, height: u16) -> Screen {
        let mut screen = Screen::new(width, height);
        screen.priority = Priority::Input;
        let depth = self.stack.len();
        let selected = *self.selected.get(depth).unwrap_or(&0);
        for (row, (id, item)) in self.current_level().children.iter().enumerate() {
            if row as u16 >= height {
                break;
            }
            let marker = if row == selected { '>' } else { ' ' };
            let text = format!("{marker}{}", item.text);
            let _ = screen.add_widget(
                lcdd_model::WidgetId::new(id.0.clone()),
                Widget::Str { x: 1, y: row as u16 + 1, text },
            );
        }
        screen
    }
}

impl Default for MenuSystem {
    fn default() -> Self {
        Self::new()
    }
}
