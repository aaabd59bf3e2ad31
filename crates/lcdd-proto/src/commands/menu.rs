use crate::outcome::DispatchOutcome;
use crate::server::Server;
use lcdd_model::{ClientId, MenuItem, MenuItemId, MenuItemKind};

fn parse_kind(kind: &str, rest: &[String]) -> Option<MenuItemKind> {
    Some(match kind {
        "action" => MenuItemKind::Action,
        "checkbox" => MenuItemKind::Checkbox { checked: false },
        "ring" => {
            let choices = rest.first().map(|c| c.split('\t').map(String::from).collect()).unwrap_or_default();
            MenuItemKind::Ring { choices, index: 0 }
        }
        "slider" => {
            let min = rest.first().and_then(|v| v.parse().ok()).unwrap_or(0);
            let max = rest.get(1).and_then(|v| v.parse().ok()).unwrap_or(100);
            let step = rest.get(2).and_then(|v| v.parse().ok()).unwrap_or(1);
            MenuItemKind::Slider { min, max, step, value: min }
        }
        "numeric" => {
            let min = rest.first().and_then(|v| v.parse().ok()).unwrap_or(0);
            let max = rest.get(1).and_then(|v| v.parse().ok()).unwrap_or(100);
            MenuItemKind::Numeric { min, max, value: min }
        }
        "alpha" => MenuItemKind::Alpha { value: rest.first().cloned().unwrap_or_default() },
        "ip" => MenuItemKind::Ip { value: rest.first().cloned().unwrap_or_default() },
        "menu" => MenuItemKind::Menu,
        _ => return None,
    })
}

/// `menu_add_item {parent} <id> <type> {text} [type-specific args...]`
/// (§4.8). An empty `{parent}` targets the root.
pub fn menu_add_item(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let [parent, id, kind, text, rest @ ..] = args else {
        return DispatchOutcome::huh("bad arguments");
    };
    let Some(kind) = parse_kind(kind, rest) else {
        return DispatchOutcome::huh("unknown menu item type");
    };
    let item = MenuItem::new(MenuItemId::new(id.clone()), client, text.clone(), kind);
    let result = if parent.is_empty() {
        server.menu.add_root_item(item)
    } else {
        server.menu.add_item(&MenuItemId::new(parent.clone()), item)
    };
    match result {
        Ok(()) => DispatchOutcome::Ok,
        Err(e) => DispatchOutcome::huh(e.to_string()),
    }
}

/// `menu_del_item {parent} <id>` (§4.8).
pub fn menu_del_item(server: &mut Server, _client: ClientId, args: &[String]) -> DispatchOutcome {
    let [parent, id] = args else {
        return DispatchOutcome::huh("bad arguments");
    };
    let id = MenuItemId::new(id.clone());
    let result = if parent.is_empty() {
        server.menu.remove_root_item(&id)
    } else {
        server.menu.remove_item(&MenuItemId::new(parent.clone()), &id)
    };
    match result {
        Ok(_) => DispatchOutcome::Ok,
        Err(e) => DispatchOutcome::huh(e.to_string()),
    }
}

/// `menu_set_item {parent} <id> -value <v>` (§4.8): updates a leaf control's
/// current value in place.
pub fn menu_set_item(server: &mut Server, _client: ClientId, args: &[String]) -> DispatchOutcome {
    let [_parent, id, rest @ ..] = args else {
        return DispatchOutcome::huh("bad arguments");
    };
    let Some(pos) = rest.iter().position(|a| a == "-value") else {
        return DispatchOutcome::huh("bad arguments");
    };
    let Some(value) = rest.get(pos + 1) else {
        return DispatchOutcome::huh("bad arguments");
    };
    let Some(item) = server.menu.find_mut(&MenuItemId::new(id.clone())) else {
        return DispatchOutcome::huh("unknown menu id");
    };
    match &mut item.kind {
        MenuItemKind::Checkbox { checked } => *checked = value == "1" || value == "on",
        MenuItemKind::Ring { index, choices } => {
            let Ok(n) = value.parse::<usize>() else {
                return DispatchOutcome::huh("bad arguments");
            };
            if n >= choices.len() {
                return DispatchOutcome::huh("out of range");
            }
            *index = n;
        }
        MenuItemKind::Slider { value: v, min, max, .. } | MenuItemKind::Numeric { value: v, min, max } => {
            let Ok(n) = value.parse::<i32>() else {
                return DispatchOutcome::huh("bad arguments");
            };
            if n < *min || n > *max {
                return DispatchOutcome::huh("out of range");
            }
            *v = n;
        }
        MenuItemKind::Alpha { value: v } | MenuItemKind::Ip { value: v } => *v = value.clone(),
        MenuItemKind::Action | MenuItemKind::Menu => return DispatchOutcome::huh("bad arguments"),
    }
    DispatchOutcome::Ok
}
