use indexmap::IndexMap;
use lcdd_driver::Driver;
use lcdd_input::{KeyTable, RouteResult};
use lcdd_menu::MenuSystem;
use lcdd_model::{Client, ClientId, ClientIdGen, Owner, ScreenId};
use lcdd_sched::{ScreenDirectory, ScreenList};
use lcdd_wire::quote;

pub const SERVER_VERSION: &str = "1.2.3";
pub const PROTOCOL_MAJOR: u8 = 0;
pub const PROTOCOL_MINOR: u8 = 3;

/// Navigation keys the server reserves for itself at startup (§4.7).
pub const SERVER_NAV_KEYS: &[&str] = &["Up", "Down", "Enter", "Escape"];

/// Outbound buffer capacity per client; 0 would mean unbounded.
pub const CLIENT_OUT_CAPACITY: usize = 64 * 1024;

/// All process-wide state (§3's "Process-wide state", §9's "single `Server`
/// value" strategy): one value constructed at startup, threaded through
/// every command handler and the scheduler/renderer. No hidden globals.
pub struct Server {
    pub clients: IndexMap<ClientId, Client>,
    pub id_gen: ClientIdGen,
    pub screen_list: ScreenList,
    pub keys: KeyTable,
    pub menu: MenuSystem,
    pub driver: Box<dyn Driver>,
    pub frame_counter: u32,
    pub autorotate: bool,
    pub global_backlight_on: bool,
    pub global_heartbeat_on: bool,
    pub menu_key: String,
}

impl Server {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        let menu_key = "Menu".to_string();
        let mut keys = KeyTable::new();
        keys.install_server_defaults(SERVER_NAV_KEYS);
        keys.install_server_defaults(&[menu_key.as_str()]);
        Self {
            clients: IndexMap::new(),
            id_gen: ClientIdGen::new(),
            screen_list: ScreenList::new(),
            keys,
            menu: MenuSystem::new(),
            driver,
            frame_counter: 0,
            autorotate: true,
            global_backlight_on: true,
            global_heartbeat_on: true,
            menu_key,
        }
    }

    pub fn connect_banner(&self) -> String {
        format!(
            "connect LCDproc {SERVER_VERSION} protocol {PROTOCOL_MAJOR}.{PROTOCOL_MINOR} lcd wid {} hgt {} cellwid {} cellhgt {}",
            self.driver.width(),
            self.driver.height(),
            self.driver.cellwid(),
            self.driver.cellhgt(),
        )
    }

    pub fn add_client(&mut self, out_capacity: usize) -> ClientId {
        let id = self.id_gen.next();
        self.clients.insert(id, Client::new(id, out_capacity));
        id
    }

    pub fn enqueue(&mut self, client: ClientId, line: &str) {
        if let Some(c) = self.clients.get_mut(&client) {
            c.out.enqueue(line);
        }
    }

    /// Run one scheduler tick (§4.3). `Server` is itself the
    /// [`ScreenDirectory`] the list consults, so `screen_list` is taken out
    /// for the duration of the call — the usual way to hand `self` to a
    /// trait object that one of `self`'s own fields needs to borrow.
    pub fn tick_scheduler(&mut self) {
        let mut screen_list = std::mem::take(&mut self.screen_list);
        screen_list.tick(self.frame_counter, self.autorotate, self);
        self.screen_list = screen_list;
    }

    /// Full teardown for a client leaving the system (§4.4): screens (which
    /// free their own widgets via Rust drop), key reservations, menu items,
    /// then the client record itself.
    pub fn drop_client(&mut self, client: ClientId) {
        self.keys.release_all_for_owner(Owner::Client(client));
        if let Some(c) = self.clients.get(&client) {
            let screen_ids: Vec<ScreenId> = c.screens.keys().cloned().collect();
            for sid in screen_ids {
                self.screen_list.remove(client, &sid);
            }
        }
        self.clients.shift_remove(&client);
        tracing::info!(target: "proto", client = client.raw(), "client disconnected, state torn down");
    }

    /// Routes one key press through §4.7's five steps: menu interception,
    /// exclusive reservation, shared reservations, server dispatch, drop.
    pub fn route_key(&mut self, key: &str) {
        if self.menu.is_open() && self.dispatch_menu_key(key) {
            return;
        }
        match self.keys.route(key) {
            RouteResult::Exclusive(client) => self.enqueue(client, &format!("key {key}")),
            RouteResult::Shared(clients) => {
                for client in clients {
                    self.enqueue(client, &format!("key {key}"));
                }
            }
            RouteResult::Server => self.dispatch_server_key(key),
            RouteResult::Dropped => {}
        }
    }

    /// Handles `key` as menu navigation while the menu is open. Returns
    /// `true` if it was consumed this way; navigation keys never fall
    /// through to the ordinary reservation routing.
    fn dispatch_menu_key(&mut self, key: &str) -> bool {
        let event = match key {
            "Up" => {
                self.menu.move_selection(-1);
                None
            }
            "Down" => {
                self.menu.move_selection(1);
                None
            }
            "Enter" => self.menu.activate(),
            "Escape" => self.menu.back(),
            k if k == self.menu_key => {
                self.menu.toggle();
                None
            }
            _ => return false,
        };
        if let Some(ev) = event {
            let line = format!("menuevent {} {} {}", ev.kind.as_wire_str(), ev.id, ev.value);
            self.enqueue(ev.owner, &line);
        }
        true
    }

    /// §4.7 step 4: a key routed to the server itself (no client
    /// reservation). Only the menu toggle key does anything today.
    fn dispatch_server_key(&mut self, key: &str) {
        if key == self.menu_key {
            self.menu.toggle();
        }
    }
}

impl ScreenDirectory for Server {
    fn duration(&self, client: ClientId, screen: &ScreenId) -> Option<u32> {
        self.clients.get(&client)?.screen(screen).map(|s| s.duration)
    }

    fn tick_timeout(&mut self, client: ClientId, screen: &ScreenId) -> Option<bool> {
        let s = self.clients.get_mut(&client)?.screen_mut(screen)?;
        match s.timeout {
            None => None,
            Some(0) => Some(true),
            Some(n) => {
                s.timeout = Some(n - 1);
                Some(n - 1 == 0)
            }
        }
    }

    fn destroy(&mut self, client: ClientId, screen: &ScreenId) {
        if let Some(c) = self.clients.get_mut(&client) {
            if let Some(s) = c.remove_screen(screen) {
                for key in &s.keys {
                    self.keys.release_for_screen(key, client);
                }
            }
        }
    }

    fn notify_listen(&mut self, client: ClientId, screen: &ScreenId) {
        let line = format!("listen {}", quote(&screen.0));
        self.enqueue(client, &line);
    }

    fn notify_ignore(&mut self, client: ClientId, screen: &ScreenId) {
        let line = format!("ignore {}", quote(&screen.0));
        self.enqueue(client, &line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcdd_driver::NullDriver;
    use lcdd_menu::MenuEventKind;
    use lcdd_model::{MenuItem, MenuItemId, MenuItemKind};
    use pretty_assertions::assert_eq;

    fn lines(server: &mut Server, client: ClientId) -> Vec<String> {
        let Some(c) = server.clients.get_mut(&client) else { return Vec::new() };
        let mut bytes = Vec::new();
        let _ = c.out.drain_into(|chunk| {
            bytes.extend_from_slice(chunk);
            Ok(chunk.len())
        });
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn exclusive_reservation_gets_the_key_line() {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let a = server.add_client(0);
        let b = server.add_client(0);
        server.keys.reserve("G1", true, Owner::Client(a)).unwrap();
        server.route_key("G1");
        assert_eq!(lines(&mut server, a), vec!["key G1"]);
        assert!(lines(&mut server, b).is_empty());
    }

    #[test]
    fn shared_reservations_all_get_the_key_line() {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let a = server.add_client(0);
        let b = server.add_client(0);
        server.keys.reserve("Vol", false, Owner::Client(a)).unwrap();
        server.keys.reserve("Vol", false, Owner::Client(b)).unwrap();
        server.route_key("Vol");
        assert_eq!(lines(&mut server, a), vec!["key Vol"]);
        assert_eq!(lines(&mut server, b), vec!["key Vol"]);
    }

    #[test]
    fn unreserved_key_is_dropped_silently() {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let a = server.add_client(0);
        server.route_key("Whatever");
        assert!(lines(&mut server, a).is_empty());
    }

    #[test]
    fn menu_key_toggles_the_menu_open_and_closed() {
        let mut server = Server::new(Box::new(NullDriver::new()));
        assert!(!server.menu.is_open());
        server.route_key("Menu");
        assert!(server.menu.is_open());
        server.route_key("Menu");
        assert!(!server.menu.is_open());
    }

    #[test]
    fn menu_navigation_keys_are_intercepted_while_open_and_notify_the_owner() {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let owner = server.add_client(0);
        server
            .menu
            .add_root_item(MenuItem::new(MenuItemId::new("a"), owner, "A", MenuItemKind::Action))
            .unwrap();
        server.route_key("Menu");
        assert!(server.menu.is_open());

        server.route_key("Enter");
        let out = lines(&mut server, owner);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with(&format!("menuevent {}", MenuEventKind::Select.as_wire_str())));
    }

    #[test]
    fn menu_navigation_does_not_fall_through_to_ordinary_key_routing() {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let listener = server.add_client(0);
        server.keys.reserve("Enter", false, Owner::Client(listener)).unwrap();
        server.route_key("Menu");
        server.route_key("Enter");
        assert!(lines(&mut server, listener).is_empty());
    }
}
