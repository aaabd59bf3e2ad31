use crate::outcome::DispatchOutcome;
use crate::server::Server;
use lcdd_model::{ClientId, Owner, ScreenId};

/// `key_add <sid> <keyname> [<keyname>...]` (§4.5): shared, per-screen
/// reservation that lives and dies with the screen.
pub fn key_add(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let [sid, keys @ ..] = args else {
        return DispatchOutcome::huh("bad arguments");
    };
    if keys.is_empty() {
        return DispatchOutcome::huh("bad arguments");
    }
    let sid = ScreenId::new(sid.clone());
    {
        let Some(screen) = server.clients.get_mut(&client).and_then(|c| c.screen_mut(&sid)) else {
            return DispatchOutcome::huh("unknown screen id");
        };
        for key in keys {
            if !screen.keys.iter().any(|k| k == key) {
                screen.keys.push(key.clone());
            }
        }
    }
    for key in keys {
        server.keys.reserve_for_screen(key, client);
    }
    DispatchOutcome::Ok
}

/// `key_del <sid> <keyname> [<keyname>...]` (§4.5).
pub fn key_del(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let [sid, keys @ ..] = args else {
        return DispatchOutcome::huh("bad arguments");
    };
    if keys.is_empty() {
        return DispatchOutcome::huh("bad arguments");
    }
    let sid = ScreenId::new(sid.clone());
    {
        let Some(screen) = server.clients.get_mut(&client).and_then(|c| c.screen_mut(&sid)) else {
            return DispatchOutcome::huh("unknown screen id");
        };
        screen.keys.retain(|k| !keys.contains(k));
    }
    for key in keys {
        server.keys.release_for_screen(key, client);
    }
    DispatchOutcome::Ok
}

/// `client_add_key <keyname> [-exclusive|-shared]` (§4.7). Default is shared.
pub fn client_add_key(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let Some(key) = args.first() else {
        return DispatchOutcome::huh("bad arguments");
    };
    let exclusive = args.get(1).map(|f| f == "-exclusive").unwrap_or(false);
    match server.keys.reserve(key, exclusive, Owner::Client(client)) {
        Ok(()) => {
            if let Some(c) = server.clients.get_mut(&client) {
                c.reserved_keys.insert(key.clone());
            }
            DispatchOutcome::Ok
        }
        Err(e) => DispatchOutcome::huh(e.to_string()),
    }
}

/// `client_del_key <keyname>` (§4.7).
pub fn client_del_key(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let Some(key) = args.first() else {
        return DispatchOutcome::huh("bad arguments");
    };
    match server.keys.release(key, Owner::Client(client)) {
        Ok(()) => {
            if let Some(c) = server.clients.get_mut(&client) {
                c.reserved_keys.remove(key);
            }
            DispatchOutcome::Ok
        }
        Err(e) => DispatchOutcome::huh(e.to_string()),
    }
}
