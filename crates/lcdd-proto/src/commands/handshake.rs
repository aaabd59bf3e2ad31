use crate::outcome::DispatchOutcome;
use crate::server::{Server, SERVER_VERSION};
use lcdd_model::{ClientId, ClientState};

/// `hello` — the only command a `NEW` client may send (§4.2). Always
/// answers with the connect banner, even if sent again later; LCDproc
/// clients commonly resend it defensively.
pub fn hello(server: &mut Server, client: ClientId, _args: &[String]) -> DispatchOutcome {
    if let Some(c) = server.clients.get_mut(&client) {
        c.state = ClientState::Active;
    }
    DispatchOutcome::Reply(server.connect_banner())
}

/// `client_set -name <name>` (§4.2): cosmetic only, used in logs/`info`.
pub fn client_set(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-name" => {
                let Some(name) = args.get(i + 1) else {
                    return DispatchOutcome::huh("bad arguments");
                };
                if let Some(c) = server.clients.get_mut(&client) {
                    c.name = Some(name.clone());
                }
                i += 2;
            }
            other => return DispatchOutcome::huh(format!("unknown option: {other}")),
        }
    }
    DispatchOutcome::Ok
}

/// `bye` — client-initiated disconnect (§4.2/§4.4).
pub fn bye(_server: &mut Server, _client: ClientId, _args: &[String]) -> DispatchOutcome {
    DispatchOutcome::Drop
}

/// `info` — supplemented diagnostic line; real LCDproc has no wire verb for
/// this but every client/server pairing in the pack exposes some form of
/// version/info probe, so this mirrors that shape.
pub fn info(server: &mut Server, _client: ClientId, _args: &[String]) -> DispatchOutcome {
    DispatchOutcome::Reply(format!(
        "info lcdd {SERVER_VERSION} clients {} screens {}",
        server.clients.len(),
        server.screen_list.len(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Server;
    use lcdd_driver::NullDriver;
    use pretty_assertions::assert_eq;

    fn server_with_client() -> (Server, ClientId) {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let id = server.add_client(0);
        (server, id)
    }

    #[test]
    fn hello_activates_client_and_echoes_banner() {
        let (mut server, id) = server_with_client();
        let outcome = hello(&mut server, id, &[]);
        assert_eq!(server.clients.get(&id).unwrap().state, ClientState::Active);
        assert!(matches!(outcome, DispatchOutcome::Reply(s) if s.starts_with("connect LCDproc")));
    }

    #[test]
    fn client_set_name_is_stored() {
        let (mut server, id) = server_with_client();
        let outcome = client_set(&mut server, id, &["-name".to_string(), "xbmc".to_string()]);
        assert_eq!(outcome, DispatchOutcome::Ok);
        assert_eq!(server.clients.get(&id).unwrap().name.as_deref(), Some("xbmc"));
    }

    #[test]
    fn bye_requests_drop() {
        let (mut server, id) = server_with_client();
        assert_eq!(bye(&mut server, id, &[]), DispatchOutcome::Drop);
    }
}
