use crate::outcome::DispatchOutcome;
use crate::server::Server;
use lcdd_model::{ClientId, ClientState};
use std::collections::HashMap;

pub type CommandHandler = fn(&mut Server, ClientId, &[String]) -> DispatchOutcome;
pub type CommandTable = HashMap<&'static str, CommandHandler>;

/// Tokenize, handshake-gate, dispatch, and enqueue the reply for one
/// incoming line (§4.1/§4.2). Returns `true` if the caller should close the
/// client's socket after flushing whatever got enqueued.
pub fn dispatch_line(server: &mut Server, client: ClientId, table: &CommandTable, line: &str) -> bool {
    let tokens = lcdd_wire::tokenize(line);
    let Some(cmd) = tokens.first() else {
        return false;
    };
    let Some(state) = server.clients.get(&client).map(|c| c.state) else {
        return true;
    };

    if state == ClientState::New && cmd != "hello" {
        tracing::warn!(target: "proto", client = client.raw(), command = %cmd, "command rejected, handshake not complete");
        server.enqueue(client, "huh? Not ready");
        return false;
    }

    let Some(handler) = table.get(cmd.as_str()) else {
        server.enqueue(client, &format!("huh? unknown command: {cmd}"));
        return false;
    };

    let args = &tokens[1..];
    match handler(server, client, args) {
        DispatchOutcome::Ok => {
            server.enqueue(client, "success");
            false
        }
        DispatchOutcome::Reply(line) => {
            server.enqueue(client, &line);
            false
        }
        DispatchOutcome::Drop => {
            if let Some(c) = server.clients.get_mut(&client) {
                c.state = ClientState::Gone;
            }
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_table;
    use lcdd_driver::NullDriver;
    use pretty_assertions::assert_eq;

    fn fresh() -> (Server, CommandTable, ClientId) {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let id = server.add_client(4096);
        (server, build_table(), id)
    }

    #[test]
    fn new_client_may_only_say_hello() {
        let (mut server, table, id) = fresh();
        let should_close = dispatch_line(&mut server, id, &table, "screen_add s1");
        assert!(!should_close);
        assert_eq!(server.clients.get(&id).unwrap().state, ClientState::New);
    }

    #[test]
    fn hello_then_ordinary_commands_succeed() {
        let (mut server, table, id) = fresh();
        dispatch_line(&mut server, id, &table, "hello");
        assert_eq!(server.clients.get(&id).unwrap().state, ClientState::Active);
        let should_close = dispatch_line(&mut server, id, &table, "screen_add s1");
        assert!(!should_close);
    }

    #[test]
    fn bye_requests_socket_close_and_marks_client_gone() {
        let (mut server, table, id) = fresh();
        dispatch_line(&mut server, id, &table, "hello");
        let should_close = dispatch_line(&mut server, id, &table, "bye");
        assert!(should_close);
        assert_eq!(server.clients.get(&id).unwrap().state, ClientState::Gone);
    }

    #[test]
    fn unknown_command_reports_huh() {
        let (mut server, table, id) = fresh();
        dispatch_line(&mut server, id, &table, "hello");
        dispatch_line(&mut server, id, &table, "frobnicate");
    }
}
