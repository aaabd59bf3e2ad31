use crate::outcome::DispatchOutcome;
use crate::server::Server;
use lcdd_model::{BacklightPolicy, ClientId};

/// `backlight on|off|toggle|blink|flash` (§4.5 last line): applies to the
/// active screen's policy, not a client-owned screen of its own.
pub fn backlight(server: &mut Server, _client: ClientId, args: &[String]) -> DispatchOutcome {
    let Some(state) = args.first() else {
        return DispatchOutcome::huh("bad arguments");
    };
    let Some((cur_client, cur_screen)) = server.screen_list.current() else {
        return DispatchOutcome::Ok;
    };
    let global_backlight_on = server.global_backlight_on;
    let Some(screen) = server
        .clients
        .get_mut(&cur_client)
        .and_then(|c| c.screen_mut(&cur_screen))
    else {
        return DispatchOutcome::Ok;
    };
    screen.backlight = if state == "toggle" {
        screen.backlight.toggled(global_backlight_on)
    } else {
        match BacklightPolicy::from_name(state) {
            Some(p) => p,
            None => return DispatchOutcome::huh("bad arguments"),
        }
    };
    DispatchOutcome::Ok
}

/// `output <n>`: sets the driver's general-purpose output lines. No driver
/// in this crate implements physical outputs, so this just acknowledges the
/// request — the degrade-gracefully behavior the rest of `Driver` already
/// follows for unsupported capabilities.
pub fn output(_server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let Some(value) = args.first().and_then(|v| crate::args::parse_u32(v)) else {
        return DispatchOutcome::huh("bad arguments");
    };
    tracing::debug!(target: "proto", client = client.raw(), output = value, "output request (no physical output lines)");
    DispatchOutcome::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::screen::screen_add;
    use lcdd_driver::NullDriver;
    use lcdd_model::ScreenId;
    use pretty_assertions::assert_eq;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn backlight_applies_to_the_active_screen() {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let id = server.add_client(0);
        screen_add(&mut server, id, &s(&["s1"]));
        server.tick_scheduler();
        assert_eq!(backlight(&mut server, id, &s(&["off"])), DispatchOutcome::Ok);
        let sid = ScreenId::new("s1");
        assert_eq!(
            server.clients.get(&id).unwrap().screen(&sid).unwrap().backlight,
            lcdd_model::BacklightPolicy::Off
        );
    }

    #[test]
    fn output_rejects_non_numeric_value() {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let id = server.add_client(0);
        let outcome = output(&mut server, id, &s(&["bogus"]));
        assert!(matches!(outcome, DispatchOutcome::Reply(r) if r.starts_with("huh?")));
    }
}
