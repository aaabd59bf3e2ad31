use crate::outcome::DispatchOutcome;
use crate::server::Server;
use lcdd_driver::{CursorStyle, Driver};
use lcdd_model::{BacklightPolicy, ClientId, HeartbeatPolicy, Priority, Screen, ScreenId};

/// `screen_add <sid>` (§4.5).
pub fn screen_add(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let Some(sid) = args.first() else {
        return DispatchOutcome::huh("bad arguments");
    };
    let sid = ScreenId::new(sid.clone());
    let screen = Screen::new(server.driver.width(), server.driver.height());
    let Some(c) = server.clients.get_mut(&client) else {
        return DispatchOutcome::Ok;
    };
    if c.add_screen(sid.clone(), screen).is_err() {
        return DispatchOutcome::huh("duplicate screen id");
    }
    server.screen_list.insert(client, sid, Priority::default());
    DispatchOutcome::Ok
}

/// `screen_del <sid>` (§4.5): tears down the screen and releases any keys it
/// auto-reserved via `key_add`.
pub fn screen_del(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let Some(sid) = args.first() else {
        return DispatchOutcome::huh("bad arguments");
    };
    let sid = ScreenId::new(sid.clone());
    let Some(c) = server.clients.get_mut(&client) else {
        return DispatchOutcome::Ok;
    };
    let Some(screen) = c.remove_screen(&sid) else {
        return DispatchOutcome::huh("unknown screen id");
    };
    for key in &screen.keys {
        server.keys.release_for_screen(key, client);
    }
    server.screen_list.remove(client, &sid);
    DispatchOutcome::Ok
}

/// `screen_set <sid> [-name N] [-wid W] [-hgt H] [-priority P] [-duration D]
/// [-timeout T] [-heartbeat on|off|open] [-backlight on|off|open|toggle|blink|flash]
/// [-cursor off|on|under|block] [-cursor_x X] [-cursor_y Y]` (§4.5).
///
/// Flags are applied left to right as encountered; a bad flag or value stops
/// at that point and reports `huh?`, but everything already applied stays
/// applied; there is no all-or-nothing rollback of a partially-applied
/// flag list.
pub fn screen_set(server: &mut Server, client: ClientId, args: &[String]) -> DispatchOutcome {
    let Some(sid_token) = args.first() else {
        return DispatchOutcome::huh("bad arguments");
    };
    let sid = ScreenId::new(sid_token.clone());
    let mut new_priority = None;

    {
        let Some(screen) = server.clients.get_mut(&client).and_then(|c| c.screen_mut(&sid)) else {
            return DispatchOutcome::huh("unknown screen id");
        };

        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            let Some(value) = args.get(i + 1) else {
                return DispatchOutcome::huh("bad arguments");
            };
            match flag {
                "-name" => screen.name = Some(value.clone()),
                "-wid" => match crate::args::parse_u16(value) {
                    Some(w) => screen.width = w,
                    None => return DispatchOutcome::huh("bad arguments"),
                },
                "-hgt" => match crate::args::parse_u16(value) {
                    Some(h) => screen.height = h,
                    None => return DispatchOutcome::huh("bad arguments"),
                },
                "-priority" => {
                    let p = Priority::from_name(value).or_else(|| {
                        crate::args::parse_i32(value).map(Priority::from_numeric)
                    });
                    match p {
                        Some(p) => {
                            screen.priority = p;
                            new_priority = Some(p);
                        }
                        None => return DispatchOutcome::huh("bad arguments"),
                    }
                }
                "-duration" => match crate::args::parse_u32(value) {
                    Some(d) => screen.duration = d,
                    None => return DispatchOutcome::huh("bad arguments"),
                },
                "-timeout" => {
                    if value == "none" {
                        screen.timeout = None;
                    } else {
                        match crate::args::parse_u32(value) {
                            Some(t) => screen.timeout = Some(t),
                            None => return DispatchOutcome::huh("bad arguments"),
                        }
                    }
                }
                "-heartbeat" => match HeartbeatPolicy::from_name(value) {
                    Some(p) => screen.heartbeat = p,
                    None => return DispatchOutcome::huh("bad arguments"),
                },
                "-backlight" => {
                    if value == "toggle" {
                        screen.backlight = screen.backlight.toggled(server.global_backlight_on);
                    } else {
                        match BacklightPolicy::from_name(value) {
                            Some(p) => screen.backlight = p,
                            None => return DispatchOutcome::huh("bad arguments"),
                        }
                    }
                }
                "-cursor" => {
                    screen.cursor_style = match value.as_str() {
                        "off" => CursorStyle::Off,
                        "on" => CursorStyle::Default,
                        "under" => CursorStyle::Underline,
                        "block" => CursorStyle::Block,
                        _ => return DispatchOutcome::huh("bad arguments"),
                    }
                }
                "-cursor_x" => {
                    let Some(x) = crate::args::parse_u16(value) else {
                        return DispatchOutcome::huh("bad arguments");
                    };
                    let (_, y) = screen.cursor_pos.unwrap_or((1, 1));
                    if screen.set_cursor_pos(x, y).is_err() {
                        return DispatchOutcome::huh("out of range");
                    }
                }
                "-cursor_y" => {
                    let Some(y) = crate::args::parse_u16(value) else {
                        return DispatchOutcome::huh("bad arguments");
                    };
                    let (x, _) = screen.cursor_pos.unwrap_or((1, 1));
                    if screen.set_cursor_pos(x, y).is_err() {
                        return DispatchOutcome::huh("out of range");
                    }
                }
                other => return DispatchOutcome::huh(format!("unknown option: {other}")),
            }
            i += 2;
        }
    }

    if let Some(p) = new_priority {
        server.screen_list.update_priority(client, &sid, p);
    }
    DispatchOutcome::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcdd_driver::NullDriver;
    use pretty_assertions::assert_eq;

    fn server_with_client() -> (Server, ClientId) {
        let mut server = Server::new(Box::new(NullDriver::new()));
        let id = server.add_client(0);
        (server, id)
    }

    #[test]
    fn screen_add_then_duplicate_is_rejected() {
        let (mut server, id) = server_with_client();
        assert_eq!(screen_add(&mut server, id, &["s1".to_string()]), DispatchOutcome::Ok);
        assert!(matches!(
            screen_add(&mut server, id, &["s1".to_string()]),
            DispatchOutcome::Reply(s) if s.starts_with("huh?")
        ));
    }

    #[test]
    fn screen_del_releases_its_keys() {
        let (mut server, id) = server_with_client();
        screen_add(&mut server, id, &["s1".to_string()]);
        super::super::key::key_add(&mut server, id, &["s1".to_string(), "Up".to_string()]);
        assert_eq!(screen_del(&mut server, id, &["s1".to_string()]), DispatchOutcome::Ok);
        assert_eq!(server.keys.route("Up"), lcdd_input::RouteResult::Dropped);
    }

    #[test]
    fn screen_set_applies_priority_and_requeues_scheduler() {
        let (mut server, id) = server_with_client();
        screen_add(&mut server, id, &["s1".to_string()]);
        let outcome = screen_set(
            &mut server,
            id,
            &["s1".to_string(), "-priority".to_string(), "foreground".to_string()],
        );
        assert_eq!(outcome, DispatchOutcome::Ok);
        let sid = ScreenId::new("s1");
        assert_eq!(server.clients.get(&id).unwrap().screen(&sid).unwrap().priority, Priority::Foreground);
    }

    #[test]
    fn screen_set_stops_at_first_bad_flag_but_keeps_prior_changes() {
        let (mut server, id) = server_with_client();
        screen_add(&mut server, id, &["s1".to_string()]);
        let outcome = screen_set(
            &mut server,
            id,
            &[
                "s1".to_string(),
                "-duration".to_string(),
                "5".to_string(),
                "-heartbeat".to_string(),
                "bogus".to_string(),
            ],
        );
        assert!(matches!(outcome, DispatchOutcome::Reply(s) if s.starts_with("huh?")));
        let sid = ScreenId::new("s1");
        assert_eq!(server.clients.get(&id).unwrap().screen(&sid).unwrap().duration, 5);
    }
}
