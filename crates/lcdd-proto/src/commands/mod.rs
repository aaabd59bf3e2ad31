//! The command surface (§4.2/§4.5/§4.7/§4.8), one module per cluster of
//! related verbs. [`build_table`] wires every handler into the
//! [`crate::dispatch::CommandTable`] the dispatcher looks up by keyword.

mod handshake;
mod key;
mod menu;
mod screen;
mod toplevel;
mod widget;

use crate::dispatch::{CommandHandler, CommandTable};

pub fn build_table() -> CommandTable {
    let mut table: CommandTable = CommandTable::new();
    let mut add = |name: &'static str, handler: CommandHandler| {
        table.insert(name, handler);
    };

    add("hello", handshake::hello);
    add("client_set", handshake::client_set);
    add("bye", handshake::bye);
    add("info", handshake::info);

    add("screen_add", screen::screen_add);
    add("screen_del", screen::screen_del);
    add("screen_set", screen::screen_set);

    add("widget_add", widget::widget_add);
    add("widget_del", widget::widget_del);
    add("widget_set", widget::widget_set);

    add("key_add", key::key_add);
    add("key_del", key::key_del);
    add("client_add_key", key::client_add_key);
    add("client_del_key", key::client_del_key);

    add("backlight", toplevel::backlight);
    add("output", toplevel::output);

    add("menu_add_item", menu::menu_add_item);
    add("menu_del_item", menu::menu_del_item);
    add("menu_set_item", menu::menu_set_item);

    table
}
