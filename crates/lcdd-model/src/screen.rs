//! A `Screen`'s widgets live in a [`slotmap::SlotMap`] arena keyed by an
//! internal [`WidgetSlot`], not by pointers — this is the fix for the
//! cyclic frame/inner-screen shape called out in the design notes: a
//! `Frame` widget owns its inner `Screen` by value, and nothing ever points
//! back up the tree, so ownership is plain Rust drop order.

use crate::ids::{WidgetId, WidgetSlot};
use crate::widget::{ScrollDirection, Widget};
use crate::ModelError;
use indexmap::IndexMap;
use lcdd_driver::CursorStyle;
use slotmap::SlotMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatPolicy {
    On,
    Off,
    Open,
}

impl Default for HeartbeatPolicy {
    fn default() -> Self {
        HeartbeatPolicy::Open
    }
}

impl HeartbeatPolicy {
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "on" => HeartbeatPolicy::On,
            "off" => HeartbeatPolicy::Off,
            "open" => HeartbeatPolicy::Open,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklightPolicy {
    On,
    Off,
    Open,
    Blink,
    Flash,
}

impl Default for BacklightPolicy {
    fn default() -> Self {
        BacklightPolicy::Open
    }
}

impl BacklightPolicy {
    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "on" => BacklightPolicy::On,
            "off" => BacklightPolicy::Off,
            "open" => BacklightPolicy::Open,
            "blink" => BacklightPolicy::Blink,
            "flash" => BacklightPolicy::Flash,
            _ => return None,
        })
    }

    /// What this policy actually lights the display as right now, given the
    /// current global backlight switch (`Open` tracks it; `Blink`/`Flash`
    /// are always lit, just modulated).
    pub fn resolved_on(self, global_backlight_on: bool) -> bool {
        match self {
            BacklightPolicy::On => true,
            BacklightPolicy::Off => false,
            BacklightPolicy::Open => global_backlight_on,
            BacklightPolicy::Blink | BacklightPolicy::Flash => true,
        }
    }

    /// `screen_set -backlight toggle`: not a stored state itself, applied
    /// against whatever the policy currently resolves to given the global
    /// backlight switch, then pinned to the opposite of that as an explicit
    /// On/Off.
    pub fn toggled(self, global_backlight_on: bool) -> Self {
        if self.resolved_on(global_backlight_on) {
            BacklightPolicy::Off
        } else {
            BacklightPolicy::On
        }
    }
}

pub const DEFAULT_DURATION_FRAMES: u32 = 128;

#[derive(Debug, Clone)]
pub struct Screen {
    pub name: Option<String>,
    pub width: u16,
    pub height: u16,
    pub priority: crate::Priority,
    pub duration: u32,
    pub timeout: Option<u32>,
    pub heartbeat: HeartbeatPolicy,
    pub cursor_style: CursorStyle,
    pub cursor_pos: Option<(u16, u16)>,
    pub backlight: BacklightPolicy,
    pub keys: Vec<String>,
    arena: SlotMap<WidgetSlot, Widget>,
    index: IndexMap<WidgetId, WidgetSlot>,
}

impl Screen {
    /// `screen_add` defaults, §4.5.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            name: None,
            width,
            height,
            priority: crate::Priority::default(),
            duration: DEFAULT_DURATION_FRAMES,
            timeout: None,
            heartbeat: HeartbeatPolicy::Open,
            cursor_style: CursorStyle::Off,
            cursor_pos: None,
            backlight: BacklightPolicy::Open,
            keys: Vec::new(),
            arena: SlotMap::with_key(),
            index: IndexMap::new(),
        }
    }

    pub fn set_cursor_pos(&mut self, x: u16, y: u16) -> Result<(), ModelError> {
        if x == 0 || y == 0 || x > self.width || y > self.height {
            return Err(ModelError::OutOfRange);
        }
        self.cursor_pos = Some((x, y));
        Ok(())
    }

    pub fn add_widget(&mut self, id: WidgetId, widget: Widget) -> Result<(), ModelError> {
        if self.index.contains_key(&id) {
            return Err(ModelError::DuplicateId);
        }
        let slot = self.arena.insert(widget);
        self.index.insert(id, slot);
        Ok(())
    }

    pub fn remove_widget(&mut self, id: &WidgetId) -> Option<Widget> {
        let slot = self.index.shift_remove(id)?;
        self.arena.remove(slot)
    }

    pub fn widget(&self, id: &WidgetId) -> Option<&Widget> {
        let slot = *self.index.get(id)?;
        self.arena.get(slot)
    }

    pub fn widget_mut(&mut self, id: &WidgetId) -> Option<&mut Widget> {
        let slot = *self.index.get(id)?;
        self.arena.get_mut(slot)
    }

    pub fn contains(&self, id: &WidgetId) -> bool {
        self.index.contains_key(id)
    }

    /// Widgets in insertion order, the order the renderer must walk (§4.6).
    pub fn widgets_in_order(&self) -> impl Iterator<Item = (&WidgetId, &Widget)> {
        self.index
            .iter()
            .filter_map(|(id, slot)| self.arena.get(*slot).map(|w| (id, w)))
    }

    pub fn widget_count(&self) -> usize {
        self.arena.len()
    }

    /// Resolve `-in <frame-wid>` to the frame's inner screen. Errors if the
    /// id is unknown or names a non-`FRAME` widget (§4.5).
    pub fn frame_inner_mut(&mut self, frame_id: &WidgetId) -> Result<&mut Screen, ModelError> {
        match self.widget_mut(frame_id) {
            Some(Widget::Frame { inner, .. }) => Ok(inner),
            Some(_) => Err(ModelError::NotAFrame),
            None => Err(ModelError::UnknownWidget),
        }
    }

    pub fn frame_inner(&self, frame_id: &WidgetId) -> Result<&Screen, ModelError> {
        match self.widget(frame_id) {
            Some(Widget::Frame { inner, .. }) => Ok(inner),
            Some(_) => Err(ModelError::NotAFrame),
            None => Err(ModelError::UnknownWidget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Priority;
    use pretty_assertions::assert_eq;

    fn wid(s: &str) -> WidgetId {
        WidgetId::new(s)
    }

    #[test]
    fn new_screen_has_spec_defaults() {
        let s = Screen::new(20, 4);
        assert_eq!(s.priority, Priority::Info);
        assert_eq!(s.duration, DEFAULT_DURATION_FRAMES);
        assert_eq!(s.timeout, None);
        assert_eq!(s.heartbeat, HeartbeatPolicy::Open);
        assert_eq!(s.cursor_style, CursorStyle::Off);
        assert_eq!(s.backlight, BacklightPolicy::Open);
    }

    #[test]
    fn duplicate_widget_id_is_rejected() {
        let mut s = Screen::new(20, 4);
        s.add_widget(wid("l1"), Widget::Str { x: 1, y: 1, text: "a".into() })
            .unwrap();
        let err = s
            .add_widget(wid("l1"), Widget::Str { x: 1, y: 1, text: "b".into() })
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateId);
    }

    #[test]
    fn widgets_render_in_insertion_order() {
        let mut s = Screen::new(20, 4);
        s.add_widget(wid("b"), Widget::Title { text: "b".into() }).unwrap();
        s.add_widget(wid("a"), Widget::Title { text: "a".into() }).unwrap();
        let order: Vec<_> = s.widgets_in_order().map(|(id, _)| id.0.clone()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn remove_widget_then_add_leaves_set_unchanged() {
        let mut s = Screen::new(20, 4);
        s.add_widget(wid("l1"), Widget::Title { text: "x".into() }).unwrap();
        assert_eq!(s.widget_count(), 1);
        s.remove_widget(&wid("l1")).unwrap();
        assert_eq!(s.widget_count(), 0);
        s.add_widget(wid("l1"), Widget::Title { text: "y".into() }).unwrap();
        assert_eq!(s.widget_count(), 1);
    }

    #[test]
    fn cursor_position_out_of_bounds_is_rejected() {
        let mut s = Screen::new(20, 4);
        assert!(s.set_cursor_pos(20, 4).is_ok());
        assert_eq!(s.set_cursor_pos(21, 4), Err(ModelError::OutOfRange));
        assert_eq!(s.set_cursor_pos(1, 0), Err(ModelError::OutOfRange));
    }

    #[test]
    fn frame_inner_mut_rejects_non_frame_widgets() {
        let mut s = Screen::new(20, 4);
        s.add_widget(wid("t"), Widget::Title { text: "x".into() }).unwrap();
        assert_eq!(s.frame_inner_mut(&wid("t")).unwrap_err(), ModelError::NotAFrame);
        assert_eq!(s.frame_inner_mut(&wid("nope")).unwrap_err(), ModelError::UnknownWidget);
    }

    #[test]
    fn frame_owns_inner_screen_reachable_by_id() {
        let mut outer = Screen::new(20, 4);
        let inner = Screen::new(10, 1);
        outer
            .add_widget(
                wid("f"),
                Widget::Frame {
                    left: 1,
                    top: 1,
                    right: 10,
                    bottom: 1,
                    direction: ScrollDirection::Horizontal,
                    speed: 1,
                    inner,
                },
            )
            .unwrap();
        let inner = outer.frame_inner_mut(&wid("f")).unwrap();
        inner
            .add_widget(wid("s"), Widget::Str { x: 1, y: 1, text: "hi".into() })
            .unwrap();
        assert_eq!(outer.frame_inner(&wid("f")).unwrap().widget_count(), 1);
    }

    #[test]
    fn backlight_toggle_flips_on_off() {
        assert_eq!(BacklightPolicy::On.toggled(true), BacklightPolicy::Off);
        assert_eq!(BacklightPolicy::On.toggled(false), BacklightPolicy::Off);
        assert_eq!(BacklightPolicy::Off.toggled(true), BacklightPolicy::On);
        assert_eq!(BacklightPolicy::Off.toggled(false), BacklightPolicy::On);
    }

    #[test]
    fn backlight_toggle_on_open_resolves_against_the_global_switch_first() {
        // Open currently resolves to "on" because the global switch is on,
        // so toggling it turns the backlight off.
        assert_eq!(BacklightPolicy::Open.toggled(true), BacklightPolicy::Off);
        // With the global switch off, Open currently resolves to "off", so
        // toggling it turns the backlight on.
        assert_eq!(BacklightPolicy::Open.toggled(false), BacklightPolicy::On);
    }

    #[test]
    fn backlight_toggle_on_blink_and_flash_always_turns_them_off() {
        // Blink/Flash always resolve to "lit", so toggling always turns
        // the backlight off regardless of the global switch.
        assert_eq!(BacklightPolicy::Blink.toggled(true), BacklightPolicy::Off);
        assert_eq!(BacklightPolicy::Flash.toggled(false), BacklightPolicy::Off);
    }
}
