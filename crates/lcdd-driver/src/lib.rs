//! Driver capability surface (§6) and two reference implementations.
//!
//! The core never assumes more than what [`Driver`] declares mandatory.
//! Methods with a provided default return [`DriverError::Unsupported`] so a
//! driver that cannot do RGB LEDs, title-speed, or heartbeats simply doesn't
//! override them; the renderer degrades gracefully on that signal (see
//! `lcdd-render`). A driver owns hardware for its lifetime and is torn down
//! via `Drop`, not an explicit `close()` call that could be forgotten.

mod memory;
mod null;

pub use memory::MemoryDriver;
pub use null::NullDriver;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    #[error("unsupported")]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Off,
    Default,
    Block,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacklightModifier {
    pub blink: bool,
    pub flash: bool,
}

impl BacklightModifier {
    pub const NONE: Self = Self {
        blink: false,
        flash: false,
    };
}

/// Enumerated icon glyphs a widget may request (§3 `ICON` widget).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconCode {
    HeartOpen,
    HeartFilled,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    CheckboxOff,
    CheckboxOn,
    CheckboxGray,
    SelectorAtLeft,
    SelectorAtRight,
    EllipsisVertical,
    StopSignal,
    Pause,
    Play,
    PlayR,
    BlockFilled,
}

impl IconCode {
    /// Map the numeric codes clients send over the wire to their symbolic
    /// form. Unknown numbers are not in the `Driver`'s job to reject — the
    /// caller (`lcdd-proto`) reports `huh? unsupported` for those.
    pub fn from_wire(n: u32) -> Option<Self> {
        use IconCode::*;
        Some(match n {
            0 => BlockFilled,
            1 => HeartOpen,
            2 => HeartFilled,
            3 => ArrowUp,
            4 => ArrowDown,
            5 => ArrowLeft,
            6 => ArrowRight,
            7 => CheckboxOff,
            8 => CheckboxOn,
            9 => CheckboxGray,
            10 => SelectorAtLeft,
            11 => SelectorAtRight,
            12 => EllipsisVertical,
            13 => StopSignal,
            14 => Pause,
            15 => Play,
            16 => PlayR,
            _ => return None,
        })
    }

    pub fn from_name(name: &str) -> Option<Self> {
        use IconCode::*;
        Some(match name {
            "BLOCK_FILLED" => BlockFilled,
            "HEART_OPEN" => HeartOpen,
            "HEART_FILLED" => HeartFilled,
            "ARROW_UP" => ArrowUp,
            "ARROW_DOWN" => ArrowDown,
            "ARROW_LEFT" => ArrowLeft,
            "ARROW_RIGHT" => ArrowRight,
            "CHECKBOX_OFF" => CheckboxOff,
            "CHECKBOX_ON" => CheckboxOn,
            "CHECKBOX_GRAY" => CheckboxGray,
            "SELECTOR_AT_LEFT" => SelectorAtLeft,
            "SELECTOR_AT_RIGHT" => SelectorAtRight,
            "ELLIPSIS" => EllipsisVertical,
            "STOP" => StopSignal,
            "PAUSE" => Pause,
            "PLAY" => Play,
            "PLAYR" => PlayR,
            _ => return None,
        })
    }
}

/// The capability surface every driver backend must expose (§6).
///
/// Coordinates are 1-based character cells, matching the wire protocol's
/// `(x, y)` widget positions.
pub trait Driver: Send {
    fn width(&self) -> u16;
    fn height(&self) -> u16;
    fn cellwid(&self) -> u16;
    fn cellhgt(&self) -> u16;

    fn clear(&mut self);
    fn set_char(&mut self, x: u16, y: u16, glyph: char);
    /// Horizontal bar `length` driver-pixels long, `cellwid` pixels per cell.
    fn hbar(&mut self, x: u16, y: u16, length: i32);
    fn num(&mut self, x: u16, digit: u8);
    fn set_cursor(&mut self, x: u16, y: u16, style: CursorStyle);
    fn set_backlight(&mut self, on: bool, modifier: BacklightModifier);
    fn flush(&mut self) -> anyhow::Result<()>;

    /// Non-blocking poll for the next key event, if the backend has one buffered.
    fn poll_key(&mut self) -> Option<String>;

    /// Vertical bar `length` driver-pixels tall, extending upward from `(x, y)`.
    /// A driver that can't do vertical bars leaves this unimplemented; the
    /// renderer falls back to an `HBAR` approximation on `Unsupported`.
    fn vbar(&mut self, _x: u16, _y: u16, _length: i32) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }

    fn icon(&mut self, _x: u16, _y: u16, _code: IconCode) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }

    fn heartbeat(&mut self, _on: bool) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }

    fn set_title_speed(&mut self, _ticks_per_advance: u32) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }

    fn set_rgb(&mut self, _r: u8, _g: u8, _b: u8) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }
}
