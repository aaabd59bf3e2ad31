use crate::{BacklightModifier, CursorStyle, Driver, DriverError, IconCode};
use std::collections::VecDeque;

/// Captures the last flushed character grid plus cursor/backlight state for
/// assertions in tests. Also supports injecting synthetic key presses via
/// [`MemoryDriver::push_key`] so integration tests can simulate a physical
/// keypad without a real terminal.
pub struct MemoryDriver {
    width: u16,
    height: u16,
    grid: Vec<char>,
    cursor: (u16, u16, CursorStyle),
    backlight_on: bool,
    backlight_modifier: BacklightModifier,
    pending_keys: VecDeque<String>,
    flush_count: u64,
}

impl MemoryDriver {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            grid: vec![' '; width as usize * height as usize],
            cursor: (0, 0, CursorStyle::Off),
            backlight_on: true,
            backlight_modifier: BacklightModifier::NONE,
            pending_keys: VecDeque::new(),
            flush_count: 0,
        }
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x == 0 || y == 0 || x > self.width || y > self.height {
            return None;
        }
        Some((y as usize - 1) * self.width as usize + (x as usize - 1))
    }

    /// Render the current grid as `height` lines of `width` characters, for
    /// assertions in integration tests.
    pub fn snapshot(&self) -> Vec<String> {
        self.grid
            .chunks(self.width as usize)
            .map(|row| row.iter().collect())
            .collect()
    }

    pub fn backlight(&self) -> (bool, BacklightModifier) {
        (self.backlight_on, self.backlight_modifier)
    }

    pub fn cursor(&self) -> (u16, u16, CursorStyle) {
        self.cursor
    }

    pub fn flush_count(&self) -> u64 {
        self.flush_count
    }

    /// Queue a key name to be returned by a future `poll_key`.
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.pending_keys.push_back(key.into());
    }
}

impl Driver for MemoryDriver {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn cellwid(&self) -> u16 {
        5
    }

    fn cellhgt(&self) -> u16 {
        8
    }

    fn clear(&mut self) {
        self.grid.fill(' ');
    }

    fn set_char(&mut self, x: u16, y: u16, glyph: char) {
        if let Some(i) = self.index(x, y) {
            self.grid[i] = glyph;
        }
    }

    fn hbar(&mut self, x: u16, y: u16, length: i32) {
        let cells = (length.max(0) as u32 / self.cellwid() as u32) as u16;
        for dx in 0..cells {
            if let Some(i) = self.index(x + dx, y) {
                self.grid[i] = '=';
            }
        }
    }

    fn vbar(&mut self, x: u16, y: u16, length: i32) -> Result<(), crate::DriverError> {
        let cells = (length.max(0) as u32 / self.cellhgt() as u32) as u16;
        for dy in 0..cells {
            if dy > y.saturating_sub(1) {
                break;
            }
            if let Some(i) = self.index(x, y - dy) {
                self.grid[i] = '|';
            }
        }
        Ok(())
    }

    fn num(&mut self, x: u16, digit: u8) {
        let glyph = if digit == 10 {
            ':'
        } else {
            char::from(b'0' + digit.min(9))
        };
        self.set_char(x, 1, glyph);
    }

    fn set_cursor(&mut self, x: u16, y: u16, style: CursorStyle) {
        self.cursor = (x, y, style);
    }

    fn set_backlight(&mut self, on: bool, modifier: BacklightModifier) {
        self.backlight_on = on;
        self.backlight_modifier = modifier;
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.flush_count += 1;
        Ok(())
    }

    fn poll_key(&mut self) -> Option<String> {
        self.pending_keys.pop_front()
    }

    fn icon(&mut self, x: u16, y: u16, code: IconCode) -> Result<(), DriverError> {
        let glyph = match code {
            IconCode::HeartOpen => '\u{2661}',
            IconCode::HeartFilled => '\u{2665}',
            IconCode::ArrowUp => '^',
            IconCode::ArrowDown => 'v',
            IconCode::ArrowLeft => '<',
            IconCode::ArrowRight => '>',
            IconCode::CheckboxOff => '[',
            IconCode::CheckboxOn => 'X',
            IconCode::CheckboxGray => '#',
            IconCode::SelectorAtLeft => '>',
            IconCode::SelectorAtRight => '<',
            IconCode::EllipsisVertical => ':',
            IconCode::StopSignal => '!',
            IconCode::Pause => '=',
            IconCode::Play => '>',
            IconCode::PlayR => '<',
            IconCode::BlockFilled => '\u{2588}',
        };
        self.set_char(x, y, glyph);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_char_and_snapshot() {
        let mut d = MemoryDriver::new(4, 2);
        d.set_char(1, 1, 'H');
        d.set_char(4, 2, '!');
        assert_eq!(d.snapshot(), vec!["H   ", "   !"]);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut d = MemoryDriver::new(2, 2);
        d.set_char(0, 1, 'x');
        d.set_char(9, 9, 'x');
        assert_eq!(d.snapshot(), vec!["  ", "  "]);
    }

    #[test]
    fn clear_resets_grid() {
        let mut d = MemoryDriver::new(3, 1);
        d.set_char(2, 1, 'x');
        d.clear();
        assert_eq!(d.snapshot(), vec!["   "]);
    }

    #[test]
    fn backlight_and_cursor_state_are_recorded() {
        let mut d = MemoryDriver::new(2, 2);
        d.set_backlight(false, BacklightModifier { blink: true, flash: false });
        d.set_cursor(1, 2, CursorStyle::Block);
        assert_eq!(d.backlight(), (false, BacklightModifier { blink: true, flash: false }));
        assert_eq!(d.cursor(), (1, 2, CursorStyle::Block));
    }

    #[test]
    fn poll_key_returns_queued_keys_in_order() {
        let mut d = MemoryDriver::new(2, 2);
        d.push_key("Up");
        d.push_key("Down");
        assert_eq!(d.poll_key(), Some("Up".to_string()));
        assert_eq!(d.poll_key(), Some("Down".to_string()));
        assert_eq!(d.poll_key(), None);
    }

    #[test]
    fn icon_draws_known_glyph() {
        let mut d = MemoryDriver::new(2, 1);
        d.icon(1, 1, IconCode::HeartFilled).unwrap();
        assert_eq!(d.snapshot(), vec!["\u{2665} "]);
    }

    #[test]
    fn flush_counts_calls() {
        let mut d = MemoryDriver::new(1, 1);
        d.flush().unwrap();
        d.flush().unwrap();
        assert_eq!(d.flush_count(), 2);
    }
}
