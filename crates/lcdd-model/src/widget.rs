use crate::screen::Screen;
use crate::ModelError;
use lcdd_driver::IconCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Horizontal,
    Vertical,
    Mixed,
}

impl ScrollDirection {
    pub fn from_letter(s: &str) -> Option<Self> {
        Some(match s {
            "h" => ScrollDirection::Horizontal,
            "v" => ScrollDirection::Vertical,
            "m" => ScrollDirection::Mixed,
            _ => return None,
        })
    }
}

/// A `NUM` widget's column content: a digit glyph or a colon, §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumDigit {
    Digit(u8),
    ColonOn,
    ColonOff,
}

impl NumDigit {
    pub fn from_code(code: u8) -> Result<Self, ModelError> {
        match code {
            0..=9 => Ok(NumDigit::Digit(code)),
            10 => Ok(NumDigit::ColonOn),
            11 => Ok(NumDigit::ColonOff),
            _ => Err(ModelError::BadArguments),
        }
    }
}

/// One addressable display element (§3). Variants carry only the fields
/// that type uses; there is no shared "universal" field set to keep unused
/// ones implicitly zero.
#[derive(Debug, Clone)]
pub enum Widget {
    Str {
        x: u16,
        y: u16,
        text: String,
    },
    Title {
        text: String,
    },
    Hbar {
        x: u16,
        y: u16,
        length: i32,
    },
    Vbar {
        x: u16,
        y: u16,
        length: i32,
    },
    Pbar {
        x: u16,
        y: u16,
        width: u16,
        promille: u16,
        begin_label: Option<String>,
        end_label: Option<String>,
    },
    Icon {
        x: u16,
        y: u16,
        icon: IconCode,
    },
    Scroller {
        left: u16,
        top: u16,
        right: u16,
        bottom: u16,
        direction: ScrollDirection,
        speed: u32,
        text: String,
    },
    /// Nesting primitive (§9): the inner `Screen` is owned inline, so the
    /// tree is freed by ordinary drop order with no back-pointer to cycle
    /// against.
    Frame {
        left: u16,
        top: u16,
        right: u16,
        bottom: u16,
        direction: ScrollDirection,
        speed: u32,
        inner: Screen,
    },
    Num {
        x: u16,
        digit: NumDigit,
    },
}

impl Widget {
    pub fn type_name(&self) -> &'static str {
        match self {
            Widget::Str { .. } => "string",
            Widget::Title { .. } => "title",
            Widget::Hbar { .. } => "hbar",
            Widget::Vbar { .. } => "vbar",
            Widget::Pbar { .. } => "pbar",
            Widget::Icon { .. } => "icon",
            Widget::Scroller { .. } => "scroller",
            Widget::Frame { .. } => "frame",
            Widget::Num { .. } => "num",
        }
    }

    pub fn promille_in_range(p: u16) -> Result<u16, ModelError> {
        if p > 1000 {
            Err(ModelError::OutOfRange)
        } else {
            Ok(p)
        }
    }
}
