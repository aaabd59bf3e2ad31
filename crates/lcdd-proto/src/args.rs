//! Small positional/flag parsing helpers shared by the command handlers.
//! Deliberately simple — the grammar per command is small and fixed, so a
//! generic option parser would buy nothing a few `match`es don't already
//! give us — a flat match over keywords rather than a general-purpose
//! option parser.

pub fn parse_u32(s: &str) -> Option<u32> {
    s.parse().ok()
}

pub fn parse_u16(s: &str) -> Option<u16> {
    s.parse().ok()
}

pub fn parse_i32(s: &str) -> Option<i32> {
    s.parse().ok()
}

/// `-flag` tokens that take no value.
pub fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}
