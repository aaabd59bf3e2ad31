//! Token state machine: Normal / InBrace / InQuote.
//!
//! Nesting is not supported for either quoting form — the first matching
//! closer ends the token, whatever it contains.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InBrace,
    InQuote,
}

/// Split `line` into tokens per the wire grammar in §4.1. Empty tokens are
/// discarded; brace/quote delimiters are stripped from the returned token.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = State::Normal;
    let mut have_token = false;

    for ch in line.chars() {
        match state {
            State::Normal => match ch {
                ' ' | '\t' => {
                    if have_token {
                        tokens.push(std::mem::take(&mut current));
                        have_token = false;
                    }
                }
                '{' => {
                    have_token = true;
                    state = State::InBrace;
                }
                '"' => {
                    have_token = true;
                    state = State::InQuote;
                }
                other => {
                    have_token = true;
                    current.push(other);
                }
            },
            State::InBrace => {
                if ch == '}' {
                    state = State::Normal;
                } else {
                    current.push(ch);
                }
            }
            State::InQuote => {
                if ch == '"' {
                    state = State::Normal;
                } else {
                    current.push(ch);
                }
            }
        }
    }
    if have_token {
        tokens.push(current);
    }
    tokens
}

/// Wrap `token` in braces if it contains whitespace or is empty, so that
/// `tokenize(&quote(t))` reproduces `t` as a single token. Tokens already
/// free of whitespace and braces are returned unquoted.
pub fn quote(token: &str) -> String {
    if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c == '{' || c == '}') {
        format!("{{{token}}}")
    } else {
        token.to_string()
    }
}
