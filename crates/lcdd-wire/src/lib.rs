//! Wire framing for the line-oriented client/server protocol.
//!
//! A connection is a stream of newline-terminated UTF-8 lines. [`LineReader`]
//! turns raw bytes into complete lines; [`tokenize`] turns a line into
//! whitespace-separated tokens honoring `{...}` and `"..."` quoting;
//! [`LineWriter`] buffers outbound lines for non-blocking flush.
//!
//! Tokenization is kept strictly separate from command dispatch (see
//! `lcdd-proto`): this crate knows nothing about command keywords.

mod reader;
mod tokenizer;
mod writer;

pub use reader::{LineReader, ReaderError};
pub use tokenizer::{quote, tokenize};
pub use writer::LineWriter;

/// Maximum accepted line length before a `Request too long` error is raised.
pub const MAX_LINE_LEN: usize = 8 * 1024;
