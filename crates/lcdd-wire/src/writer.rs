use std::collections::VecDeque;

/// Per-connection outbound ring buffer. Commands enqueue whole lines;
/// `drain_into` performs a best-effort non-blocking flush and reports how
/// many bytes were written so the caller can track backpressure deadlines
/// (see §5: a client is marked GONE if its buffer stays full for >1s).
#[derive(Default)]
pub struct LineWriter {
    pending: VecDeque<u8>,
    capacity: usize,
}

impl LineWriter {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            capacity,
        }
    }

    /// Append `line` (a `\n` is added). Returns `false` and drops the write
    /// if the buffer is already at capacity.
    pub fn enqueue(&mut self, line: &str) -> bool {
        let needed = line.len() + 1;
        if self.capacity > 0 && self.pending.len() + needed > self.capacity {
            tracing::warn!(target: "wire.writer", bytes = needed, "outbound buffer full, dropping write");
            return false;
        }
        self.pending.extend(line.as_bytes());
        self.pending.push_back(b'\n');
        true
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drain as many bytes as `write` accepts per call; `write` returns the
    /// number of bytes it consumed (0 means it would block).
    pub fn drain_into<F: FnMut(&[u8]) -> std::io::Result<usize>>(
        &mut self,
        mut write: F,
    ) -> std::io::Result<usize> {
        let mut total = 0;
        while !self.pending.is_empty() {
            let (front, _) = self.pending.as_slices();
            let chunk = if front.is_empty() {
                self.pending.make_contiguous()
            } else {
                front
            };
            let n = write(chunk)?;
            if n == 0 {
                break;
            }
            self.pending.drain(..n);
            total += n;
        }
        Ok(total)
    }
}
