use crate::{candidate::InternableStr, interned::InternedString, interner::Interner};
use core::fmt;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Largest buffer a recycled builder may keep. Builders that grew past
/// this are dropped instead of pooled, bounding peak retained memory.
const MAX_RETAINED_CAPACITY: usize = 1024;

static BUILDER_POOL: Lazy<Pool> = Lazy::new(Pool::new);

/// A bounded pool of append buffers so that acquiring a builder does not
/// allocate every time.
struct Pool {
    buffers: Mutex<Vec<String>>,
    max_pooled: usize,
}

impl Pool {
    fn new() -> Self {
        let max_pooled = std::thread::available_parallelism()
            .map(|count| count.get())
            .unwrap_or(8);
        Self {
            buffers: Mutex::new(Vec::new()),
            max_pooled,
        }
    }

    fn acquire(&self) -> String {
        self.buffers.lock().pop().unwrap_or_default()
    }

    fn release(&self, mut buffer: String) {
        if buffer.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buffer.clear();
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.max_pooled {
            buffers.push(buffer);
        }
    }
}

/// Accumulates appended text into a recycled buffer and exposes the result
/// as an internable candidate.
///
/// Builders are acquired through [`crate::builder()`] (or
/// [`StringBuilder::new`]) and hand their buffer back to a bounded
/// process-wide pool when dropped. Excessively grown buffers are discarded
/// rather than retained.
pub struct StringBuilder {
    buffer: String,
}

impl Default for StringBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StringBuilder {
    /// Returns a new or recycled builder.
    pub fn new() -> Self {
        Self {
            buffer: BUILDER_POOL.acquire(),
        }
    }

    /// Appends `text` to the accumulated content.
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self
    }

    /// Returns the length of the accumulated content in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discards the accumulated content, keeping the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Returns a zero-copy candidate view of the accumulated content.
    pub fn as_candidate(&self) -> InternableStr<'_> {
        InternableStr::Single(&self.buffer)
    }

    /// Interns the accumulated content through the process-wide interner.
    pub fn intern(&self) -> InternedString {
        Interner::global().intern_candidate(&self.as_candidate())
    }
}

impl fmt::Write for StringBuilder {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        self.append(text);
        Ok(())
    }
}

impl fmt::Debug for StringBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringBuilder")
            .field("content", &self.buffer)
            .finish()
    }
}

impl Drop for StringBuilder {
    fn drop(&mut self) {
        BUILDER_POOL.release(core::mem::take(&mut self.buffer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_accumulates_across_calls() {
        let mut builder = StringBuilder::new();
        builder.append("Hel").append("lo");
        assert_eq!(builder.len(), 5);
        assert!(builder.as_candidate().equals_materialized("Hello"));
    }

    #[test]
    fn write_macro_composes_with_append() {
        use core::fmt::Write as _;

        let mut builder = StringBuilder::new();
        builder.append("item[");
        write!(builder, "{}", 42).unwrap();
        builder.append("]");
        assert!(builder.as_candidate().equals_materialized("item[42]"));
    }

    #[test]
    fn pool_recycles_cleared_buffers() {
        let pool = Pool::new();
        let mut buffer = pool.acquire();
        buffer.push_str("ephemeral content");
        let capacity = buffer.capacity();
        pool.release(buffer);

        let recycled = pool.acquire();
        assert!(recycled.is_empty());
        assert_eq!(recycled.capacity(), capacity);
    }

    #[test]
    fn pool_discards_oversized_buffers() {
        let pool = Pool::new();
        pool.release(String::with_capacity(MAX_RETAINED_CAPACITY + 1));
        assert_eq!(pool.acquire().capacity(), 0);
    }

    #[test]
    fn pool_is_bounded() {
        let pool = Pool::new();
        for _ in 0..pool.max_pooled + 4 {
            pool.release(String::with_capacity(8));
        }
        assert!(pool.buffers.lock().len() <= pool.max_pooled);
    }
}
