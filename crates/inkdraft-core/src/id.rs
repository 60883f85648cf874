use std::cell::Cell;
use std::fmt;

/// Generates document-unique identifiers: `prefix + base + counter`.
///
/// The counter belongs to one canvas and only ever grows. Repeated
/// serializations continue the sequence instead of restarting it, so ids
/// from two renders of the same canvas never collide. Canvases sharing an
/// output context (e.g. one HTML page) stay collision-free as long as they
/// use distinct prefixes.
///
/// The counter sits in a `Cell` so serialization can take `&Canvas`; this
/// also makes the generator `!Sync`.
pub struct IdGenerator {
    prefix: String,
    counter: Cell<u64>,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Cell::new(0),
        }
    }

    /// Return the next identifier and advance the counter.
    pub fn next_id(&self, base: &str) -> String {
        let n = self.counter.get();
        self.counter.set(n + 1);
        format!("{}{base}{n}", self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The value the next call to [`next_id`](Self::next_id) will use.
    pub fn peek(&self) -> u64 {
        self.counter.get()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("d")
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdGenerator({}#{})", self.prefix, self.counter.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_concatenate_prefix_base_and_counter() {
        let ids = IdGenerator::new("d");
        assert_eq!(ids.next_id(""), "d0");
        assert_eq!(ids.next_id("grad"), "dgrad1");
        assert_eq!(ids.next_id(""), "d2");
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn generated_ids_are_unique() {
        let ids = IdGenerator::new("fig1-");
        let a = ids.next_id("");
        let b = ids.next_id("");
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_prefixes_never_collide() {
        let a = IdGenerator::new("a");
        let b = IdGenerator::new("b");
        assert_ne!(a.next_id(""), b.next_id(""));
    }
}
