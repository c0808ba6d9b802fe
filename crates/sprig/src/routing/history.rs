/// Session history the router reads its location from.
pub trait History {
    /// Current location path.
    fn location(&self) -> String;

    /// Adds an entry and makes it current, dropping any forward entries.
    fn push(&mut self, path: &str);

    /// Moves one entry back. Returns `false` at the first entry.
    fn back(&mut self) -> bool;

    /// Moves one entry forward. Returns `false` at the last entry.
    fn forward(&mut self) -> bool;
}

/// History kept in memory. Entries are stored exactly as pushed; the route
/// table normalizes when matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.to_string()],
            index: 0,
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        self.entries[self.index].clone()
    }

    fn push(&mut self, path: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(path.to_string());
        self.index = self.entries.len() - 1;
    }

    fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }
}
