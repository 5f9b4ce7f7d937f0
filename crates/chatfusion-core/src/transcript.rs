use crate::state::MessageEntry;

/// Ordered, append-only message history for one session.
///
/// Never empty: it starts from a seed entry, and entries are never edited,
/// removed, or reordered once appended.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Vec<MessageEntry>,
}

impl Transcript {
    pub fn seeded(seed: MessageEntry) -> Self {
        Self { entries: vec![seed] }
    }

    pub fn append(&mut self, entry: MessageEntry) {
        self.entries.push(entry);
    }

    /// Read-only view of every entry, oldest first.
    pub fn snapshot(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // Never true: transcripts are seeded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> &MessageEntry {
        // Seeded on construction and never shrinks.
        &self.entries[self.entries.len() - 1]
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::seeded(MessageEntry::greeting())
    }
}
