//! Chat Sidebar List
//!
//! The named chat entries shown in the left panel. New chats are prepended;
//! entries can be removed. Display-adjacent state with no remote calls.

/// Identifier for a sidebar chat entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub u32);

/// A named entry in the chat sidebar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEntry {
    /// Entry identifier
    pub id: ChatId,
    /// Display name
    pub name: String,
}

/// Ordered list of sidebar chats
#[derive(Clone, Debug)]
pub struct ChatList {
    entries: Vec<ChatEntry>,
    next_id: u32,
}

impl ChatList {
    /// Create the seeded default list
    pub fn new() -> Self {
        let seeded = [
            "Career Path Discussion",
            "Skills Development Tips",
            "Job Interview Prep",
        ];
        let entries = seeded
            .iter()
            .enumerate()
            .map(|(i, name)| ChatEntry {
                id: ChatId(i as u32 + 1),
                name: (*name).to_string(),
            })
            .collect();
        Self {
            entries,
            next_id: seeded.len() as u32 + 1,
        }
    }

    /// Create an empty list
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Prepend a new chat named after the list size
    pub fn add_chat(&mut self) -> ChatId {
        let id = ChatId(self.next_id);
        self.next_id += 1;
        let name = format!("New chat {}", self.entries.len() + 1);
        self.entries.insert(0, ChatEntry { id, name });
        id
    }

    /// Remove an entry by id (unknown ids are ignored)
    pub fn remove(&mut self, id: ChatId) {
        self.entries.retain(|entry| entry.id != id);
    }

    /// The entries, newest first
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ChatList {
    fn default() -> Self {
        Self::new()
    }
}
