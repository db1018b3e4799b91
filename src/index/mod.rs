use std::collections::HashMap;

use slotmap::SlotMap;

use crate::model::AppearanceEntry;

slotmap::new_key_type! {
    /// Unique identifier for a pending entry in the identifier index.
    pub struct EntryId;
}

/// A claimed entry together with the identifier that matched it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedEntry {
    pub entry: AppearanceEntry,
    /// The first identifier of the claim set under which the entry was registered.
    pub matched: String,
}

/// Arena of pending appearance entries addressed by target identifier.
///
/// An entry is registered under every identifier it targets. Claiming removes
/// it from the arena and from every identifier slot at once, so no entry is
/// ever handed out twice.
#[derive(Debug, Default)]
pub struct IdentifierIndex {
    entries: SlotMap<EntryId, AppearanceEntry>,
    by_target: HashMap<String, Vec<EntryId>>,
}

impl IdentifierIndex {
    /// Creates a new, empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from a sequence of entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = AppearanceEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.register(entry);
        }
        index
    }

    /// Inserts an entry under every target identifier it declares and returns its key.
    ///
    /// An entry without targets stays in the arena and can only surface
    /// through [`IdentifierIndex::into_remaining`].
    pub fn register(&mut self, entry: AppearanceEntry) -> EntryId {
        let targets: Vec<String> = entry.targets().into_iter().map(str::to_owned).collect();
        let key = self.entries.insert(entry);
        for target in targets {
            self.by_target.entry(target).or_default().push(key);
        }
        key
    }

    /// Removes and returns every entry registered under any of `identifiers`.
    ///
    /// Entries are returned in the order their first matching identifier
    /// appears in `identifiers`, then in registration order.
    pub fn claim<'a>(&mut self, identifiers: impl IntoIterator<Item = &'a str>) -> Vec<ClaimedEntry> {
        let mut claimed = Vec::new();
        for identifier in identifiers {
            let Some(keys) = self.by_target.remove(identifier) else {
                continue;
            };
            for key in keys {
                if let Some(entry) = self.take(key) {
                    claimed.push(ClaimedEntry {
                        entry,
                        matched: identifier.to_owned(),
                    });
                }
            }
        }
        claimed
    }

    /// Removes an entry from the arena and purges its key from all identifier slots.
    fn take(&mut self, key: EntryId) -> Option<AppearanceEntry> {
        let entry = self.entries.remove(key)?;
        for target in entry.targets() {
            if let Some(keys) = self.by_target.get_mut(target) {
                keys.retain(|k| *k != key);
                if keys.is_empty() {
                    self.by_target.remove(target);
                }
            }
        }
        Some(entry)
    }

    /// Returns `true` if a pending entry targets `identifier`.
    #[must_use]
    pub fn is_target(&self, identifier: &str) -> bool {
        self.by_target.contains_key(identifier)
    }

    /// Returns the number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the index and returns the pending entries in registration order.
    #[must_use]
    pub fn into_remaining(self) -> Vec<AppearanceEntry> {
        let mut remaining: Vec<AppearanceEntry> = self.entries.into_iter().map(|(_, e)| e).collect();
        remaining.sort_by_key(|e| e.sequence);
        remaining
    }
}
