use crate::index::{ClaimedEntry, IdentifierIndex};

use super::scope::FeatureScope;

/// Claimed entries sharing the theme of their global appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeGroup {
    pub theme: Option<String>,
    pub entries: Vec<ClaimedEntry>,
}

/// Claims every pending entry that targets an identifier of `scope`.
///
/// Groups are ordered by the first claimed entry of each theme.
pub fn resolve_claims(index: &mut IdentifierIndex, scope: &FeatureScope) -> Vec<ThemeGroup> {
    let mut groups: Vec<ThemeGroup> = Vec::new();
    for claimed in index.claim(scope.identifiers()) {
        let theme = claimed.entry.theme().map(str::to_owned);
        match groups.iter_mut().find(|g| g.theme == theme) {
            Some(group) => group.entries.push(claimed),
            None => groups.push(ThemeGroup {
                theme,
                entries: vec![claimed],
            }),
        }
    }
    groups
}
