use std::collections::HashMap;

use crate::model::Feature;

use super::shared::{is_shared_geometry, SharedTemplates};

/// Child indices leading from a streamed feature to a nested sub-feature.
///
/// The empty path denotes the streamed feature itself.
pub type OwnerPath = Vec<usize>;

/// The identifiers contained in a streamed feature and who owns them.
#[derive(Debug, Default, Clone)]
pub struct FeatureScope {
    /// Claimable identifiers in pre-order: own geometry before nested features.
    identifiers: Vec<String>,
    /// Containment mapping from identifier to its directly owning feature.
    owners: HashMap<String, OwnerPath>,
    /// Identifiers found inside shared template geometry.
    shared: Vec<String>,
}

impl FeatureScope {
    /// Walks `feature` and its nested features and collects their identifiers.
    #[must_use]
    pub fn collect(feature: &Feature, shared: &SharedTemplates) -> Self {
        let mut scope = Self::default();
        let mut path = Vec::new();
        scope.visit(feature, shared, &mut path);
        scope
    }

    fn visit(&mut self, feature: &Feature, shared: &SharedTemplates, path: &mut OwnerPath) {
        for geometry in &feature.geometries {
            geometry.for_each_id(&mut |id| self.add_owned(id, path.as_slice()));
        }
        for implicit in &feature.implicit_geometries {
            let Some(template) = implicit.inline_template() else {
                continue;
            };
            if is_shared_geometry(implicit, shared) {
                template.for_each_id(&mut |id| self.shared.push(id.to_owned()));
            } else {
                template.for_each_id(&mut |id| self.add_owned(id, path.as_slice()));
            }
        }
        for (index, child) in feature.children.iter().enumerate() {
            path.push(index);
            self.visit(child, shared, path);
            path.pop();
        }
    }

    fn add_owned(&mut self, id: &str, path: &[usize]) {
        if !self.owners.contains_key(id) {
            self.owners.insert(id.to_owned(), path.to_vec());
            self.identifiers.push(id.to_owned());
        }
    }

    /// Iterates over the claimable identifiers in pre-order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.identifiers.iter().map(String::as_str)
    }

    /// Iterates over identifiers that live in shared template geometry.
    pub fn shared_identifiers(&self) -> impl Iterator<Item = &str> {
        self.shared.iter().map(String::as_str)
    }

    /// Returns the path of the feature directly owning `identifier`.
    #[must_use]
    pub fn owner_of(&self, identifier: &str) -> Option<&[usize]> {
        self.owners.get(identifier).map(Vec::as_slice)
    }

    /// Returns the number of claimable identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}
