use std::collections::{HashMap, HashSet};

use crate::model::{Feature, ImplicitGeometry};

use super::scope::OwnerPath;

/// A feature of a document: the position of its top-level feature in the
/// document and the child-index path below it.
pub type FeatureLocation = (usize, OwnerPath);

/// Records which features instance each template.
///
/// Filled during the pre-pass. A feature using a template several times,
/// e.g. at different levels of detail, counts once.
#[derive(Debug, Default, Clone)]
pub struct TemplateUsage {
    users: HashMap<String, HashSet<FeatureLocation>>,
}

impl TemplateUsage {
    /// Creates an empty usage record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the feature at `position`/`path` instances `template`.
    pub fn record_template(&mut self, template: &str, position: usize, path: &[usize]) {
        self.users
            .entry(template.to_owned())
            .or_default()
            .insert((position, path.to_vec()));
    }

    /// Records every implicit geometry of the top-level feature at `position`
    /// and of its nested features.
    pub fn record_feature(&mut self, position: usize, feature: &Feature) {
        let mut path = Vec::new();
        self.visit(position, feature, &mut path);
    }

    fn visit(&mut self, position: usize, feature: &Feature, path: &mut OwnerPath) {
        for implicit in &feature.implicit_geometries {
            if let Some(template) = implicit.template_id() {
                self.record_template(template, position, path);
            }
        }
        for (index, child) in feature.children.iter().enumerate() {
            path.push(index);
            self.visit(position, child, path);
            path.pop();
        }
    }

    /// Returns the number of distinct features instancing `template`.
    #[must_use]
    pub fn count(&self, template: &str) -> usize {
        self.users.get(template).map_or(0, HashSet::len)
    }

    /// Returns the templates instanced by more than one feature.
    #[must_use]
    pub fn into_shared(self) -> SharedTemplates {
        SharedTemplates {
            templates: self
                .users
                .into_iter()
                .filter(|(_, users)| users.len() > 1)
                .map(|(template, _)| template)
                .collect(),
        }
    }
}

/// Identifiers of template geometries shared by several features.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SharedTemplates {
    templates: HashSet<String>,
}

impl SharedTemplates {
    /// Creates an empty set; no template is shared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `template` is instanced by more than one feature.
    #[must_use]
    pub fn contains(&self, template: &str) -> bool {
        self.templates.contains(template)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl FromIterator<String> for SharedTemplates {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            templates: iter.into_iter().collect(),
        }
    }
}

/// Returns `true` if the geometry of `implicit` is a shared template.
///
/// Identifiers inside a shared template belong to no single feature and
/// must never be claimed on behalf of the feature that happens to carry the
/// inline definition.
#[must_use]
pub fn is_shared_geometry(implicit: &ImplicitGeometry, shared: &SharedTemplates) -> bool {
    implicit
        .template_id()
        .is_some_and(|template| shared.contains(template))
}
