use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::RelocationError;
use crate::index::IdentifierIndex;
use crate::model::{Appearance, AppearanceEntry, AppearanceOrigin, Feature};

use super::resolve::resolve_claims;
use super::scope::FeatureScope;
use super::shared::SharedTemplates;
use super::statistic::ResultStatistic;
use super::synthesize::synthesize;
use super::target::LocalAppTarget;

/// Lifecycle of a [`RelocationEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Loading the identifier index from the pre-pass.
    Initializing,
    /// Accepting streamed features.
    Streaming,
    /// Unclaimed entries are frozen; no further features are accepted.
    Finalized,
}

/// An unclaimed entry whose targets never appeared in any streamed feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedReference {
    pub entry: Option<String>,
    pub targets: Vec<String>,
}

/// Result of a completed relocation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RelocationOutcome {
    pub statistic: ResultStatistic,
    /// Unclaimed entries, regrouped into their original global appearances.
    pub remaining: Vec<Appearance>,
    /// Number of unclaimed surface data objects.
    pub unclaimed: usize,
    /// Unclaimed entries not attributable to shared geometry.
    pub malformed_references: Vec<MalformedReference>,
}

impl RelocationOutcome {
    /// Returns `true` if every global entry was relocated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unclaimed == 0
    }
}

/// Moves global appearance entries into the features they decorate.
///
/// Features are handed in one at a time; the engine owns the pending entries
/// for the lifetime of one document.
#[derive(Debug)]
pub struct RelocationEngine {
    state: EngineState,
    policy: LocalAppTarget,
    index: IdentifierIndex,
    shared: SharedTemplates,
    /// Pending targets observed inside shared template geometry.
    shared_seen: HashSet<String>,
    /// Global appearances without surface data, written back unchanged.
    empty: Vec<AppearanceOrigin>,
    statistic: ResultStatistic,
}

impl RelocationEngine {
    /// Creates an engine from the document's global appearances.
    #[must_use]
    pub fn new(appearances: Vec<Appearance>, policy: LocalAppTarget) -> Self {
        let mut engine = Self {
            state: EngineState::Initializing,
            policy,
            index: IdentifierIndex::new(),
            shared: SharedTemplates::new(),
            shared_seen: HashSet::new(),
            empty: AppearanceOrigin::without_surface_data(&appearances),
            statistic: ResultStatistic::new(),
        };

        for entry in AppearanceEntry::explode(appearances) {
            engine.index.register(entry);
        }
        debug!(
            pending = engine.index.len(),
            %policy,
            "indexed global appearance entries"
        );
        engine.state = EngineState::Streaming;
        engine
    }

    /// Sets the templates instanced by more than one feature.
    #[must_use]
    pub fn with_shared_templates(mut self, shared: SharedTemplates) -> Self {
        self.shared = shared;
        self
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Number of entries still waiting for an owner.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.index.len()
    }

    /// Statistic accumulated so far.
    #[must_use]
    pub fn statistic(&self) -> &ResultStatistic {
        &self.statistic
    }

    /// Attaches every pending entry that decorates `feature` as local appearances.
    ///
    /// # Errors
    ///
    /// Returns [`RelocationError::Finalized`] after [`RelocationEngine::finish`].
    pub fn relocate(&mut self, feature: &mut Feature) -> Result<(), RelocationError> {
        if self.state == EngineState::Finalized {
            return Err(RelocationError::Finalized);
        }
        self.statistic.features += 1;

        if self.index.is_empty() {
            return Ok(());
        }

        let scope = FeatureScope::collect(feature, &self.shared);
        for id in scope.shared_identifiers() {
            if self.index.is_target(id) {
                self.shared_seen.insert(id.to_owned());
            }
        }

        let groups = resolve_claims(&mut self.index, &scope);
        if groups.is_empty() {
            return Ok(());
        }

        let report = synthesize(feature, groups, &scope, self.policy);
        trace!(
            feature = feature.id.as_deref().unwrap_or("<anonymous>"),
            appearances = report.appearances,
            surface_data = report.relocated.len(),
            "moved global appearance entries"
        );
        self.statistic.appearances += report.appearances;
        for kind in report.relocated {
            self.statistic.record_surface_data(kind);
        }
        Ok(())
    }

    /// Ends the stream and returns the statistic and the unclaimed entries.
    ///
    /// # Errors
    ///
    /// Returns [`RelocationError::Finalized`] if called twice.
    pub fn finish(&mut self) -> Result<RelocationOutcome, RelocationError> {
        if self.state == EngineState::Finalized {
            return Err(RelocationError::Finalized);
        }
        self.state = EngineState::Finalized;

        let remaining = std::mem::take(&mut self.index).into_remaining();
        let malformed_references: Vec<MalformedReference> = remaining
            .iter()
            .filter(|entry| !self.is_attributable_to_shared(entry))
            .map(|entry| MalformedReference {
                entry: entry.id().map(str::to_owned),
                targets: entry.targets().into_iter().map(str::to_owned).collect(),
            })
            .collect();

        Ok(RelocationOutcome {
            statistic: self.statistic,
            unclaimed: remaining.len(),
            remaining: AppearanceEntry::regroup(remaining, std::mem::take(&mut self.empty)),
            malformed_references,
        })
    }

    fn is_attributable_to_shared(&self, entry: &AppearanceEntry) -> bool {
        entry
            .targets()
            .iter()
            .any(|target| self.shared_seen.contains(*target))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::model::{
        Geometry, GeometryKind, ImplicitGeometry, SurfaceData, TemplateGeometry, X3dMaterial,
    };

    fn surface(id: &str) -> Geometry {
        Geometry::aggregate(GeometryKind::MultiSurface, Some(id.into()), vec![])
    }

    fn material(id: &str, targets: &[&str]) -> SurfaceData {
        SurfaceData::X3dMaterial(X3dMaterial::new(
            id,
            [0.1, 0.2, 0.3],
            targets.iter().map(|t| format!("#{t}")).collect(),
        ))
    }

    fn vis(entries: Vec<SurfaceData>) -> Vec<Appearance> {
        vec![Appearance {
            id: Some("GLOBAL".into()),
            theme: Some("vis".into()),
            surface_data: entries,
        }]
    }

    fn tree(template: TemplateGeometry) -> ImplicitGeometry {
        ImplicitGeometry {
            id: None,
            mime_type: None,
            reference_point: Point3::new(1.0, 2.0, 3.0),
            transformation: None,
            template,
        }
    }

    #[test]
    fn starts_streaming_and_finalizes_once() {
        let mut engine = RelocationEngine::new(Vec::new(), LocalAppTarget::TopLevel);
        assert_eq!(engine.state(), EngineState::Streaming);

        assert!(engine.finish().is_ok());
        assert_eq!(engine.state(), EngineState::Finalized);
        assert!(matches!(engine.finish(), Err(RelocationError::Finalized)));
        assert!(matches!(
            engine.relocate(&mut Feature::new("Building")),
            Err(RelocationError::Finalized)
        ));
    }

    #[test]
    fn multi_target_entry_is_claimed_whole_by_first_feature() {
        let mut engine = RelocationEngine::new(
            vis(vec![material("E1", &["S1", "S2"])]),
            LocalAppTarget::TopLevel,
        );
        let mut f1 = Feature::new("Building").with_geometry(surface("S1"));
        let mut f2 = Feature::new("Building").with_geometry(surface("S2"));

        engine.relocate(&mut f1).unwrap();
        engine.relocate(&mut f2).unwrap();

        assert_eq!(f1.appearance_count(), 1);
        assert_eq!(f2.appearance_count(), 0);
        assert!(engine.finish().unwrap().is_complete());
    }

    #[test]
    fn shared_template_entries_stay_unclaimed() {
        let template = Geometry::aggregate(GeometryKind::MultiSurface, Some("TPL".into()), vec![surface("S3")]);
        let shared: SharedTemplates = std::iter::once("TPL".to_string()).collect();
        let mut engine = RelocationEngine::new(vis(vec![material("E3", &["S3"])]), LocalAppTarget::TopLevel)
            .with_shared_templates(shared);

        let mut f1 = Feature::new("SolitaryVegetationObject")
            .with_implicit_geometry(tree(TemplateGeometry::Inline(template)));
        let mut f3 = Feature::new("SolitaryVegetationObject")
            .with_implicit_geometry(tree(TemplateGeometry::Reference { href: "#TPL".into() }));
        engine.relocate(&mut f1).unwrap();
        engine.relocate(&mut f3).unwrap();

        let outcome = engine.finish().unwrap();
        assert_eq!(f1.appearance_count() + f3.appearance_count(), 0);
        assert_eq!(outcome.unclaimed, 1);
        assert_eq!(outcome.remaining[0].surface_data[0].id(), Some("E3"));
        assert_eq!(outcome.remaining[0].id.as_deref(), Some("GLOBAL"));
        assert!(outcome.malformed_references.is_empty());
    }

    #[test]
    fn dangling_reference_is_reported_not_raised() {
        let mut engine = RelocationEngine::new(
            vis(vec![material("E1", &["S1"]), material("E9", &["MISSING"])]),
            LocalAppTarget::TopLevel,
        );
        engine
            .relocate(&mut Feature::new("Building").with_geometry(surface("S1")))
            .unwrap();

        let outcome = engine.finish().unwrap();
        assert_eq!(outcome.statistic.x3d_materials, 1);
        assert_eq!(outcome.unclaimed, 1);
        assert_eq!(
            outcome.malformed_references,
            vec![MalformedReference {
                entry: Some("E9".into()),
                targets: vec!["MISSING".into()],
            }]
        );
    }

    #[test]
    fn no_global_appearances_means_no_mutation() {
        let mut engine = RelocationEngine::new(Vec::new(), LocalAppTarget::NestedFeature);
        let original = Feature::new("Building").with_geometry(surface("S1"));
        let mut feature = original.clone();

        engine.relocate(&mut feature).unwrap();
        let outcome = engine.finish().unwrap();

        assert_eq!(feature, original);
        assert_eq!(outcome.statistic.features, 1);
        assert_eq!(outcome.statistic.appearances, 0);
        assert!(outcome.remaining.is_empty());
    }
}
