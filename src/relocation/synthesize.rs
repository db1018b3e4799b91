use std::collections::HashMap;

use tracing::warn;
use uuid::Uuid;

use crate::model::{Appearance, Feature, SurfaceData, SurfaceDataKind};

use super::resolve::ThemeGroup;
use super::scope::{FeatureScope, OwnerPath};
use super::target::{attachment_point, LocalAppTarget};

/// What the synthesizer added to one streamed feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    /// Number of local appearances created.
    pub appearances: usize,
    /// Kinds of the surface data moved into local appearances.
    pub relocated: Vec<SurfaceDataKind>,
}

/// Moves claimed entries into local appearances of `feature`.
///
/// One local appearance is created per (attachment point, theme) pair and
/// reused for every further entry of that pair.
pub fn synthesize(
    feature: &mut Feature,
    groups: Vec<ThemeGroup>,
    scope: &FeatureScope,
    policy: LocalAppTarget,
) -> SynthesisReport {
    let mut created: CreatedAppearances = HashMap::new();
    let mut report = SynthesisReport::default();

    for group in groups {
        let theme = group.theme.as_deref();
        for claimed in group.entries {
            let kind = claimed.entry.surface_data.kind();
            let point = attachment_point(policy, &claimed.matched, scope);
            let fresh = match feature.descendant_mut(point) {
                Some(owner) => place(owner, point, theme, claimed.entry.surface_data, &mut created),
                None => {
                    warn!(
                        path = ?point,
                        matched = %claimed.matched,
                        "nested owner not found, attaching to streamed feature"
                    );
                    place(feature, &[], theme, claimed.entry.surface_data, &mut created)
                }
            };
            if fresh {
                report.appearances += 1;
            }
            report.relocated.push(kind);
        }
    }

    report
}

type CreatedAppearances = HashMap<(OwnerPath, Option<String>), usize>;

/// Adds `surface_data` to the local appearance of `owner` for `theme`,
/// creating it first if needed. Returns `true` if an appearance was created.
fn place(
    owner: &mut Feature,
    point: &[usize],
    theme: Option<&str>,
    surface_data: SurfaceData,
    created: &mut CreatedAppearances,
) -> bool {
    let mut fresh = false;
    let slot = *created
        .entry((point.to_vec(), theme.map(str::to_owned)))
        .or_insert_with(|| {
            owner.appearances.push(local_appearance(theme.map(str::to_owned)));
            fresh = true;
            owner.appearances.len() - 1
        });
    owner.appearances[slot].surface_data.push(surface_data);
    fresh
}

fn local_appearance(theme: Option<String>) -> Appearance {
    Appearance {
        id: Some(format!("UUID_{}", Uuid::new_v4())),
        theme,
        surface_data: Vec::new(),
    }
}
