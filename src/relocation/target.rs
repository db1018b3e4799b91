use std::fmt;
use std::str::FromStr;

use super::scope::FeatureScope;

/// Where synthesized local appearances are attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LocalAppTarget {
    /// Always the outermost streamed feature.
    #[default]
    TopLevel,
    /// The innermost nested feature owning the decorated geometry.
    NestedFeature,
}

impl fmt::Display for LocalAppTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TopLevel => "top-level",
            Self::NestedFeature => "nested",
        })
    }
}

impl FromStr for LocalAppTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("top-level") {
            Ok(Self::TopLevel)
        } else if s.eq_ignore_ascii_case("nested") {
            Ok(Self::NestedFeature)
        } else {
            Err(format!("unknown feature target '{s}', expected 'top-level' or 'nested'"))
        }
    }
}

/// Resolves the attachment point of an entry matched by `matched`.
///
/// Returns the child-index path from the streamed feature; the empty path is
/// the streamed feature itself. Under [`LocalAppTarget::NestedFeature`] an
/// identifier without a recorded owner falls back to the streamed feature.
#[must_use]
pub fn attachment_point<'s>(
    policy: LocalAppTarget,
    matched: &str,
    scope: &'s FeatureScope,
) -> &'s [usize] {
    match policy {
        LocalAppTarget::TopLevel => &[],
        LocalAppTarget::NestedFeature => scope.owner_of(matched).unwrap_or(&[]),
    }
}
