use favr_extract::models::IconSource;
use favr_fetch::IconImage;

/// The chosen icon and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Icon {
    pub image: IconImage,
    pub source: IconSource,
}

/// Outcome of a discovery strategy, or of the whole resolution.
///
/// `found_icons` lists every candidate seen along the way, in discovery
/// order, whether or not it was chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "camelCase"))]
pub struct LoadResult {
    pub icon: Option<Icon>,
    pub found_icons: Vec<IconSource>,
}

impl LoadResult {
    pub fn empty() -> Self {
        Self::default()
    }
}
