use super::IconSize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use url::Url;

/// The `rel` values that declare an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LinkType {
    #[cfg_attr(feature = "serde", serde(rename = "icon"))]
    Icon,
    #[cfg_attr(feature = "serde", serde(rename = "shortcut icon"))]
    ShortcutIcon,
    #[cfg_attr(feature = "serde", serde(rename = "apple-touch-icon"))]
    AppleTouchIcon,
    #[cfg_attr(feature = "serde", serde(rename = "apple-touch-icon-precomposed"))]
    AppleTouchIconPrecomposed,
}
impl LinkType {
    /// Every icon link type, in favicon preference order.
    pub const ALL: [Self; 4] = [Self::Icon, Self::ShortcutIcon, Self::AppleTouchIcon, Self::AppleTouchIconPrecomposed];

    /// Classify a `rel` attribute value (case-insensitive).
    pub fn from_rel(rel: &str) -> Option<Self> {
        let rel = rel.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str().eq_ignore_ascii_case(rel))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Icon => "icon",
            Self::ShortcutIcon => "shortcut icon",
            Self::AppleTouchIcon => "apple-touch-icon",
            Self::AppleTouchIconPrecomposed => "apple-touch-icon-precomposed",
        }
    }
}
impl Display for LinkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// An icon declared by a `<link>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LinkIcon {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: LinkType,
    /// The `href` as authored. Empty for inline data, which lives in `url`.
    pub href: String,
    /// `href` resolved against the page.
    pub url: Url,
    /// `true` when `url` is a base64 `data:` URL and needs no fetch.
    #[cfg_attr(feature = "serde", serde(rename = "data", skip_serializing_if = "std::ops::Not::not"))]
    pub inline: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub size: Option<IconSize>,
}

/// An icon declared in a web app manifest's `icons` array.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ManifestIcon {
    /// The `src` as authored.
    pub href: String,
    /// `src` resolved against the manifest's own URL.
    pub url: Url,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub size: Option<IconSize>,
}

/// Where a candidate icon came from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(tag = "source", rename_all = "lowercase"))]
pub enum IconSource {
    /// The implicit `/favicon.ico` of some origin.
    #[cfg_attr(feature = "serde", serde(rename = "favicon.ico"))]
    Favicon { url: Url },
    Link(LinkIcon),
    Manifest(ManifestIcon),
}

impl IconSource {
    pub fn url(&self) -> &Url {
        match self {
            Self::Favicon { url } => url,
            Self::Link(link) => &link.url,
            Self::Manifest(manifest) => &manifest.url,
        }
    }

    /// The declared size; always `None` for `/favicon.ico`.
    pub fn size(&self) -> Option<&IconSize> {
        match self {
            Self::Favicon { .. } => None,
            Self::Link(link) => link.size.as_ref(),
            Self::Manifest(manifest) => manifest.size.as_ref(),
        }
    }

    /// The authored reference, for icons that were referenced by a document.
    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Favicon { .. } => None,
            Self::Link(link) => Some(&link.href),
            Self::Manifest(manifest) => Some(&manifest.href),
        }
    }

    pub fn link_type(&self) -> Option<LinkType> {
        match self {
            Self::Link(link) => Some(link.kind),
            _ => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Link(LinkIcon { inline: true, .. }))
    }

    /// The smallest declared side, used for ranking.
    pub fn smallest_dimension(&self) -> Option<u32> {
        self.size().and_then(IconSize::smallest_dimension)
    }

    /// Whether two sources describe the same document reference, ignoring
    /// the resolved URL (which may be rewritten after fetching).
    ///
    /// Links match on `href`, type and size; manifest entries on `href` and
    /// size. `/favicon.ico` sources are never "referenced" and never match.
    pub fn is_same_reference(&self, other: &IconSource) -> bool {
        match (self, other) {
            (Self::Link(a), Self::Link(b)) => a.href == b.href && a.kind == b.kind && a.size == b.size,
            (Self::Manifest(a), Self::Manifest(b)) => a.href == b.href && a.size == b.size,
            _ => false,
        }
    }

    /// Replace the resolved URL, keeping everything else.
    pub fn with_url(mut self, url: Url) -> Self {
        match &mut self {
            Self::Favicon { url: current } => *current = url,
            Self::Link(link) => link.url = url,
            Self::Manifest(manifest) => manifest.url = url,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn link(kind: LinkType, href: &str, size: Option<&str>) -> IconSource {
        IconSource::Link(LinkIcon {
            kind,
            href: href.to_string(),
            url: Url::parse("https://example.com/").unwrap().join(href).unwrap(),
            inline: false,
            size: size.and_then(IconSize::parse),
        })
    }

    fn manifest(href: &str, size: Option<&str>) -> IconSource {
        IconSource::Manifest(ManifestIcon {
            href: href.to_string(),
            url: Url::parse("https://example.com/").unwrap().join(href).unwrap(),
            size: size.and_then(IconSize::parse),
        })
    }

    #[rstest]
    #[case("icon", Some(LinkType::Icon))]
    #[case("ICON", Some(LinkType::Icon))]
    #[case("Shortcut Icon", Some(LinkType::ShortcutIcon))]
    #[case(" apple-touch-icon ", Some(LinkType::AppleTouchIcon))]
    #[case("apple-touch-icon-precomposed", Some(LinkType::AppleTouchIconPrecomposed))]
    #[case("manifest", None)]
    #[case("stylesheet", None)]
    #[case("shortcut", None)]
    fn test_link_type_from_rel(#[case] rel: &str, #[case] expected: Option<LinkType>) {
        assert_eq!(LinkType::from_rel(rel), expected);
    }

    #[test]
    fn test_same_reference_ignores_url() {
        let original = link(LinkType::Icon, "favicon.png", Some("32x32"));
        let rewritten = original.clone().with_url(Url::parse("https://example.com/other/favicon.png").unwrap());
        assert!(original.is_same_reference(&rewritten));
        assert_ne!(original, rewritten);
    }

    #[rstest]
    #[case::different_type(link(LinkType::AppleTouchIcon, "favicon.png", Some("32x32")))]
    #[case::different_href(link(LinkType::Icon, "other.png", Some("32x32")))]
    #[case::different_size(link(LinkType::Icon, "favicon.png", Some("16x16")))]
    #[case::different_variant(manifest("favicon.png", Some("32x32")))]
    fn test_not_same_reference(#[case] other: IconSource) {
        assert!(!link(LinkType::Icon, "favicon.png", Some("32x32")).is_same_reference(&other));
    }

    #[test]
    fn test_manifest_same_reference() {
        assert!(manifest("/icon.png", Some("192x192")).is_same_reference(&manifest("/icon.png", Some("192x192"))));
        assert!(!manifest("/icon.png", Some("192x192")).is_same_reference(&manifest("/icon.png", None)));
    }

    #[test]
    fn test_favicon_is_never_a_reference() {
        let favicon = IconSource::Favicon { url: Url::parse("https://example.com/favicon.ico").unwrap() };
        assert!(!favicon.is_same_reference(&favicon.clone()));
        assert_eq!(favicon.smallest_dimension(), None);
    }
}
