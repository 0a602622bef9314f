//! Choosing the best-fitting icon among declared candidates.

use crate::params::{PixelRatio, SizeParam};
use favr_extract::models::{IconSource, LinkType};

/// How well `source` fits a `target`-pixel slot; higher is better.
///
/// Icons at least as large as the target score `1 / excess`, so an exact
/// match is `+inf` and oversized icons tend towards zero the larger they get.
/// Undersized icons score their (negative) shortfall. Icons without a usable
/// size come last at `-inf`.
pub fn score(source: &IconSource, target: u32) -> f64 {
    let Some(smallest) = source.smallest_dimension() else {
        return f64::NEG_INFINITY;
    };
    let delta = f64::from(smallest) - f64::from(target);
    if delta > 0.0 {
        1.0 / delta
    } else if delta == 0.0 {
        f64::INFINITY
    } else {
        delta
    }
}

/// The highest scoring candidate; the earliest one wins a tie.
pub fn rank_icon<'a, I>(candidates: I, target: u32) -> Option<&'a IconSource>
where
    I: IntoIterator<Item = &'a IconSource>,
{
    let mut best: Option<(&IconSource, f64)> = None;
    for candidate in candidates {
        let score = score(candidate, target);
        if best.is_none_or(|(_, best)| score > best) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// Best link icon for favicon use. Link type takes precedence over score:
/// any `icon` beats every `shortcut icon`, and so on. Manifest icons never
/// qualify.
pub fn rank_favicon(candidates: &[IconSource], dpr: PixelRatio) -> Option<&IconSource> {
    let target = SizeParam::Favicon.target_dimension(dpr);
    LinkType::ALL.into_iter().find_map(|kind| {
        rank_icon(candidates.iter().filter(|candidate| candidate.link_type() == Some(kind)), target)
    })
}

pub fn rank_by_size(candidates: &[IconSource], size: SizeParam, dpr: PixelRatio) -> Option<&IconSource> {
    match size {
        SizeParam::Favicon => rank_favicon(candidates, dpr),
        SizeParam::Px32 | SizeParam::Px64 => rank_icon(candidates, size.target_dimension(dpr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use favr_extract::models::{IconSize, LinkIcon, ManifestIcon};
    use rstest::rstest;
    use url::Url;

    fn url(href: &str) -> Url {
        Url::parse("https://example.com/").unwrap().join(href).unwrap()
    }

    fn link(kind: LinkType, href: &str, sizes: Option<&str>) -> IconSource {
        IconSource::Link(LinkIcon {
            kind,
            href: href.to_string(),
            url: url(href),
            inline: false,
            size: sizes.and_then(IconSize::parse),
        })
    }

    fn icon(href: &str, sizes: Option<&str>) -> IconSource {
        link(LinkType::Icon, href, sizes)
    }

    fn manifest(href: &str, sizes: &str) -> IconSource {
        IconSource::Manifest(ManifestIcon { href: href.to_string(), url: url(href), size: IconSize::parse(sizes) })
    }

    fn dpr(ratio: u8) -> PixelRatio {
        PixelRatio::new(ratio).unwrap()
    }

    #[rstest]
    #[case(Some("32x32"), 32, f64::INFINITY)]
    #[case(Some("48x48"), 32, 1.0 / 16.0)]
    #[case(Some("16x16"), 32, -16.0)]
    #[case(Some("64x32"), 32, f64::INFINITY)]
    #[case(Some("16x16 64x64"), 32, -16.0)]
    #[case(Some("any"), 32, f64::NEG_INFINITY)]
    #[case(None, 32, f64::NEG_INFINITY)]
    fn test_score(#[case] sizes: Option<&str>, #[case] target: u32, #[case] expected: f64) {
        assert_eq!(score(&icon("/a.png", sizes), target), expected);
    }

    #[test]
    fn test_exact_match_wins() {
        let candidates = [
            icon("/16.png", Some("16x16")),
            icon("/64.png", Some("64x64")),
            icon("/32.png", Some("32x32")),
        ];
        assert_eq!(rank_icon(&candidates, 32), Some(&candidates[2]));
    }

    #[test]
    fn test_closest_larger_beats_any_smaller() {
        let candidates = [
            icon("/31.png", Some("31x31")),
            icon("/512.png", Some("512x512")),
            icon("/48.png", Some("48x48")),
        ];
        assert_eq!(rank_icon(&candidates, 32), Some(&candidates[2]));
    }

    #[test]
    fn test_closest_smaller_when_nothing_larger() {
        let candidates = [icon("/8.png", Some("8x8")), icon("/24.png", Some("24x24")), icon("/16.png", Some("16x16"))];
        assert_eq!(rank_icon(&candidates, 64), Some(&candidates[1]));
    }

    #[test]
    fn test_unsized_is_last_resort() {
        let candidates = [icon("/unsized.png", None), icon("/tiny.png", Some("1x1"))];
        assert_eq!(rank_icon(&candidates, 32), Some(&candidates[1]));
        let only_unsized = [icon("/a.png", None), icon("/b.png", Some("any"))];
        assert_eq!(rank_icon(&only_unsized, 32), Some(&only_unsized[0]));
    }

    #[test]
    fn test_ties_keep_first_occurrence() {
        let candidates = [icon("/first.png", Some("48x48")), icon("/second.png", Some("48x48"))];
        assert_eq!(rank_icon(&candidates, 32), Some(&candidates[0]));
    }

    #[test]
    fn test_winner_independent_of_order() {
        let mut candidates =
            vec![icon("/16.png", Some("16x16")), icon("/40.png", Some("40x40")), icon("/128.png", Some("128x128"))];
        let winner = rank_icon(&candidates, 32).cloned();
        candidates.reverse();
        assert_eq!(rank_icon(&candidates, 32).cloned(), winner);
        candidates.rotate_left(1);
        assert_eq!(rank_icon(&candidates, 32).cloned(), winner);
    }

    #[test]
    fn test_empty() {
        assert_eq!(rank_icon(std::iter::empty(), 32), None);
        assert_eq!(rank_favicon(&[], dpr(1)), None);
    }

    #[test]
    fn test_favicon_link_type_precedence() {
        let candidates = [
            link(LinkType::AppleTouchIcon, "/touch.png", Some("16x16")),
            link(LinkType::ShortcutIcon, "/shortcut.ico", None),
            link(LinkType::Icon, "/icon.png", Some("192x192")),
        ];
        assert_eq!(rank_favicon(&candidates, dpr(1)), Some(&candidates[2]));
        assert_eq!(rank_favicon(&candidates[..2], dpr(1)), Some(&candidates[1]));
        assert_eq!(rank_favicon(&candidates[..1], dpr(1)), Some(&candidates[0]));
    }

    #[test]
    fn test_favicon_ignores_manifest_icons() {
        let candidates = [manifest("/m16.png", "16x16")];
        assert_eq!(rank_favicon(&candidates, dpr(1)), None);
    }

    #[test]
    fn test_favicon_target_scales_with_dpr_up_to_32() {
        let candidates = [
            icon("/16.png", Some("16x16")),
            icon("/32.png", Some("32x32")),
            icon("/48.png", Some("48x48")),
        ];
        assert_eq!(rank_favicon(&candidates, dpr(1)), Some(&candidates[0]));
        assert_eq!(rank_favicon(&candidates, dpr(2)), Some(&candidates[1]));
        assert_eq!(rank_favicon(&candidates, dpr(3)), Some(&candidates[1]));
    }

    #[test]
    fn test_rank_by_size_includes_manifest_icons() {
        let candidates = [
            icon("/32.png", Some("32x32")),
            manifest("/m192.png", "192x192"),
            manifest("/m512.png", "512x512"),
        ];
        assert_eq!(rank_by_size(&candidates, SizeParam::Favicon, dpr(3)), Some(&candidates[0]));
        assert_eq!(rank_by_size(&candidates, SizeParam::Px32, dpr(1)), Some(&candidates[0]));
        assert_eq!(rank_by_size(&candidates, SizeParam::Px64, dpr(3)), Some(&candidates[1]));
    }
}
