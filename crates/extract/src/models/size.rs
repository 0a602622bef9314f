use crate::consts::SIZE_TOKEN_REGEX;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Width and height of an icon, in pixels. Both are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}
impl Dimensions {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// The shorter side.
    pub fn smallest(&self) -> u32 {
        self.width.min(self.height)
    }
}
impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Declared size of an icon, as written in a `sizes` attribute or manifest
/// field.
///
/// [`Multiple`](Self::Multiple) always holds at least two entries: a single
/// parsed size is [`Single`](Self::Single) and nothing parsed at all is no
/// size, not an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(tag = "type", rename_all = "lowercase"))]
pub enum IconSize {
    /// `sizes="any"`, typically a vector icon.
    Any,
    Single(Dimensions),
    Multiple { sizes: Vec<Dimensions> },
}

impl IconSize {
    /// Parse a sizes declaration such as `"16x16 32x32"` or `"any"`.
    ///
    /// Tokens that don't look like `WxH` (or declare a zero dimension) are
    /// dropped. Returns `None` when nothing usable remains.
    ///
    /// ```
    /// use favr_extract::models::{Dimensions, IconSize};
    /// assert_eq!(IconSize::parse("ANY "), Some(IconSize::Any));
    /// assert_eq!(IconSize::parse("32x32"), Dimensions::new(32, 32).map(IconSize::Single));
    /// assert_eq!(IconSize::parse("big"), None);
    /// ```
    pub fn parse(sizes: &str) -> Option<Self> {
        let sizes = sizes.trim().to_lowercase();
        if sizes == "any" {
            return Some(Self::Any);
        }
        let parsed = sizes
            .split_ascii_whitespace()
            .filter_map(|token| {
                let captures = SIZE_TOKEN_REGEX.captures(token)?;
                let width = captures.get(1)?.as_str().parse().ok()?;
                let height = captures.get(2)?.as_str().parse().ok()?;
                Dimensions::new(width, height)
            })
            .collect();
        Self::from_dimensions(parsed)
    }

    /// Collapse a list of dimensions into the right variant.
    pub fn from_dimensions(mut sizes: Vec<Dimensions>) -> Option<Self> {
        match sizes.len() {
            0 => None,
            1 => sizes.pop().map(Self::Single),
            _ => Some(Self::Multiple { sizes }),
        }
    }

    /// The smallest side across every declared size, or `None` when the
    /// size is unknown (`any`).
    pub fn smallest_dimension(&self) -> Option<u32> {
        match self {
            Self::Any => None,
            Self::Single(dimensions) => Some(dimensions.smallest()),
            Self::Multiple { sizes } => sizes.iter().map(Dimensions::smallest).min(),
        }
    }
}

impl Display for IconSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Any => f.write_str("any"),
            Self::Single(dimensions) => Display::fmt(dimensions, f),
            Self::Multiple { sizes } => {
                let sizes: Vec<String> = sizes.iter().map(Dimensions::to_string).collect();
                f.write_str(&sizes.join(" "))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions::new(width, height).unwrap()
    }

    #[rstest]
    #[case("any", Some(IconSize::Any))]
    #[case("  Any  ", Some(IconSize::Any))]
    #[case("16x16", Some(IconSize::Single(dims(16, 16))))]
    #[case("16X32", Some(IconSize::Single(dims(16, 32))))]
    #[case("16x16 32x32", Some(IconSize::Multiple { sizes: vec![dims(16, 16), dims(32, 32)] }))]
    #[case("16x16\t32x32\n48x48", Some(IconSize::Multiple { sizes: vec![dims(16, 16), dims(32, 32), dims(48, 48)] }))]
    #[case("16x16 bogus", Some(IconSize::Single(dims(16, 16))))]
    #[case("0x0 64x64", Some(IconSize::Single(dims(64, 64))))]
    #[case("99999999999x1", None)]
    #[case("", None)]
    #[case("large", None)]
    #[case("16", None)]
    fn test_parse(#[case] input: &str, #[case] expected: Option<IconSize>) {
        assert_eq!(IconSize::parse(input), expected);
    }

    #[rstest]
    #[case("any", None)]
    #[case("48x32", Some(32))]
    #[case("64x64 16x16 32x32", Some(16))]
    #[case("128x16 32x32", Some(16))]
    fn test_smallest_dimension(#[case] input: &str, #[case] expected: Option<u32>) {
        assert_eq!(IconSize::parse(input).unwrap().smallest_dimension(), expected);
    }

    #[test]
    fn test_from_dimensions_never_builds_empty_multiple() {
        assert_eq!(IconSize::from_dimensions(vec![]), None);
        assert_eq!(IconSize::from_dimensions(vec![dims(1, 1)]), Some(IconSize::Single(dims(1, 1))));
    }

    #[test]
    fn test_display() {
        assert_eq!(IconSize::parse("16x16 32x32").unwrap().to_string(), "16x16 32x32");
        assert_eq!(IconSize::Any.to_string(), "any");
    }
}
