use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// The logical icon size a caller asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SizeParam {
    /// Small and crisp; prefers `<link rel="icon">` over everything else.
    #[default]
    Favicon,
    Px32,
    Px64,
}

impl SizeParam {
    pub const ALL: [Self; 3] = [Self::Favicon, Self::Px32, Self::Px64];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Favicon => "favicon",
            Self::Px32 => "32",
            Self::Px64 => "64",
        }
    }

    /// Physical pixels wanted for this size on a display with `dpr`.
    pub fn target_dimension(&self, dpr: PixelRatio) -> u32 {
        match self {
            // Favicons are often hand-tuned at small sizes, so don't go big.
            Self::Favicon => (16 * dpr.get()).min(32),
            Self::Px32 => 32 * dpr.get(),
            Self::Px64 => 64 * dpr.get(),
        }
    }
}

impl Display for SizeParam {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeParam {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::ALL.into_iter().find(|size| size.as_str() == s) {
            Some(size) => Ok(size),
            None => exn::bail!(ErrorKind::InvalidSize(s.to_string())),
        }
    }
}

/// Device pixel ratio, always one of 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelRatio(u8);

impl PixelRatio {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(3);

    pub fn new(ratio: u8) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0).contains(&ratio).then_some(Self(ratio))
    }

    /// Round to the nearest whole ratio and clamp into range. Only `NaN` is
    /// rejected.
    pub fn from_f64(ratio: f64) -> Option<Self> {
        if ratio.is_nan() {
            return None;
        }
        let clamped = ratio.round().clamp(f64::from(Self::MIN.0), f64::from(Self::MAX.0));
        Some(Self(clamped as u8))
    }

    pub fn get(&self) -> u32 {
        u32::from(self.0)
    }
}

impl Default for PixelRatio {
    fn default() -> Self {
        Self::MIN
    }
}

impl Display for PixelRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PixelRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<f64>().ok().and_then(Self::from_f64) {
            Some(ratio) => Ok(ratio),
            None => exn::bail!(ErrorKind::InvalidPixelRatio(s.to_string())),
        }
    }
}
