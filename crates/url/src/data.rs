use crate::consts::DATA_URL_REGEX;
use crate::error::{ErrorKind, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use exn::{OptionExt, ResultExt};

// Inline icons in the wild are frequently missing their padding.
const LENIENT: GeneralPurpose =
    GeneralPurpose::new(&alphabet::STANDARD, GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent));

/// Whether `href` is an inline `data:<type>/<subtype>;base64,` reference.
pub fn is_data_url(href: &str) -> bool {
    DATA_URL_REGEX.is_match(href)
}

/// A decoded base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    /// Decoded bytes.
    pub payload: Vec<u8>,
}

impl DataUrl {
    /// Parse and decode a base64 data URL.
    ///
    /// ```
    /// use favr_url::DataUrl;
    /// let data = DataUrl::parse("data:image/png;base64,SGVsbG8=").unwrap();
    /// assert_eq!(data.media_type, "image/png");
    /// assert_eq!(data.payload, b"Hello");
    /// ```
    pub fn parse(href: &str) -> Result<Self> {
        let captures = DATA_URL_REGEX.captures(href).ok_or_raise(|| ErrorKind::MalformedDataUrl)?;
        let media_type = captures.get(1).ok_or_raise(|| ErrorKind::MalformedDataUrl)?.as_str().to_ascii_lowercase();
        let header_end = captures.get(0).ok_or_raise(|| ErrorKind::MalformedDataUrl)?.end();
        let encoded = &href[header_end..];
        if encoded.contains(',') {
            exn::bail!(ErrorKind::MalformedDataUrl);
        }
        let encoded: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let payload = LENIENT.decode(encoded).or_raise(|| ErrorKind::InvalidPayload)?;
        Ok(Self { media_type, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("data:image/png;base64,SGVsbG8=", true)]
    #[case("data:image/svg+xml;base64,PHN2Zz4=", true)]
    #[case("data:image/vnd.microsoft.icon;base64,AAAB", true)]
    #[case("data:image/svg+xml,<svg></svg>", false)]
    #[case("data:;base64,SGVsbG8=", false)]
    #[case("/favicon.ico", false)]
    #[case("https://example.com/data:image/png;base64,", false)]
    fn test_is_data_url(#[case] href: &str, #[case] expected: bool) {
        assert_eq!(is_data_url(href), expected);
    }

    #[rstest]
    #[case("data:image/png;base64,SGVsbG8=")]
    #[case("data:image/png;base64,SGVsbG8")]
    #[case("data:IMAGE/PNG;base64,SGVs\nbG8=")]
    fn test_parse(#[case] href: &str) {
        let data = DataUrl::parse(href).unwrap();
        assert_eq!(data.media_type, "image/png");
        assert_eq!(data.payload, b"Hello");
    }

    #[test]
    fn test_parse_rejects_extra_separator() {
        let err = DataUrl::parse("data:image/png;base64,SGVs,bG8=").unwrap_err();
        assert_eq!(*err, ErrorKind::MalformedDataUrl);
    }

    #[test]
    fn test_parse_rejects_bad_payload() {
        let err = DataUrl::parse("data:image/png;base64,%%%%").unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidPayload);
    }

    #[test]
    fn test_parse_rejects_plain_url() {
        let err = DataUrl::parse("https://example.com/icon.png").unwrap_err();
        assert_eq!(*err, ErrorKind::MalformedDataUrl);
    }
}
