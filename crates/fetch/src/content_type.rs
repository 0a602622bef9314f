/// Image media types worth serving as an icon.
pub const IMAGE_CONTENT_TYPES: [&str; 8] = [
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "image/tiff",
    "image/vnd.microsoft.icon",
    "image/webp",
    "image/x-icon",
];

/// The bare, lowercased media type of a `Content-Type` value, without
/// parameters such as `charset`.
pub fn media_type(content_type: &str) -> String {
    content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

pub fn is_image_content_type(content_type: &str) -> bool {
    IMAGE_CONTENT_TYPES.contains(&media_type(content_type).as_str())
}

pub fn is_html_content_type(content_type: &str) -> bool {
    media_type(content_type) == "text/html"
}

/// The `charset` parameter of a `Content-Type` value, unquoted.
pub fn charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        let value = value.trim().trim_matches('"');
        (name.trim().eq_ignore_ascii_case("charset") && !value.is_empty()).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("image/png", true)]
    #[case("IMAGE/PNG", true)]
    #[case("image/x-icon", true)]
    #[case("image/vnd.microsoft.icon", true)]
    #[case("image/svg+xml; charset=utf-8", true)]
    #[case(" image/webp ", true)]
    #[case("image/avif", false)]
    #[case("text/html", false)]
    #[case("application/octet-stream", false)]
    #[case("", false)]
    fn test_is_image_content_type(#[case] content_type: &str, #[case] expected: bool) {
        assert_eq!(is_image_content_type(content_type), expected);
    }

    #[rstest]
    #[case("text/html", true)]
    #[case("text/html; charset=UTF-8", true)]
    #[case("Text/HTML", true)]
    #[case("application/xhtml+xml", false)]
    #[case("text/plain", false)]
    fn test_is_html_content_type(#[case] content_type: &str, #[case] expected: bool) {
        assert_eq!(is_html_content_type(content_type), expected);
    }

    #[test]
    fn test_media_type_strips_parameters() {
        assert_eq!(media_type("image/PNG;foo=bar"), "image/png");
    }

    #[rstest]
    #[case("text/html; charset=utf-8", Some("utf-8"))]
    #[case("text/html;charset=\"Shift_JIS\"", Some("Shift_JIS"))]
    #[case("text/html; q=1; CHARSET = windows-1252 ", Some("windows-1252"))]
    #[case("text/html; charset=", None)]
    #[case("text/html", None)]
    #[case("charset=utf-8", None)]
    fn test_charset(#[case] content_type: &str, #[case] expected: Option<&str>) {
        assert_eq!(charset(content_type), expected);
    }
}
