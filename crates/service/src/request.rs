use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use favr_cache::CacheKey;
use favr_resolve::{PixelRatio, SizeParam};
use favr_url::{is_allowed, normalize};
use url::{Url, form_urlencoded};

/// A validated icon request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequest {
    /// Normalized `https` site URL that passed the fetch policy.
    pub url: Url,
    pub size: SizeParam,
    pub dpr: PixelRatio,
}

impl IconRequest {
    /// Validate raw request parameters.
    ///
    /// `size` defaults to `favicon` and `dpr` to 1. The URL is normalized
    /// (scheme added, `http` upgraded) and must be allowed as a fetch target.
    pub fn parse(url: Option<&str>, size: Option<&str>, dpr: Option<&str>) -> Result<Self> {
        let Some(raw) = url else {
            exn::bail!(ErrorKind::MissingUrl);
        };
        let url = normalize(raw).or_raise(|| ErrorKind::InvalidUrl(raw.to_string()))?;
        if url.host_str().is_none_or(str::is_empty) || !is_allowed(&url) {
            exn::bail!(ErrorKind::DisallowedUrl(raw.to_string()));
        }
        let size = match size {
            Some(size) => size.parse::<SizeParam>().or_raise(|| ErrorKind::InvalidSize(size.to_string()))?,
            None => SizeParam::default(),
        };
        let dpr = match dpr {
            Some(dpr) => dpr.parse::<PixelRatio>().or_raise(|| ErrorKind::InvalidDpr(dpr.to_string()))?,
            None => PixelRatio::default(),
        };
        Ok(Self { url, size, dpr })
    }

    /// Validate the `url`, `size` and `dpr` parameters of a query string. The
    /// first occurrence of a repeated parameter wins.
    pub fn from_query(query: &str) -> Result<Self> {
        let (mut url, mut size, mut dpr) = (None, None, None);
        for (name, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let slot = match name.as_ref() {
                "url" => &mut url,
                "size" => &mut size,
                "dpr" => &mut dpr,
                _ => continue,
            };
            slot.get_or_insert(value.into_owned());
        }
        Self::parse(url.as_deref(), size.as_deref(), dpr.as_deref())
    }

    /// The metadata store key for this request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.url.host_str().unwrap_or_default(), self.size.as_str(), self.dpr.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn code(result: Result<IconRequest>) -> &'static str {
        result.unwrap_err().code()
    }

    #[test]
    fn test_defaults() {
        let request = IconRequest::parse(Some("example.com"), None, None).unwrap();
        assert_eq!(request.url.as_str(), "https://example.com/");
        assert_eq!(request.size, SizeParam::Favicon);
        assert_eq!(request.dpr, PixelRatio::MIN);
    }

    #[test]
    fn test_http_upgraded() {
        let request = IconRequest::parse(Some("http://example.com/docs"), Some("64"), Some("2")).unwrap();
        assert_eq!(request.url.as_str(), "https://example.com/docs");
        assert_eq!(request.size, SizeParam::Px64);
        assert_eq!(request.dpr.get(), 2);
    }

    #[rstest]
    #[case("0.4", 1)]
    #[case("1.5", 2)]
    #[case("2.49", 2)]
    #[case("7", 3)]
    #[case("-3", 1)]
    fn test_dpr_rounded_and_clamped(#[case] dpr: &str, #[case] expected: u32) {
        let request = IconRequest::parse(Some("example.com"), None, Some(dpr)).unwrap();
        assert_eq!(request.dpr.get(), expected);
    }

    #[rstest]
    #[case(None, None, None, "missing_url")]
    #[case(Some("https://exa mple.com"), None, None, "invalid_url")]
    #[case(Some("https://127.0.0.1/"), None, None, "invalid_url")]
    #[case(Some("localhost"), None, None, "invalid_url")]
    #[case(Some("https://example.com:8443/"), None, None, "invalid_url")]
    #[case(Some("example.com"), Some("128"), None, "invalid_size")]
    #[case(Some("example.com"), Some(""), None, "invalid_size")]
    #[case(Some("example.com"), None, Some("retina"), "invalid_dpr")]
    #[case(Some("example.com"), None, Some(""), "invalid_dpr")]
    fn test_invalid(
        #[case] url: Option<&str>,
        #[case] size: Option<&str>,
        #[case] dpr: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(code(IconRequest::parse(url, size, dpr)), expected);
    }

    #[test]
    fn test_from_query() {
        let request = IconRequest::from_query("?url=https%3A%2F%2Fexample.com%2Fa%3Fb&size=32&dpr=3&x=y").unwrap();
        assert_eq!(request.url.as_str(), "https://example.com/a?b");
        assert_eq!(request.size, SizeParam::Px32);
        assert_eq!(request.dpr, PixelRatio::MAX);
        // First occurrence wins.
        let request = IconRequest::from_query("url=one.example&url=two.example").unwrap();
        assert_eq!(request.url.host_str(), Some("one.example"));
        assert_eq!(code(IconRequest::from_query("size=32")), "missing_url");
    }

    #[test]
    fn test_cache_key() {
        let a = IconRequest::parse(Some("example.com/some/page"), None, None).unwrap();
        let b = IconRequest::parse(Some("https://example.com/other"), None, None).unwrap();
        let c = IconRequest::parse(Some("example.com"), Some("32"), None).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }
}
