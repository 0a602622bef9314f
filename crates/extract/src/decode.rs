//! Incremental text decoding for documents that arrive in arbitrary chunks.

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};

/// Decodes a byte stream to UTF-8 text across chunk boundaries.
///
/// A byte order mark always wins; without one the `charset` label from the
/// response decides, falling back to UTF-8 for missing or unknown labels.
/// Malformed input becomes U+FFFD.
pub(crate) struct TextDecoder {
    inner: Decoder,
}

impl TextDecoder {
    pub(crate) fn new(charset: Option<&str>) -> Self {
        let encoding = charset.and_then(|label| Encoding::for_label(label.trim().as_bytes())).unwrap_or(UTF_8);
        // `new_decoder` sniffs for a BOM before committing to `encoding`.
        Self { inner: encoding.new_decoder() }
    }

    pub(crate) fn decode(&mut self, chunk: &[u8]) -> String {
        self.decode_inner(chunk, false)
    }

    /// Flush anything held back at the end of the input. The decoder must not
    /// be used afterwards.
    pub(crate) fn finish(&mut self) -> String {
        self.decode_inner(&[], true)
    }

    fn decode_inner(&mut self, mut chunk: &[u8], last: bool) -> String {
        let mut decoded = String::with_capacity(self.capacity_for(chunk.len()));
        loop {
            let (result, read, _) = self.inner.decode_to_string(chunk, &mut decoded, last);
            chunk = &chunk[read..];
            match result {
                CoderResult::InputEmpty => return decoded,
                CoderResult::OutputFull => decoded.reserve(self.capacity_for(chunk.len())),
            }
        }
    }

    fn capacity_for(&self, len: usize) -> usize {
        self.inner.max_utf8_buffer_length(len).unwrap_or(len.saturating_mul(3)).max(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decode_bytewise(decoder: &mut TextDecoder, bytes: &[u8]) -> String {
        let mut out = String::new();
        for byte in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        out.push_str(&decoder.finish());
        out
    }

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        bytes
    }

    #[test]
    fn test_split_multibyte_sequence() {
        let mut decoder = TextDecoder::new(None);
        assert_eq!(decode_bytewise(&mut decoder, "caf\u{e9} \u{1f600}".as_bytes()), "caf\u{e9} \u{1f600}");
    }

    #[test]
    fn test_invalid_bytes_are_replaced() {
        let mut decoder = TextDecoder::new(Some("utf-8"));
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{fffd}b");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_truncated_tail_is_flushed_lossily() {
        let mut decoder = TextDecoder::new(None);
        assert_eq!(decoder.decode(b"ok\xe2\x82"), "ok");
        assert_eq!(decoder.finish(), "\u{fffd}");
    }

    #[rstest]
    #[case(None)]
    #[case(Some("utf-8"))]
    #[case(Some("windows-1252"))]
    fn test_bom_overrides_charset(#[case] charset: Option<&str>) {
        let mut decoder = TextDecoder::new(charset);
        assert_eq!(decode_bytewise(&mut decoder, &utf16le_with_bom("<head>\u{e9}")), "<head>\u{e9}");
    }

    #[test]
    fn test_legacy_charset() {
        let mut decoder = TextDecoder::new(Some(" ISO-8859-1 "));
        assert_eq!(decoder.decode(b"caf\xe9"), "caf\u{e9}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_unknown_charset_falls_back_to_utf8() {
        let mut decoder = TextDecoder::new(Some("klingon"));
        assert_eq!(decoder.decode("caf\u{e9}".as_bytes()), "caf\u{e9}");
        assert_eq!(decoder.finish(), "");
    }
}
