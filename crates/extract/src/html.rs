//! Streaming `<link>` extraction from HTML documents.
//!
//! Built on the html5ever tokenizer rather than a tree builder: only tags
//! matter, nothing needs to be kept once seen, and the tokenizer is happy to
//! be fed one chunk at a time.

use crate::decode::TextDecoder;
use crate::models::{IconSize, LinkIcon, LinkType};
use favr_url::{Redacted, is_allowed, is_data_url};
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::{Cell, RefCell};
use tendril::StrTendril;
use tracing::instrument;
use url::Url;

/// Icon references found in a page's `<head>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Icon links in document order.
    pub link_icons: Vec<LinkIcon>,
    /// The last `<link rel="manifest">` seen, if any.
    pub manifest_url: Option<Url>,
}

struct LinkSink {
    base: Url,
    icons: RefCell<Vec<LinkIcon>>,
    manifest: RefCell<Option<Url>>,
    done: Cell<bool>,
}

impl LinkSink {
    fn new(base: Url) -> Self {
        Self { base, icons: RefCell::default(), manifest: RefCell::default(), done: Cell::new(false) }
    }

    fn process_link(&self, tag: &Tag) {
        let attribute = |name: &str| tag.attrs.iter().find(|attr| &*attr.name.local == name).map(|attr| &*attr.value);
        let (Some(rel), Some(href)) = (attribute("rel"), attribute("href")) else {
            return;
        };

        if let Some(kind) = LinkType::from_rel(rel) {
            let Ok(url) = self.base.join(href) else {
                tracing::debug!(href, "Dropping icon link with unresolvable href");
                return;
            };
            let size = attribute("sizes").and_then(IconSize::parse);
            let icon = match is_data_url(href) {
                // The payload already lives in `url`, don't store it twice.
                true => LinkIcon { kind, href: String::new(), url, inline: true, size },
                false if is_allowed(&url) => LinkIcon { kind, href: href.to_string(), url, inline: false, size },
                false => {
                    tracing::debug!(url = %Redacted(&url), "Dropping icon link that fails URL policy");
                    return;
                },
            };
            self.icons.borrow_mut().push(icon);
        } else if rel.trim().eq_ignore_ascii_case("manifest")
            && let Ok(url) = self.base.join(href)
        {
            // Several manifest links: the last one wins.
            *self.manifest.borrow_mut() = Some(url);
        }
    }
}

impl TokenSink for LinkSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if self.done.get() {
            return TokenSinkResult::Continue;
        }
        let Token::TagToken(tag) = token else {
            return TokenSinkResult::Continue;
        };
        match (tag.kind, &*tag.name) {
            (TagKind::StartTag, "link") => self.process_link(&tag),
            (TagKind::EndTag, "head") => self.done.set(true),
            // Keep `<link>`-looking strings inside scripts and styles from
            // being mistaken for markup.
            (TagKind::StartTag, "script") if !tag.self_closing => {
                return TokenSinkResult::RawData(RawKind::ScriptData);
            },
            (TagKind::StartTag, "style" | "noscript" | "noframes" | "xmp" | "iframe") if !tag.self_closing => {
                return TokenSinkResult::RawData(RawKind::Rawtext);
            },
            (TagKind::StartTag, "title" | "textarea") if !tag.self_closing => {
                return TokenSinkResult::RawData(RawKind::Rcdata);
            },
            _ => {},
        }
        TokenSinkResult::Continue
    }

    fn end(&self) {
        self.done.set(true);
    }
}

/// Push-based extractor for icon links.
///
/// Feed it chunks as they arrive with [`feed`](Self::feed) and stop as soon
/// as it reports done: that happens at the closing `</head>` tag, since icons
/// are declared in the head and the body can be arbitrarily large. Call
/// [`finish`](Self::finish) to collect the result either way.
///
/// ```
/// use favr_extract::HtmlExtractor;
/// use url::Url;
///
/// let mut extractor = HtmlExtractor::new(Url::parse("https://example.com/").unwrap());
/// assert!(!extractor.feed(b"<html><head><link rel=icon href=/a.png>"));
/// assert!(extractor.feed(b"</head><body>"));
/// let metadata = extractor.finish();
/// assert_eq!(metadata.link_icons[0].url.as_str(), "https://example.com/a.png");
/// ```
pub struct HtmlExtractor {
    tokenizer: Tokenizer<LinkSink>,
    input: BufferQueue,
    decoder: TextDecoder,
}

impl HtmlExtractor {
    /// Extractor resolving relative references against `base`, which should
    /// be the page's final URL after redirects. The document is read as UTF-8
    /// unless it starts with a byte order mark.
    pub fn new(base: Url) -> Self {
        Self::with_charset(base, None)
    }

    /// Like [`new`](Self::new), but bytes without a byte order mark are
    /// decoded using the `charset` label from the response's `Content-Type`.
    /// Unknown labels fall back to UTF-8.
    pub fn with_charset(base: Url, charset: Option<&str>) -> Self {
        Self {
            tokenizer: Tokenizer::new(LinkSink::new(base), TokenizerOpts::default()),
            input: BufferQueue::default(),
            decoder: TextDecoder::new(charset),
        }
    }

    /// Push the next chunk of the document. Returns `true` once enough of the
    /// document has been seen; further chunks are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        if self.is_done() {
            return true;
        }
        let text = self.decoder.decode(chunk);
        self.push(text);
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.tokenizer.sink.done.get()
    }

    /// Signal end of input and collect what was found.
    pub fn finish(mut self) -> PageMetadata {
        if !self.is_done() {
            let text = self.decoder.finish();
            self.push(text);
        }
        self.tokenizer.end();
        let sink = &self.tokenizer.sink;
        PageMetadata { link_icons: sink.icons.take(), manifest_url: sink.manifest.take() }
    }

    fn push(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from(text));
        // Only `Script` results pause the tokenizer and this sink never
        // produces those, so a single call drains the queue.
        let _ = self.tokenizer.feed(&self.input);
    }
}

/// Extract icon links from a complete document held in memory.
#[instrument(skip(html), fields(html_size = html.as_ref().len(), base = %Redacted(&base)))]
pub fn extract_metadata(html: impl AsRef<[u8]>, base: Url) -> PageMetadata {
    let mut extractor = HtmlExtractor::new(base);
    extractor.feed(html.as_ref());
    extractor.finish()
}
