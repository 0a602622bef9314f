use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Anything that already looks like `scheme://` is left alone by normalisation.
regex!(SCHEME_REGEX, r"^[A-Za-z]+://");
// Absolute (`https://`) or scheme-relative (`//cdn.example.com`) references.
regex!(NON_RELATIVE_REGEX, r"^([A-Za-z]+:)?//");
regex!(DATA_URL_REGEX, r"^data:([a-zA-Z]+/[a-zA-Z0-9\-+.]+);base64,");
