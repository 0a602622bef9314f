use crate::error::{ErrorKind, Result};
use crate::models::{IconSize, ManifestIcon};
use exn::{OptionExt, ResultExt};
use serde_json::Value;
use url::Url;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse the `icons` of a web app manifest.
///
/// The document itself has to be a JSON object with an `icons` array; anything
/// else is an error. Individual entries are forgiving: an entry without a
/// usable `src` is skipped, and a `sizes` that isn't a string is treated as
/// absent. Relative `src` values resolve against `base`, the manifest's own
/// URL.
pub fn parse_manifest(json: &[u8], base: &Url) -> Result<Vec<ManifestIcon>> {
    let json = json.strip_prefix(BOM).unwrap_or(json);
    let manifest: Value = serde_json::from_slice(json).or_raise(|| ErrorKind::InvalidManifest("not JSON"))?;
    let manifest = manifest.as_object().ok_or_raise(|| ErrorKind::InvalidManifest("not an object"))?;
    let icons = manifest
        .get("icons")
        .and_then(Value::as_array)
        .ok_or_raise(|| ErrorKind::InvalidManifest("missing icons array"))?;

    let icons: Vec<_> = icons.iter().filter_map(|entry| manifest_icon(entry, base)).collect();
    tracing::debug!(count = icons.len(), "Parsed manifest icons");
    Ok(icons)
}

fn manifest_icon(entry: &Value, base: &Url) -> Option<ManifestIcon> {
    let entry = entry.as_object()?;
    let href = entry.get("src")?.as_str()?;
    let url = base.join(href).ok()?;
    let size = entry.get("sizes").and_then(Value::as_str).and_then(IconSize::parse);
    Some(ManifestIcon { href: href.to_string(), url, size })
}
