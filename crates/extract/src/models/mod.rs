mod size;
mod source;

pub use self::size::{Dimensions, IconSize};
pub use self::source::{IconSource, LinkIcon, LinkType, ManifestIcon};
