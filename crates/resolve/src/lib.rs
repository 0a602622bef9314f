//! Icon resolution.
//!
//! Two strategies run side by side for every request: probing
//! `/favicon.ico` up the subdomain tree, and reading the icons the site's
//! page (and manifest) declare. [`Resolver`] runs both and merges them.
//! Neither strategy ever fails a request; they come back empty instead.

pub mod error;
mod favicon;
pub mod merge;
mod models;
mod page;
mod params;
pub mod rank;
mod resolver;

pub use crate::favicon::{MAX_BASE_HOSTS, load_favicon_ico};
pub use crate::models::{Icon, LoadResult};
pub use crate::page::load_from_page;
pub use crate::params::{PixelRatio, SizeParam};
pub use crate::resolver::Resolver;
