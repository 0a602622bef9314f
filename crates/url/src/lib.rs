//! URL handling for icon discovery.
//!
//! Everything that touches a user-supplied or page-supplied URL goes through
//! this crate first:
//! - [`normalize`] turns loose user input into an `https` URL,
//! - [`is_allowed`] is the SSRF boundary every outbound fetch must pass,
//! - [`candidate_base_hosts`] walks subdomains up to the public suffix,
//! - [`resolve_relative`] copes with sites that author relative icon paths
//!   against the wrong base,
//! - [`obfuscate`] redacts URLs before they reach a log line.

mod consts;
mod data;
pub mod error;
mod hosts;
mod normalize;
mod obfuscate;
mod policy;
mod relative;

pub use crate::data::{DataUrl, is_data_url};
pub use crate::hosts::candidate_base_hosts;
pub use crate::normalize::{favicon_url, normalize};
pub use crate::obfuscate::{Redacted, obfuscate};
pub use crate::policy::is_allowed;
pub use crate::relative::{is_relative, resolve_relative};
pub use url::{Host, Url};
