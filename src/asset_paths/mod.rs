//! Helpers for resolving aliased asset paths and building their public URLs.
//!
//! The publisher and the URL builder both derive relative paths through
//! [`strip_namespace`], so a published file and the URL pointing at it never disagree.

mod alias;
mod filters;
mod url;

pub use alias::{ALIAS_MARKER, AliasLookup, AliasMap, alias_namespace, is_alias, strip_namespace};
pub use filters::is_remote_reference;
pub use url::build_asset_url;
