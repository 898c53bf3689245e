pub(crate) mod derived_urls;
pub(crate) mod sync;
