//! Cache key definitions.

use std::fmt;

/// Key of a cached document. The sitemap is cached site-wide under one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(&'static str);

impl CacheKey {
    pub const SITEMAP_XML: CacheKey = CacheKey("forum_sitemap_xml");

    pub fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
