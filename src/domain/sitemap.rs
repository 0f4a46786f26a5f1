//! URL records making up a sitemap document.

use serde::Serialize;
use time::Date;

use crate::domain::types::{ChangeFreq, Priority};

/// One `<url>` entry of the sitemap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlRecord {
    pub loc: String,
    pub lastmod: Date,
    pub changefreq: ChangeFreq,
    pub priority: Priority,
}

impl UrlRecord {
    pub fn new(loc: String, lastmod: Date, changefreq: ChangeFreq, priority: Priority) -> Self {
        Self {
            loc,
            lastmod,
            changefreq,
            priority,
        }
    }

    /// `lastmod` as `YYYY-MM-DD`.
    pub fn lastmod_w3c(&self) -> String {
        format_w3c_date(self.lastmod)
    }
}

pub fn format_w3c_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
