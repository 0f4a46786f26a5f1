//! sitemaps.org 0.9 document rendering.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://forum.example/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!     <changefreq>hourly</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```

use std::borrow::Cow;

use quick_xml::escape::escape;
use url::Url;

use crate::domain::sitemap::UrlRecord;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Render URL records into a sitemap document. Output depends only on `records`.
pub fn render_sitemap(records: &[UrlRecord]) -> String {
    let mut xml = String::with_capacity(128 + records.len() * 160);

    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str("<urlset xmlns=\"");
    xml.push_str(SITEMAP_NS);
    xml.push_str("\">\n");

    for record in records {
        xml.push_str("  <url>\n");
        push_element(&mut xml, "loc", &escape_loc(&record.loc));
        push_element(&mut xml, "lastmod", &escape(&record.lastmod_w3c()));
        push_element(&mut xml, "changefreq", &escape(record.changefreq.as_str()));
        push_element(&mut xml, "priority", &escape(&record.priority.to_string()));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>");
    xml
}

/// Inline error document emitted when the forum is unavailable.
pub fn render_error(message: &str) -> String {
    format!("{XML_DECLARATION}<error>{}</error>", escape(message))
}

/// Error document carrying a machine-readable code next to the message.
pub fn render_coded_error(code: &str, message: &str) -> String {
    format!(
        "{XML_DECLARATION}<error><code>{}</code><message>{}</message></error>",
        escape(code),
        escape(message)
    )
}

fn push_element(xml: &mut String, name: &str, value: &str) {
    xml.push_str("    <");
    xml.push_str(name);
    xml.push('>');
    xml.push_str(value);
    xml.push_str("</");
    xml.push_str(name);
    xml.push_str(">\n");
}

/// Percent-encode what URLs may not carry, then escape for XML text.
fn escape_loc(loc: &str) -> String {
    let normalized: Cow<'_, str> = match Url::parse(loc) {
        Ok(url) => Cow::Owned(url.into()),
        Err(_) => Cow::Borrowed(loc),
    };
    escape(normalized.as_ref()).into_owned()
}
