use std::fmt::Write;
use std::sync::Arc;

use crate::permalink::Permalink;

/// Decides whether a permalink is listed in the published sitemap.
///
/// The default filter is built from `[sitemap] exclude_prefixes` in the site
/// configuration, but callers may supply any predicate of their own.
pub type SitemapFilter = Arc<dyn Fn(&Permalink) -> bool + Send + Sync>;

pub fn exclude_path_prefixes(prefixes: Vec<String>) -> SitemapFilter {
    Arc::new(move |permalink| {
        !prefixes
            .iter()
            .any(|prefix| permalink.path().starts_with(prefix.as_str()))
    })
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SitemapEntry {
    pub permalink: Permalink,
    pub updated_at: Option<String>,
}

pub fn sitemap_xml(mut entries: Vec<SitemapEntry>) -> String {
    entries.sort();
    entries.dedup_by(|a, b| a.permalink == b.permalink);

    const XML_PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

    let mut xml = String::new();
    xml.push_str(XML_PROLOG);
    xml.push('\n');
    xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    xml.push('\n');

    for entry in entries {
        xml.push_str("<url>");
        write!(&mut xml, "<loc>{}</loc>", escape_xml(entry.permalink.as_str()))
            .expect("writing to a String cannot fail");

        if let Some(updated_at) = entry.updated_at {
            write!(&mut xml, "<lastmod>{}</lastmod>", escape_xml(&updated_at))
                .expect("writing to a String cannot fail");
        }

        xml.push_str("</url>\n");
    }

    xml.push_str("</urlset>\n");

    xml
}

fn escape_xml(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
