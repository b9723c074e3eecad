use serde::Serialize;

use crate::content::Page;
use crate::markdown::plain_text;

/// A single page in the client-side search index.
#[derive(Debug, Serialize)]
pub struct SearchDocument {
    pub title: String,
    pub href: String,
    pub body: String,
}

impl SearchDocument {
    pub fn from_page(page: &Page) -> Self {
        Self {
            title: page.meta.title.clone().unwrap_or_default(),
            href: page.permalink.as_str().to_string(),
            body: plain_text(&page.raw_content),
        }
    }
}

pub fn search_index_json(documents: &[SearchDocument]) -> serde_json::Result<String> {
    serde_json::to_string(documents)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    use crate::content::Page;
    use crate::SiteOrigin;

    use super::*;

    #[test]
    fn test_search_document_from_page() {
        let origin = "https://example.com".parse::<SiteOrigin>().unwrap();

        let text = indoc! {r#"
            +++
            title = "Hello, world!"
            +++

            Welcome to *the* blog.
        "#};

        let page = Page::parse(
            &origin,
            text,
            "content",
            Path::new("content/post/hello-world.md"),
        )
        .unwrap();

        let document = SearchDocument::from_page(&page);

        assert_eq!(document.title, "Hello, world!");
        assert_eq!(document.href, "https://example.com/post/hello-world/");
        assert_eq!(document.body, "Welcome to the blog.");
    }

    #[test]
    fn test_search_index_json() {
        let documents = vec![SearchDocument {
            title: "Hello".to_string(),
            href: "https://example.com/post/hello/".to_string(),
            body: "Welcome.".to_string(),
        }];

        assert_eq!(
            search_index_json(&documents).unwrap(),
            r#"[{"title":"Hello","href":"https://example.com/post/hello/","body":"Welcome."}]"#
        );
    }
}
