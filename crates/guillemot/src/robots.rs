use crate::origin::SiteOrigin;

/// The crawler-facing `robots.txt` document for a site.
///
/// The body is a pure function of the site origin: the same origin always
/// produces a byte-identical document pointing at the `sitemap.xml` published
/// alongside the rest of the site.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RobotsDocument {
    body: String,
}

impl RobotsDocument {
    pub fn new(origin: &SiteOrigin) -> Self {
        let sitemap_url = origin.sitemap_url();

        Self {
            body: format!("User-agent: *\nAllow: /\n\nSitemap: {sitemap_url}\n"),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// The media type the hosting layer should serve the document with.
    pub fn content_type(&self) -> &'static str {
        "text/plain"
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_robots_txt() {
        let origin = "https://example.com".parse().unwrap();

        assert_eq!(
            RobotsDocument::new(&origin).body(),
            indoc! {"
                User-agent: *
                Allow: /

                Sitemap: https://example.com/sitemap.xml
            "}
        );
    }

    #[test]
    fn test_robots_txt_with_base_path() {
        let origin = "https://example.com/blog/".parse().unwrap();

        assert_eq!(
            RobotsDocument::new(&origin).body(),
            indoc! {"
                User-agent: *
                Allow: /

                Sitemap: https://example.com/blog/sitemap.xml
            "}
        );
    }

    #[test]
    fn test_robots_txt_is_deterministic() {
        let origin = "https://example.com".parse().unwrap();

        assert_eq!(RobotsDocument::new(&origin), RobotsDocument::new(&origin));
    }

    #[test]
    fn test_robots_txt_points_at_the_sitemap() {
        for origin in ["https://example.com", "https://example.com/blog/"] {
            let origin = origin.parse::<crate::SiteOrigin>().unwrap();
            let document = RobotsDocument::new(&origin);

            let sitemap_line = format!("Sitemap: {}", origin.sitemap_url());
            assert!(document.body().contains(&sitemap_line));
        }
    }

    #[test]
    fn test_robots_txt_shape() {
        let origin = "https://example.com".parse().unwrap();
        let document = RobotsDocument::new(&origin);
        let body = document.body();

        assert_eq!(document.content_type(), "text/plain");

        assert!(body.ends_with('\n'));
        assert!(!body.ends_with("\n\n"));

        let blank_lines = body
            .lines()
            .enumerate()
            .filter(|(_, line)| line.is_empty())
            .map(|(ix, _)| ix)
            .collect::<Vec<_>>();
        assert_eq!(blank_lines, vec![2]);

        assert_eq!(body.lines().next(), Some("User-agent: *"));
        assert_eq!(body.lines().nth(1), Some("Allow: /"));
        assert!(body.lines().nth(3).unwrap().starts_with("Sitemap: "));
    }

    #[test]
    fn test_malformed_origin_never_reaches_the_responder() {
        let origin = "not a url".parse::<crate::SiteOrigin>();
        assert!(origin.is_err());
    }
}
