use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::content::Page;
use crate::markdown::markdown_to_html;
use crate::origin::SiteOrigin;

pub struct BaseRenderContext<'a> {
    pub(crate) config: &'a SiteConfig,
    pub(crate) origin: &'a SiteOrigin,
    pub(crate) pages: &'a HashMap<PathBuf, Page>,
}

impl<'a> BaseRenderContext<'a> {
    pub fn config(&self) -> &'a SiteConfig {
        self.config
    }

    pub fn origin(&self) -> &'a SiteOrigin {
        self.origin
    }

    /// Renders the provided Markdown text.
    pub fn render_markdown(&self, text: &str) -> String {
        markdown_to_html(text)
    }

    /// All publishable pages, in no particular order. Drafts are excluded
    /// here just as they are from the rendered output.
    pub fn pages(&self) -> impl Iterator<Item = PageToRender<'a>> + '_ {
        self.pages
            .values()
            .filter(|page| !page.meta.draft)
            .map(PageToRender::from_page)
    }
}

pub struct RenderIndexContext<'a> {
    pub base: BaseRenderContext<'a>,

    /// The most recent posts, newest first, capped at the configured
    /// `posts_on_homepage`.
    pub posts: Vec<PageToRender<'a>>,
}

pub struct RenderPageContext<'a> {
    pub base: BaseRenderContext<'a>,
    pub page: PageToRender<'a>,
}

pub struct PageToRender<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub date: Option<&'a str>,
    pub updated: Option<&'a str>,
    pub slug: &'a str,
    pub path: &'a str,
    pub permalink: &'a str,
    pub raw_content: &'a str,
}

impl<'a> PageToRender<'a> {
    pub fn from_page(page: &'a Page) -> Self {
        Self {
            title: page.meta.title.as_deref(),
            description: page.meta.description.as_deref(),
            date: page.meta.date.as_deref(),
            updated: page.meta.updated.as_deref(),
            slug: &page.slug,
            path: page.path.as_str(),
            permalink: page.permalink.as_str(),
            raw_content: &page.raw_content,
        }
    }

    pub fn content(&self) -> String {
        markdown_to_html(self.raw_content)
    }
}
