use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use once_cell::sync::Lazy;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc::unbounded_channel;
use walkdir::WalkDir;

use crate::config::{LoadConfigError, SiteConfig};
use crate::content::{Page, ParsePageError};
use crate::origin::{ConfigurationError, SiteOrigin};
use crate::permalink::Permalink;
use crate::render::{BaseRenderContext, PageToRender, RenderIndexContext, RenderPageContext};
use crate::robots::RobotsDocument;
use crate::search::{search_index_json, SearchDocument};
use crate::sitemap::{exclude_path_prefixes, sitemap_xml, SitemapEntry, SitemapFilter};
use crate::storage::{DiskStorage, InMemoryStorage, Store};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub enum TemplateKey {
    Default,
    Custom(String),
}

pub type RenderIndex = Arc<dyn Fn(&RenderIndexContext) -> String + Send + Sync>;

pub type RenderPage = Arc<dyn Fn(&RenderPageContext) -> String + Send + Sync>;

struct Templates {
    pub index: RenderIndex,
    pub page: HashMap<TemplateKey, RenderPage>,
}

#[derive(Error, Debug)]
pub enum LoadSiteError {
    #[error("failed to walk content directory: {0}")]
    Io(#[from] walkdir::Error),

    #[error("failed to load site config: {0}")]
    Config(#[from] LoadConfigError),

    #[error("invalid site configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("failed to parse page: {0}")]
    ParsePage(#[from] ParsePageError),
}

#[derive(Error, Debug)]
pub enum RenderSiteError {
    #[error("template not found: {0:?}")]
    TemplateNotFound(TemplateKey),

    #[error("failed to compile styles: {0}")]
    Styles(String),

    #[error("failed to serialize search index: {0}")]
    SearchIndex(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Error, Debug)]
pub enum ServeSiteError {
    #[error("async IO error: {0}")]
    AsyncIo(#[from] tokio::io::Error),

    #[error("failed to render site: {0}")]
    Render(#[from] RenderSiteError),

    #[error("failed to watch site files: {0}")]
    Watch(#[from] notify::Error),
}

static SITE_CONTENT: Lazy<Arc<RwLock<HashMap<String, String>>>> =
    Lazy::new(|| Arc::new(RwLock::new(HashMap::new())));

struct BuildSiteParams {
    root_path: PathBuf,
    sass_path: Option<PathBuf>,
    templates: Templates,
    sitemap_filter: Option<SitemapFilter>,
}

pub struct Site {
    root_path: PathBuf,
    content_path: PathBuf,
    sass_path: Option<PathBuf>,
    output_path: PathBuf,
    config: SiteConfig,
    origin: SiteOrigin,
    templates: Templates,
    sitemap_filter: SitemapFilter,
    pages: HashMap<PathBuf, Page>,
    is_serving: bool,
}

impl Site {
    pub fn builder() -> SiteBuilder<()> {
        SiteBuilder::new()
    }

    fn from_params(params: BuildSiteParams) -> Result<Self, LoadSiteError> {
        let root_path = params.root_path;

        let config = SiteConfig::from_path(root_path.join("site.toml"))?;
        let origin = config.origin()?;

        let sitemap_filter = params
            .sitemap_filter
            .unwrap_or_else(|| exclude_path_prefixes(config.sitemap.exclude_prefixes.clone()));

        Ok(Site {
            content_path: root_path.join("content"),
            sass_path: params.sass_path.map(|sass_path| root_path.join(sass_path)),
            output_path: root_path.join("public"),
            root_path,
            config,
            origin,
            templates: params.templates,
            sitemap_filter,
            pages: HashMap::new(),
            is_serving: false,
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn origin(&self) -> &SiteOrigin {
        &self.origin
    }

    pub fn load(&mut self) -> Result<(), LoadSiteError> {
        let walker = WalkDir::new(&self.content_path)
            .follow_links(true)
            .into_iter();

        self.pages.clear();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }

            let Some(filename) = entry.file_name().to_str() else {
                continue;
            };

            if !filename.ends_with(".md") || filename.starts_with('.') {
                continue;
            }

            let page = Page::from_path(&self.origin, &self.content_path, path)?;

            self.pages.insert(page.file_path.clone(), page);
        }

        Ok(())
    }

    pub fn render(&mut self) -> Result<(), RenderSiteError> {
        if self.is_serving {
            self.render_to(InMemoryStorage::new(SITE_CONTENT.clone()))
        } else {
            self.render_to(DiskStorage::new(self.output_path.clone()))
        }
    }

    fn render_to(&mut self, storage: impl Store) -> Result<(), RenderSiteError> {
        let index_ctx = RenderIndexContext {
            base: BaseRenderContext {
                config: &self.config,
                origin: &self.origin,
                pages: &self.pages,
            },
            posts: self
                .recent_posts()
                .into_iter()
                .map(PageToRender::from_page)
                .collect(),
        };

        let rendered = (self.templates.index)(&index_ctx);

        storage
            .store_static_file(Path::new("index.html"), rendered)
            .map_err(|err| RenderSiteError::Storage(err.to_string()))?;

        for page in self.pages.values().filter(|page| !page.meta.draft) {
            let template_name = page
                .meta
                .template
                .clone()
                .map(TemplateKey::Custom)
                .unwrap_or(TemplateKey::Default);

            let page_template = self
                .templates
                .page
                .get(&template_name)
                .ok_or_else(|| RenderSiteError::TemplateNotFound(template_name))?;

            let ctx = RenderPageContext {
                base: BaseRenderContext {
                    config: &self.config,
                    origin: &self.origin,
                    pages: &self.pages,
                },
                page: PageToRender::from_page(page),
            };

            let rendered = page_template(&ctx);

            storage
                .store_rendered_page(page, rendered)
                .map_err(|err| RenderSiteError::Storage(err.to_string()))?;
        }

        if let Some(sass_path) = self.sass_path.as_ref() {
            fn is_sass(entry: &walkdir::DirEntry) -> bool {
                entry
                    .path()
                    .extension()
                    .and_then(|extension| extension.to_str())
                    .map(|extension| extension == "sass" || extension == "scss")
                    .unwrap_or(false)
            }

            fn is_partial(entry: &walkdir::DirEntry) -> bool {
                entry
                    .file_name()
                    .to_str()
                    .map(|filename| filename.starts_with('_'))
                    .unwrap_or(false)
            }

            let sass_files = WalkDir::new(sass_path)
                .into_iter()
                .filter_entry(|entry| !is_partial(entry))
                .filter_map(|entry| entry.ok())
                .filter(is_sass)
                .map(|entry| entry.into_path())
                .collect::<Vec<_>>();

            let options = grass::Options::default().style(grass::OutputStyle::Compressed);

            for file in sass_files {
                let css = grass::from_path(&file, &options)
                    .map_err(|err| RenderSiteError::Styles(err.to_string()))?;
                let path = file.strip_prefix(sass_path).unwrap_or(&file);

                storage
                    .store_css(&path.with_extension("css"), css)
                    .map_err(|err| RenderSiteError::Storage(err.to_string()))?;
            }
        }

        if self.config.integrations.sitemap {
            let mut entries = HashSet::new();

            entries.insert(SitemapEntry {
                permalink: Permalink::from_path(&self.origin, "/"),
                updated_at: None,
            });

            for page in self.pages.values().filter(|page| !page.meta.draft) {
                entries.insert(SitemapEntry {
                    permalink: page.permalink.clone(),
                    updated_at: page
                        .meta
                        .updated
                        .as_ref()
                        .or(page.meta.date.as_ref())
                        .cloned(),
                });
            }

            let entries = entries
                .into_iter()
                .filter(|entry| (self.sitemap_filter)(&entry.permalink))
                .collect::<Vec<_>>();

            storage
                .store_static_file(Path::new("sitemap.xml"), sitemap_xml(entries))
                .map_err(|err| RenderSiteError::Storage(err.to_string()))?;
        }

        if self.config.integrations.robots {
            let robots = RobotsDocument::new(&self.origin);

            storage
                .store_static_file(Path::new("robots.txt"), robots.into_body())
                .map_err(|err| RenderSiteError::Storage(err.to_string()))?;
        }

        if self.config.integrations.search {
            let documents = self
                .pages
                .values()
                .filter(|page| !page.meta.draft)
                .map(SearchDocument::from_page)
                .collect::<Vec<_>>();

            storage
                .store_static_file(
                    Path::new("search-index.json"),
                    search_index_json(&documents)?,
                )
                .map_err(|err| RenderSiteError::Storage(err.to_string()))?;
        }

        Ok(())
    }

    fn recent_posts(&self) -> Vec<&Page> {
        let mut posts = self
            .pages
            .values()
            .filter(|page| !page.meta.draft && page.meta.date.is_some())
            .collect::<Vec<_>>();

        posts.sort_by(|a, b| {
            b.meta
                .date
                .cmp(&a.meta.date)
                .then_with(|| a.permalink.cmp(&b.permalink))
        });
        posts.truncate(self.config.posts_on_homepage);

        posts
    }

    pub async fn serve(self) -> Result<(), ServeSiteError> {
        let addr = SocketAddr::from(([127, 0, 0, 1], 3000));

        let listener = TcpListener::bind(addr).await?;

        fn empty() -> BoxBody<Bytes, hyper::Error> {
            Empty::<Bytes>::new()
                .map_err(|never| match never {})
                .boxed()
        }

        fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, hyper::Error> {
            Full::new(chunk.into())
                .map_err(|never| match never {})
                .boxed()
        }

        async fn handle_request(
            req: Request<hyper::body::Incoming>,
        ) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible> {
            match (req.method(), req.uri().path()) {
                (&Method::GET, path) => {
                    let key = if path == "/" { "/index.html" } else { path };

                    if let Some(content) = SITE_CONTENT.read().unwrap().get(key) {
                        let content_type =
                            mime_guess::from_path(key).first_raw().unwrap_or("text/html");

                        return Ok(Response::builder()
                            .header(header::CONTENT_TYPE, content_type)
                            .status(StatusCode::OK)
                            .body(full(content.to_owned()))
                            .unwrap());
                    }

                    let mut not_found = Response::new(empty());
                    *not_found.status_mut() = StatusCode::NOT_FOUND;
                    Ok(not_found)
                }
                _ => {
                    let mut not_found = Response::new(empty());
                    *not_found.status_mut() = StatusCode::NOT_FOUND;
                    Ok(not_found)
                }
            }
        }

        let mut site = self;
        site.is_serving = true;
        site.render()?;

        let site = Arc::new(RwLock::new(site));

        let (watcher_tx, mut watcher_rx) = unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                if let Ok(event) = result {
                    watcher_tx.send(event).ok();
                }
            },
            notify::Config::default(),
        )?;

        watcher.watch(
            &site.read().unwrap().content_path,
            RecursiveMode::Recursive,
        )?;

        if let Some(sass_path) = site.read().unwrap().sass_path.as_ref() {
            watcher.watch(sass_path, RecursiveMode::Recursive)?;
        }

        println!("Serving site at http://{addr}");

        tokio::task::spawn(async move {
            use notify::EventKind;

            loop {
                let Some(event) = watcher_rx.recv().await else {
                    continue;
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                        let mut site = site.write().unwrap();

                        if let Err(err) = site.load() {
                            eprintln!("failed to reload site: {err}");
                            continue;
                        }

                        if let Err(err) = site.render() {
                            eprintln!("failed to render site: {err}");
                        }
                    }
                    _ => {}
                }
            }
        });

        loop {
            let (stream, _) = listener.accept().await?;

            let io = TokioIo::new(stream);

            tokio::task::spawn(async move {
                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, service_fn(handle_request))
                    .await
                {
                    eprintln!("Error serving connection: {err:?}");
                }
            });
        }
    }
}

pub struct SiteBuilder<T> {
    state: T,
}

impl SiteBuilder<()> {
    pub fn new() -> Self {
        Self { state: () }
    }

    pub fn root(self, root_path: impl AsRef<Path>) -> SiteBuilder<WithRootPath> {
        SiteBuilder {
            state: WithRootPath {
                root_path: root_path.as_ref().to_owned(),
            },
        }
    }
}

pub struct WithRootPath {
    root_path: PathBuf,
}

impl SiteBuilder<WithRootPath> {
    pub fn templates(
        self,
        index: impl Fn(&RenderIndexContext) -> String + Send + Sync + 'static,
        page: impl Fn(&RenderPageContext) -> String + Send + Sync + 'static,
    ) -> SiteBuilder<WithTemplates> {
        SiteBuilder {
            state: WithTemplates {
                with_root_path: self.state,
                templates: Templates {
                    index: Arc::new(index),
                    page: HashMap::from_iter([(
                        TemplateKey::Default,
                        Arc::new(page) as RenderPage,
                    )]),
                },
                sass_path: None,
                sitemap_filter: None,
            },
        }
    }
}

pub struct WithTemplates {
    with_root_path: WithRootPath,
    templates: Templates,
    sass_path: Option<PathBuf>,
    sitemap_filter: Option<SitemapFilter>,
}

impl SiteBuilder<WithTemplates> {
    pub fn add_page_template(
        mut self,
        name: impl Into<String>,
        template: impl Fn(&RenderPageContext) -> String + Send + Sync + 'static,
    ) -> Self {
        self.state
            .templates
            .page
            .insert(TemplateKey::Custom(name.into()), Arc::new(template));
        self
    }

    pub fn with_sass(mut self, sass_path: impl AsRef<Path>) -> Self {
        self.state.sass_path = Some(sass_path.as_ref().to_owned());
        self
    }

    /// Overrides the sitemap filter built from `[sitemap] exclude_prefixes`.
    pub fn sitemap_filter(
        mut self,
        filter: impl Fn(&Permalink) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.state.sitemap_filter = Some(Arc::new(filter));
        self
    }

    pub fn build(self) -> Result<Site, LoadSiteError> {
        Site::from_params(BuildSiteParams {
            root_path: self.state.with_root_path.root_path,
            sass_path: self.state.sass_path,
            templates: self.state.templates,
            sitemap_filter: self.state.sitemap_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    fn index_template(_ctx: &RenderIndexContext) -> String {
        "<index>".to_string()
    }

    fn page_template(ctx: &RenderPageContext) -> String {
        ctx.page.content()
    }

    fn make_site(config: &str, documents: &[(&str, &str)]) -> Site {
        let config: SiteConfig = toml::from_str(config).unwrap();
        let origin = config.origin().unwrap();
        let sitemap_filter = exclude_path_prefixes(config.sitemap.exclude_prefixes.clone());

        let mut pages = HashMap::new();
        for (filepath, text) in documents {
            let page = Page::parse(&origin, text, "test-site/content", Path::new(filepath)).unwrap();
            pages.insert(page.file_path.clone(), page);
        }

        Site {
            root_path: PathBuf::from("test-site"),
            content_path: PathBuf::from("test-site/content"),
            sass_path: None,
            output_path: PathBuf::from("test-site/public"),
            config,
            origin,
            templates: Templates {
                index: Arc::new(index_template),
                page: HashMap::from_iter([(
                    TemplateKey::Default,
                    Arc::new(page_template) as RenderPage,
                )]),
            },
            sitemap_filter,
            pages,
            is_serving: false,
        }
    }

    fn render_to_memory(site: &mut Site) -> HashMap<String, String> {
        let contents = Arc::new(RwLock::new(HashMap::new()));

        site.render_to(InMemoryStorage::new(contents.clone()))
            .unwrap();

        let contents = contents.read().unwrap();
        contents.clone()
    }

    const PUBLISHED_PAGE: &str = indoc! {r#"
        +++
        title = "Hello, world!"
        date = 2024-01-02
        +++

        Welcome to the blog.
    "#};

    const DRAFT_PAGE: &str = indoc! {r#"
        +++
        title = "Work in progress"
        date = 2024-02-03
        draft = true
        +++

        Not ready yet.
    "#};

    #[test]
    fn test_render_excludes_drafts() {
        let mut site = make_site(
            indoc! {r#"
                base_url = "https://example.com"
                title = "Example"
            "#},
            &[
                ("test-site/content/post/hello-world.md", PUBLISHED_PAGE),
                ("test-site/content/post/work-in-progress.md", DRAFT_PAGE),
            ],
        );

        let output = render_to_memory(&mut site);

        assert!(output.contains_key("/post/hello-world/"));
        assert!(!output.contains_key("/post/work-in-progress/"));

        let sitemap = output.get("/sitemap.xml").unwrap();
        assert!(sitemap.contains("https://example.com/post/hello-world/"));
        assert!(!sitemap.contains("work-in-progress"));

        let search_index = output.get("/search-index.json").unwrap();
        assert!(search_index.contains("Hello, world!"));
        assert!(!search_index.contains("Work in progress"));
    }

    #[test]
    fn test_render_stores_crawler_documents() {
        let mut site = make_site(
            indoc! {r#"
                base_url = "https://example.com"
                title = "Example"
            "#},
            &[("test-site/content/post/hello-world.md", PUBLISHED_PAGE)],
        );

        let output = render_to_memory(&mut site);

        assert_eq!(
            output.get("/robots.txt").map(String::as_str),
            Some(indoc! {"
                User-agent: *
                Allow: /

                Sitemap: https://example.com/sitemap.xml
            "})
        );
        assert!(output.contains_key("/sitemap.xml"));
        assert!(output.contains_key("/search-index.json"));
        assert!(output.contains_key("/index.html"));
    }

    #[test]
    fn test_render_with_integrations_disabled() {
        let mut site = make_site(
            indoc! {r#"
                base_url = "https://example.com"
                title = "Example"

                [integrations]
                sitemap = false
                robots = false
                search = false
            "#},
            &[("test-site/content/post/hello-world.md", PUBLISHED_PAGE)],
        );

        let output = render_to_memory(&mut site);

        assert!(output.contains_key("/index.html"));
        assert!(output.contains_key("/post/hello-world/"));
        assert!(!output.contains_key("/robots.txt"));
        assert!(!output.contains_key("/sitemap.xml"));
        assert!(!output.contains_key("/search-index.json"));
    }

    #[test]
    fn test_render_applies_the_sitemap_filter() {
        let mut site = make_site(
            indoc! {r#"
                base_url = "https://example.com"
                title = "Example"

                [sitemap]
                exclude_prefixes = ["/post/"]
            "#},
            &[
                ("test-site/content/post/hello-world.md", PUBLISHED_PAGE),
                ("test-site/content/notes/reading-list.md", PUBLISHED_PAGE),
            ],
        );

        let output = render_to_memory(&mut site);

        let sitemap = output.get("/sitemap.xml").unwrap();
        assert!(sitemap.contains("https://example.com/notes/reading-list/"));
        assert!(!sitemap.contains("https://example.com/post/hello-world/"));
    }
}
