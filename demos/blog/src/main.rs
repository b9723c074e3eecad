use anyhow::Result;
use clap::Parser;
use guillemot::render::{RenderIndexContext, RenderPageContext};
use guillemot::Site;

#[derive(Parser)]
#[command(name = "blog")]
struct Args {
    /// Serve the site locally, rebuilding on changes.
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut site = Site::builder()
        .root("demos/blog")
        .templates(index_template, page_template)
        .with_sass("sass")
        .build()?;

    site.load()?;

    if args.serve {
        site.serve().await?;
    } else {
        site.render()?;
        println!("Site rendered to {:?}", site.root_path().join("public"));
    }

    Ok(())
}

fn index_template(ctx: &RenderIndexContext) -> String {
    let config = ctx.base.config();

    let posts = ctx
        .posts
        .iter()
        .map(|post| {
            format!(
                r#"<li><a href="{}">{}</a>{}</li>"#,
                post.permalink,
                post.title.unwrap_or(post.slug),
                post.date
                    .map(|date| format!(" <time>{date}</time>"))
                    .unwrap_or_default()
            )
        })
        .collect::<String>();

    let socials = config
        .socials
        .iter()
        .map(|social| format!(r#"<a href="{}">{}</a>"#, social.href, social.name))
        .collect::<Vec<_>>()
        .join(" · ");

    page_shell(
        &config.title,
        &format!(
            "<h1>{}</h1><p>{}</p><ul>{posts}</ul><footer>{socials}</footer>",
            config.title, config.description
        ),
    )
}

fn page_template(ctx: &RenderPageContext) -> String {
    let title = ctx.page.title.unwrap_or(ctx.page.slug);

    page_shell(
        title,
        &format!(
            "<article><h1>{title}</h1>{}</article>",
            ctx.page.content()
        ),
    )
}

fn page_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="/style.css">
</head>
<body>{body}</body>
</html>
"#
    )
}
