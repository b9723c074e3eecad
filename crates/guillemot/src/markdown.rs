use pulldown_cmark::{html, Event, Options, Parser, Tag};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Renders the provided Markdown text to HTML.
pub fn markdown_to_html(text: &str) -> String {
    let parser = Parser::new_ext(text, options());

    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);

    rendered
}

/// Extracts the plain text from the provided Markdown text.
///
/// Used to build the search index, where markup is just noise.
pub fn plain_text(text: &str) -> String {
    let parser = Parser::new_ext(text, options());

    let mut plain = String::new();

    for event in parser {
        match event {
            Event::Text(text) | Event::Code(text) => plain.push_str(&text),
            Event::SoftBreak | Event::HardBreak => plain.push(' '),
            Event::End(Tag::Paragraph | Tag::Heading(..) | Tag::Item) => plain.push(' '),
            _ => {}
        }
    }

    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}
