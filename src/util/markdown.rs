use pulldown_cmark::{html, Event, Options, Parser};

/// Render generated markdown to HTML. Raw HTML in the source is escaped as text since
/// post bodies come from a model, not from an editor.
pub fn render_markdown(input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(input, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(input.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
