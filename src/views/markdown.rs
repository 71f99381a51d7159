//! Markdown to HTML rendering.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render CommonMark (with tables, footnotes, strikethrough and task lists)
/// to an HTML fragment.
///
/// Raw HTML in the source is passed through. Only use this for the site
/// owner's own posts; third-party text goes through [`render_escaped`].
pub fn render(text: &str) -> String {
    let parser = Parser::new_ext(text, options());
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render markdown from outside sources (conference abstracts, generated
/// summaries).
///
/// Raw HTML is emitted as escaped text and `javascript:` link targets are
/// replaced with `#`.
pub fn render_escaped(text: &str) -> String {
    let parser = Parser::new_ext(text, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if is_script_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn is_script_url(url: &str) -> bool {
    url.trim_start()
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_escaped_neutralizes_html() {
        let html = render_escaped("Gout <img src=x onerror=alert(1)> **trial**");
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(!html.contains("<img"));
        assert!(html.contains("<strong>trial</strong>"));

        let html = render_escaped("<script>alert(1)</script>\n\ntext");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));

        let html = render_escaped("[click](JavaScript:alert(1)) [ok](https://acr.example)");
        assert!(html.contains(r##"<a href="#">click</a>"##));
        assert!(html.contains(r#"<a href="https://acr.example">ok</a>"#));
    }

    #[test]
    fn test_render_keeps_owner_html() {
        assert!(render("<div class=\"note\">hi</div>").contains(r#"<div class="note">"#));
    }

    #[test]
    fn test_render_basic() {
        let html = render("# Title\n\nSome **bold** text.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_render_code_block_language() {
        let html = render("```python\nprint(1)\n```");
        assert!(html.contains("class=\"language-python\""));
    }

    #[test]
    fn test_render_table_and_strikethrough() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_render_image_path() {
        let html = render("![plot](/posts/images/plot.png)");
        assert!(html.contains("src=\"/posts/images/plot.png\""));
    }
}
