//! HTML rendering.
//!
//! Pages are assembled from small string-building functions. Every piece of
//! content interpolated into markup goes through [`escape`]; markdown is
//! rendered server-side by [`markdown::render`].

pub mod conference;
pub mod markdown;
pub mod site;

use std::fmt::Write;

const PICO_CSS: &str = "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
const HTMX_JS: &str = "https://unpkg.com/htmx.org@2.0.3/dist/htmx.min.js";
const HIGHLIGHT_BASE: &str = "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0";
const HIGHLIGHT_LANGUAGES: [&str; 4] = ["python", "javascript", "html", "css"];

/// Which nav entry is highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPage {
    Home,
    Blog,
    Projects,
    Conference,
}

/// Escape text for use in HTML content and double- or single-quoted
/// attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Site navigation bar.
///
/// The ACR24 entry only appears when the conference explorer is enabled.
pub fn nav_menu(active: NavPage, conference: bool) -> String {
    let mut entries = vec![
        ("Home", "/", NavPage::Home),
        ("Blog", "/blog", NavPage::Blog),
        ("Projects", "/projects", NavPage::Projects),
    ];
    if conference {
        entries.push(("ACR24", "/acr24", NavPage::Conference));
    }

    let mut nav = String::from("<nav>");
    for (label, href, page) in entries {
        let class = if page == active { "active" } else { "" };
        let _ = write!(nav, r#"<a href="{}" class="{}">{}</a>"#, href, class, label);
    }
    nav.push_str("</nav>");
    nav
}

/// Full HTML document around `body`.
pub fn layout(title: &str, body: &str) -> String {
    let mut head = String::new();
    let _ = write!(
        head,
        concat!(
            r#"<meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            r#"<title>{title}</title>"#,
            r#"<link rel="stylesheet" href="{pico}">"#,
            r#"<link rel="stylesheet" href="/static/css/style.css">"#,
            r#"<script src="{htmx}"></script>"#,
            r#"<link rel="stylesheet" href="{hl}/styles/atom-one-dark.min.css">"#,
            r#"<script src="{hl}/highlight.min.js"></script>"#,
        ),
        title = escape(title),
        pico = PICO_CSS,
        htmx = HTMX_JS,
        hl = HIGHLIGHT_BASE,
    );
    for language in HIGHLIGHT_LANGUAGES {
        let _ = write!(
            head,
            r#"<script src="{}/languages/{}.min.js"></script>"#,
            HIGHLIGHT_BASE, language
        );
    }
    head.push_str(concat!(
        "<script>",
        "document.addEventListener('DOMContentLoaded', () => hljs.highlightAll());",
        "document.addEventListener('htmx:afterSwap', () => hljs.highlightAll());",
        "</script>"
    ));

    format!(
        "<!doctype html>\n<html lang=\"en\"><head>{}</head><body>{}</body></html>",
        head, body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_nav_menu_active_and_conference() {
        let nav = nav_menu(NavPage::Blog, false);
        assert!(nav.contains(r#"<a href="/blog" class="active">Blog</a>"#));
        assert!(nav.contains(r#"<a href="/" class="">Home</a>"#));
        assert!(!nav.contains("ACR24"));

        let nav = nav_menu(NavPage::Conference, true);
        assert!(nav.contains(r#"<a href="/acr24" class="active">ACR24</a>"#));
    }

    #[test]
    fn test_layout_escapes_title() {
        let page = layout("A <b> title", "<main></main>");
        assert!(page.starts_with("<!doctype html>"));
        assert!(page.contains("<title>A &lt;b&gt; title</title>"));
        assert!(page.contains("/static/css/style.css"));
        assert!(page.contains("languages/python.min.js"));
        assert!(page.contains("<body><main></main></body>"));
    }
}
