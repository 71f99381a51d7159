//! Conference abstract explorer pages and htmx fragments.

use std::fmt::Write;

use serde_json::json;

use super::{escape, layout, markdown, nav_menu, NavPage};
use crate::config::SiteIdentity;
use crate::models::{SimilarAbstract, TopicSummary};
use crate::query::{KeywordMatches, ResultLimit, DEFAULT_RESULT_LIMIT};

/// Characters of abstract text shown per search result.
pub const SEARCH_EXCERPT_CHARS: usize = 300;

/// Characters of abstract text shown per similar abstract.
pub const SIMILAR_EXCERPT_CHARS: usize = 200;

const EXPLORER_STYLE: &str = r#"<style>
.tabs { margin-bottom: 2rem; list-style: none; padding: 0; }
.tabs li { display: inline-block; margin-right: 1rem; }
.tabs a { display: inline-block; padding: 0.5rem 1rem; text-decoration: none; border: 1px solid transparent; border-bottom: none; margin-bottom: -1px; }
[data-section] { display: none; }
[data-section].active { display: block; }
.view-toggle { margin-bottom: 1rem; }
.view-toggle button { margin-right: 0.5rem; }
.view-toggle button.active { background: #4a5568; color: white; }
.modal-overlay { display: none; position: fixed; inset: 0; background: rgba(0, 0, 0, 0.5); z-index: 10; overflow-y: auto; }
.modal { position: relative; max-width: 50rem; margin: 3rem auto; padding: 1.5rem; background: var(--pico-background-color, white); border-radius: 0.5rem; }
.modal-close { position: absolute; top: 0.5rem; right: 0.5rem; width: auto; }
</style>"#;

const TAB_SCRIPT: &str = r#"<script>
document.addEventListener('DOMContentLoaded', function() {
    const tabLinks = document.querySelectorAll('a[data-tab]');
    const sections = document.querySelectorAll('[data-section]');

    function switchTab(targetTab) {
        tabLinks.forEach(link => {
            link.classList.toggle('active', link.dataset.tab === targetTab);
        });
        sections.forEach(section => {
            section.classList.toggle('active', section.dataset.section === targetTab);
        });
    }

    tabLinks.forEach(link => {
        link.addEventListener('click', (e) => {
            e.preventDefault();
            switchTab(link.dataset.tab);
        });
    });

    switchTab('summaries');
});
</script>"#;

const MODAL_SCRIPT: &str = r#"<script>
function showModal(abstractNumber) {
    fetch('/acr24/similar/' + encodeURIComponent(abstractNumber))
        .then(response => response.text())
        .then(html => {
            document.getElementById('modal-content').innerHTML = html;
            document.getElementById('modal-overlay').style.display = 'block';
        });
}

function closeModal() {
    document.getElementById('modal-overlay').style.display = 'none';
}

document.getElementById('modal-overlay').addEventListener('click', function(e) {
    if (e.target === this) {
        closeModal();
    }
});
</script>"#;

/// The explorer page: summaries, search and embeddings plot tabs.
///
/// `data_url` is the URL prefix the conference data directory is served
/// under, e.g. `/data/acr/2024`.
pub fn explorer(site: &SiteIdentity, summaries: &[TopicSummary], data_url: &str) -> String {
    let data_url = escape(data_url.trim_end_matches('/'));

    let tabs = concat!(
        r#"<nav><ul class="tabs" style="margin-bottom: 0">"#,
        r##"<li><a href="#" data-tab="summaries" class="active">AI Summaries</a></li>"##,
        r##"<li><a href="#" data-tab="search">Search</a></li>"##,
        r##"<li><a href="#" data-tab="embeddings">Embeddings</a></li>"##,
        "</ul></nav>"
    );

    let mut summaries_section = format!(
        concat!(
            r#"<section id="summaries" data-section="summaries" class="active">"#,
            "<h2>AI-Generated Topic Summaries</h2>",
            r#"<a href="{}/summaries.pdf" class="button" style="margin-bottom: 1rem">Download as PDF</a>"#,
            "<div>"
        ),
        data_url
    );
    for summary in summaries {
        let _ = write!(
            summaries_section,
            r#"<article class="summary-card"><h3>{}</h3><div class="markdown">{}</div></article>"#,
            escape(&summary.topic),
            markdown::render_escaped(&summary.summary)
        );
    }
    summaries_section.push_str("</div></section>");

    let search_section = concat!(
        r#"<section id="search" data-section="search"><h2>Search Abstracts</h2>"#,
        r#"<form class="search-form" onsubmit="return false">"#,
        r#"<input type="search" name="q" placeholder="Search abstracts...""#,
        r#" hx-post="/acr24/search" hx-trigger="keyup changed delay:500ms""#,
        r##" hx-target="#search-results">"##,
        r#"</form><div id="search-results"></div></section>"#
    );

    let embeddings_section = format!(
        concat!(
            r#"<section id="embeddings" data-section="embeddings"><h2>Embeddings Plot</h2>"#,
            r#"<a href="{url}/embeddings.png"><img src="{url}/embeddings.png" alt="Embeddings TSNE Plot"></a>"#,
            "</section>"
        ),
        url = data_url
    );

    let modal = concat!(
        r#"<div id="modal-overlay" class="modal-overlay"><div class="modal">"#,
        r#"<button class="modal-close" onclick="closeModal()">×</button>"#,
        r#"<div id="modal-content"></div></div></div>"#
    );

    let body = format!(
        concat!(
            "<main>{nav}<div class=\"container\">",
            "<h1>ACR 2024</h1>{tabs}{summaries}{search}{embeddings}",
            "{style}{tab_script}</div>{modal}{modal_script}</main>"
        ),
        nav = nav_menu(NavPage::Conference, true),
        tabs = tabs,
        summaries = summaries_section,
        search = search_section,
        embeddings = embeddings_section,
        style = EXPLORER_STYLE,
        tab_script = TAB_SCRIPT,
        modal = modal,
        modal_script = MODAL_SCRIPT,
    );
    layout(&format!("ACR 2024 - {}", site.brand), &body)
}

/// A bare message fragment.
pub fn message(text: &str) -> String {
    format!("<div>{}</div>", escape(text))
}

/// An error fragment htmx swaps into the target.
pub fn error_message(text: &str) -> String {
    format!(r#"<div class="error">{}</div>"#, escape(text))
}

fn toggle_button(label: &str, query: &str, limit: ResultLimit, active: bool) -> String {
    let vals = json!({ "q": query, "limit": limit.to_string() }).to_string();
    format!(
        r##"<button hx-post="/acr24/search" hx-vals="{}" hx-target="#search-results"{}>{}</button>"##,
        escape(&vals),
        if active { r#" class="active""# } else { "" },
        label
    )
}

/// Keyword search results fragment.
pub fn search_results(query: &str, limit: ResultLimit, matches: &KeywordMatches<'_>) -> String {
    if matches.total == 0 {
        return "<div><p>No matching abstracts found</p></div>".to_string();
    }

    let mut out = format!(
        concat!(
            r#"<div><div class="view-toggle">{}{}</div>"#,
            "<p>Found {} matching abstracts:</p>"
        ),
        toggle_button(
            &format!("Show First {}", DEFAULT_RESULT_LIMIT),
            query,
            ResultLimit::default(),
            limit == ResultLimit::default()
        ),
        toggle_button("Show All", query, ResultLimit::All, limit == ResultLimit::All),
        matches.total
    );

    for record in &matches.shown {
        let number = serde_json::Value::String(record.abstract_number.clone()).to_string();
        let _ = write!(
            out,
            concat!(
                r#"<article class="abstract-result"><h5><a href="{}">{}</a></h5><p>{}</p>"#,
                r#"<button class="button similar-button" onclick="showModal({})">Find Similar</button>"#,
                "</article>"
            ),
            escape(&record.link),
            escape(&record.title),
            escape(&record.excerpt(SEARCH_EXCERPT_CHARS)),
            escape(&number)
        );
    }
    out.push_str("</div>");
    out
}

/// Similar abstracts fragment.
pub fn similar_abstracts(similar: &[SimilarAbstract]) -> String {
    if similar.is_empty() {
        return "<div><h2>Similar Abstracts</h2><p>No similar abstracts found</p></div>".to_string();
    }

    let mut out = String::from(r#"<div><h2>Similar Abstracts</h2><ul class="similar-list">"#);
    for item in similar {
        let record = &item.record;
        let _ = write!(
            out,
            concat!(
                r#"<li class="similar-abstract"><h3><a href="{}">{}</a></h3>"#,
                "<p>Topic: {}</p>",
                r#"<div class="markdown">{}</div>"#,
                r#"<p class="relevance">Similarity {:.3} ({})</p></li>"#
            ),
            escape(&record.link),
            escape(&record.title),
            escape(&record.topic),
            markdown::render_escaped(&record.excerpt(SIMILAR_EXCERPT_CHARS)),
            item.score,
            item.relevance
        );
    }
    out.push_str("</ul></div>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Abstract;

    fn record(number: &str, title: &str) -> Abstract {
        Abstract {
            slug: String::new(),
            abstract_number: number.to_string(),
            title: title.to_string(),
            body: "x".repeat(400),
            link: format!("https://acr.example/{}", number),
            topic: "Gout".to_string(),
        }
    }

    #[test]
    fn test_explorer_page() {
        let summaries = vec![TopicSummary {
            topic: "Gout & Crystal".to_string(),
            summary: "**Key** finding".to_string(),
        }];
        let page = explorer(&SiteIdentity::default(), &summaries, "/data/acr/2024/");
        assert!(page.contains("<title>ACR 2024 - RheumAI</title>"));
        assert!(page.contains("<h3>Gout &amp; Crystal</h3>"));
        assert!(page.contains("<strong>Key</strong>"));
        assert!(page.contains(r#"href="/data/acr/2024/summaries.pdf""#));
        assert!(page.contains(r#"src="/data/acr/2024/embeddings.png""#));
        assert!(page.contains(r#"hx-post="/acr24/search""#));
        assert!(page.contains(r#"id="modal-overlay""#));
    }

    #[test]
    fn test_search_results_no_match() {
        let matches = KeywordMatches {
            total: 0,
            shown: Vec::new(),
        };
        assert_eq!(
            search_results("zzz", ResultLimit::default(), &matches),
            "<div><p>No matching abstracts found</p></div>"
        );
    }

    #[test]
    fn test_search_results_cards() {
        let a = record("0012", "Gout <trial>");
        let matches = KeywordMatches {
            total: 25,
            shown: vec![&a],
        };
        let html = search_results("gout", ResultLimit::default(), &matches);

        assert!(html.contains("<p>Found 25 matching abstracts:</p>"));
        assert!(html.contains(r#"<a href="https://acr.example/0012">Gout &lt;trial&gt;</a>"#));
        assert!(html.contains(&format!("<p>{}...</p>", "x".repeat(300))));
        assert!(html.contains(r#"onclick="showModal(&quot;0012&quot;)""#));
        assert!(html.contains(
            r#"hx-vals="{&quot;q&quot;:&quot;gout&quot;,&quot;limit&quot;:&quot;all&quot;}""#
        ));
        assert!(html.contains(r#"class="active">Show First 10</button>"#));

        let wider = search_results("gout", ResultLimit::First(25), &matches);
        assert!(!wider.contains(r#"class="active">Show First 10</button>"#));
        assert!(!wider.contains(r#"class="active">Show All</button>"#));

        let all = search_results("gout", ResultLimit::All, &matches);
        assert!(all.contains(r#"class="active">Show All</button>"#));
        assert!(!all.contains(r#"class="active">Show First 10</button>"#));
    }

    #[test]
    fn test_similar_fragment() {
        let similar = vec![SimilarAbstract::new(record("7", "Neighbour"), 0.9)];
        let html = similar_abstracts(&similar);
        assert!(html.contains("<h2>Similar Abstracts</h2>"));
        assert!(html.contains("<p>Topic: Gout</p>"));
        assert!(html.contains("Similarity 0.900 (highly similar)"));
        assert!(html.contains(&format!("{}...", "x".repeat(200))));
        assert!(!html.contains(&"x".repeat(201)));

        assert!(similar_abstracts(&[]).contains("No similar abstracts found"));

        let mut hostile = record("8", "Scraped");
        hostile.body = "Results <iframe src=evil></iframe> improved".to_string();
        let html = similar_abstracts(&[SimilarAbstract::new(hostile, 0.5)]);
        assert!(!html.contains("<iframe"));
        assert!(html.contains("&lt;iframe src=evil&gt;"));
    }

    #[test]
    fn test_messages_escape() {
        assert_eq!(message("a < b"), "<div>a &lt; b</div>");
        assert_eq!(
            error_message("Abstract not found"),
            r#"<div class="error">Abstract not found</div>"#
        );
    }
}
