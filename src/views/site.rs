//! Home, blog and project pages.

use std::fmt::Write;

use super::{escape, layout, markdown, nav_menu, NavPage};
use crate::config::SiteIdentity;
use crate::models::{Post, PostContent, Project};

const POST_STYLE: &str = "<style>\
.blog-post img { max-width: 100%; height: auto; margin: 1em 0; }\
.blog-post .markdown { overflow-x: auto; }\
</style>";

/// Home page with the profile card.
pub fn home(site: &SiteIdentity, conference: bool) -> String {
    let body = format!(
        concat!(
            r#"<main class="container">{nav}<div class="profile">"#,
            r#"<img src="/media/me.jpeg" alt="Profile Photo">"#,
            "<h1>{owner}</h1><p>{tagline}</p><p>{mission}</p>",
            "</div></main>"
        ),
        nav = nav_menu(NavPage::Home, conference),
        owner = escape(&site.owner),
        tagline = escape(&site.tagline),
        mission = escape(&site.mission),
    );
    layout(&site.brand, &body)
}

/// Blog listing, posts in the order given.
pub fn blog(site: &SiteIdentity, conference: bool, posts: &[Post]) -> String {
    let mut body = format!(
        r#"<main>{}<div class="container"><h1>Blog Posts</h1>"#,
        nav_menu(NavPage::Blog, conference)
    );
    for post in posts {
        let _ = write!(
            body,
            r#"<div class="blog-post"><h2><a href="/post/{}">{}</a></h2><p class="date">{}</p></div>"#,
            escape(&post.slug),
            escape(&post.title),
            post.display_date()
        );
    }
    body.push_str("</div></main>");
    layout(&format!("Blog - {}", site.brand), &body)
}

/// "Find similar" hook appended to a post about a conference abstract.
pub struct SimilarHook<'a> {
    /// Abstract number to look up neighbours for
    pub abstract_number: &'a str,
}

/// A single rendered post.
pub fn post(conference: bool, content: &PostContent, similar: Option<SimilarHook<'_>>) -> String {
    let mut article = markdown::render(&content.body);
    if let Some(hook) = similar {
        let _ = write!(
            article,
            concat!(
                r#"<div id="similar-abstracts"></div>"#,
                r##"<button class="button" hx-get="/acr24/similar/{}" hx-target="#similar-abstracts">"##,
                "Find Similar Abstracts</button>"
            ),
            escape(&urlencoding::encode(hook.abstract_number))
        );
    }

    let body = format!(
        concat!(
            "{style}<main>{nav}",
            r#"<div class="blog-post container"><h1>{title}</h1>"#,
            r#"<div class="markdown">{article}</div></div></main>"#
        ),
        style = POST_STYLE,
        nav = nav_menu(NavPage::Blog, conference),
        title = escape(&content.title),
        article = article,
    );
    layout(&content.title, &body)
}

/// Projects listing.
pub fn projects(site: &SiteIdentity, conference: bool, projects: &[Project]) -> String {
    let mut body = format!(
        r#"<main>{}<div class="container"><h1>Projects</h1>"#,
        nav_menu(NavPage::Projects, conference)
    );
    for project in projects {
        let _ = write!(
            body,
            concat!(
                r#"<div class="blog-post"><h2>{}</h2><p>{}</p>"#,
                r#"<a href="{}" class="button">Visit Project</a></div>"#
            ),
            escape(&project.name),
            escape(&project.description),
            escape(&project.external_link)
        );
    }
    body.push_str("</div></main>");
    layout(&format!("Projects - {}", site.brand), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use std::path::PathBuf;

    #[test]
    fn test_home_page() {
        let page = home(&SiteIdentity::default(), true);
        assert!(page.contains("<title>RheumAI</title>"));
        assert!(page.contains("<h1>Dr. Chris McMaster</h1>"));
        assert!(page.contains("Using AI to improve healthcare"));
        assert!(page.contains(r#"<a href="/" class="active">Home</a>"#));
    }

    #[test]
    fn test_blog_listing() {
        let posts = vec![Post {
            slug: "first".to_string(),
            title: "First <Post>".to_string(),
            date: Local.with_ymd_and_hms(2024, 11, 17, 9, 30, 0).unwrap(),
            path: PathBuf::from("posts/first.md"),
        }];
        let page = blog(&SiteIdentity::default(), false, &posts);
        assert!(page.contains("<title>Blog - RheumAI</title>"));
        assert!(page.contains(r#"<a href="/post/first">First &lt;Post&gt;</a>"#));
        assert!(page.contains(r#"<p class="date">2024-11-17</p>"#));
    }

    #[test]
    fn test_post_with_and_without_hook() {
        let content = PostContent {
            title: "Gout".to_string(),
            body: "Some *text*".to_string(),
        };
        let plain = post(true, &content, None);
        assert!(plain.contains("<em>text</em>"));
        assert!(!plain.contains("similar-abstracts"));

        let hooked = post(
            true,
            &content,
            Some(SimilarHook {
                abstract_number: "0042",
            }),
        );
        assert!(hooked.contains(r#"<div id="similar-abstracts"></div>"#));
        assert!(hooked.contains(r#"hx-get="/acr24/similar/0042""#));

        let odd = post(
            true,
            &content,
            Some(SimilarHook {
                abstract_number: "12/b #3",
            }),
        );
        assert!(odd.contains(r#"hx-get="/acr24/similar/12%2Fb%20%233""#));
    }

    #[test]
    fn test_projects_page() {
        let projects = vec![Project {
            name: "Gout Bot".to_string(),
            description: "Answers gout questions".to_string(),
            external_link: "https://example.org/?a=1&b=2".to_string(),
            internal_link: Some("gout".to_string()),
        }];
        let page = super::projects(&SiteIdentity::default(), true, &projects);
        assert!(page.contains("<title>Projects - RheumAI</title>"));
        assert!(page.contains("<h2>Gout Bot</h2>"));
        assert!(page.contains(r#"href="https://example.org/?a=1&amp;b=2" class="button""#));
    }
}
