#![allow(dead_code)]

use std::time::Duration;

use httpmock::prelude::*;
use httpmock::Mock;
use postcraft::CrawlOptions;

const PARAGRAPH: &str = "Our neighbourhood cafe has been roasting beans in small batches for \
    over ten years, and every season we rethink the menu around what local farmers bring us. \
    This spring that means strawberries from the hills, fresh herbs for the sandwiches and a \
    lighter roast that pairs well with pastries baked every morning before we open the doors.";

/// A blog post page with enough body text for readability to pick up.
pub fn article_html(title: &str, marker: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><title>{title}</title></head>
<body>
<nav><a href="/">Home</a> <a href="/about-us">About</a></nav>
<article>
<h1>{title}</h1>
<p>{marker}. {PARAGRAPH}</p>
<p>{PARAGRAPH}</p>
<p>{PARAGRAPH}</p>
</article>
<footer>Copyright Cafe</footer>
</body>
</html>"#
    )
}

pub fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|url| format!("<url><loc>{url}</loc></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
    )
}

pub fn sitemap_index(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|url| format!("<sitemap><loc>{url}</loc></sitemap>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</sitemapindex>"#
    )
}

pub fn rss(site: &str, links: &[String]) -> String {
    let items: String = links
        .iter()
        .enumerate()
        .map(|(index, link)| format!("<item><title>Post {index}</title><link>{link}</link></item>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Cafe blog</title><link>{site}</link><description>News from the cafe</description>{items}</channel></rss>"#
    )
}

pub async fn serve<'a>(server: &'a MockServer, path: &str, content_type: &str, body: String) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(200).header("content-type", content_type).body(body);
        })
        .await
}

pub async fn serve_article<'a>(server: &'a MockServer, path: &str, title: &str) -> Mock<'a> {
    serve(server, path, "text/html; charset=utf-8", article_html(title, title)).await
}

pub fn test_options() -> CrawlOptions {
    CrawlOptions {
        fetch_timeout: Duration::from_secs(2),
        total_timeout: Duration::from_secs(30),
        ..Default::default()
    }
}
