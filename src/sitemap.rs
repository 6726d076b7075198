//! Sitemap probing and depth-limited sitemap index expansion.

use std::collections::{HashSet, VecDeque};

use anyhow::{Result, bail};
use log::{debug, info};
use sitemap::{
    reader::{SiteMapEntity, SiteMapReader},
    structs::Location,
};
use url::Url;

use crate::article_url::ArticleUrlPolicy;
use crate::constants::{SITEMAP_MAX_DEPTH, SITEMAP_PATHS};
use crate::fetch::Fetcher;

/// A sitemap that yielded article URLs.
#[derive(Debug)]
pub struct SitemapHit {
    pub sitemap_url: String,
    pub urls: Vec<String>,
}

/// Whether `body` is a sitemap document rather than, say, an HTML 404 page.
pub fn looks_like_sitemap(body: &str) -> bool {
    body.contains("<urlset") || body.contains("<sitemapindex")
}

fn is_taxonomy_sitemap(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    ["category", "tag", "author"]
        .iter()
        .any(|taxonomy| path.contains(taxonomy))
}

/// Extracts article URLs from a sitemap.
///
/// Sitemap indexes are expanded breadth-first down to [`SITEMAP_MAX_DEPTH`]
/// levels, skipping category, tag and author sitemaps. Every `<loc>` of a
/// urlset is kept only if `policy` accepts it for `site`.
///
/// # Arguments
///
/// * `fetcher` - HTTP access
/// * `sitemap_url` - The sitemap or sitemap index to start from
/// * `site` - The blog whose articles are wanted
/// * `policy` - Article URL acceptance policy
///
/// # Errors
///
/// Returns an error if the root sitemap cannot be fetched or is not a sitemap.
/// Failing child sitemaps are skipped.
pub async fn extract_sitemap_urls(
    fetcher: &Fetcher,
    sitemap_url: &str,
    site: &Url,
    policy: &ArticleUrlPolicy,
) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    let mut seen = HashSet::new();
    let mut sitemaps_to_process = VecDeque::from([(sitemap_url.to_string(), 0_usize)]);

    while let Some((current_sitemap, depth)) = sitemaps_to_process.pop_front() {
        let page = match fetcher.get(&current_sitemap).await {
            Ok(page) => page,
            Err(e) if depth > 0 => {
                debug!("Skipping child sitemap {current_sitemap}: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        if !looks_like_sitemap(&page.body) {
            if depth == 0 {
                bail!("{current_sitemap} is not a sitemap");
            }
            continue;
        }

        let reader = SiteMapReader::new(page.body.as_bytes());

        for entity in reader {
            match entity {
                SiteMapEntity::Url(url_entry) => {
                    if let Location::Url(mut url) = url_entry.loc {
                        url.set_fragment(None);
                        if policy.accepts(&url, site) && seen.insert(url.to_string()) {
                            urls.push(url.to_string());
                        }
                    }
                }
                SiteMapEntity::SiteMap(sitemap_entry) => {
                    if let Location::Url(url) = sitemap_entry.loc {
                        if depth >= SITEMAP_MAX_DEPTH || is_taxonomy_sitemap(&url) {
                            debug!("Not expanding child sitemap {url}");
                            continue;
                        }
                        sitemaps_to_process.push_back((url.to_string(), depth + 1));
                    }
                }
                SiteMapEntity::Err(_) => continue,
            }
        }
    }

    Ok(urls)
}

/// Probes the conventional sitemap locations of `site` in order and returns
/// the first one that yields at least one article URL.
pub async fn find_sitemap(
    fetcher: &Fetcher,
    site: &Url,
    policy: &ArticleUrlPolicy,
) -> Option<SitemapHit> {
    for path in SITEMAP_PATHS {
        let Ok(candidate) = site.join(path) else {
            continue;
        };

        match extract_sitemap_urls(fetcher, candidate.as_str(), site, policy).await {
            Ok(urls) if !urls.is_empty() => {
                info!("Found {} article URLs in {candidate}", urls.len());
                return Some(SitemapHit {
                    sitemap_url: candidate.to_string(),
                    urls,
                });
            }
            Ok(_) => debug!("Sitemap {candidate} has no article URLs"),
            Err(e) => debug!("No sitemap at {candidate}: {e}"),
        }
    }

    None
}
