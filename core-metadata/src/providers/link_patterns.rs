//! Constructed reference links
//!
//! Builds the URL a service would use for an artist or album and keeps it
//! only if a `HEAD` request answers 200, 301 or 302. Candidates are tried in
//! order per service and the first one that exists wins:
//!
//! | service | candidates |
//! |---|---|
//! | Wikipedia | `https://{lang}.wikipedia.org/wiki/{Artist_Name}`, one per configured language |
//! | Genius | `https://genius.com/albums/{artist-slug}/{album-slug}`, then `https://genius.com/{artist-slug}-{album-slug}-album` |
//! | Last.fm | `https://www.last.fm/music/{Artist+Name}/{Album+Name}` |
//! | Bandcamp | `https://{artistslug}.bandcamp.com/` |
//!
//! Each probe is throttled under the probed host's source class. Redirects
//! are not followed; a redirect already proves the page exists.

use super::RemoteContext;
use crate::error::Result;
use crate::links::LinkEntry;
use crate::query::Query;
use crate::resolver::{Hit, Provider, RateLimiter, SourceClass};
use async_trait::async_trait;
use bridge_traits::http::{HttpRequest, RetryPolicy};
use tracing::debug;

const SOURCE: &str = "Link patterns";

/// Statuses that count as "page exists"
const ACCEPTED_STATUSES: [u16; 3] = [200, 301, 302];

/// One service's candidate URLs, most specific first
struct ServiceCandidates {
    title: String,
    class: SourceClass,
    urls: Vec<String>,
}

/// `Artist_Name` form used in Wikipedia article paths
fn wikipedia_title(name: &str) -> String {
    name.trim().replace('&', "and").replace(' ', "_")
}

/// Lowercase, spaces to hyphens, `&` to `and`, other punctuation dropped
fn genius_slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace('&', "and")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Lowercase ASCII letters and digits only
fn bandcamp_slug(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Percent-encoded with `+` for spaces
fn lastfm_segment(name: &str) -> String {
    urlencoding::encode(name.trim()).replace("%20", "+")
}

/// Verifies constructed service URLs with `HEAD` requests
pub struct LinkPatternProvider {
    context: RemoteContext,
    wikipedia_languages: Vec<String>,
}

impl LinkPatternProvider {
    pub fn new(context: RemoteContext, wikipedia_languages: Vec<String>) -> Self {
        Self {
            context,
            wikipedia_languages,
        }
    }

    fn candidates(&self, query: &Query) -> Vec<ServiceCandidates> {
        let artist = query.artist_name();
        let album = query.album_name();
        let mut services = Vec::new();

        let title = wikipedia_title(artist);
        services.push(ServiceCandidates {
            title: "Wikipedia".to_string(),
            class: SourceClass::WIKIPEDIA,
            urls: self
                .wikipedia_languages
                .iter()
                .map(|lang| format!("https://{}.wikipedia.org/wiki/{}", lang, title))
                .collect(),
        });

        if !album.is_empty() {
            let artist_slug = genius_slug(artist);
            let album_slug = genius_slug(album);
            if !artist_slug.is_empty() && !album_slug.is_empty() {
                services.push(ServiceCandidates {
                    title: "Genius".to_string(),
                    class: SourceClass::GENIUS,
                    urls: vec![
                        format!("https://genius.com/albums/{}/{}", artist_slug, album_slug),
                        format!("https://genius.com/{}-{}-album", artist_slug, album_slug),
                    ],
                });
            }
        }

        let lastfm_url = if album.is_empty() {
            format!("https://www.last.fm/music/{}", lastfm_segment(artist))
        } else {
            format!(
                "https://www.last.fm/music/{}/{}",
                lastfm_segment(artist),
                lastfm_segment(album)
            )
        };
        services.push(ServiceCandidates {
            title: "Last.fm".to_string(),
            class: SourceClass::LASTFM_WEB,
            urls: vec![lastfm_url],
        });

        let slug = bandcamp_slug(artist);
        if !slug.is_empty() {
            services.push(ServiceCandidates {
                title: "Bandcamp".to_string(),
                class: SourceClass::BANDCAMP,
                urls: vec![format!("https://{}.bandcamp.com/", slug)],
            });
        }

        services
    }

    /// `true` when the page answers with an accepted status.
    /// Transport failures count as missing.
    async fn exists(&self, url: &str, class: SourceClass, limiter: &RateLimiter) -> bool {
        limiter.acquire(class).await;

        let request = HttpRequest::head(url)
            .header("User-Agent", &self.context.user_agent)
            .timeout(self.context.timeout);

        match self
            .context
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await
        {
            Ok(response) => {
                debug!(url, status = response.status, "Link probe");
                ACCEPTED_STATUSES.contains(&response.status)
            }
            Err(e) => {
                debug!(url, error = %e, "Link probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl Provider<Vec<LinkEntry>> for LinkPatternProvider {
    fn name(&self) -> &str {
        SOURCE
    }

    fn source_class(&self) -> SourceClass {
        SourceClass::LINK_CHECK
    }

    async fn fetch(
        &self,
        query: &Query,
        limiter: &RateLimiter,
    ) -> Result<Option<Hit<Vec<LinkEntry>>>> {
        let mut links = Vec::new();

        for service in self.candidates(query) {
            for url in &service.urls {
                if self.exists(url, service.class, limiter).await {
                    links.push(LinkEntry::new(url.as_str(), service.title.as_str(), SOURCE));
                    break;
                }
            }
        }

        Ok((!links.is_empty()).then(|| Hit::new(links).with_confidence(0.7)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{status_response, MockHttp};
    use bridge_traits::http::HttpMethod;
    use std::sync::Arc;

    fn provider(mock: MockHttp) -> LinkPatternProvider {
        LinkPatternProvider::new(
            RemoteContext::new(Arc::new(mock)),
            vec!["es".to_string(), "en".to_string()],
        )
    }

    #[test]
    fn test_slugs() {
        assert_eq!(wikipedia_title("Simon & Garfunkel"), "Simon_and_Garfunkel");
        assert_eq!(genius_slug("Simon & Garfunkel"), "simon-and-garfunkel");
        assert_eq!(genius_slug("AC/DC"), "acdc");
        assert_eq!(bandcamp_slug("Godspeed You! Black Emperor"), "godspeedyoublackemperor");
        assert_eq!(lastfm_segment("Sigur Rós"), "Sigur+R%C3%B3s");
    }

    #[test]
    fn test_candidates_without_album() {
        let provider = provider(MockHttp::new());
        let services = provider.candidates(&Query::artist("Sigur Ros"));
        let titles: Vec<&str> = services.iter().map(|s| s.title.as_str()).collect();

        assert_eq!(titles, vec!["Wikipedia", "Last.fm", "Bandcamp"]);
        assert_eq!(
            services[0].urls,
            vec![
                "https://es.wikipedia.org/wiki/Sigur_Ros",
                "https://en.wikipedia.org/wiki/Sigur_Ros",
            ]
        );
        assert_eq!(services[1].urls, vec!["https://www.last.fm/music/Sigur+Ros"]);
    }

    #[tokio::test]
    async fn test_only_existing_pages_are_kept() {
        let mut mock = MockHttp::new();
        mock.expect_execute()
            .withf(|r| r.method == HttpMethod::Head && !r.follow_redirects)
            .returning(|request| {
                let status = match request.url.as_str() {
                    "https://es.wikipedia.org/wiki/Portishead" => 404,
                    "https://en.wikipedia.org/wiki/Portishead" => 200,
                    "https://genius.com/albums/portishead/dummy" => 404,
                    "https://genius.com/portishead-dummy-album" => 301,
                    _ => 404,
                };
                Ok(status_response(status))
            });

        let hit = provider(mock)
            .fetch(&Query::new("Portishead", "Dummy"), &RateLimiter::unthrottled())
            .await
            .unwrap()
            .unwrap();

        let urls: Vec<&str> = hit.payload.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://en.wikipedia.org/wiki/Portishead",
                "https://genius.com/portishead-dummy-album",
            ]
        );
        assert_eq!(hit.payload[1].title, "Genius");
    }

    #[tokio::test]
    async fn test_nothing_verified_is_none() {
        let mut mock = MockHttp::new();
        mock.expect_execute().returning(|_| Ok(status_response(404)));

        let result = provider(mock)
            .fetch(&Query::artist("Nobody Here"), &RateLimiter::unthrottled())
            .await
            .unwrap();

        assert!(result.is_none());
    }
}
