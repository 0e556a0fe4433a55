use crate::UrlError;
use url::Url;

/// Query parameters that change what a page serves and are therefore kept
/// during normalization. Everything else (tracking, session ids, ...) is
/// dropped so the visited-set treats such variants as one page.
const KEPT_QUERY_PARAMS: &[&str] = &["page", "p", "category", "cat", "id", "slug"];

/// Normalizes a URL into the canonical form used as the frontier key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or without a host
/// 2. Only HTTP and HTTPS schemes are accepted
/// 3. Lowercase host and removal of default ports come from the parser
/// 4. Remove the fragment
/// 5. Drop every query parameter not on the kept allow-list; an empty
///    result drops the query string entirely
///
/// The operation is idempotent: normalizing an already-normalized URL
/// yields the same URL.
///
/// # Examples
///
/// ```
/// use sitescope::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com:443/docs?utm_source=x&page=2#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs?page=2");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| KEPT_QUERY_PARAMS.contains(&key.as_ref()))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(None);
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            drop(pairs);
        }
    }

    Ok(url)
}
