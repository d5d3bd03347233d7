// src/checker/partition.rs
// =============================================================================
// Groups URLs by "registrable domain" so each site gets one sequential worker.
//
// The domain is deliberately approximate: take the network location of the
// URL (everything between "://" and the next '/', '?' or '#', port included)
// and keep its last two dot-separated labels. So `a.b.example.co.uk` lands in
// `co.uk`. This is not public-suffix resolution and must stay that way, as
// existing report groupings depend on it.
// =============================================================================

use std::collections::BTreeMap;

/// The network-location part of `url`, or "" if it has none.
fn network_location(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => return "",
    };
    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Grouping key for `url`: at most the last two labels of its host.
pub fn registrable_domain(url: &str) -> String {
    let netloc = network_location(url);
    let labels: Vec<&str> = netloc.rsplitn(3, '.').collect();
    match labels.as_slice() {
        [last, second, ..] => format!("{}.{}", second, last),
        [only] => only.to_string(),
        [] => String::new(),
    }
}

/// Splits `urls` into per-domain groups. Every URL lands in exactly one
/// group; order inside a group follows the input order.
pub fn partition<I, S>(urls: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for url in urls {
        let url = url.as_ref();
        groups
            .entry(registrable_domain(url))
            .or_default()
            .push(url.to_string());
    }
    groups
}
