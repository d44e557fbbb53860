//! Host name extraction for story links.

/// Extracts the host shown next to a story title.
///
/// URLs with a scheme take the segment after `//`; bare URLs take everything
/// before the first `/`. A leading `www.` is dropped.
pub fn host_name(url: &str) -> &str {
    let host = if url.contains("://") {
        url.split('/').nth(2).unwrap_or_default()
    } else {
        url.split('/').next().unwrap_or_default()
    };

    host.strip_prefix("www.").unwrap_or(host)
}
