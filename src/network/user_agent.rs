//! Browser-like request headers

use rand::seq::SliceRandom;

const PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
];

const CHROME_VERSIONS: &[&str] = &["129.0.0.0", "130.0.0.0", "131.0.0.0"];

const FIREFOX_VERSIONS: &[&str] = &["131.0", "132.0", "133.0"];

/// Generate a random but realistic browser user agent.
///
/// Picked once per client, so a process presents one consistent browser.
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let platform = PLATFORMS.choose(&mut rng).copied().unwrap_or(PLATFORMS[0]);

    if rand::random::<bool>() {
        let version = CHROME_VERSIONS
            .choose(&mut rng)
            .copied()
            .unwrap_or(CHROME_VERSIONS[0]);
        format!(
            "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{version} Safari/537.36"
        )
    } else {
        let version = FIREFOX_VERSIONS
            .choose(&mut rng)
            .copied()
            .unwrap_or(FIREFOX_VERSIONS[0]);
        format!("Mozilla/5.0 ({platform}; rv:{version}) Gecko/20100101 Firefox/{version}")
    }
}

/// Accept header for HTML pages
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
}

/// Accept header for JSON APIs
pub fn accept_json() -> &'static str {
    "application/json,text/javascript,*/*;q=0.01"
}

/// Accept-Language header for a language code
pub fn accept_language(lang: &str) -> String {
    if lang == "all" || lang.is_empty() {
        "en-US,en;q=0.9".to_string()
    } else {
        format!("{},en-US;q=0.9,en;q=0.8", lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_user_agent() {
        let ua = generate_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"));
        assert!(PLATFORMS.iter().any(|p| ua.contains(p)));
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(accept_language("all"), "en-US,en;q=0.9");
        assert!(accept_language("de").starts_with("de,"));
    }
}
