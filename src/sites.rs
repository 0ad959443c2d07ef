//! Mapping of request hosts onto site directories
//!
//! `www.example.com` is served from `Humm/Sites/Example`, `blog.example.org`
//! from `Humm/Sites/BlogExample`. Digits are spelled with two-letter words so
//! `shop24.com` becomes `Shoptwfo`. Hosts without a matching directory fall
//! back to the `Main` site.

use std::path::Path;

use tracing::debug;

use crate::paths::{MAIN_SITE, SITES, SitePaths};
use crate::views::capitalize;

const HOST_PREFIXES: [&str; 3] = ["http://", "https://", "www."];

/// Derive the site directory name from a host, without checking the disk
pub fn site_dir_from_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    for prefix in HOST_PREFIXES {
        host = host.replace(prefix, "");
    }

    // Everything before the last dot
    let Some((name, _tld)) = host.rsplit_once('.') else {
        return String::new();
    };
    if name.is_empty() {
        return String::new();
    }

    name.split('.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            if part.starts_with(|c: char| c.is_ascii_digit()) {
                capitalize(&spell_digits(part))
            } else {
                capitalize(part)
            }
        })
        .collect()
}

/// Site directory to use for `host` under an installation root
pub fn resolve_site(root: &Path, host: &str) -> String {
    let derived = site_dir_from_host(host);
    let sites_dir = SitePaths::humm_dir(root).join(SITES);

    if !derived.trim().is_empty() && sites_dir.join(&derived).is_dir() {
        derived
    } else {
        debug!(host = host, derived = %derived, "No site directory for host, using main site");
        MAIN_SITE.to_string()
    }
}

fn spell_digits(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '0' => "ze".to_string(),
            '1' => "on".to_string(),
            '2' => "tw".to_string(),
            '3' => "th".to_string(),
            '4' => "fo".to_string(),
            '5' => "fi".to_string(),
            '6' => "si".to_string(),
            '7' => "se".to_string(),
            '8' => "ei".to_string(),
            '9' => "ni".to_string(),
            other => other.to_string(),
        })
        .collect()
}
