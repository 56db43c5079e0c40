//! Resolve raw detail links into absolute URLs.
//!
//! Row links on the results grid come in three shapes: already absolute,
//! relative to the ApplicationMaster module (`default.aspx?...`), or
//! relative to the site root (`/path`). Anything else is assumed to be
//! module-relative.

use url::Url;

use datrack_shared::{DatrackError, PortalConfig, Result};

/// Prefix of links that are relative to the application module.
const APP_RELATIVE_PREFIX: &str = "default.aspx";

/// Pure string resolver for row links. No network access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlNormalizer {
    /// Module base, always ending in `/`.
    app_base: String,
    /// Site root, never ending in `/`.
    site_root: String,
}

impl UrlNormalizer {
    /// Build a normalizer from the two roots.
    ///
    /// Both must be absolute http(s) URLs; that is what makes
    /// [`normalize`](Self::normalize) idempotent.
    pub fn new(app_base: &str, site_root: &str) -> Result<Self> {
        let app_base = app_base.trim();
        let site_root = site_root.trim();
        check_root("app_base", app_base)?;
        check_root("site_root", site_root)?;

        let mut app_base = app_base.to_string();
        if !app_base.ends_with('/') {
            app_base.push('/');
        }

        Ok(Self {
            app_base,
            site_root: site_root.trim_end_matches('/').to_string(),
        })
    }

    /// Build a normalizer from the `[portal]` config section.
    pub fn from_portal(portal: &PortalConfig) -> Result<Self> {
        Self::new(&portal.app_base, &portal.site_root)
    }

    /// Resolve `raw` to an absolute URL. Empty input yields `""`.
    pub fn normalize(&self, raw: &str) -> String {
        let url = raw.trim();

        if url.is_empty() {
            return String::new();
        }

        if is_absolute(url) {
            return url.to_string();
        }

        if starts_with_ignore_case(url, APP_RELATIVE_PREFIX) {
            return format!("{}{url}", self.app_base);
        }

        if url.starts_with('/') {
            return format!("{}{url}", self.site_root);
        }

        format!("{}{url}", self.app_base)
    }
}

fn check_root(name: &str, value: &str) -> Result<()> {
    if !is_absolute(value) || Url::parse(value).is_err() {
        return Err(DatrackError::validation(format!(
            "{name} '{value}' must be an absolute http(s) URL"
        )));
    }
    Ok(())
}

fn is_absolute(url: &str) -> bool {
    starts_with_ignore_case(url, "http://") || starts_with_ignore_case(url, "https://")
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}
