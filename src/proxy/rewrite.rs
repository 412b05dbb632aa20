const WILDCARD: &str = ":path*";

/// A single source -> destination mapping.
///
/// A source ending in `/:path*` matches any path under its prefix and hands the
/// remainder to the `:path*` placeholder in the destination. Any other source
/// only matches itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    source: String,
    destination: String,
}

impl RewriteRule {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn apply(&self, path: &str) -> Option<String> {
        let Some(prefix) = self.source.strip_suffix(WILDCARD) else {
            return (path == self.source).then(|| self.destination.clone());
        };

        let rest = path.strip_prefix(prefix)?;
        if !rest.split('/').all(is_plain_segment) {
            return None;
        }

        Some(self.destination.replace(WILDCARD, rest))
    }
}

/// Upstreams normalise `%2e` to `.` and some treat `%2f` or `%5c` as separators,
/// so dot segments are checked after decoding.
fn is_plain_segment(segment: &str) -> bool {
    let Ok(decoded) = urlencoding::decode(segment) else {
        return false;
    };
    !decoded
        .split(['/', '\\'])
        .any(|part| part == ".." || part == ".")
}

/// Ordered rewrite rules plus the bearer token injected into forwarded calls.
#[derive(Debug, Clone)]
pub struct RewriteTable {
    rules: Vec<RewriteRule>,
    bearer_token: Option<String>,
}

impl RewriteTable {
    pub fn new(rules: Vec<RewriteRule>, bearer_token: Option<String>) -> Self {
        Self {
            rules,
            bearer_token,
        }
    }

    /// The standard table for a remote TTS service rooted at `base_url`.
    pub fn for_upstream(base_url: &str, bearer_token: Option<String>) -> Self {
        let base = base_url.trim_end_matches('/');
        Self::new(
            vec![
                RewriteRule::new("/api/convert", format!("{}/v1/audio/speech", base)),
                RewriteRule::new("/api/:path*", format!("{}/v1/:path*", base)),
            ],
            bearer_token,
        )
    }

    /// First matching rule wins.
    pub fn resolve(&self, path: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(path))
    }

    pub fn authorization(&self) -> Option<String> {
        self.bearer_token
            .as_ref()
            .map(|token| format!("Bearer {}", token))
    }
}
