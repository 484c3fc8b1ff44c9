use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocationParts {
    pub(crate) origin: String,
    pub(crate) pathname: String,
    pub(crate) search: String,
    pub(crate) hash: String,
}

impl LocationParts {
    pub(crate) fn parse(href: &str) -> Self {
        let (origin, rest) = match href.find("://") {
            Some(scheme_end) => {
                let after_scheme = scheme_end + 3;
                let authority_end = href[after_scheme..]
                    .find(['/', '?', '#'])
                    .map(|offset| after_scheme + offset)
                    .unwrap_or(href.len());
                (href[..authority_end].to_string(), &href[authority_end..])
            }
            None => (String::new(), href),
        };

        let (before_hash, hash) = match rest.find('#') {
            Some(at) => (&rest[..at], rest[at..].to_string()),
            None => (rest, String::new()),
        };
        let (pathname, search) = match before_hash.find('?') {
            Some(at) => (&before_hash[..at], before_hash[at..].to_string()),
            None => (before_hash, String::new()),
        };

        let pathname = if pathname.is_empty() && !origin.is_empty() {
            "/".to_string()
        } else {
            pathname.to_string()
        };

        Self {
            origin,
            pathname,
            search,
            hash,
        }
    }

    pub(crate) fn href(&self) -> String {
        format!("{}{}{}{}", self.origin, self.pathname, self.search, self.hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// Full navigation to another document.
    Assign,
    /// Native same-page fragment jump.
    Jump,
    /// Fragment rewritten in place, no jump and no new history entry.
    Replace,
}

/// One observed location change. `from` and `to` are full hrefs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRecord {
    pub kind: NavigationKind,
    pub from: String,
    pub to: String,
}

#[derive(Debug)]
pub(crate) struct LocationState {
    pub(crate) current: LocationParts,
    pub(crate) log: Vec<NavigationRecord>,
}

impl LocationState {
    pub(crate) fn parse(url: &str) -> Self {
        Self {
            current: LocationParts::parse(url),
            log: Vec::new(),
        }
    }

    pub(crate) fn href(&self) -> String {
        self.current.href()
    }

    pub(crate) fn hash(&self) -> &str {
        &self.current.hash
    }

    pub(crate) fn set_hash(&mut self, kind: NavigationKind, fragment: &str) {
        let from = self.href();
        self.current.hash = ensure_hash_prefix(fragment);
        let to = self.href();
        self.log.push(NavigationRecord { kind, from, to });
    }

    pub(crate) fn assign(&mut self, href: &str) {
        let from = self.href();
        self.current = self.resolve(href);
        let to = self.href();
        self.log.push(NavigationRecord {
            kind: NavigationKind::Assign,
            from,
            to,
        });
    }

    /// Resolves an href the way a link target resolves: absolute URLs
    /// replace everything, root-relative paths keep the origin, and
    /// bare relative paths land in the current directory.
    fn resolve(&self, href: &str) -> LocationParts {
        if href.contains("://") {
            return LocationParts::parse(href);
        }
        if href.starts_with('/') {
            let mut parts = LocationParts::parse(href);
            parts.origin = self.current.origin.clone();
            return parts;
        }
        let directory = match self.current.pathname.rfind('/') {
            Some(at) => &self.current.pathname[..at + 1],
            None => "/",
        };
        let mut parts = LocationParts::parse(&format!("{directory}{href}"));
        parts.origin = self.current.origin.clone();
        parts
    }
}

pub(crate) fn ensure_hash_prefix(fragment: &str) -> String {
    if fragment.is_empty() || fragment.starts_with('#') {
        fragment.to_string()
    } else {
        format!("#{fragment}")
    }
}
