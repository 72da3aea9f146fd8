//! Tag ordering.
//!
//! Tags that parse as semantic versions (optionally `v`-prefixed) sort by
//! version, newest first. Everything else (`latest`, `sha-…`) sorts after
//! them in descending lexical order. Duplicates are dropped so the result
//! is strictly descending.

use std::cmp::Ordering;

use semver::Version;

/// Sort `tags` into strictly descending order.
pub fn order_tags(mut tags: Vec<String>) -> Vec<String> {
    tags.sort_by(|a, b| compare_tags(b, a));
    tags.dedup();
    tags
}

/// First `count` tags of an already-ordered list.
pub fn preview(tags: &[String], count: usize) -> &[String] {
    &tags[..tags.len().min(count)]
}

fn compare_tags(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn parse_version(tag: &str) -> Option<Version> {
    Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn orders_versions_descending() {
        let ordered = order_tags(tags(&["3.1.0", "3.2.1", "3.2.0"]));
        assert_eq!(ordered, tags(&["3.2.1", "3.2.0", "3.1.0"]));
    }

    #[test]
    fn semantic_not_lexical() {
        let ordered = order_tags(tags(&["1.9.0", "1.10.0", "1.2.0"]));
        assert_eq!(ordered, tags(&["1.10.0", "1.9.0", "1.2.0"]));
    }

    #[test]
    fn prerelease_below_release() {
        let ordered = order_tags(tags(&["2.0.0-rc.1", "2.0.0", "1.9.9"]));
        assert_eq!(ordered, tags(&["2.0.0", "2.0.0-rc.1", "1.9.9"]));
    }

    #[test]
    fn non_semver_after_versions() {
        let ordered = order_tags(tags(&["latest", "1.0.0", "develop", "v1.1.0"]));
        assert_eq!(ordered, tags(&["v1.1.0", "1.0.0", "latest", "develop"]));
    }

    #[test]
    fn duplicates_removed() {
        let ordered = order_tags(tags(&["1.0.0", "1.0.0", "0.9.0"]));
        assert_eq!(ordered, tags(&["1.0.0", "0.9.0"]));
    }

    #[test]
    fn prefixed_and_bare_same_version_are_distinct() {
        let ordered = order_tags(tags(&["1.0.0", "v1.0.0"]));
        assert_eq!(ordered, tags(&["v1.0.0", "1.0.0"]));
    }

    #[test]
    fn strictly_descending() {
        let ordered = order_tags(tags(&[
            "0.1.0", "latest", "10.0.0", "2.3.4", "2.3.4", "main", "v3.0.0",
        ]));
        for pair in ordered.windows(2) {
            assert_eq!(compare_tags(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn preview_truncates_without_reordering() {
        let ordered = order_tags((0..15).map(|i| format!("1.{i}.0")).collect());
        let top = preview(&ordered, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top, &ordered[..10]);
        assert_eq!(top[0], "1.14.0");
        assert_eq!(preview(&ordered[..3], 10).len(), 3);
    }
}
