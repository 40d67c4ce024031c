//! Pattern matching for request URIs
//!
//! Exception-path patterns support wildcards:
//! - `*` - matches exactly one path segment (e.g., `/studies/*/metadata`)
//! - `**` - matches any number of segments (e.g., `/tools/**`)
//! - in-segment globs (e.g., `/instances/*.json`)
//!
//! URIs are normalized before matching: the query string and fragment are
//! stripped, duplicate slashes collapse, and `.`/`..` segments are resolved
//! so that `/tools/../instances` cannot ride an exception configured for
//! `/tools/**`.

/// Matcher for read-only exception path patterns
pub struct PatternMatcher;

impl PatternMatcher {
    /// Check if a request URI matches an exception pattern
    ///
    /// # Examples
    /// ```
    /// use gantry_rs::policy::PatternMatcher;
    ///
    /// assert!(PatternMatcher::matches("/tools/find", "/tools/find"));
    /// assert!(PatternMatcher::matches("/tools/find", "/tools/find?limit=10"));
    /// assert!(PatternMatcher::matches("/studies/*/metadata", "/studies/42/metadata"));
    /// assert!(!PatternMatcher::matches("/tools/**", "/tools/../instances"));
    /// ```
    pub fn matches(pattern: &str, uri: &str) -> bool {
        let pattern_segments = Self::segments(pattern);
        let uri_segments = Self::segments(Self::strip_query(uri));

        Self::match_segments(&pattern_segments, &uri_segments, 0, 0)
    }

    /// Drop the query string and fragment from a URI
    fn strip_query(uri: &str) -> &str {
        let end = uri
            .find(|c| c == '?' || c == '#')
            .unwrap_or(uri.len());
        &uri[..end]
    }

    /// Split a path into normalized segments, resolving `.` and `..`
    fn segments(path: &str) -> Vec<&str> {
        let mut resolved: Vec<&str> = Vec::new();

        for part in path.split('/').filter(|s| !s.is_empty()) {
            match part {
                "." => continue,
                ".." => {
                    resolved.pop();
                }
                _ => resolved.push(part),
            }
        }

        resolved
    }

    /// Recursively match pattern segments against URI segments
    fn match_segments(pattern: &[&str], uri: &[&str], pat_idx: usize, uri_idx: usize) -> bool {
        // Both exhausted - match
        if pat_idx >= pattern.len() && uri_idx >= uri.len() {
            return true;
        }

        // Pattern exhausted but URI remains - no match
        if pat_idx >= pattern.len() {
            return false;
        }

        // URI exhausted - only matches if the rest of the pattern is all **
        if uri_idx >= uri.len() {
            return pattern[pat_idx..].iter().all(|&p| p == "**");
        }

        match pattern[pat_idx] {
            // ** consumes zero or more segments
            "**" => (0..=(uri.len() - uri_idx))
                .any(|skip| Self::match_segments(pattern, uri, pat_idx + 1, uri_idx + skip)),
            // * consumes exactly one segment
            "*" => Self::match_segments(pattern, uri, pat_idx + 1, uri_idx + 1),
            // Segment containing a glob (e.g., *.json, series-*)
            p if p.contains('*') => {
                Self::match_glob_segment(p, uri[uri_idx])
                    && Self::match_segments(pattern, uri, pat_idx + 1, uri_idx + 1)
            }
            // Literal segment
            p => p == uri[uri_idx] && Self::match_segments(pattern, uri, pat_idx + 1, uri_idx + 1),
        }
    }

    /// Match a glob pattern segment against a URI segment
    /// Supports * within segments (e.g., *.json, series-*, ct-*-axial)
    fn match_glob_segment(pattern: &str, segment: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();

        let mut pos = 0;

        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }

            if i == 0 {
                // Anchored at the beginning
                if !segment.starts_with(part) {
                    return false;
                }
                pos = part.len();
            } else if i == parts.len() - 1 {
                // Anchored at the end
                if !segment.ends_with(part) || segment.len() < pos + part.len() {
                    return false;
                }
            } else {
                // Interior parts must appear in order
                match segment[pos..].find(part) {
                    Some(found) => pos += found + part.len(),
                    None => return false,
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(PatternMatcher::matches("/tools/find", "/tools/find"));
        assert!(!PatternMatcher::matches("/tools/find", "/tools/lookup"));
    }

    #[test]
    fn test_query_string_stripped() {
        assert!(PatternMatcher::matches("/tools/find", "/tools/find?limit=10"));
        assert!(PatternMatcher::matches("/tools/find", "/tools/find?a=1&b=2"));
        assert!(PatternMatcher::matches("/tools/find", "/tools/find#anchor"));
        assert!(!PatternMatcher::matches("/tools/find", "/tools/find/extra?x=1"));
    }

    #[test]
    fn test_single_wildcard() {
        assert!(PatternMatcher::matches("/studies/*", "/studies/42"));
        assert!(PatternMatcher::matches("/studies/*", "/studies/abc-def"));
        assert!(!PatternMatcher::matches("/studies/*", "/studies/42/series"));
        assert!(!PatternMatcher::matches("/studies/*", "/instances/42"));
    }

    #[test]
    fn test_recursive_wildcard() {
        assert!(PatternMatcher::matches("/tools/**", "/tools/find"));
        assert!(PatternMatcher::matches("/tools/**", "/tools/lookup/deep"));
        assert!(PatternMatcher::matches("/tools/**", "/tools"));
        assert!(!PatternMatcher::matches("/tools/**", "/instances/tools"));
    }

    #[test]
    fn test_mixed_wildcards() {
        assert!(PatternMatcher::matches(
            "/studies/*/metadata",
            "/studies/42/metadata"
        ));
        assert!(!PatternMatcher::matches(
            "/studies/*/metadata",
            "/studies/42/series"
        ));
        assert!(PatternMatcher::matches(
            "/studies/**/metadata",
            "/studies/42/series/7/metadata"
        ));
    }

    #[test]
    fn test_normalization() {
        assert!(PatternMatcher::matches("/tools/find", "tools/find"));
        assert!(PatternMatcher::matches("tools/find/", "/tools/find"));
        assert!(PatternMatcher::matches("/tools/find", "/tools//find"));
        assert!(PatternMatcher::matches("/tools/find", "/tools/./find"));
    }

    #[test]
    fn test_dot_segment_resolution() {
        // Traversal is resolved before matching, closing the bypass where a
        // mutating endpoint is reached through an exception prefix.
        assert!(!PatternMatcher::matches(
            "/tools/**",
            "/tools/../instances"
        ));
        assert!(PatternMatcher::matches(
            "/instances/**",
            "/tools/../instances/upload"
        ));
    }

    #[test]
    fn test_root_pattern() {
        assert!(PatternMatcher::matches("/", "/"));
        assert!(PatternMatcher::matches("/*", "/anything"));
        assert!(PatternMatcher::matches("/**", "/anything/nested"));
    }

    #[test]
    fn test_glob_segments() {
        assert!(PatternMatcher::matches("/exports/*.json", "/exports/study.json"));
        assert!(!PatternMatcher::matches("/exports/*.json", "/exports/study.xml"));
        assert!(PatternMatcher::matches("/series/ct-*", "/series/ct-axial"));
        assert!(!PatternMatcher::matches("/series/ct-*", "/series/mr-axial"));
        assert!(PatternMatcher::matches(
            "/logs/*-*-*.log",
            "/logs/gate-prod-2026.log"
        ));
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(!PatternMatcher::matches("/Tools/find", "/tools/find"));
        assert!(!PatternMatcher::matches("/tools/find", "/tools/FIND"));
    }
}
