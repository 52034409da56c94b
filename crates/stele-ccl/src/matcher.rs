//! # Pattern Matching and Specificity
//!
//! The segment matcher backs both action patterns (dot-separated) and
//! resource patterns (slash-separated). Wildcard rules:
//!
//! - `*` matches exactly one segment
//! - `**` matches zero or more segments
//!
//! Recursion at `**` branches on "consume zero" vs "consume one more";
//! depth is bounded by pattern length, and pattern length is bounded in
//! practice by the document size cap upstream.

/// Match an action string against a dot-separated pattern.
pub fn match_action(pattern: &str, action: &str) -> bool {
    let pattern_parts: Vec<&str> = pattern.split('.').collect();
    let action_parts: Vec<&str> = action.split('.').collect();
    segments_match(&pattern_parts, 0, &action_parts, 0)
}

/// Match a resource path against a slash-separated pattern.
///
/// Leading and trailing slashes are stripped from both sides before
/// matching. An empty pattern matches only an empty resource; `**`
/// matches anything; `*` matches any resource without a `/`.
pub fn match_resource(pattern: &str, resource: &str) -> bool {
    let norm_pattern = pattern.trim_matches('/');
    let norm_resource = resource.trim_matches('/');

    if norm_pattern.is_empty() && norm_resource.is_empty() {
        return true;
    }
    if norm_pattern == "**" {
        return true;
    }
    if norm_pattern == "*" && !norm_resource.contains('/') {
        return true;
    }

    let pattern_parts: Vec<&str> = norm_pattern.split('/').collect();
    let resource_parts: Vec<&str> = norm_resource.split('/').collect();
    segments_match(&pattern_parts, 0, &resource_parts, 0)
}

fn segments_match(pattern: &[&str], pi: usize, target: &[&str], ti: usize) -> bool {
    let mut pi = pi;
    let mut ti = ti;

    while pi < pattern.len() && ti < target.len() {
        let p = pattern[pi];

        if p == "**" {
            // Consume zero target segments, or one more and stay on **.
            if segments_match(pattern, pi + 1, target, ti) {
                return true;
            }
            return segments_match(pattern, pi, target, ti + 1);
        }

        if p == "*" {
            pi += 1;
            ti += 1;
            continue;
        }

        if p != target[ti] {
            return false;
        }
        pi += 1;
        ti += 1;
    }

    // Trailing ** patterns match zero remaining segments.
    while pi < pattern.len() && pattern[pi] == "**" {
        pi += 1;
    }

    pi == pattern.len() && ti == target.len()
}

/// Specificity score of an action + resource pattern pair.
///
/// Each segment contributes: literal = 2, `*` = 1, `**` = 0. Higher
/// scores rank as more specific during evaluation.
pub fn specificity(action_pattern: &str, resource_pattern: &str) -> u32 {
    let mut score = 0;

    for part in action_pattern.split('.') {
        score += segment_weight(part);
    }

    let norm_resource = resource_pattern.trim_matches('/');
    if !norm_resource.is_empty() {
        for part in norm_resource.split('/') {
            score += segment_weight(part);
        }
    }

    score
}

fn segment_weight(segment: &str) -> u32 {
    match segment {
        "**" => 0,
        "*" => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_action_matches_itself_only() {
        assert!(match_action("read", "read"));
        assert!(!match_action("read", "write"));
        assert!(!match_action("read", "read.file"));
    }

    #[test]
    fn single_wildcard_matches_exactly_one_action_segment() {
        assert!(match_action("file.*", "file.read"));
        assert!(!match_action("file.*", "file"));
        assert!(!match_action("file.*", "file.read.meta"));
        assert!(match_action("*.read", "file.read"));
    }

    #[test]
    fn double_wildcard_matches_zero_or_more_action_segments() {
        assert!(match_action("**", "read"));
        assert!(match_action("**", "a.b.c"));
        assert!(match_action("file.**", "file"));
        assert!(match_action("file.**", "file.read.meta"));
        assert!(match_action("**.delete", "admin.user.delete"));
        assert!(match_action("**.delete", "delete"));
        assert!(!match_action("**.delete", "admin.user.create"));
    }

    #[test]
    fn interior_double_wildcard() {
        assert!(match_action("api.**.write", "api.v1.users.write"));
        assert!(match_action("api.**.write", "api.write"));
        assert!(!match_action("api.**.write", "api.v1.read"));
    }

    #[test]
    fn resource_matching_normalizes_slashes() {
        assert!(match_resource("/data/", "data"));
        assert!(match_resource("data", "/data/"));
        assert!(match_resource("/data/users", "/data/users"));
    }

    #[test]
    fn resource_special_cases() {
        assert!(match_resource("", ""));
        assert!(match_resource("/", "/"));
        assert!(!match_resource("", "/data"));
        assert!(match_resource("**", "/anything/at/all"));
        assert!(match_resource("**", ""));
        assert!(match_resource("*", "/top"));
        assert!(!match_resource("*", "/a/b"));
    }

    #[test]
    fn resource_glob_patterns() {
        assert!(match_resource("/data/**", "/data/users/alice"));
        assert!(match_resource("/data/**", "/data"));
        assert!(!match_resource("/data/**", "/api"));
        assert!(match_resource("/api/*", "/api/v1"));
        assert!(!match_resource("/api/*", "/api/v1/users"));
        assert!(!match_resource("/api/*", "/api"));
    }

    #[test]
    fn trailing_double_wildcards_absorb() {
        assert!(match_resource("/a/**/**", "/a"));
        assert!(match_action("a.**.**", "a"));
    }

    #[test]
    fn specificity_weights() {
        // Literal segments score 2, * scores 1, ** scores 0.
        assert_eq!(specificity("read", ""), 2);
        assert_eq!(specificity("file.read", "/data"), 6);
        assert_eq!(specificity("file.*", "/data/**"), 5);
        assert_eq!(specificity("**", "**"), 0);
        assert_eq!(specificity("*", "*"), 2);
    }

    #[test]
    fn more_literal_patterns_are_more_specific() {
        let broad = specificity("**", "/data/**");
        let narrow = specificity("read", "/data/public");
        assert!(narrow > broad);
    }

    #[test]
    fn specificity_ignores_empty_resource() {
        assert_eq!(specificity("a.b", ""), specificity("a.b", "/"));
    }
}
