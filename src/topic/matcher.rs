//! Pure topic/pattern matching operations.
//!
//! Topics are dotted strings (`ride.accepted`); a pattern may contain `*`
//! segments that match exactly one whole dotted segment. This is hand-rolled
//! rather than built on the `glob` crate: segment-wildcard matching here has
//! different semantics from filesystem globbing (a `*` never spans a `.`,
//! and never matches zero characters across a boundary the way shell globs
//! can), so a dedicated matcher is clearer than bending a general-purpose
//! glob engine to fit.

const SEPARATOR: char = '.';
const WILDCARD: char = '*';

/// True iff `pattern` contains a `*` whose neighbors (or the string
/// boundaries) are the `.` separator. A `*` adjacent to any other
/// character is a literal asterisk, not a wildcard segment.
pub fn has_wildcard(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c != WILDCARD {
            continue;
        }

        let left_ok = i == 0 || chars[i - 1] == SEPARATOR;
        let right_ok = i + 1 == chars.len() || chars[i + 1] == SEPARATOR;

        if left_ok && right_ok {
            return true;
        }
    }

    false
}

/// Returns the subset of `topics` that match `pattern`, preserving the
/// order of `topics`. A pattern segment of `*` matches exactly one
/// non-empty dotted segment of a candidate topic; all other segments must
/// match literally.
pub fn match_list<'a>(topics: &'a [String], pattern: &str) -> Vec<&'a String> {
    topics
        .iter()
        .filter(|topic| segments_match(topic, pattern))
        .collect()
}

/// Symmetric to [`match_list`]: given a literal `topic`, returns the
/// subset of `patterns` that match it (wildcard or literal-equal).
pub fn match_related_wildcards<'a>(topic: &str, patterns: &'a [String]) -> Vec<&'a String> {
    patterns
        .iter()
        .filter(|pattern| segments_match(topic, pattern))
        .collect()
}

/// Segment-wise match between a literal topic and a pattern that may
/// contain `*` wildcard segments. A literal pattern identical to `topic`
/// matches via this same path (every segment compares equal).
fn segments_match(topic: &str, pattern: &str) -> bool {
    let topic_segments: Vec<&str> = topic.split(SEPARATOR).collect();
    let pattern_segments: Vec<&str> = pattern.split(SEPARATOR).collect();

    if topic_segments.len() != pattern_segments.len() {
        return false;
    }

    topic_segments
        .iter()
        .zip(pattern_segments.iter())
        .all(|(t, p)| *p == "*" || t == p)
}
