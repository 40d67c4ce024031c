#![no_main]
use gantry_rs::PatternMatcher;
use libfuzzer_sys::fuzz_target;

// Pattern matching runs on every request; arbitrary patterns and URIs must
// never panic, and matching must be insensitive to a trailing slash.

fuzz_target!(|input: (&str, &str)| {
    let (pattern, uri) = input;

    let matched = PatternMatcher::matches(pattern, uri);

    let trailing = format!("{}/", uri);
    assert_eq!(matched, PatternMatcher::matches(pattern, &trailing));
});
