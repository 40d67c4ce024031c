#![no_main]
use gantry_rs::PolicyConfiguration;
use libfuzzer_sys::fuzz_target;

// Policy files come from deployment operators; malformed input must surface
// as a parse or validation error, never a panic.

fuzz_target!(|data: &str| {
    let _ = PolicyConfiguration::from_json(data);
    let _ = PolicyConfiguration::from_toml(data);
});
