#![no_main]

//! Fuzz target for filter option string parsing.

use detelecine::DetelecineConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 {
        return;
    }
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Anything that parses must describe a usable cadence and re-parse to
    // the same configuration.
    if let Ok(config) = s.parse::<DetelecineConfig>() {
        assert!(config.cadence().is_ok());
        let reparsed: DetelecineConfig = config.to_string().parse().expect("display re-parses");
        assert_eq!(reparsed, config);
    }
});
