#![no_main]

use envelope_errors::{ErrorCode, namespaces};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    for ns in namespaces::ALL {
        let once = ErrorCode::namespaced(ns, raw);
        let twice = ErrorCode::namespaced(ns, once.as_str());

        assert_eq!(once, twice);
        assert!(once.is_in(ns));
        assert!(!once.identifier().is_empty());
        assert_eq!(once.identifier(), once.identifier().to_uppercase());
        assert!(ErrorCode::parse(once.as_str()).is_ok());
    }
});
