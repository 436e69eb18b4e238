//! Fuzz target for endpoint resolution.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_endpoint_resolve
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use strata_migrate::ConnectionResolver;

#[derive(Debug, Arbitrary)]
struct Input {
    endpoint: String,
    base_domain: String,
    secret: String,
}

fuzz_target!(|input: Input| {
    let resolver = ConnectionResolver::new().base_domain(&input.base_domain);

    // A resolved host is always `db.<project>.<base>`.
    if let Ok(desc) = resolver.resolve(&input.endpoint, &input.secret) {
        assert!(desc.host.starts_with("db."));
        assert!(desc.host.ends_with(resolver.domain()));
        assert_eq!(desc.password, input.secret);
    }
});
