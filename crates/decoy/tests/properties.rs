//! Property tests for resolution order and consumption.

use bytes::Bytes;
use decoy::{Mock, Registry};
use hyper::Request;
use proptest::prelude::*;
use std::sync::Arc;

fn get(path: &str) -> Request<Bytes> {
    Request::get(format!("http://foo.com{path}"))
        .body(Bytes::new())
        .unwrap()
}

proptest! {
    /// Among mocks claiming the same path, the earliest registered live one wins.
    #[test]
    fn prop_first_match_wins(paths in prop::collection::vec(0u8..4, 1..12), probe in 0u8..4) {
        let registry = Registry::new();
        let mocks: Vec<_> = paths
            .iter()
            .map(|p| {
                let mock = Mock::given("http://foo.com")
                    .get(&format!("/p{p}"))
                    .reply(200)
                    .build()
                    .unwrap();
                registry.register(Arc::clone(&mock));
                (*p, mock)
            })
            .collect();

        let expected: Vec<_> = mocks.iter().filter(|(p, _)| *p == probe).map(|(_, m)| m).collect();
        for mock in &expected {
            let outcome = registry.match_request(&get(&format!("/p{probe}")));
            prop_assert!(Arc::ptr_eq(outcome.mock.as_ref().unwrap(), mock));
        }
        let probe_path = format!("/p{probe}");
        prop_assert!(registry.match_request(&get(&probe_path)).mock.is_none());
    }

    /// `times(n)` yields exactly n matches; `persist` never exhausts.
    #[test]
    fn prop_times_and_persist(n in 0usize..10, extra in 1usize..5, persist in any::<bool>()) {
        let registry = Registry::new();
        let mut builder = Mock::given("http://foo.com").times(n);
        if persist {
            builder = builder.persist();
        }
        let mock = builder.reply(200).mount(&registry).unwrap();

        let matched = (0..n + extra)
            .filter(|_| registry.match_request(&get("/")).mock.is_some())
            .count();
        if persist {
            prop_assert_eq!(matched, n + extra);
            prop_assert!(!mock.done());
        } else {
            prop_assert_eq!(matched, n);
            prop_assert!(mock.done());
            prop_assert!(registry.is_done());
        }
    }
}
