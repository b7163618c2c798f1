#![expect(
    clippy::expect_used,
    reason = "tests should fail fast when setup breaks"
)]

//! Property coverage for the end-to-end recommendation pipeline.

use std::sync::Arc;

use geo::Coord;
use proptest::prelude::*;
use techmatch_core::{
    Recommender, ServiceRequest, Technician,
    test_support::{DirectorySeed, MemoryDirectory, ready_context},
};

const REQUEST_ID: u64 = 1;

fn location() -> impl Strategy<Value = Option<Coord<f64>>> {
    proptest::option::of((-60.0_f64..60.0, -170.0_f64..170.0).prop_map(|(y, x)| Coord { x, y }))
}

fn technician(id: u64) -> impl Strategy<Value = Technician> {
    (location(), proptest::option::of(0.0_f64..5.0), any::<bool>()).prop_map(
        move |(location, average_rating, available)| Technician {
            id,
            location,
            average_rating,
            available,
        },
    )
}

fn seed() -> impl Strategy<Value = DirectorySeed> {
    (0_usize..8)
        .prop_flat_map(|count| {
            let technicians: Vec<_> = (1..=count as u64).map(technician).collect();
            (
                location(),
                technicians,
                proptest::collection::vec((1..=8_u64, 1.0_f64..5.0), 0..16),
                proptest::collection::vec((1..=8_u64, proptest::option::of(10.0_f64..500.0)), 0..16),
                proptest::collection::vec(1..=8_u64, 0..16),
            )
        })
        .prop_map(|(site, technicians, ratings, offers, assignments)| DirectorySeed {
            requests: vec![ServiceRequest::new(REQUEST_ID, 1, 1, site)],
            technicians,
            ratings,
            offers,
            assignments,
        })
}

fn recommender(seed: &DirectorySeed) -> Recommender<MemoryDirectory> {
    Recommender::new(Arc::new(ready_context()), MemoryDirectory::from_seed(seed))
}

proptest! {
    #[test]
    fn recommend_is_idempotent(seed in seed()) {
        let recommender = recommender(&seed);
        let first = recommender.recommend(REQUEST_ID, None).expect("first call");
        let second = recommender.recommend(REQUEST_ID, None).expect("second call");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn inline_and_directory_agree(seed in seed()) {
        let recommender = recommender(&seed);
        let payload = seed.inline_payload(REQUEST_ID);

        let from_directory = recommender.recommend(REQUEST_ID, None).expect("directory");
        let inline = recommender.recommend(REQUEST_ID, Some(&payload)).expect("inline");

        prop_assert_eq!(from_directory, inline);
    }

    #[test]
    fn ranking_is_sorted_and_complete(seed in seed()) {
        let ranked = recommender(&seed).recommend(REQUEST_ID, None).expect("ranking");
        let available = seed.technicians.iter().filter(|t| t.available).count();
        prop_assert_eq!(ranked.len(), available);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
