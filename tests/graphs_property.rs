//! Property tests for eager wiring resolution.

use proptest::prelude::*;

use flowline::graphs::GraphBuilder;
use flowline::transform::Passthrough;

const STAGE_POOL: [&str; 6] = ["src", "mirror", "shake", "overlay", "display", "relay"];
const TAP_POOL: [&str; 4] = ["out", "trace", "archive", "preview"];

proptest! {
    /// Whenever every edge source is a declared stage, compilation succeeds,
    /// every undeclared target is reachable as a source, and no declared
    /// stage leaks into the tap table.
    #[test]
    fn resolution_covers_every_undeclared_target(
        declared in proptest::collection::btree_set(0usize..STAGE_POOL.len(), 1..=STAGE_POOL.len()),
        edges in proptest::collection::vec((0usize..STAGE_POOL.len(), 0usize..(STAGE_POOL.len() + TAP_POOL.len())), 0..24),
    ) {
        let declared: Vec<&str> = declared.into_iter().map(|i| STAGE_POOL[i]).collect();

        let mut builder = GraphBuilder::<u32>::new();
        for name in &declared {
            builder = builder.add_stage(*name, Passthrough);
        }

        let mut expected_taps: Vec<&str> = Vec::new();
        for (from_idx, to_idx) in &edges {
            // Clamp sources onto declared stages so the description is valid.
            let from = declared[from_idx % declared.len()];
            let to = if *to_idx < STAGE_POOL.len() {
                STAGE_POOL[*to_idx]
            } else {
                TAP_POOL[*to_idx - STAGE_POOL.len()]
            };
            builder = builder.add_edge(from, to);
            if !declared.contains(&to) && !expected_taps.contains(&to) {
                expected_taps.push(to);
            }
        }

        let graph = builder.compile().expect("valid wiring must compile");

        for tap in &expected_taps {
            prop_assert!(graph.source(tap).is_ok(), "tap `{tap}` must exist");
        }
        prop_assert_eq!(graph.source_names().count(), expected_taps.len());
        for stage in &declared {
            prop_assert!(graph.source(stage).is_err(), "stage `{stage}` must not be a tap");
            prop_assert!(graph.sink(stage).is_ok());
        }
    }

    /// An edge whose source is undeclared must fail compilation, regardless
    /// of everything else in the description.
    #[test]
    fn undeclared_edge_source_fails_compilation(
        declared in proptest::collection::btree_set(0usize..STAGE_POOL.len() - 1, 1..STAGE_POOL.len()),
        target in 0usize..(STAGE_POOL.len() + TAP_POOL.len()),
    ) {
        // The last pool entry is deliberately never declared.
        let ghost = STAGE_POOL[STAGE_POOL.len() - 1];
        let declared: Vec<&str> = declared.into_iter().map(|i| STAGE_POOL[i]).collect();

        let mut builder = GraphBuilder::<u32>::new();
        for name in &declared {
            builder = builder.add_stage(*name, Passthrough);
        }
        let to = if target < STAGE_POOL.len() {
            STAGE_POOL[target]
        } else {
            TAP_POOL[target - STAGE_POOL.len()]
        };

        let result = builder.add_edge(ghost, to).compile();
        prop_assert!(result.is_err());
    }
}
