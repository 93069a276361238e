//! Property-based tests for atlas allocator correctness
//!
//! Uses proptest to verify packing invariants hold across many random request
//! sequences

use proptest::prelude::*;
use quadatlas::{AtlasAllocator, Placement};
use std::collections::HashMap;

const PAGE_SIZE: u32 = 256;
const MIN_SIZE: u32 = 16;

fn rgba(width: u32, height: u32, byte: u8) -> Vec<u8> {
    vec![byte; width as usize * height as usize * 4]
}

fn expected_quad(width: u32, height: u32) -> u32 {
    width
        .next_power_of_two()
        .max(height.next_power_of_two())
        .max(MIN_SIZE)
}

fn requests() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..=PAGE_SIZE, 1u32..=PAGE_SIZE), 1..40)
}

/// Requests biased towards small images so pages actually get shared
fn small_requests() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..=70, 1u32..=70), 1..80)
}

proptest! {
    #[test]
    fn prop_no_overlap(sizes in small_requests()) {
        let mut atlas = AtlasAllocator::new(PAGE_SIZE, MIN_SIZE).unwrap();
        let mut placed: Vec<Placement> = Vec::new();

        for (i, (w, h)) in sizes.iter().enumerate() {
            let p = atlas.load(&format!("img{}", i), *w, *h, &rgba(*w, *h, i as u8)).unwrap();

            prop_assert!(p.offset.0 + p.size.0 <= PAGE_SIZE);
            prop_assert!(p.offset.1 + p.size.1 <= PAGE_SIZE);

            // Reserved quads must not overlap either, not just the image footprints
            let quad = p.quad(MIN_SIZE);
            for other in &placed {
                prop_assert!(
                    !quad.overlaps(&other.quad(MIN_SIZE)),
                    "{:?} overlaps {:?}",
                    p,
                    other
                );
                prop_assert!(!p.overlaps(other));
            }
            placed.push(p);
        }
    }

    #[test]
    fn prop_dedup_idempotent(sizes in small_requests(), repeat in 0usize..80) {
        let mut atlas = AtlasAllocator::new(PAGE_SIZE, MIN_SIZE).unwrap();
        let mut first = HashMap::new();

        for (i, (w, h)) in sizes.iter().enumerate() {
            let key = format!("img{}", i);
            first.insert(key.clone(), atlas.load(&key, *w, *h, &rgba(*w, *h, 1)).unwrap());
        }

        let idx = repeat % sizes.len();
        let key = format!("img{}", idx);
        let (w, h) = sizes[idx];

        let pages_before: Vec<Vec<u8>> = (0..atlas.page_count())
            .map(|i| atlas.page_buffer(i).unwrap().to_vec())
            .collect();
        let stats_before = atlas.stats();

        let again = atlas.load(&key, w, h, &rgba(w, h, 0xEE)).unwrap();
        prop_assert_eq!(Some(&again), first.get(&key));

        // No page touched, no allocation made
        prop_assert_eq!(atlas.page_count(), pages_before.len());
        for (i, before) in pages_before.iter().enumerate() {
            prop_assert!(atlas.page_buffer(i).unwrap() == &before[..]);
        }
        let stats_after = atlas.stats();
        prop_assert_eq!(stats_after.used_area, stats_before.used_area);
        prop_assert_eq!(&stats_after.free_quads_per_level, &stats_before.free_quads_per_level);
    }

    #[test]
    fn prop_conservation_of_area(sizes in requests()) {
        let mut atlas = AtlasAllocator::new(PAGE_SIZE, MIN_SIZE).unwrap();
        let mut quad_area = 0u64;

        for (i, (w, h)) in sizes.iter().enumerate() {
            let p = atlas.load(&format!("img{}", i), *w, *h, &rgba(*w, *h, 0)).unwrap();
            let side = p.quad_size(MIN_SIZE) as u64;
            quad_area += side * side;

            let stats = atlas.stats();
            prop_assert_eq!(stats.used_area, quad_area);
            prop_assert_eq!(
                stats.used_area + stats.free_area,
                atlas.page_count() as u64 * PAGE_SIZE as u64 * PAGE_SIZE as u64
            );
        }
    }

    #[test]
    fn prop_power_of_two_quads(sizes in requests()) {
        let mut atlas = AtlasAllocator::new(PAGE_SIZE, MIN_SIZE).unwrap();

        for (i, (w, h)) in sizes.iter().enumerate() {
            let p = atlas.load(&format!("img{}", i), *w, *h, &rgba(*w, *h, 0)).unwrap();
            let quad = p.quad(MIN_SIZE);

            prop_assert_eq!(p.size, (*w, *h));
            prop_assert_eq!(quad.size, expected_quad(*w, *h));
            prop_assert!(quad.size.is_power_of_two());
            prop_assert!(quad.size >= MIN_SIZE && quad.size <= PAGE_SIZE);
            prop_assert!(quad.is_aligned());
        }

        for quad in atlas.free_quads() {
            prop_assert!(quad.size.is_power_of_two());
            prop_assert!(quad.size >= MIN_SIZE);
            prop_assert!(quad.is_aligned());
        }
    }

    #[test]
    fn prop_growth_monotonic(sizes in requests()) {
        let mut atlas = AtlasAllocator::new(PAGE_SIZE, MIN_SIZE).unwrap();

        for (i, (w, h)) in sizes.iter().enumerate() {
            let level = (PAGE_SIZE / expected_quad(*w, *h)).trailing_zeros() as usize;
            let before = atlas.page_count();
            let nothing_free = atlas.stats().free_quads_per_level[..=level]
                .iter()
                .all(|&n| n == 0);

            atlas.load(&format!("img{}", i), *w, *h, &rgba(*w, *h, 0)).unwrap();

            let after = atlas.page_count();
            if nothing_free {
                prop_assert_eq!(after, before + 1);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }

    #[test]
    fn prop_release_then_reload_keeps_invariants(
        sizes in small_requests(),
        release_mask in prop::collection::vec(any::<bool>(), 80)
    ) {
        let mut atlas = AtlasAllocator::new(PAGE_SIZE, MIN_SIZE).unwrap();

        for (i, (w, h)) in sizes.iter().enumerate() {
            atlas.load(&format!("img{}", i), *w, *h, &rgba(*w, *h, 0)).unwrap();
        }
        for i in 0..sizes.len() {
            if release_mask[i] {
                atlas.release(&format!("img{}", i)).unwrap();
            }
        }
        for (i, (w, h)) in sizes.iter().enumerate() {
            atlas.load(&format!("again{}", i), *h, *w, &rgba(*h, *w, 0)).unwrap();
        }

        let stats = atlas.stats();
        prop_assert_eq!(stats.used_area + stats.free_area, stats.total_area());
        prop_assert!(atlas.manifest().validate().is_ok());
    }

    #[test]
    fn prop_oversized_rejected_without_side_effects(
        sizes in small_requests(),
        extra in 1u32..1000
    ) {
        let mut atlas = AtlasAllocator::new(PAGE_SIZE, MIN_SIZE).unwrap();
        for (i, (w, h)) in sizes.iter().enumerate() {
            atlas.load(&format!("img{}", i), *w, *h, &rgba(*w, *h, 0)).unwrap();
        }
        let before = atlas.stats();

        let w = PAGE_SIZE + extra;
        let result = atlas.load("too-big", w, 1, &rgba(w, 1, 0));
        prop_assert!(
            matches!(result, Err(quadatlas::AtlasError::ImageTooLarge { .. })),
            "expected ImageTooLarge, got {:?}",
            result
        );
        prop_assert!(result.unwrap_err().is_request_error());

        let short = atlas.load("short", 8, 8, &[0u8; 10]);
        prop_assert!(
            matches!(short, Err(quadatlas::AtlasError::InvalidRequest(_))),
            "expected InvalidRequest, got {:?}",
            short
        );

        // Counters included: a rejected load is not a cache miss
        prop_assert_eq!(atlas.stats(), before);
        prop_assert!(!atlas.contains("too-big"));
        prop_assert!(!atlas.contains("short"));
    }
}
