//! # Set-Mapping Tests
//!
//! Geometry properties of the direct-mapped set computation and the
//! `set-map` pipeline end to end.

use cachelab_viz::cli::SetMapCli;
use cachelab_viz::error::Error;
use cachelab_viz::geometry::{MatrixGeometry, compute};
use cachelab_viz::run_set_map;
use clap::Parser;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(0, 0, 0)]
#[case(0, 7, 0)]
#[case(0, 8, 1)]
#[case(7, 15, 15)]
#[case(2, 0, 4)]
fn test_reference_geometry(#[case] row: usize, #[case] col: usize, #[case] expected: u64) {
    let geometry = MatrixGeometry::new(8, 16, 4, 1024, 32).unwrap();
    let (grid, sets_count) = compute(&geometry).unwrap();
    assert_eq!(sets_count, 32);
    assert_eq!(grid.get(row, col), Some(expected));
}

#[rstest]
#[case(1024, 30)]
#[case(1024, 0)]
#[case(0, 32)]
#[case(16, 32)]
fn test_bad_geometry_is_fatal(#[case] cache_size: u64, #[case] block_size: u64) {
    let err = MatrixGeometry::new(4, 4, 4, cache_size, block_size).unwrap_err();
    assert!(matches!(err, Error::InvalidGeometry { .. }), "got {err}");
}

#[test]
fn test_wide_rows_alias_each_other() {
    // 256 ints per row fill the whole 1 KiB cache, so every row maps identically
    let geometry = MatrixGeometry::new(4, 256, 4, 1024, 32).unwrap();
    let (grid, _) = compute(&geometry).unwrap();
    for row in 1..4 {
        assert_eq!(grid.row(row), grid.row(0));
    }
}

fn geometry_strategy() -> impl Strategy<Value = MatrixGeometry> {
    (1usize..24, 1usize..24, 1u64..16, 0u32..6, 1u64..8).prop_map(|(rows, cols, int_size, block_log, sets)| {
        let block_size = 1u64 << block_log;
        MatrixGeometry::new(rows, cols, int_size, block_size * sets, block_size).unwrap()
    })
}

proptest! {
    #[test]
    fn prop_sets_in_range(geometry in geometry_strategy()) {
        let (grid, sets_count) = compute(&geometry).unwrap();
        prop_assert_eq!(sets_count, geometry.cache_size / geometry.block_size);
        prop_assert_eq!(grid.len(), geometry.rows * geometry.cols);
        for (_, _, set) in grid.iter() {
            prop_assert!(set < sets_count);
        }
    }

    #[test]
    fn prop_one_cache_apart_same_set(geometry in geometry_strategy()) {
        let (grid, _) = compute(&geometry).unwrap();
        // elements whose byte offsets differ by exactly cache_size
        if geometry.cache_size % geometry.int_size == 0 {
            let stride = (geometry.cache_size / geometry.int_size) as usize;
            let cells: Vec<u64> = grid.iter().map(|(_, _, set)| set).collect();
            for idx in 0..cells.len().saturating_sub(stride) {
                prop_assert_eq!(cells[idx], cells[idx + stride]);
            }
        }
    }
}

#[test]
fn test_cli_defaults() {
    let cli = SetMapCli::parse_from(["set-map", "-N", "8", "-M", "16"]);
    assert_eq!(cli.int_size, 4);
    assert_eq!(cli.cache_size, 1024);
    assert_eq!(cli.block_size, 32);
    assert!(!cli.annotate);
    assert!(cli.out.is_none());
    assert!(cli.title.is_none());
}

#[test]
fn test_cli_rejects_zero_rows() {
    assert!(SetMapCli::try_parse_from(["set-map", "-N", "0", "-M", "16"]).is_err());
}

#[test]
fn test_run_writes_annotated_svg() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("sets.svg");
    let cli = SetMapCli::parse_from([
        "set-map",
        "-N",
        "8",
        "-M",
        "16",
        "--annotate",
        "--out",
        out.to_str().unwrap(),
    ]);
    let outcome = run_set_map(cli).unwrap();
    assert!(outcome.annotated);
    assert!(!outcome.annotation_skipped);
    let svg = std::fs::read_to_string(&out).unwrap();
    assert!(svg.contains("N=8, M=16, int=4B, cache=1024B, block=32B (32 sets)"));
}

#[test]
fn test_reference_svg_labels_every_set() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("reference.svg");
    let cli = SetMapCli::parse_from(["set-map", "-N", "8", "-M", "16", "--out", out.to_str().unwrap()]);
    run_set_map(cli).unwrap();

    let svg = std::fs::read_to_string(&out).unwrap();
    for set in 0..32 {
        assert!(svg.contains(&format!(">{set}</text>")), "no label for set {set}");
    }
    // sets past the last column index only appear in the legend
    for set in 16..32 {
        assert_eq!(svg.matches(&format!(">{set}</text>")).count(), 1, "set {set}");
    }
}

#[test]
fn test_run_suppresses_large_annotation() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("big.svg");
    let cli = SetMapCli::parse_from([
        "set-map",
        "-N",
        "40",
        "-M",
        "40",
        "--annotate",
        "--title",
        "big",
        "--out",
        out.to_str().unwrap(),
    ]);
    let outcome = run_set_map(cli).unwrap();
    assert!(!outcome.annotated);
    assert!(outcome.annotation_skipped);
    assert!(out.exists());
}

#[test]
fn test_run_fails_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("never.svg");
    let cli = SetMapCli::parse_from([
        "set-map",
        "-N",
        "8",
        "-M",
        "8",
        "--cache-size",
        "1000",
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(matches!(run_set_map(cli), Err(Error::InvalidGeometry { .. })));
    assert!(!out.exists());
}
