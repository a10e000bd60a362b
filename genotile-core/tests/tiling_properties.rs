use genotile_core::coords::TileGeometry;
use genotile_core::config::TileConfig;
use genotile_core::normalize::row_sum_normalize;
use genotile_core::{unflatten, visible_tiles, Axis, GenomicRange, TilesetInfo};
use proptest::prelude::*;

fn flatten(matrix: &[Vec<f64>]) -> Vec<f64> {
    let rows = matrix.len();
    let channels = matrix.first().map_or(0, |r| r.len());
    let mut dense = vec![0.0; rows * channels];
    for (j, row) in matrix.iter().enumerate() {
        for (i, v) in row.iter().enumerate() {
            dense[rows * i + j] = *v;
        }
    }
    dense
}

fn arb_matrix() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1..8usize, 1..16usize).prop_flat_map(|(channels, rows)| {
        proptest::collection::vec(proptest::collection::vec(0.0..1000.0f64, channels), rows)
    })
}

proptest! {
    #[test]
    fn power_of_two_tiles_partition_the_extent(
        min in -1e6..1e6f64,
        max_width in 1.0..1e9f64,
        zoom in 0..12u32,
    ) {
        let info = TilesetInfo::power_of_two(vec![min], vec![min + max_width], max_width, 12);
        let geometry = TileGeometry::new(&info, &TileConfig::default()).unwrap();
        let count = 1u64 << zoom;

        let first = geometry.axis_extent(zoom, 0, Axis::X).unwrap();
        prop_assert_eq!(first.start, min);
        let mut end = first.end();
        for index in 1..count {
            let extent = geometry.axis_extent(zoom, index, Axis::X).unwrap();
            prop_assert!((extent.start - end).abs() <= 1e-6 * max_width);
            end = extent.end();
        }
        prop_assert!((end - (min + max_width)).abs() <= 1e-6 * max_width);
    }

    #[test]
    fn visible_tiles_cover_the_range(start in 0.0..1e6f64, width in 1.0..5e5f64, zoom in 0..10u32) {
        let info = TilesetInfo::power_of_two(vec![0.0], vec![2e6], 2_097_152.0, 10);
        let geometry = TileGeometry::new(&info, &TileConfig::default()).unwrap();
        let range = GenomicRange::new(start, start + width);
        let set = visible_tiles(zoom, &[range], &info).unwrap();

        prop_assert!(!set.is_empty());
        let first = geometry.tile_position(set.iter().next().unwrap()).unwrap().x;
        let last = geometry.tile_position(set.iter().last().unwrap()).unwrap().x;
        prop_assert!(first.start <= range.start);
        prop_assert!(last.end() >= range.end);
    }

    #[test]
    fn shifted_viewports_share_common_tiles(start in 0.0..1e6f64, width in 1e3..5e5f64, shift in 0.0..1.0f64, zoom in 0..10u32) {
        let info = TilesetInfo::power_of_two(vec![0.0], vec![2e6], 2_097_152.0, 10);
        let a = GenomicRange::new(start, start + width);
        let b = GenomicRange::new(start + shift * width, start + width + shift * width);
        let common = GenomicRange::new(b.start, a.end);

        let set_a = visible_tiles(zoom, &[a], &info).unwrap();
        let set_b = visible_tiles(zoom, &[b], &info).unwrap();
        let set_common = visible_tiles(zoom, &[common], &info).unwrap();

        for id in set_common.iter() {
            prop_assert!(set_a.contains(id));
            prop_assert!(set_b.contains(id));
        }
    }

    #[test]
    fn unflatten_inverts_flatten(matrix in arb_matrix()) {
        let shape = [matrix[0].len(), matrix.len()];
        prop_assert_eq!(unflatten(&flatten(&matrix), shape).unwrap(), matrix);
    }

    #[test]
    fn row_sum_rows_sum_to_one(matrix in arb_matrix()) {
        let normalized = row_sum_normalize(&matrix).unwrap();
        for (row, original) in normalized.iter().zip(&matrix) {
            if original.iter().sum::<f64>() != 0.0 {
                prop_assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            }
        }
    }
}
