use proptest::prelude::*;
use strata_downsample::{Downsampler, LayerSchedule, downsample};
use strata_grid::{Grid, GridDims};

fn dim() -> impl Strategy<Value = u32> {
    0u32..=13
}

fn binary_grid() -> impl Strategy<Value = Grid> {
    (dim(), dim(), dim()).prop_flat_map(|(x, y, z)| {
        let d = GridDims::new(x, y, z);
        prop::collection::vec(prop::bool::weighted(0.1), d.len()).prop_map(move |bits| {
            let data = bits.into_iter().map(u32::from).collect();
            Grid::from_data(d, data, 7).unwrap()
        })
    })
}

fn schedule() -> impl Strategy<Value = LayerSchedule> {
    prop_oneof![
        Just(LayerSchedule::PerLayer),
        (1usize..=4).prop_map(|workers| LayerSchedule::Pool { workers }),
        (0usize..=8, 1usize..=4)
            .prop_map(|(max_layer_tasks, workers)| LayerSchedule::Auto { max_layer_tasks, workers }),
    ]
}

// Literal neighborhood evaluation through the bounds-checked accessors
fn expected_voxel(input: &Grid, x: u32, y: u32, z: u32) -> u32 {
    for dz in -1i64..=1 { for dy in -1i64..=1 { for dx in -1i64..=1 {
        let (xn, yn, zn) = (2 * (i64::from(x) + dx), 2 * (i64::from(y) + dy), 2 * (i64::from(z) + dz));
        if xn < 0 || yn < 0 || zn < 0 {
            continue;
        }
        if let Ok(1) = input.val(xn as u32, yn as u32, zn as u32) {
            return 1;
        }
    }}}
    0
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // dims halve with floor division on every axis
    #[test]
    fn dims_halve(g in binary_grid()) {
        let d = g.dims();
        prop_assert_eq!(downsample(&g).dims(), GridDims::new(d.x / 2, d.y / 2, d.z / 2));
    }

    // every output voxel matches the 27-candidate rule
    #[test]
    fn matches_neighborhood_rule(g in binary_grid()) {
        let out = downsample(&g);
        let od = out.dims();
        for z in 0..od.z { for y in 0..od.y { for x in 0..od.x {
            prop_assert_eq!(out.val(x, y, z).unwrap(), expected_voxel(&g, x, y, z));
        }}}
        prop_assert_eq!(out.label(), g.label());
    }

    // any schedule, any worker count, repeated runs: identical output
    #[test]
    fn schedule_does_not_change_output(g in binary_grid(), s in schedule()) {
        let reference = downsample(&g);
        let d = Downsampler::new(s).unwrap();
        for _ in 0..3 {
            prop_assert_eq!(&d.downsample(&g), &reference);
        }
    }

    // output stays binary
    #[test]
    fn output_is_binary(g in binary_grid()) {
        prop_assert!(downsample(&g).data().iter().all(|&v| v <= 1));
    }
}
