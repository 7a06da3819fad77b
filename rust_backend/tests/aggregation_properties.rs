//! Property tests for the spatial reductions.

use proptest::prelude::*;
use tetres_tt::aggregation::{spatial_average, spatial_total};
use tetres_tt::models::StationSeries;

fn station_set(max_stations: usize, max_len: usize) -> impl Strategy<Value = Vec<StationSeries>> {
    (1..=max_stations, 1..=max_len).prop_flat_map(|(stations, len)| {
        prop::collection::vec(
            prop::collection::vec(prop::option::weighted(0.8, 0.0f64..120.0), len),
            stations,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, data)| StationSeries::new(format!("S{}", i), data))
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn prop_outputs_follow_the_timeline(set in station_set(6, 24)) {
        let n = set[0].len();
        prop_assert_eq!(spatial_average(&set).unwrap().len(), n);
        prop_assert_eq!(spatial_total(&set).unwrap().len(), n);
    }

    #[test]
    fn prop_average_without_gaps_is_the_mean(
        rows in prop::collection::vec(prop::collection::vec(0.0f64..120.0, 5), 1..6)
    ) {
        let set: Vec<StationSeries> = rows
            .iter()
            .map(|r| StationSeries::from_values("S", r))
            .collect();
        let avgs = spatial_average(&set).unwrap();
        for (t, avg) in avgs.iter().enumerate() {
            let mean = rows.iter().map(|r| r[t]).sum::<f64>() / rows.len() as f64;
            prop_assert!((avg.unwrap() - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_average_stays_within_observed_range(set in station_set(6, 24)) {
        let observed: Vec<f64> = set.iter().flat_map(|s| s.data.iter().flatten().copied()).collect();
        let lo = observed.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for avg in spatial_average(&set).unwrap().into_iter().flatten() {
            prop_assert!(avg >= lo - 1e-9 && avg <= hi + 1e-9);
        }
    }

    #[test]
    fn prop_total_skips_missing_samples(set in station_set(6, 24)) {
        let totals = spatial_total(&set).unwrap();
        for (t, total) in totals.iter().enumerate() {
            let expected: f64 = set.iter().filter_map(|s| s.data[t]).sum();
            prop_assert!((total - expected).abs() < 1e-9);
        }
    }
}
