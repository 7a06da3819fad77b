//! Per-timestep metadata snapshots.
//!
//! A snapshot keeps the raw virtual-node samples of one timestep together
//! with speed statistics, ramp volumes and the thresholds in effect, so that
//! threshold-dependent measures can later be recomputed without going back
//! to the sensor layer.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MergeFlow, MoeThresholds, Sample, StationSeries};

#[derive(Debug, Error)]
pub enum MetaDataError {
    #[error("Failed to parse metadata at '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted snapshot layout. Field names and order are the stored format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    pub flow: Vec<Sample>,
    pub speed: Vec<Sample>,
    pub density: Vec<Sample>,
    pub lanes: Vec<f64>,
    pub speed_average: f64,
    pub speed_variance: f64,
    pub speed_max_u: f64,
    pub speed_min_u: f64,
    pub speed_difference: f64,
    pub number_of_vehicles_entered: f64,
    pub number_of_vehicles_exited: f64,
    pub moe_lane_capacity: f64,
    pub moe_critical_density: f64,
    pub moe_congestion_threshold_speed: f64,
}

impl MetaData {
    /// Thresholds the snapshot was produced with.
    pub fn thresholds(&self) -> MoeThresholds {
        MoeThresholds {
            critical_density: self.moe_critical_density,
            lane_capacity: self.moe_lane_capacity,
            congestion_threshold_speed: self.moe_congestion_threshold_speed,
        }
    }

    pub fn to_json(&self) -> Result<String, MetaDataError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, MetaDataError> {
        let de = &mut serde_json::Deserializer::from_str(s);
        serde_path_to_error::deserialize(de).map_err(|e| MetaDataError::Parse {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        })
    }
}

/// Raw inputs a snapshot is cut from. Every series is aligned with the
/// period timeline; `raw_lanes` holds one static lane count per virtual node.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotInputs<'a> {
    pub raw_flow: &'a [Vec<Sample>],
    pub raw_speed: &'a [Vec<Sample>],
    pub raw_density: &'a [Vec<Sample>],
    pub raw_lanes: &'a [f64],
    /// Station speeds without virtual nodes, used for the speed statistics.
    pub station_speeds: &'a [StationSeries],
    pub merge_flows: &'a [MergeFlow],
}

/// Summary statistics over the station speeds of one timestep.
///
/// Each statistic is `None` when it is undefined for the sample set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedStats {
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}

impl SpeedStats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        let mean = (n > 0).then(|| samples.iter().sum::<f64>() / n as f64);
        let variance = match mean {
            Some(m) if n >= 2 => {
                Some(samples.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64)
            }
            _ => None,
        };
        Self {
            mean,
            variance,
            max: samples.iter().copied().reduce(f64::max),
            min: samples.iter().copied().reduce(f64::min),
        }
    }
}

fn or_zero(name: &str, value: Option<f64>, time_index: usize) -> f64 {
    value.unwrap_or_else(|| {
        warn!(
            "fail to calculate {} at timestep {}: not enough speed samples",
            name, time_index
        );
        0.0
    })
}

/// Sum of positive ramp samples at `time_index` for nodes matching `select`.
fn ramp_volume(
    merge_flows: &[MergeFlow],
    time_index: usize,
    what: &str,
    select: impl Fn(&crate::models::RNode) -> bool,
) -> f64 {
    let mut total = 0.0;
    for mf in merge_flows {
        let Some(rnode) = mf.rnode.as_ref() else {
            warn!("skipping unclassified merge point while counting vehicles {}", what);
            continue;
        };
        if !select(rnode) {
            continue;
        }
        match mf.data.get(time_index) {
            Some(Some(v)) if *v > 0.0 => total += v,
            Some(_) => {}
            None => warn!(
                "fail to count vehicles {} at '{}': no sample at timestep {}",
                what, rnode.name, time_index
            ),
        }
    }
    total
}

/// Build the snapshot of `time_index` using `thresholds`.
pub fn build(inputs: &SnapshotInputs<'_>, thresholds: &MoeThresholds, time_index: usize) -> MetaData {
    let at = |row: &Vec<Sample>| row.get(time_index).copied().flatten();
    let n_nodes = inputs
        .raw_flow
        .len()
        .min(inputs.raw_speed.len())
        .min(inputs.raw_density.len())
        .min(inputs.raw_lanes.len());

    let speed_samples: Vec<f64> = inputs
        .station_speeds
        .iter()
        .filter_map(|s| s.at(time_index))
        .collect();
    let stats = SpeedStats::from_samples(&speed_samples);
    let speed_max_u = or_zero("speed max", stats.max, time_index);
    let speed_min_u = or_zero("speed min", stats.min, time_index);

    MetaData {
        flow: inputs.raw_flow[..n_nodes].iter().map(at).collect(),
        speed: inputs.raw_speed[..n_nodes].iter().map(at).collect(),
        density: inputs.raw_density[..n_nodes].iter().map(at).collect(),
        lanes: inputs.raw_lanes[..n_nodes].to_vec(),
        speed_average: or_zero("speed average", stats.mean, time_index),
        speed_variance: or_zero("speed variance", stats.variance, time_index),
        speed_max_u,
        speed_min_u,
        speed_difference: speed_max_u - speed_min_u,
        number_of_vehicles_entered: ramp_volume(inputs.merge_flows, time_index, "entered", |n| {
            n.is_entrance()
        }),
        number_of_vehicles_exited: ramp_volume(inputs.merge_flows, time_index, "exited", |n| {
            n.is_exit()
        }),
        moe_lane_capacity: thresholds.lane_capacity,
        moe_critical_density: thresholds.critical_density,
        moe_congestion_threshold_speed: thresholds.congestion_threshold_speed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RNode;

    fn thresholds() -> MoeThresholds {
        MoeThresholds::new(40.0, 2200.0, 45.0)
    }

    struct Fixture {
        flow: Vec<Vec<Sample>>,
        speed: Vec<Vec<Sample>>,
        density: Vec<Vec<Sample>>,
        lanes: Vec<f64>,
        stations: Vec<StationSeries>,
        merges: Vec<MergeFlow>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                flow: vec![vec![Some(1800.0), Some(1900.0)], vec![Some(2000.0), None]],
                speed: vec![vec![Some(60.0), Some(40.0)], vec![Some(55.0), Some(35.0)]],
                density: vec![vec![Some(30.0), Some(47.5)], vec![Some(36.4), Some(50.0)]],
                lanes: vec![3.0, 2.0],
                stations: vec![
                    StationSeries::from_values("S1", &[60.0, 40.0]),
                    StationSeries::new("S2", vec![Some(50.0), None]),
                ],
                merges: vec![
                    MergeFlow {
                        rnode: Some(RNode::entrance("E1", 0.5)),
                        data: vec![Some(120.0), Some(-1.0)],
                    },
                    MergeFlow {
                        rnode: Some(RNode::entrance("E2", 0.8)),
                        data: vec![Some(30.0), Some(10.0)],
                    },
                    MergeFlow {
                        rnode: Some(RNode::exit("X1", 1.0)),
                        data: vec![Some(80.0), None],
                    },
                    MergeFlow {
                        rnode: None,
                        data: vec![Some(999.0), Some(999.0)],
                    },
                ],
            }
        }

        fn inputs(&self) -> SnapshotInputs<'_> {
            SnapshotInputs {
                raw_flow: &self.flow,
                raw_speed: &self.speed,
                raw_density: &self.density,
                raw_lanes: &self.lanes,
                station_speeds: &self.stations,
                merge_flows: &self.merges,
            }
        }
    }

    #[test]
    fn test_slices_raw_arrays_at_timestep() {
        let fx = Fixture::new();
        let meta = build(&fx.inputs(), &thresholds(), 1);
        assert_eq!(meta.flow, vec![Some(1900.0), None]);
        assert_eq!(meta.speed, vec![Some(40.0), Some(35.0)]);
        assert_eq!(meta.density, vec![Some(47.5), Some(50.0)]);
        assert_eq!(meta.lanes, vec![3.0, 2.0]);
    }

    #[test]
    fn test_speed_statistics() {
        let fx = Fixture::new();
        let meta = build(&fx.inputs(), &thresholds(), 0);
        assert_eq!(meta.speed_average, 55.0);
        assert_eq!(meta.speed_variance, 50.0);
        assert_eq!(meta.speed_max_u, 60.0);
        assert_eq!(meta.speed_min_u, 50.0);
        assert_eq!(meta.speed_difference, 10.0);
    }

    #[test]
    fn test_single_sample_variance_is_zero() {
        let fx = Fixture::new();
        let meta = build(&fx.inputs(), &thresholds(), 1);
        assert_eq!(meta.speed_average, 40.0);
        assert_eq!(meta.speed_variance, 0.0);
        assert_eq!(meta.speed_difference, 0.0);
    }

    #[test]
    fn test_no_samples_degrade_to_zero() {
        let mut fx = Fixture::new();
        fx.stations = vec![StationSeries::new("S1", vec![None, None])];
        let meta = build(&fx.inputs(), &thresholds(), 0);
        assert_eq!(meta.speed_average, 0.0);
        assert_eq!(meta.speed_variance, 0.0);
        assert_eq!(meta.speed_max_u, 0.0);
        assert_eq!(meta.speed_min_u, 0.0);
        assert_eq!(meta.speed_difference, 0.0);
    }

    #[test]
    fn test_ramp_volumes_count_positive_classified_samples() {
        let fx = Fixture::new();
        let t0 = build(&fx.inputs(), &thresholds(), 0);
        assert_eq!(t0.number_of_vehicles_entered, 150.0);
        assert_eq!(t0.number_of_vehicles_exited, 80.0);

        let t1 = build(&fx.inputs(), &thresholds(), 1);
        assert_eq!(t1.number_of_vehicles_entered, 10.0);
        assert_eq!(t1.number_of_vehicles_exited, 0.0);
    }

    #[test]
    fn test_short_ramp_series_contributes_zero() {
        let mut fx = Fixture::new();
        fx.merges[0].data.truncate(1);
        let meta = build(&fx.inputs(), &thresholds(), 1);
        assert_eq!(meta.number_of_vehicles_entered, 10.0);
    }

    #[test]
    fn test_embeds_thresholds() {
        let fx = Fixture::new();
        let th = MoeThresholds::new(35.0, 2000.0, 50.0);
        let meta = build(&fx.inputs(), &th, 0);
        assert_eq!(meta.thresholds(), th);
    }

    #[test]
    fn test_json_layout() {
        let fx = Fixture::new();
        let json = build(&fx.inputs(), &thresholds(), 1).to_json().unwrap();
        assert!(json.starts_with("{\"flow\":[1900.0,null],\"speed\":"));
        assert!(json.ends_with("\"moe_congestion_threshold_speed\":45.0}"));
        let parsed = MetaData::from_json(&json).unwrap();
        assert_eq!(parsed.flow, vec![Some(1900.0), None]);
    }

    #[test]
    fn test_thresholds_survive_json_exactly() {
        let fx = Fixture::new();
        let th = MoeThresholds::new(40.702075331263124, 2187.3300000000004, 50.639965196936004);
        let json = build(&fx.inputs(), &th, 0).to_json().unwrap();
        assert_eq!(MetaData::from_json(&json).unwrap().thresholds(), th);
    }

    struct Capture(std::sync::Mutex<Vec<(log::Level, String)>>);

    impl log::Log for Capture {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            if let Ok(mut lines) = self.0.lock() {
                lines.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(std::sync::Mutex::new(Vec::new()));

    #[test]
    fn test_unclassified_merge_point_is_a_warning() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Trace);

        let fx = Fixture::new();
        build(&fx.inputs(), &thresholds(), 0);

        let lines = CAPTURE.0.lock().unwrap();
        let skipped: Vec<_> = lines
            .iter()
            .filter(|(_, msg)| msg.contains("unclassified merge point"))
            .collect();
        assert!(!skipped.is_empty());
        assert!(skipped.iter().all(|(level, _)| *level == log::Level::Warn));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let err = MetaData::from_json("{\"flow\":[\"x\"]}").unwrap_err();
        match err {
            MetaDataError::Parse { path, .. } => assert_eq!(path, "flow[0]"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
