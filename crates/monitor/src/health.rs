//! Deployment health score

use crate::ResourceSample;
use serde::{Deserialize, Serialize};

const OFFLINE_PENALTY: i32 = 50;
const CPU_PENALTY: i32 = 10;
const MEMORY_PENALTY: i32 = 15;
const DISK_PENALTY: i32 = 20;
const LATENCY_PENALTY: i32 = 10;

const CPU_LIMIT: f64 = 80.0;
const MEMORY_LIMIT: f64 = 85.0;
const DISK_LIMIT: f64 = 90.0;
const LATENCY_LIMIT_MS: f64 = 2000.0;

/// Whether the deployment answered its last probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    #[default]
    Online,
    Offline,
}

impl Availability {
    pub fn from_online(online: bool) -> Self {
        if online {
            Availability::Online
        } else {
            Availability::Offline
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Online => "Online",
            Availability::Offline => "Offline",
        }
    }
}

/// 100 minus a penalty per breached threshold, floored at 0
pub fn health_score(sample: &ResourceSample) -> u8 {
    let mut score = 100;
    if !sample.online {
        score -= OFFLINE_PENALTY;
    }
    if sample.cpu_percent > CPU_LIMIT {
        score -= CPU_PENALTY;
    }
    if sample.memory_percent > MEMORY_LIMIT {
        score -= MEMORY_PENALTY;
    }
    if sample.disk_percent > DISK_LIMIT {
        score -= DISK_PENALTY;
    }
    if sample.latency_ms > LATENCY_LIMIT_MS {
        score -= LATENCY_PENALTY;
    }
    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_healthy_sample_scores_full() {
        let sample = ResourceSample {
            cpu_percent: 20.0,
            memory_percent: 40.0,
            disk_percent: 50.0,
            latency_ms: 120.0,
            online: true,
        };
        assert_eq!(health_score(&sample), 100);
    }

    #[test]
    fn test_every_penalty_floors_at_zero() {
        let sample = ResourceSample {
            cpu_percent: 85.0,
            memory_percent: 90.0,
            disk_percent: 95.0,
            latency_ms: 2500.0,
            online: false,
        };
        assert_eq!(health_score(&sample), 0);
    }

    #[test]
    fn test_single_penalties() {
        let base = ResourceSample {
            online: true,
            ..Default::default()
        };
        assert_eq!(health_score(&ResourceSample { online: false, ..base }), 50);
        assert_eq!(health_score(&ResourceSample { disk_percent: 91.0, ..base }), 80);
        assert_eq!(health_score(&ResourceSample { latency_ms: 2000.0, ..base }), 100);
    }

    proptest! {
        #[test]
        fn prop_score_in_range(
            cpu in -10.0f64..200.0,
            memory in -10.0f64..200.0,
            disk in -10.0f64..200.0,
            latency in -100.0f64..100_000.0,
            online in any::<bool>(),
        ) {
            let sample = ResourceSample {
                cpu_percent: cpu,
                memory_percent: memory,
                disk_percent: disk,
                latency_ms: latency,
                online,
            };
            prop_assert!(health_score(&sample) <= 100);
        }
    }
}
