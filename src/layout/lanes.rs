// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, HashMap};

use smallvec::SmallVec;

use crate::model::NodeId;

/// Lanes closer than this are treated as the same lane when re-registering.
const SAME_LANE_EPSILON: f64 = 1e-6;

pub(crate) type LaneGroup = SmallVec<[f64; 8]>;

/// Probe limits and spacing used while reserving lanes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LaneProbe {
    pub(crate) min_lane_gap: f64,
    pub(crate) max_lane_probes: u32,
    pub(crate) max_group_probes: u32,
}

/// Per-call reservation state threaded through one layout traversal.
#[derive(Debug, Default)]
pub(crate) struct LaneState {
    layer_occupancy: BTreeMap<usize, Vec<f64>>,
    lane_overrides: HashMap<NodeId, f64>,
    overlap_fallbacks: usize,
}

fn clears_all(reserved: &[f64], candidate: f64, gap: f64) -> bool {
    reserved.iter().all(|lane| (lane - candidate).abs() >= gap)
}

impl LaneState {
    pub(crate) fn overlap_fallbacks(&self) -> usize {
        self.overlap_fallbacks
    }

    #[cfg(test)]
    pub(crate) fn reserved(&self, depth: usize) -> &[f64] {
        self.layer_occupancy.get(&depth).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn set_override(&mut self, node_id: NodeId, lane: f64) {
        self.lane_overrides.insert(node_id, lane);
    }

    /// Removes and returns the lane a parent pre-assigned to `node_id`.
    pub(crate) fn take_override(&mut self, node_id: &NodeId) -> Option<f64> {
        self.lane_overrides.remove(node_id)
    }

    /// Reserves the lane closest to `desired` that keeps `min_lane_gap` to every lane at
    /// `depth`, probing below then above in steps of the gap.
    ///
    /// When probing runs out, `desired` is reserved anyway and the overlap is counted.
    pub(crate) fn reserve_lane(&mut self, depth: usize, desired: f64, probe: &LaneProbe) -> f64 {
        let gap = probe.min_lane_gap;
        let lanes = self.layer_occupancy.entry(depth).or_default();

        let mut chosen = None;
        if clears_all(lanes, desired, gap) {
            chosen = Some(desired);
        } else {
            for step in 1..probe.max_lane_probes {
                let offset = f64::from(step) * gap;
                let below = desired - offset;
                if clears_all(lanes, below, gap) {
                    chosen = Some(below);
                    break;
                }
                let above = desired + offset;
                if clears_all(lanes, above, gap) {
                    chosen = Some(above);
                    break;
                }
            }
        }

        let lane = match chosen {
            Some(lane) => lane,
            None => {
                self.overlap_fallbacks += 1;
                tracing::debug!(depth, desired, "lane probing exhausted; overlapping placement");
                desired
            }
        };
        lanes.push(lane);
        lane
    }

    /// Registers a lane that was already resolved by a group reservation.
    pub(crate) fn register_existing_lane(&mut self, depth: usize, lane: f64) -> f64 {
        let lanes = self.layer_occupancy.entry(depth).or_default();
        if !lanes.iter().any(|existing| (existing - lane).abs() < SAME_LANE_EPSILON) {
            lanes.push(lane);
        }
        lane
    }

    /// Reserves a whole sibling group at `depth`.
    ///
    /// The group is accepted only when every member clears every reserved lane; otherwise
    /// the entire group is shifted together, below then above, so siblings keep their
    /// relative spacing and never interleave with another group.
    pub(crate) fn reserve_lane_group(
        &mut self,
        depth: usize,
        desired: &[f64],
        probe: &LaneProbe,
    ) -> LaneGroup {
        if desired.is_empty() {
            return LaneGroup::new();
        }

        let gap = probe.min_lane_gap;
        let lanes = self.layer_occupancy.entry(depth).or_default();
        let group_clears = |reserved: &[f64], group: &LaneGroup| {
            group.iter().all(|&c| clears_all(reserved, c, gap))
        };

        let mut chosen: Option<LaneGroup> = None;
        let as_is = desired.iter().copied().collect::<LaneGroup>();
        if group_clears(lanes, &as_is) {
            chosen = Some(as_is);
        } else {
            for step in 1..probe.max_group_probes {
                let offset = f64::from(step) * gap;
                let below = desired.iter().map(|lane| lane - offset).collect::<LaneGroup>();
                if group_clears(lanes, &below) {
                    chosen = Some(below);
                    break;
                }
                let above = desired.iter().map(|lane| lane + offset).collect::<LaneGroup>();
                if group_clears(lanes, &above) {
                    chosen = Some(above);
                    break;
                }
            }
        }

        let group = match chosen {
            Some(group) => group,
            None => {
                self.overlap_fallbacks += 1;
                tracing::debug!(
                    depth,
                    size = desired.len(),
                    "group probing exhausted; overlapping placement"
                );
                desired.iter().copied().collect()
            }
        };
        lanes.extend(group.iter().copied());
        group
    }
}

#[cfg(test)]
mod tests {
    use super::{LaneProbe, LaneState};
    use crate::model::NodeId;

    const PROBE: LaneProbe =
        LaneProbe { min_lane_gap: 0.9, max_lane_probes: 100, max_group_probes: 200 };

    fn assert_lanes(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn free_lane_is_reserved_as_desired() {
        let mut state = LaneState::default();
        assert_eq!(state.reserve_lane(0, 0.0, &PROBE), 0.0);
        assert_eq!(state.reserved(0), [0.0]);
    }

    #[test]
    fn taken_lane_probes_below_before_above() {
        let mut state = LaneState::default();
        state.reserve_lane(3, 0.0, &PROBE);

        assert_lanes(&[state.reserve_lane(3, 0.0, &PROBE)], &[-0.9]);
        assert_lanes(&[state.reserve_lane(3, 0.0, &PROBE)], &[0.9]);
        assert_lanes(&[state.reserve_lane(3, 0.0, &PROBE)], &[-1.8]);
        assert_eq!(state.overlap_fallbacks(), 0);
    }

    #[test]
    fn lanes_are_tracked_per_depth() {
        let mut state = LaneState::default();
        state.reserve_lane(1, 0.0, &PROBE);
        assert_eq!(state.reserve_lane(2, 0.0, &PROBE), 0.0);
    }

    #[test]
    fn exhausted_probing_falls_back_to_the_desired_lane() {
        let probe = LaneProbe { max_lane_probes: 1, ..PROBE };
        let mut state = LaneState::default();
        state.reserve_lane(0, 0.0, &probe);

        assert_eq!(state.reserve_lane(0, 0.2, &probe), 0.2);
        assert_eq!(state.overlap_fallbacks(), 1);
        assert_lanes(state.reserved(0), &[0.0, 0.2]);
    }

    #[test]
    fn re_registering_a_lane_does_not_duplicate_it() {
        let mut state = LaneState::default();
        state.reserve_lane_group(1, &[-0.575, 0.575], &PROBE);
        state.register_existing_lane(1, -0.575);
        state.register_existing_lane(1, 4.0);
        assert_lanes(state.reserved(1), &[-0.575, 0.575, 4.0]);
    }

    #[test]
    fn colliding_group_shifts_as_a_whole() {
        let mut state = LaneState::default();
        state.reserve_lane(1, 0.0, &PROBE);

        let group = state.reserve_lane_group(1, &[-0.575, 0.575], &PROBE);

        // One step each way still overlaps lane 0; two steps below clears it.
        assert_lanes(&group, &[-2.375, -1.225]);
        assert!(((group[1] - group[0]) - 1.15).abs() < 1e-9);
    }

    #[test]
    fn empty_group_reserves_nothing() {
        let mut state = LaneState::default();
        assert!(state.reserve_lane_group(1, &[], &PROBE).is_empty());
        assert!(state.reserved(1).is_empty());
    }

    #[test]
    fn exhausted_group_probing_keeps_desired_lanes() {
        let probe = LaneProbe { max_group_probes: 1, ..PROBE };
        let mut state = LaneState::default();
        state.reserve_lane(1, 0.0, &probe);

        let group = state.reserve_lane_group(1, &[0.1, 1.25], &probe);
        assert_lanes(&group, &[0.1, 1.25]);
        assert_eq!(state.overlap_fallbacks(), 1);
    }

    #[test]
    fn overrides_are_consumed_once() {
        let mut state = LaneState::default();
        let id = NodeId::new("r::opt-1").expect("node id");
        state.set_override(id.clone(), 2.5);
        assert_eq!(state.take_override(&id), Some(2.5));
        assert_eq!(state.take_override(&id), None);
    }
}
