//! Host mirror of the persistent tile scheduler.
//!
//! Each launch runs a fixed number of workers; worker `w` starts at global
//! tile index `w` and advances by the worker count, walking the groups in
//! order and claiming every tile whose global index lands on its stride. The
//! partition is pure index arithmetic over `m_offsets` and the tile sizes, so
//! it can be reproduced (and tested) here without a device.

use crate::error::GroupedGemmError;

/// One tile of one group, owned by exactly one worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileAssignment {
    pub worker: usize,
    pub group: usize,
    pub tile_m: usize,
    pub tile_n: usize,
}

/// Check the ragged-batch offset contract for host-built offsets:
/// non-negative, monotonically non-decreasing, and covering exactly `[0, m)`.
pub fn validate_offsets(m_offsets: &[i32], m: usize) -> Result<(), GroupedGemmError> {
    let mut prev = 0i32;
    for (g, &end) in m_offsets.iter().enumerate() {
        if end < prev {
            return Err(GroupedGemmError::InvalidOffsets {
                message: format!("offset {end} at group {g} decreases from {prev}"),
            });
        }
        prev = end;
    }
    match m_offsets.last() {
        Some(&last) if last as usize == m => Ok(()),
        Some(&last) => Err(GroupedGemmError::InvalidOffsets {
            message: format!("last offset {last} does not cover M={m}"),
        }),
        None => Err(GroupedGemmError::InvalidOffsets {
            message: "empty offsets".into(),
        }),
    }
}

/// Total tiles contributed by all groups.
pub fn total_tiles(m_offsets: &[i32], n: usize, block_m: usize, block_n: usize) -> usize {
    let num_n_tiles = n.div_ceil(block_n);
    let mut start = 0usize;
    let mut total = 0usize;
    for &end in m_offsets {
        let end = end as usize;
        let m_size = end - start;
        if m_size > 0 {
            total += m_size.div_ceil(block_m) * num_n_tiles;
        }
        start = end;
    }
    total
}

/// Upper bound on the tile count without knowing the offsets: every group can
/// add at most one partial M tile on top of the dense tiling of M.
pub fn worst_case_tiles(g: usize, m: usize, n: usize, block_m: usize, block_n: usize) -> usize {
    (m.div_ceil(block_m) + g.saturating_sub(1)) * n.div_ceil(block_n)
}

/// Enumerate every tile with the worker that owns it, in global tile order.
/// Mirrors the device walk exactly: tiles are group-major with the M tile
/// index varying fastest, and global tile `t` belongs to worker
/// `t % num_workers`.
pub fn assignments(
    m_offsets: &[i32],
    n: usize,
    block_m: usize,
    block_n: usize,
    num_workers: usize,
) -> Vec<TileAssignment> {
    assert!(num_workers > 0, "num_workers must be > 0");
    let num_n_tiles = n.div_ceil(block_n);
    let mut out = Vec::new();
    let mut iterated_tiles = 0usize;
    let mut start = 0usize;
    for (group, &end) in m_offsets.iter().enumerate() {
        let end = end as usize;
        let m_size = end - start;
        if m_size > 0 {
            let num_m_tiles = m_size.div_ceil(block_m);
            let num_tiles = num_m_tiles * num_n_tiles;
            for gidx in 0..num_tiles {
                out.push(TileAssignment {
                    worker: (iterated_tiles + gidx) % num_workers,
                    group,
                    tile_m: gidx % num_m_tiles,
                    tile_n: gidx / num_m_tiles,
                });
            }
            iterated_tiles += num_tiles;
        }
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Direct simulation of one worker's device loop, kept independent of
    /// `assignments` so the two formulations check each other.
    fn walk_worker(
        m_offsets: &[i32],
        n: usize,
        block_m: usize,
        block_n: usize,
        num_workers: usize,
        worker: usize,
    ) -> Vec<(usize, usize, usize)> {
        let num_n_tiles = n.div_ceil(block_n);
        let mut claimed = Vec::new();
        let mut tidx = worker;
        let mut iterated_tiles = 0usize;
        let mut start = 0usize;
        for (group, &end) in m_offsets.iter().enumerate() {
            let end = end as usize;
            let m_size = end - start;
            if m_size > 0 {
                let num_m_tiles = m_size.div_ceil(block_m);
                let num_tiles = num_m_tiles * num_n_tiles;
                while tidx >= iterated_tiles && tidx < iterated_tiles + num_tiles {
                    let gidx = tidx - iterated_tiles;
                    claimed.push((group, gidx % num_m_tiles, gidx / num_m_tiles));
                    tidx += num_workers;
                }
                iterated_tiles += num_tiles;
            }
            start = end;
        }
        claimed
    }

    #[test]
    fn every_tile_is_claimed_exactly_once() {
        let offsets = [100, 100, 228, 256];
        let (n, bm, bn, workers) = (96, 32, 32, 7);
        let all = assignments(&offsets, n, bm, bn, workers);
        let unique: HashSet<_> = all.iter().map(|t| (t.group, t.tile_m, t.tile_n)).collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(all.len(), total_tiles(&offsets, n, bm, bn));
        // group 0: 100 rows -> 4 m-tiles, group 1 empty, group 2: 128 -> 4,
        // group 3: 28 -> 1; times 3 n-tiles
        assert_eq!(all.len(), (4 + 4 + 1) * 3);
    }

    #[test]
    fn assignments_match_the_device_walk_per_worker() {
        let offsets = [3, 3, 67, 67, 128];
        let (n, bm, bn, workers) = (80, 16, 32, 5);
        let all = assignments(&offsets, n, bm, bn, workers);
        for w in 0..workers {
            let expected = walk_worker(&offsets, n, bm, bn, workers, w);
            let got: Vec<_> = all
                .iter()
                .filter(|t| t.worker == w)
                .map(|t| (t.group, t.tile_m, t.tile_n))
                .collect();
            assert_eq!(got, expected, "worker {w}");
        }
    }

    #[test]
    fn load_is_balanced_at_tile_granularity() {
        // one huge group spreads over all workers
        let offsets = [1024];
        let all = assignments(&offsets, 256, 32, 32, 8);
        let mut counts = vec![0usize; 8];
        for t in &all {
            counts[t.worker] += 1;
        }
        let min = counts.iter().min().copied().unwrap_or(0);
        let max = counts.iter().max().copied().unwrap_or(0);
        assert!(max - min <= 1, "counts={counts:?}");
    }

    #[test]
    fn empty_groups_contribute_no_tiles() {
        let offsets = [0, 0, 64, 64, 64, 128];
        let all = assignments(&offsets, 64, 32, 32, 4);
        assert!(all.iter().all(|t| t.group == 2 || t.group == 5));
        assert_eq!(total_tiles(&offsets, 64, 32, 32), 2 * 2 * 2);
    }

    #[test]
    fn fewer_tiles_than_workers_leaves_workers_idle() {
        let offsets = [8, 16];
        let all = assignments(&offsets, 16, 32, 32, 64);
        assert_eq!(all.len(), 2);
        let used: HashSet<_> = all.iter().map(|t| t.worker).collect();
        assert_eq!(used.len(), 2);
    }

    #[test]
    fn m_tile_index_varies_fastest_within_a_group() {
        let offsets = [96];
        let all = assignments(&offsets, 64, 32, 32, 1);
        let order: Vec<_> = all.iter().map(|t| (t.tile_m, t.tile_n)).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn worst_case_bounds_the_actual_tile_count() {
        let offsets = [7, 19, 19, 200, 256];
        for bm in [16, 32] {
            for bn in [16, 32] {
                assert!(
                    total_tiles(&offsets, 96, bm, bn)
                        <= worst_case_tiles(offsets.len(), 256, 96, bm, bn)
                );
            }
        }
    }

    #[test]
    fn offset_validation_rejects_bad_sequences() {
        assert!(validate_offsets(&[16, 8], 16).is_err());
        assert!(validate_offsets(&[8, 16], 32).is_err());
        assert!(validate_offsets(&[], 0).is_err());
        assert!(validate_offsets(&[0, 0, 32], 32).is_ok());
    }
}
