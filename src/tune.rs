//! Tile-configuration selection.
//!
//! The kernel body is parameterized over tile sizes; picking them is an
//! injected strategy keyed by the problem shape so that a search-based tuner
//! can replace the built-in heuristic without touching the launch path. M is
//! bucketed to the next power of two purely to bound the number of distinct
//! keys a caching tuner would see.

use std::sync::OnceLock;

/// Problem-shape key a configuration source selects against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TuneKey {
    pub g: usize,
    pub m_bucket: usize,
    pub n: usize,
    pub k: usize,
}

impl TuneKey {
    pub fn new(g: usize, m: usize, n: usize, k: usize) -> Self {
        Self {
            g,
            m_bucket: m.next_power_of_two(),
            n,
            k,
        }
    }
}

/// Tile sizes for one launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KernelConfig {
    pub block_m: usize,
    pub block_n: usize,
    pub block_k: usize,
}

/// A configuration-selection strategy. Must be a pure function of the key.
pub trait ConfigSource {
    fn select(&self, key: &TuneKey) -> KernelConfig;
}

const BLOCK_M_SMALL: usize = 16;
const BLOCK_M_LARGE: usize = 32;
const BLOCK_N_SMALL: usize = 16;
const BLOCK_N_LARGE: usize = 32;
const BLOCK_K_CANDIDATES: [usize; 3] = [64, 32, 16];

/// Built-in heuristic: larger tiles once the per-group work is big enough to
/// fill them, and the largest K step that divides K.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigs;

impl ConfigSource for DefaultConfigs {
    fn select(&self, key: &TuneKey) -> KernelConfig {
        let rows_per_group = key.m_bucket / key.g.max(1);
        let block_m = if rows_per_group <= BLOCK_M_SMALL {
            BLOCK_M_SMALL
        } else {
            BLOCK_M_LARGE
        };
        let block_n = if key.n >= BLOCK_N_LARGE {
            BLOCK_N_LARGE
        } else {
            BLOCK_N_SMALL
        };
        let block_k = BLOCK_K_CANDIDATES
            .into_iter()
            .find(|bk| key.k.is_multiple_of(*bk))
            .unwrap_or(BLOCK_K_CANDIDATES[BLOCK_K_CANDIDATES.len() - 1]);
        KernelConfig {
            block_m,
            block_n,
            block_k,
        }
    }
}

fn forced_config_from_env() -> Option<KernelConfig> {
    static FORCED: OnceLock<Option<KernelConfig>> = OnceLock::new();
    *FORCED.get_or_init(|| {
        let raw = std::env::var("GROUPED_GEMM_FORCE_TILES").ok()?;
        let mut parts = raw.trim().split('x');
        let block_m = parts.next()?.parse::<usize>().ok()?;
        let block_n = parts.next()?.parse::<usize>().ok()?;
        let block_k = parts.next()?.parse::<usize>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        log::debug!("forcing grouped GEMM tiles {block_m}x{block_n}x{block_k} from env");
        Some(KernelConfig {
            block_m,
            block_n,
            block_k,
        })
    })
}

/// Configuration used when the caller does not supply one: the env override
/// if set, the heuristic otherwise.
pub fn select_config(key: &TuneKey) -> KernelConfig {
    if let Some(forced) = forced_config_from_env() {
        return forced;
    }
    DefaultConfigs.select(key)
}
