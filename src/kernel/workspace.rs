//! Per-device descriptor workspace.
//!
//! Every persistent worker owns one 128-byte slot it rewrites whenever it
//! moves to a new group, so a launch needs `workers * 128` bytes of device
//! memory. The buffer is created lazily once per device and cached for the
//! lifetime of the process; concurrent launches on the same device are safe
//! as long as they serialize on the device's stream, since each worker
//! re-creates its slot before use.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use cubecl::prelude::*;
use cubecl::server::Handle;

/// u32 words per descriptor slot. Four are used (base, rows, cols, row
/// stride); the slot is padded to the 128-byte block-copy descriptor
/// footprint.
pub(crate) const DESCRIPTOR_WORDS: usize = 32;
pub(crate) const DESCRIPTOR_BYTES: usize = DESCRIPTOR_WORDS * core::mem::size_of::<u32>();

/// Grid width when the runtime does not report a compute-unit count. Any
/// value yields a correct partition; only load balance shifts.
pub const DEFAULT_WORKER_COUNT: usize = 64;

/// Number of persistent workers to launch: one per streaming multiprocessor
/// when the backend reports the count.
pub fn worker_count<R: Runtime>(client: &ComputeClient<R>) -> usize {
    client
        .properties()
        .hardware
        .num_streaming_multiprocessors
        .map(|count| count as usize)
        .unwrap_or(DEFAULT_WORKER_COUNT)
}

static WORKSPACES: OnceLock<Mutex<HashMap<String, Handle>>> = OnceLock::new();

/// Fetch (or create on first use) the descriptor workspace for `device`.
/// The buffer is never freed; workers overwrite their slots on every visit,
/// so stale contents from an earlier launch are harmless.
pub fn descriptor_workspace<R: Runtime>(
    client: &ComputeClient<R>,
    device: &R::Device,
    workers: usize,
) -> Handle {
    let key = format!("{}/{device:?}", core::any::type_name::<R>());
    let workspaces = WORKSPACES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut workspaces = workspaces
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    workspaces
        .entry(key)
        .or_insert_with(|| {
            log::debug!("allocating {} descriptor slots on {device:?}", workers);
            client.empty(workers * DESCRIPTOR_BYTES)
        })
        .clone()
}
