//! Pre-allocation validation.
//!
//! The allocation check runs before any buffer is touched: a state of N
//! qubits needs 16·2^N bytes of amplitudes plus 5% overhead, and requests
//! that cannot fit in the machine's available physical memory are rejected
//! up front with [`SimError::ResourceExhausted`].

use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

use crate::error::{SimError, SimResult};

/// Largest supported register, in qubits.
pub const MAX_QUBITS: u32 = 30;

/// Bytes per stored amplitude (two f64 components).
const BYTES_PER_AMP: u64 = 16;

/// Reject qubit counts outside [1, MAX_QUBITS].
pub fn check_qubit_count(num_qubits: u32) -> SimResult<()> {
    if num_qubits == 0 || num_qubits > MAX_QUBITS {
        return Err(SimError::InvalidArgument(format!(
            "num_qubits must be in [1, {MAX_QUBITS}], got {num_qubits}"
        )));
    }
    Ok(())
}

/// Reject allocations that exceed available physical memory.
///
/// `local_qubits` is the locally stored share (equal to `num_qubits` in the
/// single-process case); `buffers` counts how many full-size buffers the
/// register keeps (a sharded register also owns an exchange scratch buffer).
pub fn check_allocation(num_qubits: u32, local_qubits: u32, buffers: u64) -> SimResult<()> {
    let amps = BYTES_PER_AMP << local_qubits;
    let required = amps * buffers;
    let required = required + required / 20; // 5% overhead
    let available = available_memory();
    debug!(num_qubits, local_qubits, required, available, "allocation pre-flight");
    if required > available {
        return Err(SimError::ResourceExhausted {
            num_qubits,
            required,
            available,
        });
    }
    Ok(())
}

fn available_memory() -> u64 {
    let refresh = RefreshKind::new().with_memory(MemoryRefreshKind::everything());
    let sys = System::new_with_specifics(refresh);
    sys.available_memory()
}
