//! Block-wise waveform export, paced by the epoch counter
//!
//! The captured waveform is pushed out eight samples at a time, one block per
//! epoch second starting at [`EXPORT_FIRST_EPOCH`]. The machine is polled
//! from the main loop: each poll takes a short critical section to check the
//! gate and copy one block out of the shared record, then renders records
//! with the lock released. After the last block, or as soon as the export
//! index reaches the captured length, the buffer is cleared and the machine
//! rearms for the next super-cycle.

use core::cell::RefCell;

use critical_section::Mutex;
use ufmt::uWrite;

use crate::config::{EXPORT_BLOCK_SIZE, EXPORT_FIRST_EPOCH, WAVEFORM_CAPACITY};
use crate::measure::MeterState;
use crate::report;

/// Number of export blocks in a full buffer.
pub const BLOCK_COUNT: usize = WAVEFORM_CAPACITY / EXPORT_BLOCK_SIZE;

pub struct WaveformExporter {
    next_block: usize,
}

impl WaveformExporter {
    pub const fn new() -> Self {
        Self { next_block: 0 }
    }

    /// Epoch value that releases the next pending block.
    fn release_epoch(&self) -> u8 {
        EXPORT_FIRST_EPOCH + self.next_block as u8
    }

    /// Drive the machine one step; emits at most one block.
    ///
    /// Returns `true` when a full export pass completed on this call (the
    /// buffer has just been cleared).
    pub fn poll<W: uWrite>(
        &mut self,
        state: &Mutex<RefCell<MeterState>>,
        out: &mut W,
    ) -> core::result::Result<bool, W::Error> {
        let release = self.release_epoch();
        let gate = critical_section::with(|cs| {
            let st = state.borrow_ref(cs);
            if st.epoch != release {
                return None;
            }
            let start = self.next_block * EXPORT_BLOCK_SIZE;
            let mut block = [0u16; EXPORT_BLOCK_SIZE];
            block.copy_from_slice(&st.waveform.samples[start..start + EXPORT_BLOCK_SIZE]);
            Some((start, st.waveform.captured as usize, block))
        });

        let Some((start, captured, block)) = gate else {
            return Ok(false);
        };

        let mut exhausted = false;
        for (k, &value) in block.iter().enumerate() {
            let index = start + k;
            if index >= captured {
                exhausted = true;
                break;
            }
            report::write_wave_sample(out, index as u16, value)?;
        }

        self.next_block += 1;
        if exhausted || self.next_block == BLOCK_COUNT {
            critical_section::with(|cs| state.borrow_ref_mut(cs).waveform.clear());
            self.next_block = 0;
            return Ok(true);
        }
        Ok(false)
    }
}
