//! Shared measurement state and per-sample processing
//!
//! One [`MeterState`] record holds everything the sampling and tick contexts
//! both touch. The record itself carries no locking; whoever owns it wraps it
//! in a `critical_section::Mutex` and every cross-context access happens
//! inside a critical section, so a handler can never observe a half-updated
//! multi-field snapshot.

use crate::config::{CAPTURE_EPOCH, INITIAL_OFFSET, WAVEFORM_CAPACITY};

/// Polarity is the converter reading's bit 9: set for samples at or above
/// the mid-scale bias point.
const POLARITY_MASK: u16 = 0x0200;

/// `cycle_count` value meaning "no measurement in progress".
pub const WINDOW_IDLE: i8 = -1;

/// Cycle bookkeeping of the current one-second window.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementWindow {
    /// Completed cycles since the window opened, [`WINDOW_IDLE`] when idle.
    pub cycle_count: i8,
    /// Samples since the window opened. Free-runs and wraps while idle; the
    /// wrapped value is discarded when the next window opens.
    pub elapsed_samples: u16,
    /// Sample count frozen at the last completed cycle, the reporting
    /// divisor. Zero until a full cycle has been seen.
    pub frozen_sample_count: u16,
}

impl MeasurementWindow {
    pub const fn new() -> Self {
        Self {
            cycle_count: WINDOW_IDLE,
            elapsed_samples: 0,
            frozen_sample_count: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.cycle_count == WINDOW_IDLE
    }
}

/// Running sums for the cycle currently in progress.
#[derive(Debug, Clone, Copy)]
pub struct CycleAccumulator {
    /// Sum of squared bias-corrected samples, reset on every edge.
    pub square_sum: f32,
    /// Sum of raw samples since the window opened. Wraps while idle like
    /// `elapsed_samples`; discarded at window start before first use.
    pub value_sum: u32,
}

impl CycleAccumulator {
    pub const fn new() -> Self {
        Self {
            square_sum: 0.0,
            value_sum: 0,
        }
    }
}

/// Captured raw waveform: one cycle recorded during the capture epoch.
pub struct WaveformBuffer {
    pub samples: [u16; WAVEFORM_CAPACITY],
    /// Number of valid entries; capture that would exceed the array stops
    /// advancing silently.
    pub captured: u16,
}

impl WaveformBuffer {
    pub const fn new() -> Self {
        Self {
            samples: [0; WAVEFORM_CAPACITY],
            captured: 0,
        }
    }

    pub fn clear(&mut self) {
        self.samples = [0; WAVEFORM_CAPACITY];
        self.captured = 0;
    }
}

/// The measurement record shared by the sampling and tick contexts.
pub struct MeterState {
    pub window: MeasurementWindow,
    pub cycle: CycleAccumulator,
    /// Sum of squares folded in from every completed cycle of the window.
    pub window_square_sum: f32,
    /// Mean raw level over the window's completed cycles, rewritten by each
    /// cycle fold; the tick context reads the latest value at window close.
    pub window_average: f32,
    /// Smoothed DC bias estimate. Survives window resets.
    pub offset: f32,
    pub waveform: WaveformBuffer,
    /// Position in the 60 s capture/export super-cycle.
    pub epoch: u8,
}

impl MeterState {
    pub const fn new() -> Self {
        Self {
            window: MeasurementWindow::new(),
            cycle: CycleAccumulator::new(),
            window_square_sum: 0.0,
            window_average: 0.0,
            offset: INITIAL_OFFSET,
            waveform: WaveformBuffer::new(),
            epoch: 0,
        }
    }
}

/// Per-sample processor: edge detection and accumulator updates.
///
/// Owns the previous-polarity bit, which belongs to the sampling context
/// alone and is not part of the shared record.
pub struct SampleProcessor {
    prev_polarity: bool,
}

impl SampleProcessor {
    pub const fn new() -> Self {
        Self {
            prev_polarity: false,
        }
    }

    /// Process one raw conversion result.
    ///
    /// Runs once per completed conversion, inside the sampling context's
    /// critical section. The ordering below (edge bookkeeping, sample count,
    /// capture, accumulation, cycle finalization) is load-bearing: the edge
    /// sample itself is accumulated before the finished cycle is folded, and
    /// the frozen divisor counts it.
    pub fn process(&mut self, st: &mut MeterState, raw: u16) {
        let polarity = raw & POLARITY_MASK != 0;
        let rising = !self.prev_polarity && polarity;
        self.prev_polarity = polarity;

        if rising {
            if st.window.is_idle() {
                // first edge after a window close: restart measurement
                st.window.cycle_count = 0;
                st.window.elapsed_samples = 0;
                st.window.frozen_sample_count = 0;
            } else {
                st.window.cycle_count = st.window.cycle_count.wrapping_add(1);
                st.window.frozen_sample_count = st.window.elapsed_samples.wrapping_add(1);
            }
        }
        st.window.elapsed_samples = st.window.elapsed_samples.wrapping_add(1);

        // waveform capture: first cycle of the capture epoch's window only
        if st.epoch == CAPTURE_EPOCH
            && st.window.cycle_count == 0
            && (st.window.elapsed_samples as usize) <= WAVEFORM_CAPACITY
        {
            st.waveform.samples[st.window.elapsed_samples as usize - 1] = raw;
            st.waveform.captured = st.window.elapsed_samples;
        }

        let centered = raw as f32 - st.offset;
        st.cycle.square_sum += centered * centered;
        st.cycle.value_sum = st.cycle.value_sum.wrapping_add(raw as u32);

        if rising {
            if st.window.cycle_count == 0 {
                // the partial stretch before the first edge is not a period;
                // drop it along with anything accumulated while idle
                st.cycle.square_sum = 0.0;
                st.cycle.value_sum = 0;
                st.window_square_sum = 0.0;
            } else {
                st.window_square_sum += st.cycle.square_sum;
                st.cycle.square_sum = 0.0;
                st.window_average =
                    st.cycle.value_sum as f32 / st.window.frozen_sample_count as f32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW: u16 = 100;
    const HIGH: u16 = 600;

    fn feed(processor: &mut SampleProcessor, st: &mut MeterState, samples: &[u16]) {
        for &raw in samples {
            processor.process(st, raw);
        }
    }

    #[test]
    fn counts_every_upward_transition() {
        let mut st = MeterState::new();
        let mut sp = SampleProcessor::new();
        // 4 upward transitions; the first opens the window, the rest
        // complete cycles
        feed(&mut sp, &mut st, &[LOW, HIGH, LOW, HIGH, LOW, HIGH, LOW, HIGH]);
        assert_eq!(st.window.cycle_count, 3);
    }

    #[test]
    fn flat_input_never_opens_a_window() {
        let mut st = MeterState::new();
        let mut sp = SampleProcessor::new();
        feed(&mut sp, &mut st, &[LOW; 5000]);
        assert!(st.window.is_idle());
        assert_eq!(st.window.frozen_sample_count, 0);
    }

    #[test]
    fn constant_high_input_yields_one_edge_and_no_cycle() {
        let mut st = MeterState::new();
        let mut sp = SampleProcessor::new();
        feed(&mut sp, &mut st, &[HIGH; 5000]);
        // the single edge opened the window but no cycle ever completed
        assert_eq!(st.window.cycle_count, 0);
        assert_eq!(st.window.frozen_sample_count, 0);
    }

    #[test]
    fn elapsed_count_wraps_while_idle() {
        let mut st = MeterState::new();
        let mut sp = SampleProcessor::new();
        st.window.elapsed_samples = u16::MAX;
        feed(&mut sp, &mut st, &[LOW, LOW]);
        assert_eq!(st.window.elapsed_samples, 1);
        assert!(st.window.is_idle());
    }

    #[test]
    fn accumulates_and_folds_per_cycle() {
        let mut st = MeterState::new();
        let mut sp = SampleProcessor::new();
        st.offset = 0.0;
        feed(&mut sp, &mut st, &[0, HIGH, 0, HIGH, 0, HIGH]);
        // edges at samples 1, 3, 5; cycles of two samples each
        assert_eq!(st.window.cycle_count, 2);
        assert_eq!(st.window.frozen_sample_count, 5);
        // each fold contributes one HIGH^2 (the low sample is zero)
        assert_eq!(st.window_square_sum, 2.0 * (HIGH as f32) * (HIGH as f32));
        // latest fold: value sum 1200 over divisor 5
        assert_eq!(st.window_average, 1200.0 / 5.0);
        // the cycle accumulator was reset by the last fold
        assert_eq!(st.cycle.square_sum, 0.0);
    }

    #[test]
    fn first_partial_cycle_is_discarded() {
        let mut st = MeterState::new();
        let mut sp = SampleProcessor::new();
        st.offset = 0.0;
        // garbage before the first edge must not leak into the window sums
        feed(&mut sp, &mut st, &[300, 100, 300, 100, HIGH]);
        assert_eq!(st.window.cycle_count, 0);
        assert_eq!(st.cycle.square_sum, 0.0);
        assert_eq!(st.cycle.value_sum, 0);
        assert_eq!(st.window_square_sum, 0.0);
    }

    #[test]
    fn captures_only_during_the_capture_epoch() {
        let mut st = MeterState::new();
        let mut sp = SampleProcessor::new();
        st.epoch = CAPTURE_EPOCH;
        feed(&mut sp, &mut st, &[LOW, HIGH, LOW, LOW, HIGH]);
        // capture covers the first cycle: the edge sample and the two low
        // samples after it; the second edge ends cycle 0 and the gate closes
        assert_eq!(st.waveform.captured, 3);
        assert_eq!(st.waveform.samples[0], HIGH);
        assert_eq!(st.waveform.samples[1], LOW);
        assert_eq!(st.waveform.samples[2], LOW);

        let mut other = MeterState::new();
        let mut sp2 = SampleProcessor::new();
        other.epoch = CAPTURE_EPOCH + 1;
        feed(&mut sp2, &mut other, &[LOW, HIGH, LOW, LOW, HIGH]);
        assert_eq!(other.waveform.captured, 0);
    }

    #[test]
    fn capture_truncates_at_buffer_capacity() {
        let mut st = MeterState::new();
        let mut sp = SampleProcessor::new();
        st.epoch = CAPTURE_EPOCH;
        // one edge, then a cycle longer than the buffer
        sp.process(&mut st, HIGH);
        for _ in 0..(WAVEFORM_CAPACITY + 50) {
            sp.process(&mut st, LOW);
        }
        assert_eq!(st.waveform.captured as usize, WAVEFORM_CAPACITY);
    }
}
