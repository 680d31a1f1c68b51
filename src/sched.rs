//! Millisecond tick handling and window close-out
//!
//! The tick context runs at 1 kHz and touches the shared record exactly once
//! per second: it computes the report values, starts the bias update, idles
//! the window and advances the epoch counter. Rendering the report is the
//! caller's job and happens outside the state critical section.

use libm::sqrtf;

use crate::config::{
    ADC_FULL_SCALE, ADC_VREF_VOLTS, DIVIDER_RATIO, EPOCH_SECONDS, OFFSET_SMOOTHING,
    SAMPLE_RATE_HZ, TICKS_PER_SECOND,
};
use crate::measure::{MeterState, WINDOW_IDLE};
use crate::report::Report;

/// Sub-second tick counter. Owned by the tick context; not shared.
pub struct Ticker {
    ms: u16,
}

impl Ticker {
    pub const fn new() -> Self {
        Self { ms: 0 }
    }

    /// Count one tick. On each 1000th tick the window is closed and the
    /// report for the elapsed second is returned.
    pub fn tick(&mut self, st: &mut MeterState) -> Option<Report> {
        self.ms += 1;
        if self.ms < TICKS_PER_SECOND {
            return None;
        }
        self.ms = 0;
        Some(close_window(st))
    }
}

/// Close the one-second window: derive the report, update the bias estimate,
/// idle the window, advance the epoch.
///
/// Frequency is reciprocal: completed cycles over the time the frozen sample
/// count spans. A window with no completed cycle reports zero for both
/// values. `cycle_count` is used as stored; a window that closed earlier and
/// saw no edge since still holds the idle marker, and the quotient goes
/// negative (see `stale_window_reports_negative_frequency` below).
fn close_window(st: &mut MeterState) -> Report {
    let frozen = st.window.frozen_sample_count;

    let freq_hz = if frozen != 0 {
        st.window.cycle_count as f32 * SAMPLE_RATE_HZ / frozen as f32
    } else {
        0.0
    };

    let rms_volts = if frozen != 0 {
        let raw = sqrtf(st.window_square_sum / frozen as f32);
        raw / ADC_FULL_SCALE * ADC_VREF_VOLTS / DIVIDER_RATIO
    } else {
        0.0
    };

    let report = Report {
        freq_hz,
        rms_volts,
        offset_raw: st.offset,
    };

    st.offset = st.offset * OFFSET_SMOOTHING + st.window_average * (1.0 - OFFSET_SMOOTHING);

    // measurement resumes at the next detected edge
    st.window.cycle_count = WINDOW_IDLE;

    st.epoch += 1;
    if st.epoch >= EPOCH_SECONDS {
        st.epoch = 0;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::INITIAL_OFFSET;

    #[test]
    fn fires_every_thousandth_tick() {
        let mut st = MeterState::new();
        let mut ticker = Ticker::new();
        for _ in 0..(TICKS_PER_SECOND - 1) {
            assert!(ticker.tick(&mut st).is_none());
        }
        assert!(ticker.tick(&mut st).is_some());
        // and the cadence repeats
        for _ in 0..(TICKS_PER_SECOND - 1) {
            assert!(ticker.tick(&mut st).is_none());
        }
        assert!(ticker.tick(&mut st).is_some());
    }

    fn second(st: &mut MeterState) -> Report {
        let mut ticker = Ticker::new();
        let mut out = None;
        for _ in 0..TICKS_PER_SECOND {
            out = ticker.tick(st);
        }
        out.unwrap()
    }

    #[test]
    fn computes_frequency_and_rms_from_the_window() {
        let mut st = MeterState::new();
        st.window.cycle_count = 2;
        st.window.frozen_sample_count = 5;
        st.window_square_sum = 720_000.0;
        let report = second(&mut st);

        let expected_freq = 2.0 * SAMPLE_RATE_HZ / 5.0;
        assert!((report.freq_hz - expected_freq).abs() < 1e-3);

        let expected_rms = sqrtf(720_000.0 / 5.0) / ADC_FULL_SCALE * ADC_VREF_VOLTS / DIVIDER_RATIO;
        assert!((report.rms_volts - expected_rms).abs() < 1e-3);

        // the window is idled for the next second
        assert!(st.window.is_idle());
    }

    #[test]
    fn empty_window_reports_zero() {
        let mut st = MeterState::new();
        let report = second(&mut st);
        assert_eq!(report.freq_hz, 0.0);
        assert_eq!(report.rms_volts, 0.0);
    }

    #[test]
    fn stale_window_reports_negative_frequency() {
        // a window closed with data, then a second passed with no edge at
        // all: the idle marker flows through the quotient unclamped
        let mut st = MeterState::new();
        st.window.cycle_count = WINDOW_IDLE;
        st.window.frozen_sample_count = 12_000;
        let report = second(&mut st);
        assert!(report.freq_hz < 0.0);
        assert!((report.freq_hz + SAMPLE_RATE_HZ / 12_000.0).abs() < 1e-3);
    }

    #[test]
    fn report_carries_the_pre_update_offset() {
        let mut st = MeterState::new();
        st.window_average = 0.0;
        let report = second(&mut st);
        assert_eq!(report.offset_raw, INITIAL_OFFSET);
        // smoothing pulled the estimate toward the (zero) window average
        assert!((st.offset - INITIAL_OFFSET * OFFSET_SMOOTHING).abs() < 1e-3);
    }

    #[test]
    fn offset_tracks_the_window_average() {
        let mut st = MeterState::new();
        st.window_average = 300.0;
        for _ in 0..150 {
            second(&mut st);
        }
        assert!((st.offset - 300.0).abs() < 1.0);
    }

    #[test]
    fn epoch_advances_and_wraps() {
        let mut st = MeterState::new();
        for expected in 1..=(EPOCH_SECONDS as u32 * 2) {
            second(&mut st);
            assert_eq!(st.epoch as u32, expected % EPOCH_SECONDS as u32);
        }
    }
}
