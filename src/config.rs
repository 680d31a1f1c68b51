//! Configuration constants for the mains meter firmware

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 20_000_000;

/// UART baud rate
pub const UART_BAUD: u32 = 19_200;

/// ADC clock prescaler
pub const ADC_PRESCALER: u32 = 128;

/// ADC clocks consumed per conversion in free-running mode
pub const ADC_CLOCKS_PER_SAMPLE: u32 = 13;

/// Effective sampling rate, fixed by clock, prescaler and conversion length
pub const SAMPLE_RATE_HZ: f32 =
    CPU_FREQ_HZ as f32 / ADC_PRESCALER as f32 / ADC_CLOCKS_PER_SAMPLE as f32;

/// ADC full-scale count (10-bit converter)
pub const ADC_FULL_SCALE: f32 = 1024.0;

/// ADC reference voltage (AVCC)
pub const ADC_VREF_VOLTS: f32 = 5.0;

/// Input divider, secondary-side fraction of the primary voltage (5k / 305k)
pub const DIVIDER_RATIO: f32 = 5.0 / (300.0 + 5.0);

/// Timer ticks per reporting second
pub const TICKS_PER_SECOND: u16 = 1000;

/// Length of the capture/export super-cycle in seconds
pub const EPOCH_SECONDS: u8 = 60;

/// Epoch second during which one waveform cycle is captured
pub const CAPTURE_EPOCH: u8 = 1;

/// Epoch second at which the first export block is released
pub const EXPORT_FIRST_EPOCH: u8 = 2;

/// Waveform buffer length; must cover one period of the slowest input
/// (SAMPLE_RATE_HZ / 40 Hz = 300 samples)
pub const WAVEFORM_CAPACITY: usize = 320;

/// Samples emitted per export block, one block per epoch second
pub const EXPORT_BLOCK_SIZE: usize = 8;

/// Serial transmit FIFO size; one slot is sacrificed to tell full from empty
pub const TX_FIFO_CAPACITY: usize = 256;

/// Initial DC bias estimate, mid-scale of the converter
pub const INITIAL_OFFSET: f32 = 512.0;

/// Weight of the previous bias estimate in the once-per-second smoothing
pub const OFFSET_SMOOTHING: f32 = 0.95;
