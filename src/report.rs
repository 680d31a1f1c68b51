//! Serial record shapes and fixed-point number rendering
//!
//! The output is a line-oriented ASCII stream with three record shapes: a
//! one-time startup header, one `csv-1` measurement record per second and one
//! `csv-2` record per exported waveform sample. No checksums, no escaping;
//! flow control is the bounded FIFO.

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

/// Values of one per-second measurement record.
///
/// `offset_raw` is the bias estimate as it was used for this window, before
/// the end-of-window smoothing update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    pub freq_hz: f32,
    pub rms_volts: f32,
    pub offset_raw: f32,
}

/// `f32` printed with a fixed number of decimals through integer scaling.
///
/// The AVR build carries no float formatting; the value is scaled, rounded
/// and emitted digit by digit. Out-of-range magnitudes saturate the scaled
/// integer rather than wrapping.
pub struct Fixed<const DP: usize>(pub f32);

fn render_fixed(value: f32, decimals: usize, buf: &mut [u8; 16]) -> &str {
    let mut pos = 0;
    let mut v = value;
    if v < 0.0 {
        buf[pos] = b'-';
        pos += 1;
        v = -v;
    }

    let mut scale: u32 = 1;
    let mut i = 0;
    while i < decimals {
        scale *= 10;
        i += 1;
    }

    // float-to-int casts saturate, which is what we want for garbage inputs
    let scaled = (v * scale as f32 + 0.5) as u32;
    let int_part = scaled / scale;
    let frac_part = scaled % scale;

    let mut digits = [0u8; 10];
    let mut n = int_part;
    let mut count = 0;
    loop {
        digits[count] = b'0' + (n % 10) as u8;
        n /= 10;
        count += 1;
        if n == 0 {
            break;
        }
    }
    while count > 0 {
        count -= 1;
        buf[pos] = digits[count];
        pos += 1;
    }

    if decimals > 0 {
        buf[pos] = b'.';
        pos += 1;
        let mut div = scale / 10;
        while div > 0 {
            buf[pos] = b'0' + ((frac_part / div) % 10) as u8;
            pos += 1;
            div /= 10;
        }
    }

    core::str::from_utf8(&buf[..pos]).unwrap_or("")
}

impl<const DP: usize> uDisplay for Fixed<DP> {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let mut buf = [0u8; 16];
        f.write_str(render_fixed(self.0, DP, &mut buf))
    }
}

/// Startup header, emitted once before any record.
pub fn write_header<W: uWrite>(w: &mut W) -> core::result::Result<(), W::Error> {
    w.write_str("\nmode, data1, data2\n")
}

/// One `csv-1` record: frequency 3 dp, rms 2 dp, offset 2 dp.
pub fn write_report<W: uWrite>(w: &mut W, report: &Report) -> core::result::Result<(), W::Error> {
    uwrite!(
        w,
        "csv-1,{},{},{}\n",
        Fixed::<3>(report.freq_hz),
        Fixed::<2>(report.rms_volts),
        Fixed::<2>(report.offset_raw)
    )
}

/// One `csv-2` record: waveform sample index and raw converter value.
pub fn write_wave_sample<W: uWrite>(
    w: &mut W,
    index: u16,
    value: u16,
) -> core::result::Result<(), W::Error> {
    uwrite!(w, "csv-2,{},{}\n", index, value)
}
