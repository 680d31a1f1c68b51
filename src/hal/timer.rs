//! Timer1 CTC compare interrupt at the millisecond tick rate

use avr_device::atmega328p::TC1;

use crate::config::{CPU_FREQ_HZ, TICKS_PER_SECOND};

pub fn init() {
    let ticks = (CPU_FREQ_HZ / TICKS_PER_SECOND as u32 - 1) as u16;

    unsafe {
        let p = TC1::ptr();
        (*p).tcnt1.write(|w| w.bits(0));
        (*p).ocr1a.write(|w| w.bits(ticks));
        // CTC mode, clear on OCR1A
        (*p).tccr1a.write(|w| w.wgm1().bits(0));
        (*p).tccr1b.write(|w| w.wgm1().bits(1));
        // compare-A interrupt
        (*p).timsk1.write(|w| w.ocie1a().set_bit());
        // start counting, no prescaling
        (*p).tccr1b.modify(|_, w| w.cs1().direct());
    }
}
