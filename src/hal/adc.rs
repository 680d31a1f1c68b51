//! Free-running conversion on channel ADC0

use avr_device::atmega328p::ADC;

use crate::config::ADC_PRESCALER;

pub fn init() {
    // the sample-rate constants assume this prescaler setting
    const _: () = assert!(ADC_PRESCALER == 128);

    unsafe {
        let p = ADC::ptr();
        // AVCC reference, right-adjusted result, channel ADC0
        (*p).admux
            .write(|w| w.refs().avcc().adlar().clear_bit().mux().adc0());
        // enable, auto-trigger, completion interrupt, prescaler 128
        (*p).adcsra.write(|w| {
            w.aden()
                .set_bit()
                .adate()
                .set_bit()
                .adie()
                .set_bit()
                .adps()
                .prescaler_128()
        });
        // auto-trigger source: free running
        (*p).adcsrb.write(|w| w.adts().val_0x00());
    }
}

/// Kick off the first conversion; auto-trigger chains the rest.
pub fn start() {
    unsafe {
        (*ADC::ptr()).adcsra.modify(|_, w| w.adsc().set_bit());
    }
}

/// Latest conversion result; called from the completion interrupt.
pub fn read_raw() -> u16 {
    unsafe { (*ADC::ptr()).adc.read().bits() }
}
