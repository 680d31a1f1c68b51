//! Port direction and pull-up setup

use avr_device::atmega328p::{PORTB, PORTC, PORTD};

pub fn init() {
    unsafe {
        // Port B: PB0-5 no connect, inputs with pull-ups
        (*PORTB::ptr()).ddrb.write(|w| w.bits(0x00));
        (*PORTB::ptr()).portb.write(|w| w.bits(0x3F));

        // Port C: PC0 analog input (must stay pull-up free), PC1-5 no connect
        (*PORTC::ptr()).ddrc.write(|w| w.bits(0b0000_0000));
        (*PORTC::ptr()).portc.write(|w| w.bits(0b0011_1110));

        // Port D: PD1 is TxD, everything else no connect
        (*PORTD::ptr()).ddrd.write(|w| w.bits(0b0000_0010));
        (*PORTD::ptr()).portd.write(|w| w.bits(0b1111_1101));
    }
}
