//! USART0 transmit path: init, FIFO glue and the drain interrupt

use core::cell::RefCell;

use avr_device::atmega328p::USART0;
use critical_section::Mutex;

use crate::config::{CPU_FREQ_HZ, TX_FIFO_CAPACITY, UART_BAUD};
use crate::fifo::TxFifo;
use crate::serial::{self, RetryBudget, SharedFifo, TxPort, TxSignal};

/// Transmit FIFO shared between the record producers and the drain interrupt.
pub static TX_FIFO: SharedFifo<TX_FIFO_CAPACITY> = Mutex::new(RefCell::new(TxFifo::new()));

pub fn init() {
    let ubrr = (CPU_FREQ_HZ / UART_BAUD / 16 - 1) as u16;

    unsafe {
        let p = USART0::ptr();
        (*p).ubrr0.write(|w| w.bits(ubrr));
        // 8 data bits, no parity, one stop bit; transmit only
        (*p).ucsr0c.write(|w| w.ucsz0().chr8());
        (*p).ucsr0b.write(|w| w.txen0().set_bit());
    }
}

/// Producer-side trigger: arms the data-register-empty interrupt so the
/// drain starts (or keeps) running.
pub struct UdreSignal;

impl TxSignal for UdreSignal {
    fn raise(&mut self) {
        unsafe {
            (*USART0::ptr()).ucsr0b.modify(|_, w| w.udrie0().set_bit());
        }
    }
}

/// Producer handle over the shared FIFO. The firmware spins on a full queue;
/// the drain interrupt frees slots at the line rate.
pub fn tx_port() -> TxPort<'static, UdreSignal, TX_FIFO_CAPACITY> {
    TxPort::new(&TX_FIFO, UdreSignal, RetryBudget::Forever)
}

#[avr_device::interrupt(atmega328p)]
fn USART_UDRE() {
    match serial::pump(&TX_FIFO) {
        Some(byte) => unsafe {
            (*USART0::ptr()).udr0.write(|w| w.bits(byte));
        },
        None => unsafe {
            // drained: disarm until the next push raises the signal again
            (*USART0::ptr()).ucsr0b.modify(|_, w| w.udrie0().clear_bit());
        },
    }
}
