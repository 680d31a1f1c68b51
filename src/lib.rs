//! AC mains measurement engine for the ATmega328P gridmeter
//!
//! Samples one analog channel at ~12 kHz, measures line frequency by
//! reciprocal counting of rising edges and RMS voltage by per-cycle square
//! accumulation, and streams CSV records over the serial link. The modules
//! here are portable: nothing outside [`hal`] touches device registers, so
//! the whole engine runs under the host test harness as well as on the MCU.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod config;
pub mod export;
pub mod fifo;
pub mod measure;
pub mod report;
pub mod sched;
pub mod serial;

#[cfg(target_arch = "avr")]
pub mod hal;
