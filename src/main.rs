//! Firmware entry: interrupt wiring and the export polling loop

#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use core::cell::RefCell;

    use critical_section::Mutex;
    use panic_halt as _;

    use gridmeter_firmware::export::WaveformExporter;
    use gridmeter_firmware::hal;
    use gridmeter_firmware::measure::{MeterState, SampleProcessor};
    use gridmeter_firmware::report;
    use gridmeter_firmware::sched::Ticker;

    /// The measurement record shared by the sampling and tick contexts.
    static METER: Mutex<RefCell<MeterState>> = Mutex::new(RefCell::new(MeterState::new()));
    /// Edge detector state, owned by the conversion interrupt.
    static SAMPLER: Mutex<RefCell<SampleProcessor>> =
        Mutex::new(RefCell::new(SampleProcessor::new()));
    /// Sub-second counter, owned by the tick interrupt.
    static TICKER: Mutex<RefCell<Ticker>> = Mutex::new(RefCell::new(Ticker::new()));

    #[avr_device::entry]
    fn main() -> ! {
        hal::gpio::init();
        hal::timer::init();
        hal::adc::init();
        hal::adc::start();
        hal::uart::init();

        unsafe { avr_device::interrupt::enable() };

        let mut port = hal::uart::tx_port();
        report::write_header(&mut port).ok();

        let mut exporter = WaveformExporter::new();
        loop {
            exporter.poll(&METER, &mut port).ok();
        }
    }

    #[avr_device::interrupt(atmega328p)]
    fn ADC() {
        let raw = hal::adc::read_raw();
        critical_section::with(|cs| {
            let mut st = METER.borrow_ref_mut(cs);
            SAMPLER.borrow_ref_mut(cs).process(&mut st, raw);
        });
    }

    #[avr_device::interrupt(atmega328p)]
    fn TIMER1_COMPA() {
        let closed = critical_section::with(|cs| {
            TICKER
                .borrow_ref_mut(cs)
                .tick(&mut METER.borrow_ref_mut(cs))
        });
        if let Some(values) = closed {
            // the record renders with interrupts live again, so the drain
            // keeps running while the producer waits on the FIFO
            unsafe { avr_device::interrupt::enable() };
            let mut port = hal::uart::tx_port();
            report::write_report(&mut port, &values).ok();
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    // the runnable entry exists only on the AVR target; host builds carry
    // the library and its test suite
}
