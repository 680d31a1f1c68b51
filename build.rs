use std::env;

fn main() {
    let target = env::var("TARGET").unwrap_or_default();

    // Host builds (unit and integration tests) carry no device code, so the
    // MCU link argument only applies when cross-compiling for AVR.
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega328p");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
