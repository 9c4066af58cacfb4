//! Triode: a hardware-register-level NES (Ricoh 2A03/2C02) emulator core.
//!
//! The crate loads iNES images and emulates the 6502-family CPU, the 2C02
//! PPU, the 2A03 APU, two controllers and mappers 0/1/2/3/4/7 with the
//! three clocks interleaved per instruction (PPU at 3x the CPU, APU channel
//! timers at half). Host I/O stays outside: callers pump [`nes::Console`]
//! with [`nes::Console::run_for`], read the framebuffer slice, drain audio
//! samples, and feed button state back in.

pub mod nes;
