/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022 Advanced Micro Devices, Inc.
 *
 * Authors: Carlos Bilbao <carlos.bilbao@amd.com> and
 *          Tom Lendacky <thomas.lendacky@amd.com>
 */

use crate::util::locking::SpinLock;
use crate::BIT;

use core::fmt;
use lazy_static::lazy_static;
use x86_64::instructions::port::Port;

/// 0x3f8
pub const TTYS0: u16 = 0x3f8;

/// 115200
pub const DIV_BASE: u64 = 115200;
/// Bit 7
pub const DLAB_BIT: u8 = BIT!(7);

/// 0
pub const THR: u16 = 0;
/// 1
pub const IER: u16 = 1;
/// 2
pub const FCR: u16 = 2;
/// 3
pub const LCR: u16 = 3;
/// 4
pub const MCR: u16 = 4;

/// 0
pub const DLL: u16 = 0;
/// 1
pub const DLM: u16 = 1;

// Port I/O faults outside CPL0, and host tests run at CPL3
const SERIAL_ENABLED: bool = cfg!(all(feature = "verbose", not(test)));

/// 16550 UART on a fixed I/O port
pub struct SerialPort {
    base: u16,
    ready: bool,
}

impl SerialPort {
    pub const fn new(base: u16) -> Self {
        SerialPort { base, ready: false }
    }

    fn outb(&self, reg: u16, value: u8) {
        let mut port: Port<u8> = Port::new(self.base + reg);
        unsafe { port.write(value) }
    }

    fn inb(&self, reg: u16) -> u8 {
        let mut port: Port<u8> = Port::new(self.base + reg);
        unsafe { port.read() }
    }

    fn init(&mut self) {
        self.outb(IER, 0); /* Disable all interrupts */
        self.outb(FCR, 0); /* Disable all FIFOs */
        self.outb(LCR, 3); /* 8n1 */
        self.outb(MCR, 3); /* DTR and RTS */

        let div: u16 = (DIV_BASE / 115200) as u16;
        let div_lo: u8 = (div & 0xff) as u8;
        let div_hi: u8 = ((div >> 8) & 0xff) as u8;

        let c: u8 = self.inb(LCR);
        self.outb(LCR, c | DLAB_BIT);
        self.outb(DLL, div_lo);
        self.outb(DLM, div_hi);
        self.outb(LCR, c);

        self.ready = true;
    }
}

impl fmt::Write for SerialPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.ready {
            return Ok(());
        }

        for b in s.as_bytes() {
            self.outb(THR, *b);
        }
        Ok(())
    }
}

lazy_static! {
    // SpinLock to keep lines from different CPUs from interleaving
    static ref SERIAL: SpinLock<SerialPort> = SpinLock::new(SerialPort::new(TTYS0));
}

/// Print with format to the serial output
#[macro_export]
macro_rules! prints {
    ($($args:tt)*) => {{
        $crate::util::serial::serial_out(format_args!($($args)*))
    }};
}

/// Write formatted text to the serial port, if it is enabled
pub fn serial_out(args: fmt::Arguments) {
    use core::fmt::Write;

    if !SERIAL_ENABLED {
        return;
    }

    let _ = SERIAL.lock().write_fmt(args);
}

/// Initialize serial port
pub fn serial_init() {
    if !SERIAL_ENABLED {
        return;
    }

    SERIAL.lock().init();
}
