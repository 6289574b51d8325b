/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022 Advanced Micro Devices, Inc.
 *
 * Authors: Carlos Bilbao <carlos.bilbao@amd.com> and
 *          Tom Lendacky <thomas.lendacky@amd.com>
 */

use core::arch::asm;

/// Read MSR
pub fn rdmsr(msr: u32) -> u64 {
    let lo: u32;
    let hi: u32;

    unsafe {
        asm!("rdmsr",
             in("rcx") msr, out("rax") lo, out("rdx") hi,
             options(nostack));
    }

    ((hi as u64) << 32) | lo as u64
}

/// Write to MSR a given value
pub fn wrmsr(msr: u32, value: u64) {
    let lo: u32 = value as u32;
    let hi: u32 = (value >> 32) as u32;

    unsafe {
        asm!("wrmsr",
             in("rcx") msr, in("rax") lo, in("rdx") hi,
             options(nostack));
    }
}

/// Exit to the more privileged level. The caller is expected to have
/// placed a request in the GHCB MSR (or page) beforehand.
pub fn vmgexit() {
    unsafe {
        asm!("rep vmmcall", options(nostack));
    }
}

/// Execute assembly pause instruction
pub fn pause() {
    unsafe {
        asm!("pause", options(nomem, nostack));
    }
}

/// Execute assembly hlt instruction (yielding)
pub fn halt() {
    unsafe {
        asm!("hlt", options(nostack));
    }
}
