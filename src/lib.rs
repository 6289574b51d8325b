/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022, 2023 Advanced Micro Devices, Inc.
 *
 * Authors: Carlos Bilbao <carlos.bilbao@amd.com> and
 *          Tom Lendacky <thomas.lendacky@amd.com>
 */

// Disable the (implicitly-linked) standard library. #! defines behavior of the current module; as
// we are in root, the entire crate is affected. Unit tests run as ordinary host processes and
// keep std.
#![cfg_attr(not(test), no_std)]

/// System call trampoline, privilege classification and GHCB MSR protocol
pub mod cpu;
/// Global constants
pub mod globals;
/// Auxiliary functions and macros
pub mod util;
/// C entry points
pub mod wrapper;

pub use crate::cpu::syscall::{syscall_entry, syscall_init};
pub use crate::cpu::trampoline::{dispatch, DispatchPath, Hardware, Platform, SyscallRegs};

#[cfg(not(test))]
use core::panic::PanicInfo;

#[cfg(not(test))]
#[panic_handler]
fn panic(panic_info: &PanicInfo) -> ! {
    prints!("PANIC!\n{}\nPANIC!\n", panic_info);
    cpu::vc_terminate_vmpl_general();
}
