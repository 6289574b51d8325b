/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022, 2023 Advanced Micro Devices, Inc.
 *
 * Authors: Carlos Bilbao <carlos.bilbao@amd.com> and
 *          Tom Lendacky <thomas.lendacky@amd.com>
 */

use crate::BIT;
use x86_64::addr::VirtAddr;

// MSRs
/// 0xc0010130
pub const MSR_GHCB: u32 = 0xc0010130;
/// 0xc0010131
pub const MSR_SEV_STATUS: u32 = 0xc0010131;

// MSR SEV_STATUS bits
/// Bit 2
pub const SEV_STATUS_SNP_ENABLED: u64 = BIT!(2);

// GHCB MSR protocol: SNP Run VMPL request. The target VMPL lives in
// GHCBData[39:32], so the upper half of the MSR value selects it.
/// 0x16
pub const GHCB_MSR_RUN_VMPL_REQ: u64 = 0x016;

// GHCB MSR protocol: Termination request
/// 0x100
pub const GHCB_MSR_TERMINATE_REQ: u64 = 0x100;

// VMPL termination constants
/// 15
pub const VMPL_REASON_CODE_SET: u64 = 15;
/// 0
pub const VMPL_TERM_GENERAL: u64 = 0;
/// 13
pub const VMPL_TERM_NOT_SNP: u64 = 13;

// Segment selectors
/// Bits 0 and 1 (requested privilege level)
pub const SELECTOR_RPL_MASK: u16 = 0x3;

// RFLAGS
/// Bit 1 (always set)
pub const RFLAGS_FIXED: u64 = BIT!(1);
/// Bit 6
pub const RFLAGS_ZF: u64 = BIT!(6);
/// Bit 9
pub const RFLAGS_IF: u64 = BIT!(9);

/// Number of arguments the native syscall convention passes in registers
pub const SYSCALL_MAX_ARGS: usize = 6;

/// Largest errno a syscall reports through a negative return value
pub const SYSCALL_MAX_ERRNO: u64 = 4095;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
/// Vmpl levels
pub enum VMPL {
    Vmpl0,
    Vmpl1,
    Vmpl2,
    Vmpl3,

    VmplMax,
}

//
// External symbol support:
//   Labels emitted by assembly only have an address, so the getters hand
//   out that address instead of reading through the symbol.
//
macro_rules! extern_symbol_virtaddr_ro {
    ($name: ident) => {
        paste::paste! {
            extern "C" {
                static $name: u8;
            }
            pub fn [<get_ $name>]() -> VirtAddr {
                unsafe {
                    VirtAddr::new(core::ptr::addr_of!($name) as u64)
                }
            }
        }
    };
}

#[cfg(target_arch = "x86_64")]
extern_symbol_virtaddr_ro!(vmpl_syscall_end);
