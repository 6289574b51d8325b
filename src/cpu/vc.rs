/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022 Advanced Micro Devices, Inc.
 *
 * Authors: Carlos Bilbao <carlos.bilbao@amd.com> and
 *          Tom Lendacky <thomas.lendacky@amd.com>
 */

use crate::cpu::sys::{halt, vmgexit, wrmsr};
use crate::globals::*;

/// 0xfff
pub const GHCB_MSR_INFO_MASK: u64 = 0xfff;

/// Low 12 bits of a GHCB MSR value: the request or response code
#[macro_export]
macro_rules! GHCB_MSR_INFO {
    ($x: expr) => {
        $x & $crate::cpu::vc::GHCB_MSR_INFO_MASK
    };
}

/// GHCB MSR value asking to run the given VMPL
pub const fn ghcb_msr_run_vmpl(vmpl: VMPL) -> u64 {
    GHCB_MSR_RUN_VMPL_REQ | ((vmpl as u64) << 32)
}

/// GHCB MSR value asking the hypervisor to terminate the guest
pub const fn ghcb_msr_terminate(reason_set: u64, reason_code: u64) -> u64 {
    GHCB_MSR_TERMINATE_REQ | (reason_set << 12) | (reason_code << 16)
}

/// Terminate execution of the guest
pub fn vc_terminate(reason_set: u64, reason_code: u64) -> ! {
    wrmsr(MSR_GHCB, ghcb_msr_terminate(reason_set, reason_code));
    vmgexit();

    loop {
        halt()
    }
}

/// Terminate with generic VMPL reason
#[inline]
pub fn vc_terminate_vmpl_general() -> ! {
    vc_terminate(VMPL_REASON_CODE_SET, VMPL_TERM_GENERAL);
}

/// Terminate because SEV-SNP is not active, so there is no GHCB MSR
/// protocol to redirect system calls with
#[inline]
pub fn vc_terminate_vmpl_not_snp() -> ! {
    vc_terminate(VMPL_REASON_CODE_SET, VMPL_TERM_NOT_SNP);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LOWER_32BITS, UPPER_32BITS};

    #[test]
    fn test_run_vmpl0_request_clears_upper_half() {
        let value: u64 = ghcb_msr_run_vmpl(VMPL::Vmpl0);
        assert_eq!(value, 0x16);
        assert_eq!(UPPER_32BITS!(value), 0);
        assert_eq!(GHCB_MSR_INFO!(value), GHCB_MSR_RUN_VMPL_REQ);
    }

    #[test]
    fn test_run_vmpl_target_in_upper_half() {
        let value: u64 = ghcb_msr_run_vmpl(VMPL::Vmpl2);
        assert_eq!(UPPER_32BITS!(value), 2);
        assert_eq!(LOWER_32BITS!(value), 0x16);
    }

    #[test]
    fn test_terminate_request_layout() {
        let value: u64 = ghcb_msr_terminate(VMPL_REASON_CODE_SET, VMPL_TERM_NOT_SNP);
        assert_eq!(GHCB_MSR_INFO!(value), GHCB_MSR_TERMINATE_REQ);
        assert_eq!((value >> 12) & 0xf, VMPL_REASON_CODE_SET);
        assert_eq!((value >> 16) & 0xff, VMPL_TERM_NOT_SNP);
    }
}
