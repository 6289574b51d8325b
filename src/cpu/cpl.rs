/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022, 2023 Advanced Micro Devices, Inc.
 *
 * Author: Carlos Bilbao <carlos.bilbao@amd.com>
 *
 */

use crate::globals::SELECTOR_RPL_MASK;
use x86_64::instructions::segmentation::{Segment, CS};
use x86_64::PrivilegeLevel;

/// Where the code issuing a system call runs, as far as dispatching
/// is concerned
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrivilegeClass {
    /// CPL0: the system call is redirected to the more privileged VMPL
    MostPrivileged,
    /// CPL1-3: the native SYSCALL instruction is used
    Reduced,
}

impl PrivilegeClass {
    /// Classify from the RPL bits of a code segment selector
    pub fn from_selector(selector: u16) -> Self {
        if selector & SELECTOR_RPL_MASK == 0 {
            PrivilegeClass::MostPrivileged
        } else {
            PrivilegeClass::Reduced
        }
    }
}

impl From<PrivilegeLevel> for PrivilegeClass {
    fn from(level: PrivilegeLevel) -> Self {
        match level {
            PrivilegeLevel::Ring0 => PrivilegeClass::MostPrivileged,
            _ => PrivilegeClass::Reduced,
        }
    }
}

/// Selector of the code segment currently executing
pub fn current_code_selector() -> u16 {
    CS::get_reg().0
}

/// Classify the current execution context
pub fn current_privilege_class() -> PrivilegeClass {
    CS::get_reg().rpl().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_selectors() {
        // Kernel and user code selectors of a Linux style GDT
        assert_eq!(PrivilegeClass::from_selector(0x10), PrivilegeClass::MostPrivileged);
        assert_eq!(PrivilegeClass::from_selector(0x33), PrivilegeClass::Reduced);
        assert_eq!(PrivilegeClass::from_selector(0x2b), PrivilegeClass::Reduced);
        assert_eq!(PrivilegeClass::from_selector(0x09), PrivilegeClass::Reduced);
        assert_eq!(PrivilegeClass::from_selector(0x0a), PrivilegeClass::Reduced);
    }

    #[test]
    fn test_selector_and_level_agree() {
        for rpl in 0..4u16 {
            let selector: u16 = 0x30 | rpl;
            assert_eq!(
                PrivilegeClass::from_selector(selector),
                PrivilegeClass::from(PrivilegeLevel::from_u16(rpl))
            );
        }
    }

    #[test]
    #[cfg(all(target_arch = "x86_64", target_os = "linux"))]
    fn test_host_runs_reduced() {
        // Test binaries run as ordinary user processes
        assert_eq!(current_privilege_class(), PrivilegeClass::Reduced);
        assert_eq!(
            PrivilegeClass::from_selector(current_code_selector()),
            PrivilegeClass::Reduced
        );
    }
}
