/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2023 IBM
 *
 * Authors:
 *   Claudio Carvalho <cclaudio@ibm.com>
 *   Vikram Narayanan <vikram186@gmail.com>
 */

use crate::cpu::syscall::syscall_entry;
use crate::cpu::trampoline::{dispatch, Hardware, SyscallRegs};
use crate::prints;

use core::ptr;

/// Address of the system call trampoline, for the runtime that installs
/// it as the guest's system call entry
#[no_mangle]
pub extern "C" fn vmpl_syscall_addr() -> *const cty::c_void {
    syscall_entry().as_ptr()
}

/// Dispatch the system call staged in `regs` and return its result.
/// `regs` is updated with the registers as the call left them.
///
/// # Safety
///
/// `regs` must be null or point to a valid, writable SyscallRegs.
#[no_mangle]
pub unsafe extern "C" fn vmpl_dispatch(regs: *mut SyscallRegs) -> cty::c_long {
    if regs.is_null() {
        prints!("ERR: BUG: vmpl_dispatch called without registers\n");
        return -(crate::cpu::syscall::EINVAL as cty::c_long);
    }

    let mut staged: SyscallRegs = ptr::read(regs);
    dispatch(&mut Hardware, &mut staged);
    ptr::write(regs, staged);

    staged.ret() as cty::c_long
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::syscall::EINVAL;
    use crate::globals::SYSCALL_MAX_ARGS;

    /// 39
    const SYS_GETPID: u64 = 39;

    #[test]
    fn test_null_regs_rejected() {
        let ret: cty::c_long = unsafe { vmpl_dispatch(ptr::null_mut()) };
        assert_eq!(ret, -(EINVAL as cty::c_long));
    }

    #[test]
    fn test_addr_is_trampoline() {
        assert_eq!(vmpl_syscall_addr() as u64, syscall_entry().as_u64());
    }

    #[test]
    #[cfg(all(target_arch = "x86_64", target_os = "linux"))]
    fn test_dispatch_through_c_abi() {
        let mut regs: SyscallRegs = SyscallRegs::new(SYS_GETPID, [0; SYSCALL_MAX_ARGS]);
        let ret: cty::c_long = unsafe { vmpl_dispatch(&mut regs) };
        assert_eq!(ret as u64, std::process::id() as u64);
        assert_eq!(regs.ret(), ret as u64);
    }
}
