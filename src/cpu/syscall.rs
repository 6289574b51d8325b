/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2023 Advanced Micro Devices, Inc.
 *
 * Author: Carlos Bilbao <carlos.bilbao@amd.com>
 *
 */

use crate::cpu::sys::rdmsr;
use crate::cpu::vc::vc_terminate_vmpl_not_snp;
use crate::globals::*;
use crate::util::serial::serial_init;
use crate::{prints, STATIC_ASSERT};

use core::arch::{asm, global_asm};
use core::fmt;
use x86_64::VirtAddr;

// The trampoline below spells these out as immediates
STATIC_ASSERT!(MSR_GHCB == 0xc0010130);
STATIC_ASSERT!(GHCB_MSR_RUN_VMPL_REQ == 0x16);

//
// vmpl_syscall: issue the system call staged in the registers following
// the native convention (RAX = number, RDI, RSI, RDX, R10, R8, R9 =
// arguments, result in RAX).
//
// At CPL1-3 it is a plain SYSCALL. At CPL0 the call is handed to VMPL0:
// the GHCB MSR gets an SNP Run VMPL request (target VMPL0 in the upper
// half) and VMGEXIT transfers control. Everything pushed is popped before
// either instruction runs.
//
global_asm!(
    ".pushsection .text",
    ".globl vmpl_syscall",
    ".type vmpl_syscall, @function",
    "vmpl_syscall:",
    "    pushfq",
    "    push %rax",
    "    mov %cs, %ax",
    "    test $3, %al",
    "    jnz 2f",
    "    push %rcx",
    "    push %rdx",
    "    mov $0xc0010130, %ecx",
    "    mov $0x16, %eax",
    "    xor %edx, %edx",
    "    wrmsr",
    "    pop %rdx",
    "    pop %rcx",
    "    pop %rax",
    "    popfq",
    "    rep vmmcall",
    "    jmp 3f",
    "2:",
    "    pop %rax",
    "    popfq",
    "    syscall",
    "3:",
    "    ret",
    ".globl vmpl_syscall_end",
    "vmpl_syscall_end:",
    ".size vmpl_syscall, . - vmpl_syscall",
    ".popsection",
    options(att_syntax)
);

extern "C" {
    /// Not callable as a Rust function: it takes its input in the system
    /// call registers. Use the syscallN() functions or vmpl_syscall!().
    pub fn vmpl_syscall();
}

/// 1
pub const EPERM: u64 = 1;
/// 22
pub const EINVAL: u64 = 22;
/// 38
pub const ENOSYS: u64 = 38;

/// A system call failed; holds the errno it reported
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SyscallError(pub u64);

impl SyscallError {
    pub fn errno(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system call failed with errno {}", self.0)
    }
}

/// Split a raw RAX into a value or the errno encoded as -1..-4095.
/// Redirected calls report rejection the same way.
pub fn syscall_result(ret: u64) -> Result<u64, SyscallError> {
    if ret >= SYSCALL_MAX_ERRNO.wrapping_neg() {
        return Err(SyscallError(ret.wrapping_neg()));
    }

    Ok(ret)
}

/// Address collaborators register as the system call entry of the guest
pub fn syscall_entry() -> VirtAddr {
    VirtAddr::new(vmpl_syscall as usize as u64)
}

/// Check that system calls issued at CPL0 can be redirected and report
/// where the trampoline lives. Runs at CPL0, once, during guest setup.
pub fn syscall_init() {
    serial_init();

    let status: u64 = rdmsr(MSR_SEV_STATUS);
    if status & SEV_STATUS_SNP_ENABLED == 0 {
        prints!("ERR: SEV-SNP is not active, SEV_STATUS={:#x}\n", status);
        vc_terminate_vmpl_not_snp();
    }

    prints!(
        "> VMPL syscall trampoline at {:#x}-{:#x}\n",
        syscall_entry().as_u64(),
        get_vmpl_syscall_end().as_u64()
    );
}

// The trampoline may take the native path, so RCX and R11 are clobbered
// like for a bare SYSCALL

#[inline]
pub fn syscall0(id: u64) -> u64 {
    let ret: u64;
    unsafe {
        asm!("call {entry}",
             entry = sym vmpl_syscall,
             inout("rax") id => ret,
             lateout("rcx") _, lateout("r11") _);
    }

    ret
}

#[inline]
pub fn syscall1(id: u64, p1: u64) -> u64 {
    let ret: u64;
    unsafe {
        asm!("call {entry}",
             entry = sym vmpl_syscall,
             inout("rax") id => ret,
             in("rdi") p1,
             lateout("rcx") _, lateout("r11") _);
    }

    ret
}

#[inline]
pub fn syscall2(id: u64, p1: u64, p2: u64) -> u64 {
    let ret: u64;
    unsafe {
        asm!("call {entry}",
             entry = sym vmpl_syscall,
             inout("rax") id => ret,
             in("rdi") p1,
             in("rsi") p2,
             lateout("rcx") _, lateout("r11") _);
    }

    ret
}

#[inline]
pub fn syscall3(id: u64, p1: u64, p2: u64, p3: u64) -> u64 {
    let ret: u64;
    unsafe {
        asm!("call {entry}",
             entry = sym vmpl_syscall,
             inout("rax") id => ret,
             in("rdi") p1,
             in("rsi") p2,
             in("rdx") p3,
             lateout("rcx") _, lateout("r11") _);
    }

    ret
}

#[inline]
pub fn syscall4(id: u64, p1: u64, p2: u64, p3: u64, p4: u64) -> u64 {
    let ret: u64;
    unsafe {
        asm!("call {entry}",
             entry = sym vmpl_syscall,
             inout("rax") id => ret,
             in("rdi") p1,
             in("rsi") p2,
             in("rdx") p3,
             in("r10") p4,
             lateout("rcx") _, lateout("r11") _);
    }

    ret
}

#[inline]
pub fn syscall5(id: u64, p1: u64, p2: u64, p3: u64, p4: u64, p5: u64) -> u64 {
    let ret: u64;
    unsafe {
        asm!("call {entry}",
             entry = sym vmpl_syscall,
             inout("rax") id => ret,
             in("rdi") p1,
             in("rsi") p2,
             in("rdx") p3,
             in("r10") p4,
             in("r8") p5,
             lateout("rcx") _, lateout("r11") _);
    }

    ret
}

#[inline]
pub fn syscall6(id: u64, p1: u64, p2: u64, p3: u64, p4: u64, p5: u64, p6: u64) -> u64 {
    let ret: u64;
    unsafe {
        asm!("call {entry}",
             entry = sym vmpl_syscall,
             inout("rax") id => ret,
             in("rdi") p1,
             in("rsi") p2,
             in("rdx") p3,
             in("r10") p4,
             in("r8") p5,
             in("r9") p6,
             lateout("rcx") _, lateout("r11") _);
    }

    ret
}

///
/// System call through the trampoline. Example of usage:
/// vmpl_syscall!(CALL_ID, param1)
///
#[macro_export]
macro_rules! vmpl_syscall {
    ($id: expr) => {
        $crate::cpu::syscall::syscall0($id as u64)
    };
    ($id: expr, $p1: expr) => {
        $crate::cpu::syscall::syscall1($id as u64, $p1 as u64)
    };
    ($id: expr, $p1: expr, $p2: expr) => {
        $crate::cpu::syscall::syscall2($id as u64, $p1 as u64, $p2 as u64)
    };
    ($id: expr, $p1: expr, $p2: expr, $p3: expr) => {
        $crate::cpu::syscall::syscall3($id as u64, $p1 as u64, $p2 as u64, $p3 as u64)
    };
    ($id: expr, $p1: expr, $p2: expr, $p3: expr, $p4: expr) => {
        $crate::cpu::syscall::syscall4(
            $id as u64, $p1 as u64, $p2 as u64, $p3 as u64, $p4 as u64,
        )
    };
    ($id: expr, $p1: expr, $p2: expr, $p3: expr, $p4: expr, $p5: expr) => {
        $crate::cpu::syscall::syscall5(
            $id as u64, $p1 as u64, $p2 as u64, $p3 as u64, $p4 as u64, $p5 as u64,
        )
    };
    ($id: expr, $p1: expr, $p2: expr, $p3: expr, $p4: expr, $p5: expr, $p6: expr) => {
        $crate::cpu::syscall::syscall6(
            $id as u64, $p1 as u64, $p2 as u64, $p3 as u64, $p4 as u64, $p5 as u64,
            $p6 as u64,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syscall_result_splits_errno() {
        assert_eq!(syscall_result(0), Ok(0));
        assert_eq!(syscall_result(4096), Ok(4096));
        assert_eq!(syscall_result(EINVAL.wrapping_neg()), Err(SyscallError(EINVAL)));
        assert_eq!(syscall_result(u64::MAX), Err(SyscallError(EPERM)));
        assert_eq!(syscall_result(4095u64.wrapping_neg()), Err(SyscallError(4095)));
        // Large values such as mmap() addresses are not errors
        assert_eq!(syscall_result(4096u64.wrapping_neg()), Ok(4096u64.wrapping_neg()));
    }

    #[test]
    fn test_entry_precedes_end_label() {
        let entry: VirtAddr = syscall_entry();
        let end: VirtAddr = get_vmpl_syscall_end();
        assert!(entry < end);
        // Both paths and the shared tail fit in one cache line
        assert!(end - entry < 64);
    }

    #[cfg(target_os = "linux")]
    mod host {
        use super::*;

        /// 1
        const SYS_WRITE: u64 = 1;
        /// 3
        const SYS_CLOSE: u64 = 3;
        /// 39
        const SYS_GETPID: u64 = 39;
        /// 110
        const SYS_GETPPID: u64 = 110;
        /// 9
        const EBADF: u64 = 9;

        // Test binaries run at CPL3, so these exercise the native path
        // of the real trampoline

        #[test]
        fn test_trampoline_direct_path() {
            assert_eq!(syscall0(SYS_GETPID), std::process::id() as u64);
            assert_eq!(vmpl_syscall!(SYS_GETPPID), std::os::unix::process::parent_id() as u64);
        }

        #[test]
        fn test_trampoline_passes_arguments() {
            let buf: [u8; 4] = *b"vmpl";
            let ret: u64 = vmpl_syscall!(SYS_WRITE, u32::MAX, buf.as_ptr(), buf.len());
            assert_eq!(syscall_result(ret), Err(SyscallError(EBADF)));

            let ret: u64 = vmpl_syscall!(SYS_WRITE, 1, buf.as_ptr(), 0);
            assert_eq!(syscall_result(ret), Ok(0));
        }

        #[test]
        fn test_trampoline_reports_errno() {
            let ret: u64 = syscall1(SYS_CLOSE, u32::MAX as u64);
            assert_eq!(syscall_result(ret), Err(SyscallError(EBADF)));
        }

        #[test]
        fn test_trampoline_keeps_flags() {
            // DF is part of RFLAGS the caller relies on staying clear
            let rflags_before: u64 = x86_64::registers::rflags::read_raw();
            syscall0(SYS_GETPID);
            let rflags_after: u64 = x86_64::registers::rflags::read_raw();
            assert_eq!(rflags_before & 0x400, rflags_after & 0x400);
            assert_eq!(rflags_before & RFLAGS_IF, rflags_after & RFLAGS_IF);
        }
    }
}
