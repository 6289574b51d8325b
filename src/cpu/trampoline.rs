/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2023 Advanced Micro Devices, Inc.
 *
 * Author: Carlos Bilbao <carlos.bilbao@amd.com>
 *
 */

//
// Dispatcher behind the vmpl_syscall entry (see src/cpu/syscall.rs),
// written against an explicit register file. The privilege query and the
// instructions that leave the trampoline are supplied by a Platform, so
// the same two-branch logic runs on hardware and under test.
//

use crate::cpu::cpl::{current_privilege_class, PrivilegeClass};
use crate::cpu::sys::wrmsr;
use crate::cpu::vc::ghcb_msr_run_vmpl;
use crate::globals::*;
use crate::{LOWER_32BITS, UPPER_32BITS};

use core::arch::asm;

/// RFLAGS and RAX, plus RCX and RDX on the redirect path
pub const SCRATCH_SLOTS: usize = 4;

/// Registers the native system call convention uses, plus RFLAGS
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyscallRegs {
    /// System call number on entry, return value on exit
    pub rax: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
    pub r10: u64,
    pub r8: u64,
    pub r9: u64,
    /// Clobbered by SYSCALL (return RIP)
    pub rcx: u64,
    /// Clobbered by SYSCALL (saved RFLAGS)
    pub r11: u64,
    pub rflags: u64,
}

impl SyscallRegs {
    /// Stage a system call number and its arguments the way the native
    /// convention expects them
    pub fn new(id: u64, args: [u64; SYSCALL_MAX_ARGS]) -> Self {
        SyscallRegs {
            rax: id,
            rdi: args[0],
            rsi: args[1],
            rdx: args[2],
            r10: args[3],
            r8: args[4],
            r9: args[5],
            rcx: 0,
            r11: 0,
            rflags: RFLAGS_FIXED | RFLAGS_IF,
        }
    }

    pub fn ret(&self) -> u64 {
        self.rax
    }

    fn set_rflag(&mut self, flag: u64, set: bool) {
        if set {
            self.rflags |= flag;
        } else {
            self.rflags &= !flag;
        }
    }
}

/// Path a system call took through the trampoline
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchPath {
    /// Native SYSCALL instruction
    Direct,
    /// GHCB MSR request followed by VMGEXIT
    Redirect,
}

/// Processor capabilities the dispatcher relies on
pub trait Platform {
    /// Classify the context issuing the system call. Must depend only on
    /// hardware enforced state.
    fn privilege_class(&self) -> PrivilegeClass;

    fn wrmsr(&mut self, msr: u32, value: u64);

    /// Execute the native SYSCALL instruction with the staged registers
    fn syscall(&mut self, regs: &mut SyscallRegs);

    /// Execute VMGEXIT; returns once the more privileged level resumes us
    fn vmgexit(&mut self, regs: &mut SyscallRegs);
}

/// Save area of one dispatch. It lives on the dispatching stack frame,
/// so nested dispatches never share one.
struct ScratchFrame {
    slots: [u64; SCRATCH_SLOTS],
    depth: usize,
}

impl ScratchFrame {
    fn new() -> Self {
        ScratchFrame {
            slots: [0; SCRATCH_SLOTS],
            depth: 0,
        }
    }

    fn push(&mut self, value: u64) {
        self.slots[self.depth] = value;
        self.depth += 1;
    }

    fn pop(&mut self) -> u64 {
        self.depth -= 1;
        self.slots[self.depth]
    }

    fn is_empty(&self) -> bool {
        self.depth == 0
    }
}

/// Route one system call, either to the native SYSCALL instruction
/// (reduced privilege) or to the more privileged VMPL through the GHCB
/// MSR and VMGEXIT (CPL0). On return `regs.rax` holds the result.
pub fn dispatch<P: Platform>(platform: &mut P, regs: &mut SyscallRegs) -> DispatchPath {
    let mut frame: ScratchFrame = ScratchFrame::new();

    frame.push(regs.rflags);
    frame.push(regs.rax);

    // Classification clobbers ZF
    let class: PrivilegeClass = platform.privilege_class();
    regs.set_rflag(RFLAGS_ZF, class == PrivilegeClass::MostPrivileged);

    match class {
        PrivilegeClass::Reduced => {
            regs.rax = frame.pop();
            regs.rflags = frame.pop();
            debug_assert!(frame.is_empty());

            platform.syscall(regs);
            DispatchPath::Direct
        }
        PrivilegeClass::MostPrivileged => {
            frame.push(regs.rcx);
            frame.push(regs.rdx);

            let request: u64 = ghcb_msr_run_vmpl(VMPL::Vmpl0);
            regs.rcx = MSR_GHCB as u64;
            regs.rax = LOWER_32BITS!(request) as u64;
            regs.rdx = UPPER_32BITS!(request) as u64;
            platform.wrmsr(regs.rcx as u32, (regs.rdx << 32) | regs.rax);

            regs.rdx = frame.pop();
            regs.rcx = frame.pop();
            regs.rax = frame.pop();
            regs.rflags = frame.pop();
            debug_assert!(frame.is_empty());

            platform.vmgexit(regs);
            DispatchPath::Redirect
        }
    }
}

/// The processor this code runs on
pub struct Hardware;

impl Platform for Hardware {
    fn privilege_class(&self) -> PrivilegeClass {
        current_privilege_class()
    }

    fn wrmsr(&mut self, msr: u32, value: u64) {
        wrmsr(msr, value);
    }

    // RFLAGS is preserved by the processor itself on both paths, so
    // regs.rflags is not written back
    fn syscall(&mut self, regs: &mut SyscallRegs) {
        unsafe {
            asm!("syscall",
                 inout("rax") regs.rax,
                 inout("rdi") regs.rdi,
                 inout("rsi") regs.rsi,
                 inout("rdx") regs.rdx,
                 inout("r10") regs.r10,
                 inout("r8") regs.r8,
                 inout("r9") regs.r9,
                 lateout("rcx") regs.rcx,
                 lateout("r11") regs.r11,
                 options(nostack));
        }
    }

    fn vmgexit(&mut self, regs: &mut SyscallRegs) {
        unsafe {
            asm!("rep vmmcall",
                 inout("rax") regs.rax,
                 inout("rdi") regs.rdi,
                 inout("rsi") regs.rsi,
                 inout("rdx") regs.rdx,
                 inout("r10") regs.r10,
                 inout("r8") regs.r8,
                 inout("r9") regs.r9,
                 inout("rcx") regs.rcx,
                 inout("r11") regs.r11,
                 options(nostack));
        }
    }
}
