/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022, 2023 Advanced Micro Devices, Inc.
 *
 * Authors: Carlos Bilbao <carlos.bilbao@amd.com> and
 *          Tom Lendacky <thomas.lendacky@amd.com>
 */

/// CPL classification
pub mod cpl;
/// Auxiliary assembly functions
pub mod sys;
/// System call trampoline and initialization
pub mod syscall;
/// Portable system call dispatcher
pub mod trampoline;
/// VC functions
pub mod vc;

pub use crate::cpu::cpl::*;
pub use crate::cpu::sys::*;
pub use crate::cpu::syscall::*;
pub use crate::cpu::trampoline::*;
pub use crate::cpu::vc::*;
