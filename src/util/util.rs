/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022 Advanced Micro Devices, Inc.
 *
 * Authors: Carlos Bilbao <carlos.bilbao@amd.com> and
 *          Tom Lendacky <thomas.lendacky@amd.com>
 */

/// Statically check for a condition
#[macro_export]
macro_rules! STATIC_ASSERT {
    ($x: expr) => {
        const _: () = core::assert!($x);
    };
}

/// Obtain bit for a given position
#[macro_export]
macro_rules! BIT {
    ($x: expr) => {
        (1 << ($x))
    };
}

/// Retrieve 16 least significant bits
#[macro_export]
macro_rules! LOWER_16BITS {
    ($x: expr) => {
        (($x) as u16 & 0xffff)
    };
}

/// Retrieve 32 least significant bits
#[macro_export]
macro_rules! LOWER_32BITS {
    ($x: expr) => {
        (($x) as u32 & 0xffffffff)
    };
}

/// Retrieve 32 most significant bits
#[macro_export]
macro_rules! UPPER_32BITS {
    ($x: expr) => {
        (($x >> 32) as u32 & 0xffffffff)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_split_halves() {
        let v: u64 = 0x1234_5678_9abc_def0;
        assert_eq!(LOWER_32BITS!(v), 0x9abc_def0);
        assert_eq!(UPPER_32BITS!(v), 0x1234_5678);
        assert_eq!(LOWER_16BITS!(v), 0xdef0);
    }

    #[test]
    fn test_bit() {
        let b: u64 = BIT!(12);
        assert_eq!(b, 0x1000);
    }
}
