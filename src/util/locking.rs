/* SPDX-License-Identifier: MIT */
/*
 * Copyright (C) 2022 SUSE LLC.
 * Authors: Jörg Rödel (jroedel at suse.de)
 *
 */

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU64, Ordering};

use crate::cpu::pause;

pub struct LockGuard<'a, T> {
    holder: &'a AtomicU64,
    data: &'a mut T,
}

impl<'a, T> Deref for LockGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.data
    }
}

impl<'a, T> DerefMut for LockGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.data
    }
}

impl<'a, T> Drop for LockGuard<'a, T> {
    fn drop(&mut self) {
        self.holder.fetch_add(1, Ordering::Release);
    }
}

/// Ticket lock; waiters are served in arrival order
pub struct SpinLock<T> {
    current: AtomicU64,
    holder: AtomicU64,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(data: T) -> Self {
        SpinLock {
            current: AtomicU64::new(1),
            holder: AtomicU64::new(1),
            data: UnsafeCell::new(data),
        }
    }

    pub fn lock(&self) -> LockGuard<T> {
        let ticket: u64 = self.current.fetch_add(1, Ordering::Relaxed);

        while self.holder.load(Ordering::Acquire) != ticket {
            pause();
        }

        LockGuard {
            holder: &self.holder,
            data: unsafe { &mut *self.data.get() },
        }
    }

    /// Number of lockers served so far (including the current holder)
    pub fn served(&self) -> u64 {
        self.holder.load(Ordering::Relaxed) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let lock: SpinLock<u32> = SpinLock::new(7);
        {
            let mut guard: LockGuard<u32> = lock.lock();
            *guard += 1;
        }
        assert_eq!(lock.served(), 1);
        assert_eq!(*lock.lock(), 8);
    }

    #[test]
    fn test_lock_from_threads() {
        use std::sync::Arc;
        use std::thread;
        use std::vec::Vec;

        let lock: Arc<SpinLock<u64>> = Arc::new(SpinLock::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let l = Arc::clone(&lock);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        *l.lock() += 1;
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(*lock.lock(), 4000);
    }
}
