//! Reader/writer coordination for the registry.
//!
//! With the `multithreading` feature, [`RegistryLock`] gives writers priority: a writer
//! announces itself, waits for the active readers to drain, then takes the writer mutex.
//! Readers never wait on each other, only on announced writers. All waiting is spinning, which
//! suits a registry that is written rarely and read on every dispatch.
//!
//! A thread that already holds a read may read again without checking for writers, so handlers
//! can dispatch further events. Writing while holding a read on the same lock panics.
//!
//! Without the feature the lock is a `RefCell` and the registry is not `Sync`.

pub use self::imp::{ReadGuard, RegistryLock, WriteGuard};

#[cfg(feature = "multithreading")]
mod imp {
    use std::cell::{RefCell, UnsafeCell};
    use std::hint;
    use std::marker::PhantomData;
    use std::ops::{Deref, DerefMut};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard};
    use std::thread;

    const SPINS_BEFORE_YIELD: u32 = 64;

    thread_local! {
        // Addresses of the locks the current thread holds reads on.
        static HELD_READS: RefCell<Vec<usize>> = RefCell::new(Vec::new());
    }

    fn spin(spins: &mut u32) {
        if *spins < SPINS_BEFORE_YIELD {
            *spins += 1;
            hint::spin_loop();
        } else {
            thread::yield_now();
        }
    }

    pub struct RegistryLock<T> {
        readers: AtomicUsize,
        writers: AtomicUsize,
        writer_mutex: Mutex<()>,
        data: UnsafeCell<T>,
    }

    // Safety: the data is only reached through guards. Read guards exist only while no writer
    // holds the data, and a write guard needs the reader count at zero plus the writer mutex.
    unsafe impl<T: Send> Send for RegistryLock<T> { }
    unsafe impl<T: Send + Sync> Sync for RegistryLock<T> { }

    impl<T> RegistryLock<T> {
        pub fn new(data: T) -> Self {
            Self {
                readers: AtomicUsize::new(0),
                writers: AtomicUsize::new(0),
                writer_mutex: Mutex::new(()),
                data: UnsafeCell::new(data),
            }
        }

        fn address(&self) -> usize {
            self as *const Self as usize
        }

        fn held_by_current_thread(&self) -> bool {
            let address = self.address();
            HELD_READS.with(|held| held.borrow().contains(&address))
        }

        pub fn read(&self) -> ReadGuard<'_, T> {
            if self.held_by_current_thread() {
                self.readers.fetch_add(1, Ordering::SeqCst);
            } else {
                let mut spins = 0;
                loop {
                    while self.writers.load(Ordering::SeqCst) > 0 {
                        spin(&mut spins);
                    }

                    self.readers.fetch_add(1, Ordering::SeqCst);

                    // A writer may have announced itself between the check and the increment.
                    if self.writers.load(Ordering::SeqCst) == 0 {
                        break;
                    }
                    self.readers.fetch_sub(1, Ordering::SeqCst);
                }
            }

            let address = self.address();
            HELD_READS.with(|held| held.borrow_mut().push(address));

            ReadGuard {
                lock: self,
                _not_send: PhantomData,
            }
        }

        pub fn write(&self) -> WriteGuard<'_, T> {
            if self.held_by_current_thread() {
                panic!("RegistryLock: write requested by a thread holding a read on the same lock");
            }

            self.writers.fetch_add(1, Ordering::SeqCst);

            let mut spins = 0;
            while self.readers.load(Ordering::SeqCst) > 0 {
                spin(&mut spins);
            }

            let mutex = self.writer_mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

            WriteGuard {
                lock: self,
                mutex: Some(mutex),
            }
        }

        pub fn readers(&self) -> usize {
            self.readers.load(Ordering::SeqCst)
        }

        pub fn pending_writers(&self) -> usize {
            self.writers.load(Ordering::SeqCst)
        }

        pub fn into_inner(self) -> T {
            self.data.into_inner()
        }
    }

    pub struct ReadGuard<'a, T> {
        lock: &'a RegistryLock<T>,
        _not_send: PhantomData<*const ()>,
    }

    impl<T> Deref for ReadGuard<'_, T> {
        type Target = T;

        fn deref(&self) -> &T {
            // Writers only touch the data once the reader count is zero.
            unsafe { &*self.lock.data.get() }
        }
    }

    impl<T> Drop for ReadGuard<'_, T> {
        fn drop(&mut self) {
            let address = self.lock.address();
            HELD_READS.with(|held| {
                let mut held = held.borrow_mut();
                if let Some(position) = held.iter().rposition(|a| *a == address) {
                    held.remove(position);
                }
            });
            self.lock.readers.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub struct WriteGuard<'a, T> {
        lock: &'a RegistryLock<T>,
        mutex: Option<MutexGuard<'a, ()>>,
    }

    impl<T> Deref for WriteGuard<'_, T> {
        type Target = T;

        fn deref(&self) -> &T {
            unsafe { &*self.lock.data.get() }
        }
    }

    impl<T> DerefMut for WriteGuard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            // No readers are active and the writer mutex is held.
            unsafe { &mut *self.lock.data.get() }
        }
    }

    impl<T> Drop for WriteGuard<'_, T> {
        fn drop(&mut self) {
            self.mutex.take();
            self.lock.writers.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(not(feature = "multithreading"))]
mod imp {
    use std::cell::{Ref, RefCell, RefMut};

    pub type ReadGuard<'a, T> = Ref<'a, T>;
    pub type WriteGuard<'a, T> = RefMut<'a, T>;

    pub struct RegistryLock<T> {
        data: RefCell<T>,
    }

    impl<T> RegistryLock<T> {
        pub fn new(data: T) -> Self {
            Self {
                data: RefCell::new(data),
            }
        }

        pub fn read(&self) -> ReadGuard<'_, T> {
            self.data.borrow()
        }

        pub fn write(&self) -> WriteGuard<'_, T> {
            match self.data.try_borrow_mut() {
                Ok(guard) => guard,
                Err(_) => panic!("RegistryLock: write requested by a thread holding a read on the same lock"),
            }
        }

        pub fn readers(&self) -> usize {
            0
        }

        pub fn pending_writers(&self) -> usize {
            0
        }

        pub fn into_inner(self) -> T {
            self.data.into_inner()
        }
    }
}
