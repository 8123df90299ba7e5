//! Backing buffer for the SDRAM array.
//!
//! On Unix the buffer is an anonymous `mmap`, so a multi-hundred-megabyte
//! simulated part only consumes host pages that simulated writes actually
//! touch. Other platforms fall back to a zeroed `Vec`.

use std::slice;

/// A lazily allocated byte buffer.
pub struct LazyBuffer {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer exclusively owns its allocation; all access goes through
// &self/&mut self methods, so aliasing follows the usual borrow rules.
unsafe impl Send for LazyBuffer {}
// SAFETY: as above; shared references only permit reads.
unsafe impl Sync for LazyBuffer {}

impl LazyBuffer {
    /// Creates a zero-initialized buffer of the given size in bytes.
    ///
    /// # Panics
    ///
    /// Panics if the host refuses the mapping; a simulation cannot start
    /// without its backing store.
    pub fn new(size: usize) -> Self {
        #[cfg(unix)]
        {
            use std::ptr;
            // SAFETY: anonymous private mapping with no file descriptor;
            // arguments are valid per mmap(2).
            let ptr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };

            assert!(
                ptr != libc::MAP_FAILED,
                "failed to mmap {size}-byte memory array"
            );

            Self {
                ptr: ptr.cast::<u8>(),
                size,
                is_mmap: true,
            }
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u8; size];
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Self {
                ptr,
                size,
                is_mmap: false,
            }
        }
    }

    /// Buffer size in bytes.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns whether the buffer has zero capacity.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Reads `len` bytes at `offset`.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-bounds range; callers mask addresses first.
    pub fn read_slice(&self, offset: usize, len: usize) -> &[u8] {
        assert!(
            offset + len <= self.size,
            "memory array read out of bounds: {offset}+{len} > {}",
            self.size
        );
        // SAFETY: range checked above; the allocation lives as long as self.
        unsafe { slice::from_raw_parts(self.ptr.add(offset), len) }
    }

    /// Writes `data` at `offset`.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-bounds range; callers mask addresses first.
    pub fn write_slice(&mut self, offset: usize, data: &[u8]) {
        assert!(
            offset + data.len() <= self.size,
            "memory array write out of bounds: {offset}+{} > {}",
            data.len(),
            self.size
        );
        // SAFETY: range checked above; &mut self guarantees exclusive access.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(offset), data.len());
        }
    }
}

impl Drop for LazyBuffer {
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: ptr/size are exactly what mmap returned.
            unsafe {
                let _ = libc::munmap(self.ptr.cast(), self.size);
            }
        } else {
            #[cfg(not(unix))]
            // SAFETY: reconstructs the Vec forgotten in new() to free it.
            unsafe {
                let _ = Vec::from_raw_parts(self.ptr, self.size, self.size);
            }
        }
    }
}
