//! A fast resettable vector based on timestamps.

/// A vector of values that can be reset to a default in amortized O(1) by
/// advancing a 32bit epoch counter. An entry counts as present only when its
/// stamp equals the current epoch.
#[derive(Debug, Clone)]
pub struct TimestampedVector<T> {
    data: Vec<T>,
    // timestamp for the current round, up to date values carry this one
    current: u32,
    timestamps: Vec<u32>,
    default: T,
}

impl<T: Clone> TimestampedVector<T> {
    pub fn new(size: usize, default: T) -> TimestampedVector<T> {
        TimestampedVector {
            data: vec![default.clone(); size],
            // stamps start at zero, so the active epoch must never be zero
            current: 1,
            timestamps: vec![0; size],
            default,
        }
    }

    /// Logically reset all entries to the default.
    pub fn reset(&mut self) {
        let (new, overflow) = self.current.overflowing_add(1);
        self.current = new;

        // on wraparound old stamps would become valid again, clear for real
        if overflow {
            for stamp in &mut self.timestamps {
                *stamp = 0;
            }
            self.current = 1;
        }
    }

    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
        self.timestamps[index] = self.current;
    }

    /// The stored value if it was written this epoch, the default otherwise.
    pub fn get(&self, index: usize) -> T {
        if self.timestamps[index] == self.current {
            self.data[index].clone()
        } else {
            self.default.clone()
        }
    }

    /// Was this entry written since the last reset?
    pub fn has(&self, index: usize) -> bool {
        self.timestamps[index] == self.current
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
