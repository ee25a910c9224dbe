//! The bounded memory tape.
//!
//! A tape is a fixed run of `u8` cells with a single data pointer. Its length
//! is decided once at construction and never changes. Pointer moves that would
//! leave `0..len` are refused with [`OutOfBounds`] and leave the tape untouched.

/// Number of cells used when no size is configured.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// A pointer move was refused because it would leave the tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    /// Pointer position at the time of the refused move.
    pub ptr: usize,
}

#[derive(Debug, Clone)]
pub struct Tape {
    cells: Box<[u8]>,
    pointer: usize,
}

impl Tape {
    /// Create a zeroed tape of `size` cells.
    ///
    /// A size of zero is raised to one so there is always a current cell.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size.max(1)].into_boxed_slice(),
            pointer: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Value of the cell under the pointer.
    pub fn current(&self) -> u8 {
        self.cells[self.pointer]
    }

    pub fn move_right(&mut self) -> Result<(), OutOfBounds> {
        if self.pointer + 1 >= self.cells.len() {
            return Err(OutOfBounds { ptr: self.pointer });
        }
        self.pointer += 1;
        Ok(())
    }

    pub fn move_left(&mut self) -> Result<(), OutOfBounds> {
        if self.pointer == 0 {
            return Err(OutOfBounds { ptr: self.pointer });
        }
        self.pointer -= 1;
        Ok(())
    }

    /// Add one to the current cell, wrapping 255 to 0. Returns the new value.
    pub fn increment(&mut self) -> u8 {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_add(1);
        *cell
    }

    /// Subtract one from the current cell, wrapping 0 to 255. Returns the new value.
    pub fn decrement(&mut self) -> u8 {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_sub(1);
        *cell
    }

    /// Zero every cell and return the pointer to cell 0.
    pub fn reset(&mut self) {
        self.cells.fill(0);
        self.pointer = 0;
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(DEFAULT_TAPE_SIZE)
    }
}
