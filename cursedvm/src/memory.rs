//! The four addressable backing stores a [`crate::value::Region`] can name,
//! plus the private call-stack backing.
//!
//! Word-shaped regions hold raw 32-bit cells reinterpreted on demand; object-
//! shaped regions hold tagged [`Value`]s directly. Both are fixed-capacity
//! and bounds-checked on every access, mirroring the teacher's `Memory<N>`
//! wrapper around a fixed-size byte array.

use crate::error::Fault;
use crate::value::{Region, Value};

/// A fixed-capacity region of raw 32-bit cells (word memory, the call stack,
/// the IRS).
#[derive(Debug, Clone)]
pub struct WordRegion {
    region: Region,
    cells: Vec<i32>,
}

impl WordRegion {
    /// Allocate a zeroed region of `capacity` cells tagged as `region`.
    pub fn new(region: Region, capacity: usize) -> Self {
        Self { region, cells: vec![0; capacity] }
    }

    /// Number of cells in this region.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Zero every cell without changing capacity.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    fn check(&self, pc: u32, offset: u32) -> Result<usize, Fault> {
        let idx = offset as usize;
        if idx < self.cells.len() {
            Ok(idx)
        } else {
            Err(Fault::BoundsError {
                pc,
                region: self.region,
                offset: offset as i64,
                capacity: self.cells.len(),
            })
        }
    }

    /// Read the raw word at `offset`.
    pub fn read(&self, pc: u32, offset: u32) -> Result<i32, Fault> {
        let idx = self.check(pc, offset)?;
        Ok(self.cells[idx])
    }

    /// Write the raw word at `offset`.
    pub fn write(&mut self, pc: u32, offset: u32, raw: i32) -> Result<(), Fault> {
        let idx = self.check(pc, offset)?;
        self.cells[idx] = raw;
        Ok(())
    }

    /// Copy `words` into the region starting at offset 0, leaving the rest
    /// of the region untouched (the caller is expected to have cleared it
    /// first if a clean load is wanted).
    pub fn load_at_zero(&mut self, words: &[i32]) -> Result<(), Fault> {
        if words.len() > self.cells.len() {
            return Err(Fault::BoundsError {
                pc: 0,
                region: self.region,
                offset: words.len() as i64,
                capacity: self.cells.len(),
            });
        }
        self.cells[..words.len()].copy_from_slice(words);
        Ok(())
    }
}

/// A fixed-capacity region of tagged [`Value`]s (object memory, the data
/// stack).
#[derive(Debug, Clone)]
pub struct ObjectRegion {
    region: Region,
    cells: Vec<Value>,
}

impl ObjectRegion {
    /// Allocate a region of `capacity` cells, each `Value::Null`, tagged as
    /// `region`.
    pub fn new(region: Region, capacity: usize) -> Self {
        Self { region, cells: vec![Value::Null; capacity] }
    }

    /// Number of cells in this region.
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Reset every cell to `Value::Null` without changing capacity.
    pub fn clear(&mut self) {
        self.cells.fill(Value::Null);
    }

    fn check(&self, pc: u32, offset: u32) -> Result<usize, Fault> {
        let idx = offset as usize;
        if idx < self.cells.len() {
            Ok(idx)
        } else {
            Err(Fault::BoundsError {
                pc,
                region: self.region,
                offset: offset as i64,
                capacity: self.cells.len(),
            })
        }
    }

    /// Read the value at `offset`.
    pub fn read(&self, pc: u32, offset: u32) -> Result<Value, Fault> {
        let idx = self.check(pc, offset)?;
        Ok(self.cells[idx])
    }

    /// Write `value` at `offset`, preserving its tag.
    pub fn write(&mut self, pc: u32, offset: u32, value: Value) -> Result<(), Fault> {
        let idx = self.check(pc, offset)?;
        self.cells[idx] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_region_bounds_check_read_and_write() {
        let mut r = WordRegion::new(Region::WordMemory, 4);
        r.write(0, 3, 99).unwrap();
        assert_eq!(r.read(0, 3).unwrap(), 99);
        assert!(matches!(r.read(0, 4), Err(Fault::BoundsError { .. })));
        assert!(matches!(r.write(0, 4, 1), Err(Fault::BoundsError { .. })));
    }

    #[test]
    fn object_region_preserves_tags() {
        let mut r = ObjectRegion::new(Region::DataStack, 2);
        r.write(0, 0, Value::Float(1.5)).unwrap();
        assert_eq!(r.read(0, 0).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn load_at_zero_rejects_oversized_program() {
        let mut r = WordRegion::new(Region::WordMemory, 2);
        assert!(r.load_at_zero(&[1, 2, 3]).is_err());
        assert!(r.load_at_zero(&[1, 2]).is_ok());
    }
}
