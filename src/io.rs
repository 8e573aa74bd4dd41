//! Reading and writing the headerless little-endian vector files that make
//! up a graph directory. A file is the raw byte image of the vector, nothing
//! else, so loading boils down to reinterpreting bytes.

use std::{
    fs::{metadata, File},
    io::{prelude::*, Error, ErrorKind, Result},
    mem,
    path::Path,
    slice,
};

pub trait DataBytes {
    fn data_bytes(&self) -> &[u8];
}

pub trait DataBytesMut {
    fn data_bytes_mut(&mut self) -> &mut [u8];
}

impl<T: Copy> DataBytes for [T] {
    fn data_bytes(&self) -> &[u8] {
        let num_bytes = self.len() * mem::size_of::<T>();
        unsafe { slice::from_raw_parts(self.as_ptr() as *const u8, num_bytes) }
    }
}

impl<T: Copy> DataBytes for Vec<T> {
    fn data_bytes(&self) -> &[u8] {
        self[..].data_bytes()
    }
}

impl<T: Copy> DataBytesMut for Vec<T> {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        let num_bytes = self.len() * mem::size_of::<T>();
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr() as *mut u8, num_bytes) }
    }
}

pub trait Store: DataBytes {
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: DataBytes> Store for T {}

pub trait Load: DataBytesMut + Sized {
    fn new_with_bytes(num_bytes: usize) -> Result<Self>;

    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let metadata = metadata(path.as_ref())?;
        let mut file = File::open(path)?;

        let mut object = Self::new_with_bytes(metadata.len() as usize)?;
        file.read_exact(object.data_bytes_mut())?;

        Ok(object)
    }
}

impl<T: Default + Copy> Load for Vec<T> {
    fn new_with_bytes(num_bytes: usize) -> Result<Self> {
        if num_bytes % mem::size_of::<T>() != 0 {
            return Err(Error::new(ErrorKind::InvalidData, "file size is not a multiple of the element size"));
        }
        let num_elements = num_bytes / mem::size_of::<T>();
        Ok(vec![T::default(); num_elements])
    }
}

/// Helper to load several vectors relative to one directory.
#[derive(Debug)]
pub struct Loader<'a> {
    path: &'a Path,
}

impl<'a> Loader<'a> {
    pub fn load<T: Load, P: AsRef<Path>>(&self, filename: P) -> Result<T> {
        T::load_from(self.path.join(filename))
    }

    pub fn path(&self) -> &Path {
        self.path
    }
}

/// Types that can be put back together from the vectors in a directory.
pub trait Reconstruct: Sized {
    fn reconstruct_with(loader: Loader) -> Result<Self>;

    fn reconstruct_from<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::reconstruct_with(Loader { path: dir.as_ref() })
    }
}
