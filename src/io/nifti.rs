use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

const HEADER_SIZE: usize = 348;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors encountered when inspecting a NIfTI file
#[derive(Debug, Error)]
pub enum NiftiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File too short for a NIfTI-1 header: {0} bytes")]
    Truncated(usize),
    #[error("Not a NIfTI-1 header (sizeof_hdr={0})")]
    BadHeaderSize(i32),
    #[error("Unsupported NIfTI magic: {0:?}")]
    BadMagic([u8; 4]),
}

/// Summary of a NIfTI-1 volume header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NiftiHeader {
    /// Number of used dimensions (dim[0])
    pub ndim: usize,
    /// Extent of each used dimension
    pub dims: Vec<usize>,
    /// Voxel spacing for each used dimension
    pub pixdim: Vec<f32>,
    pub datatype: i16,
    pub bitpix: i16,
    pub vox_offset: f32,
    /// true for single-file `.nii` (`n+1`), false for header/image pairs (`ni1`)
    pub single_file: bool,
    pub big_endian: bool,
}

impl NiftiHeader {
    /// Human-readable voxel type name
    pub fn datatype_name(&self) -> &'static str {
        match self.datatype {
            2 => "uint8",
            4 => "int16",
            8 => "int32",
            16 => "float32",
            32 => "complex64",
            64 => "float64",
            128 => "rgb24",
            256 => "int8",
            512 => "uint16",
            768 => "uint32",
            1024 => "int64",
            1280 => "uint64",
            _ => "unknown",
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.dims.iter().product()
    }
}

/// What could be learned about a volume file without decompressing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum VolumeInfo {
    Nifti(NiftiHeader),
    /// gzip-compressed (`.nii.gz`); header not parsed
    Compressed,
}

/// Inspect a volume file's header
pub fn inspect(path: &Path) -> Result<VolumeInfo, NiftiError> {
    let mut file = File::open(path)?;
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    file.by_ref()
        .take(HEADER_SIZE as u64)
        .read_to_end(&mut buf)?;

    if buf.len() >= 2 && buf[..2] == GZIP_MAGIC {
        return Ok(VolumeInfo::Compressed);
    }
    parse_header(&buf).map(VolumeInfo::Nifti)
}

/// Parse a raw NIfTI-1 header. Byte order is detected from `sizeof_hdr`.
pub fn parse_header(buf: &[u8]) -> Result<NiftiHeader, NiftiError> {
    if buf.len() < HEADER_SIZE {
        return Err(NiftiError::Truncated(buf.len()));
    }

    let raw_size = [buf[0], buf[1], buf[2], buf[3]];
    let big_endian = match (i32::from_le_bytes(raw_size), i32::from_be_bytes(raw_size)) {
        (348, _) => false,
        (_, 348) => true,
        (le, _) => return Err(NiftiError::BadHeaderSize(le)),
    };

    let magic = [buf[344], buf[345], buf[346], buf[347]];
    let single_file = match &magic {
        b"n+1\0" => true,
        b"ni1\0" => false,
        _ => return Err(NiftiError::BadMagic(magic)),
    };

    let i16_at = |off: usize| {
        let b = [buf[off], buf[off + 1]];
        if big_endian {
            i16::from_be_bytes(b)
        } else {
            i16::from_le_bytes(b)
        }
    };
    let f32_at = |off: usize| {
        let b = [buf[off], buf[off + 1], buf[off + 2], buf[off + 3]];
        if big_endian {
            f32::from_be_bytes(b)
        } else {
            f32::from_le_bytes(b)
        }
    };

    // dim[8] at 40, pixdim[8] at 76
    let ndim = i16_at(40).clamp(0, 7) as usize;
    let dims = (1..=ndim)
        .map(|i| i16_at(40 + 2 * i).max(0) as usize)
        .collect();
    let pixdim = (1..=ndim).map(|i| f32_at(76 + 4 * i)).collect();

    Ok(NiftiHeader {
        ndim,
        dims,
        pixdim,
        datatype: i16_at(70),
        bitpix: i16_at(72),
        vox_offset: f32_at(108),
        single_file,
        big_endian,
    })
}

/// File size in MiB, as shown in run reports
pub fn size_mb(path: &Path) -> std::io::Result<f64> {
    Ok(std::fs::metadata(path)?.len() as f64 / (1024.0 * 1024.0))
}
