//! Minimal NumPy `.npy` v1.0 codec
//!
//! The writer covers exactly the two shapes this pipeline persists:
//! little-endian f32 1-D waveforms and little-endian i64 scalar labels
//! (shape `()`, matching `np.save` of a Python int). The reader parses the
//! same subset and backs the round-trip and byte-identity tests.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Serialize a 1-D f32 array as `.npy` (descr `<f4`, shape `(n,)`)
pub fn write_f32_1d(path: &Path, data: &[f32]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(&header_bytes("<f4", &format!("({},)", data.len())))?;
    for &value in data {
        file.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

/// Serialize an i64 scalar as `.npy` (descr `<i8`, shape `()`)
pub fn write_i64_scalar(path: &Path, value: i64) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(&header_bytes("<i8", "()"))?;
    file.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Parse a `.npy` file written by [`write_f32_1d`]
pub fn read_f32_1d(path: &Path) -> io::Result<Vec<f32>> {
    let buf = fs::read(path)?;
    let (header, payload) = split_header(&buf)?;
    if !header.contains("'<f4'") {
        return Err(invalid(format!("expected '<f4' dtype in header: {header}")));
    }
    if payload.len() % 4 != 0 {
        return Err(invalid("f32 payload not a multiple of 4 bytes".to_string()));
    }
    Ok(payload
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Parse a `.npy` file written by [`write_i64_scalar`]
pub fn read_i64_scalar(path: &Path) -> io::Result<i64> {
    let buf = fs::read(path)?;
    let (header, payload) = split_header(&buf)?;
    if !header.contains("'<i8'") {
        return Err(invalid(format!("expected '<i8' dtype in header: {header}")));
    }
    let payload_len = payload.len();
    let bytes: [u8; 8] = payload
        .try_into()
        .map_err(|_| invalid(format!("scalar payload must be 8 bytes, got {payload_len}")))?;
    Ok(i64::from_le_bytes(bytes))
}

/// Build the magic + version + padded ASCII header block
///
/// The header dict is padded with spaces so the total preamble length is a
/// multiple of 64, with a trailing newline, as the format requires.
fn header_bytes(descr: &str, shape: &str) -> Vec<u8> {
    let dict = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");

    // magic(6) + version(2) + header-len field(2) + dict + padding + '\n'
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(10 + header_len);
    out.extend_from_slice(MAGIC);
    out.push(1);
    out.push(0);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat(b' ').take(padding));
    out.push(b'\n');
    out
}

fn split_header(buf: &[u8]) -> io::Result<(&str, &[u8])> {
    if buf.len() < 10 || &buf[0..6] != MAGIC {
        return Err(invalid("missing .npy magic".to_string()));
    }
    if buf[6] != 1 {
        return Err(invalid(format!("unsupported .npy version {}", buf[6])));
    }
    let header_len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
    let header_end = 10 + header_len;
    if header_end > buf.len() {
        return Err(invalid("header past end of file".to_string()));
    }
    let header = std::str::from_utf8(&buf[10..header_end])
        .map_err(|_| invalid("non-UTF8 header".to_string()))?;
    Ok((header, &buf[header_end..]))
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
