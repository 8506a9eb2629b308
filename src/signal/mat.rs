//! Minimal MATLAB v5 container reader
//!
//! Parses numeric matrices out of a `.mat` file: 128-byte header with
//! endian indicator, data elements with the small-element tag optimization,
//! and `miMATRIX` elements whose subelements are read positionally
//! (array flags, dimensions, name, real part). Compressed elements are not
//! decoded and yield a format error. Complex parts are ignored.

use std::path::Path;

use crate::error::SignalError;

const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

/// Numeric matrix extracted from a container, flattened to f32
#[derive(Debug, Clone, PartialEq)]
pub struct MatMatrix {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl MatMatrix {
    /// Squeeze to a 1-D waveform
    ///
    /// At most one dimension may exceed 1; `(1, n)` and `(n, 1)` vectors
    /// flatten without reordering.
    pub fn squeeze_1d(self, path: &Path) -> Result<Vec<f32>, SignalError> {
        let wide_dims = self.shape.iter().filter(|&&dim| dim > 1).count();
        if wide_dims > 1 {
            return Err(SignalError::MatFormat {
                path: path.display().to_string(),
                details: format!("expected a 1-D signal, got shape {:?}", self.shape),
            });
        }
        Ok(self.data)
    }
}

/// Extract the ECG waveform from a MAT container
///
/// Looks up variable `val`, falling back to `ecg`; fails with
/// `MissingVariable` if neither exists.
pub fn read_ecg(path: &Path) -> Result<Vec<f32>, SignalError> {
    let mut matrices = read_matrices(path)?;
    for name in ["val", "ecg"] {
        if let Some(pos) = matrices.iter().position(|(n, _)| n == name) {
            let (_, matrix) = matrices.swap_remove(pos);
            return matrix.squeeze_1d(path);
        }
    }
    Err(SignalError::MissingVariable {
        path: path.display().to_string(),
    })
}

/// Read every numeric matrix in the container, in file order
pub fn read_matrices(path: &Path) -> Result<Vec<(String, MatMatrix)>, SignalError> {
    let buf = std::fs::read(path)?;
    parse(&buf, path)
}

fn parse(buf: &[u8], path: &Path) -> Result<Vec<(String, MatMatrix)>, SignalError> {
    let format_err = |details: String| SignalError::MatFormat {
        path: path.display().to_string(),
        details,
    };

    if buf.len() < 128 {
        return Err(format_err("file too small for a v5 header".to_string()));
    }
    let big_endian = match &buf[126..128] {
        b"IM" => false,
        b"MI" => true,
        other => {
            return Err(format_err(format!(
                "unrecognized endian indicator {:?}",
                String::from_utf8_lossy(other)
            )))
        }
    };

    let mut matrices = Vec::new();
    let mut offset = 128usize;
    while offset + 8 <= buf.len() {
        let (dtype, size, tag_len) = read_tag(buf, offset, big_endian)
            .map_err(|details| format_err(details))?;
        let start = offset + tag_len;
        let end = start + size;
        if end > buf.len() {
            return Err(format_err("element payload past end of file".to_string()));
        }
        match dtype {
            MI_COMPRESSED => {
                return Err(format_err(
                    "compressed (miCOMPRESSED) elements are not supported".to_string(),
                ));
            }
            MI_MATRIX => {
                let (name, matrix) = parse_matrix(&buf[start..end], big_endian)
                    .map_err(|details| format_err(details))?;
                matrices.push((name, matrix));
            }
            // Other top-level element types carry no signal data.
            _ => {}
        }
        // Elements are padded to 8-byte boundaries; small elements are
        // self-contained in their 8 tag bytes.
        offset = if tag_len == 4 { offset + 8 } else { (end + 7) & !7 };
    }

    Ok(matrices)
}

/// Read an element tag, honoring the small-element optimization
///
/// Returns (type, payload size, tag length). A small element packs the
/// payload size in the upper half of the first word and the payload in the
/// second word, so its tag length is 4.
fn read_tag(buf: &[u8], offset: usize, big: bool) -> Result<(u32, usize, usize), String> {
    if offset + 8 > buf.len() {
        return Err("truncated element tag".to_string());
    }
    let word = read_u32(buf, offset, big);
    let small_size = (word >> 16) & 0xFFFF;
    if small_size != 0 && small_size <= 4 {
        return Ok((word & 0xFFFF, small_size as usize, 4));
    }
    Ok((word, read_u32(buf, offset + 4, big) as usize, 8))
}

/// Parse an `miMATRIX` element body into (name, matrix)
///
/// Subelements are positional: array flags, dimensions, name, real part.
fn parse_matrix(buf: &[u8], big: bool) -> Result<(String, MatMatrix), String> {
    let mut shape: Vec<usize> = Vec::new();
    let mut name = String::new();
    let mut data: Option<Vec<f32>> = None;

    let mut offset = 0usize;
    let mut position = 0usize;
    while offset + 8 <= buf.len() {
        let (dtype, size, tag_len) = read_tag(buf, offset, big)?;
        let start = offset + tag_len;
        let end = start + size;
        if end > buf.len() {
            return Err("matrix subelement past end of element".to_string());
        }
        match position {
            // Array flags: class/complexity, nothing the loader needs.
            0 => {}
            1 => {
                if dtype != MI_INT32 {
                    return Err(format!("dimensions subelement has type {dtype}, want miINT32"));
                }
                for chunk_start in (start..end).step_by(4) {
                    if chunk_start + 4 > end {
                        return Err("dimensions subelement not a multiple of 4 bytes".to_string());
                    }
                    let dim = read_u32(buf, chunk_start, big) as i32;
                    if dim < 0 {
                        return Err(format!("negative dimension {dim}"));
                    }
                    shape.push(dim as usize);
                }
            }
            2 => {
                name = String::from_utf8_lossy(&buf[start..end])
                    .trim_end_matches('\0')
                    .to_string();
            }
            3 => {
                data = Some(decode_numeric(dtype, &buf[start..end], big)?);
            }
            // Imaginary part (if any) is ignored.
            _ => {}
        }
        position += 1;
        offset = if tag_len == 4 { offset + 8 } else { (end + 7) & !7 };
    }

    let data = data.ok_or_else(|| "matrix element has no real part".to_string())?;
    if shape.is_empty() {
        shape = vec![data.len()];
    }
    Ok((name, MatMatrix { shape, data }))
}

/// Decode a numeric subelement payload to f32
fn decode_numeric(dtype: u32, buf: &[u8], big: bool) -> Result<Vec<f32>, String> {
    let out = match dtype {
        MI_INT8 => buf.iter().map(|&b| b as i8 as f32).collect(),
        MI_UINT8 => buf.iter().map(|&b| b as f32).collect(),
        MI_INT16 => buf
            .chunks_exact(2)
            .map(|c| {
                let v = [c[0], c[1]];
                (if big {
                    i16::from_be_bytes(v)
                } else {
                    i16::from_le_bytes(v)
                }) as f32
            })
            .collect(),
        MI_UINT16 => buf
            .chunks_exact(2)
            .map(|c| {
                let v = [c[0], c[1]];
                (if big {
                    u16::from_be_bytes(v)
                } else {
                    u16::from_le_bytes(v)
                }) as f32
            })
            .collect(),
        MI_INT32 => (0..buf.len() / 4)
            .map(|i| read_u32(buf, i * 4, big) as i32 as f32)
            .collect(),
        MI_UINT32 => (0..buf.len() / 4)
            .map(|i| read_u32(buf, i * 4, big) as f32)
            .collect(),
        MI_SINGLE => buf
            .chunks_exact(4)
            .map(|c| {
                let v = [c[0], c[1], c[2], c[3]];
                if big {
                    f32::from_be_bytes(v)
                } else {
                    f32::from_le_bytes(v)
                }
            })
            .collect(),
        MI_DOUBLE => buf
            .chunks_exact(8)
            .map(|c| {
                let v = [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]];
                (if big {
                    f64::from_be_bytes(v)
                } else {
                    f64::from_le_bytes(v)
                }) as f32
            })
            .collect(),
        other => return Err(format!("unsupported numeric element type {other}")),
    };
    Ok(out)
}

fn read_u32(buf: &[u8], offset: usize, big: bool) -> u32 {
    let v = [buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]];
    if big {
        u32::from_be_bytes(v)
    } else {
        u32::from_le_bytes(v)
    }
}
