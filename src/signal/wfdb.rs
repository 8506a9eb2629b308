//! WFDB header/data pair reader
//!
//! Parses the `.hea` record line and per-signal specification lines, then
//! decodes the `.dat` payload for signal formats 16 (interleaved
//! little-endian 16-bit) and 212 (paired 12-bit samples). Samples are
//! converted from ADC units to physical units via
//! `(adc - baseline) / gain`, and only channel 0 is returned. Invalid-sample
//! sentinels decode to NaN, matching the reference WFDB readers.

use std::path::Path;

use crate::error::SignalError;

/// Default ADC gain when the header specifies none (WFDB convention)
const DEFAULT_GAIN: f32 = 200.0;

/// Parsed `.hea` contents, limited to the fields the loader consumes
#[derive(Debug, Clone, PartialEq)]
pub struct WfdbHeader {
    pub record: String,
    pub n_signals: usize,
    pub sampling_frequency: f32,
    pub n_samples: usize,
    pub signals: Vec<SignalSpec>,
}

/// Per-signal specification line
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    pub file: String,
    pub format: u32,
    pub byte_offset: usize,
    pub gain: f32,
    pub baseline: i32,
}

/// Parse a `.hea` header file
pub fn read_header(path: &Path) -> Result<WfdbHeader, SignalError> {
    let text = std::fs::read_to_string(path)?;
    parse_header(&text, path)
}

/// Load channel 0 of a WFDB pair as physical units
pub fn read_first_channel(hea_path: &Path, dat_path: &Path) -> Result<Vec<f32>, SignalError> {
    let header = read_header(hea_path)?;
    let spec = header
        .signals
        .first()
        .ok_or_else(|| SignalError::WfdbFormat {
            path: hea_path.display().to_string(),
            details: "header declares no signals".to_string(),
        })?;

    let bytes = std::fs::read(dat_path)?;
    if spec.byte_offset > bytes.len() {
        return Err(SignalError::WfdbFormat {
            path: dat_path.display().to_string(),
            details: format!(
                "byte offset {} past end of {}-byte file",
                spec.byte_offset,
                bytes.len()
            ),
        });
    }
    let payload = &bytes[spec.byte_offset..];

    let adc = match spec.format {
        16 => decode_format16(payload),
        212 => decode_format212(payload),
        other => {
            return Err(SignalError::UnsupportedWfdbFormat {
                path: dat_path.display().to_string(),
                format: other,
            })
        }
    };

    let invalid = match spec.format {
        212 => -2048,
        _ => i32::from(i16::MIN),
    };

    // Frames interleave one sample per signal; channel 0 is every
    // n_signals-th sample.
    let mut out = Vec::with_capacity(adc.len() / header.n_signals.max(1) + 1);
    for frame in adc.chunks_exact(header.n_signals.max(1)) {
        let sample = frame[0];
        if sample == invalid {
            out.push(f32::NAN);
        } else {
            out.push((sample - spec.baseline) as f32 / spec.gain);
        }
    }

    if header.n_samples > 0 {
        out.truncate(header.n_samples);
        if out.len() < header.n_samples {
            return Err(SignalError::WfdbFormat {
                path: dat_path.display().to_string(),
                details: format!(
                    "header declares {} samples but data holds {}",
                    header.n_samples,
                    out.len()
                ),
            });
        }
    }

    Ok(out)
}

fn parse_header(text: &str, path: &Path) -> Result<WfdbHeader, SignalError> {
    let format_err = |details: String| SignalError::WfdbFormat {
        path: path.display().to_string(),
        details,
    };

    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let record_line = lines
        .next()
        .ok_or_else(|| format_err("empty header".to_string()))?;
    let mut tokens = record_line.split_whitespace();

    let record = tokens
        .next()
        .ok_or_else(|| format_err("missing record name".to_string()))?
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let n_signals: usize = tokens
        .next()
        .ok_or_else(|| format_err("missing signal count".to_string()))?
        .parse()
        .map_err(|_| format_err("signal count is not an integer".to_string()))?;
    // Sampling frequency may carry a counter frequency after '/'.
    let sampling_frequency = tokens
        .next()
        .and_then(|tok| tok.split('/').next())
        .and_then(|tok| tok.parse::<f32>().ok())
        .unwrap_or(250.0);
    let n_samples = tokens
        .next()
        .and_then(|tok| tok.parse::<usize>().ok())
        .unwrap_or(0);

    let mut signals = Vec::with_capacity(n_signals);
    for _ in 0..n_signals {
        let line = lines
            .next()
            .ok_or_else(|| format_err("fewer signal lines than declared".to_string()))?;
        signals.push(parse_signal_line(line).map_err(format_err)?);
    }

    Ok(WfdbHeader {
        record,
        n_signals,
        sampling_frequency,
        n_samples,
        signals,
    })
}

fn parse_signal_line(line: &str) -> Result<SignalSpec, String> {
    let mut tokens = line.split_whitespace();
    let file = tokens
        .next()
        .ok_or_else(|| "missing data file name".to_string())?
        .to_string();

    // Format token: digits, then optional xN (samples/frame), :N (skew),
    // +N (byte offset).
    let format_token = tokens
        .next()
        .ok_or_else(|| "missing format specification".to_string())?;
    let digits: String = format_token.chars().take_while(|c| c.is_ascii_digit()).collect();
    let format: u32 = digits
        .parse()
        .map_err(|_| format!("unparsable format '{format_token}'"))?;
    let byte_offset = format_token
        .split('+')
        .nth(1)
        .and_then(|tok| {
            let digits: String = tok.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<usize>().ok()
        })
        .unwrap_or(0);

    // Gain token: gain(baseline)/units, every part optional.
    let mut gain = DEFAULT_GAIN;
    let mut baseline: Option<i32> = None;
    if let Some(token) = tokens.next() {
        let without_units = token.split('/').next().unwrap_or_default();
        let (gain_part, baseline_part) = match without_units.split_once('(') {
            Some((g, rest)) => (g, rest.strip_suffix(')')),
            None => (without_units, None),
        };
        if let Ok(parsed) = gain_part.parse::<f32>() {
            if parsed != 0.0 {
                gain = parsed;
            }
        }
        if let Some(b) = baseline_part {
            baseline = b.parse::<i32>().ok();
        }
    }

    // ADC resolution (unused), then ADC zero: the baseline default.
    let _adc_res = tokens.next();
    let adc_zero = tokens
        .next()
        .and_then(|tok| tok.parse::<i32>().ok())
        .unwrap_or(0);

    Ok(SignalSpec {
        file,
        format,
        byte_offset,
        gain,
        baseline: baseline.unwrap_or(adc_zero),
    })
}

/// Format 16: interleaved little-endian two's-complement 16-bit
fn decode_format16(buf: &[u8]) -> Vec<i32> {
    buf.chunks_exact(2)
        .map(|c| i32::from(i16::from_le_bytes([c[0], c[1]])))
        .collect()
}

/// Format 212: two 12-bit samples packed into three bytes
fn decode_format212(buf: &[u8]) -> Vec<i32> {
    let mut out = Vec::with_capacity(buf.len() / 3 * 2);
    for group in buf.chunks_exact(3) {
        let mut first = i32::from(group[0]) | (i32::from(group[1] & 0x0F) << 8);
        if first > 2047 {
            first -= 4096;
        }
        let mut second = i32::from(group[2]) | (i32::from(group[1] & 0xF0) << 4);
        if second > 2047 {
            second -= 4096;
        }
        out.push(first);
        out.push(second);
    }
    out
}
