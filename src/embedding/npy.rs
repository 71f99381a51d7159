//! NumPy `.npy` reader for embedding matrices.
//!
//! # File Format
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Magic: "\x93NUMPY" (6 bytes)                         │
//! │ Version: major u8, minor u8                          │
//! │ Header length: u16 LE (v1) or u32 LE (v2, v3)        │
//! │ Header: Python dict literal, space/newline padded    │
//! │   {'descr': '<f4', 'fortran_order': False,           │
//! │    'shape': (rows, dim), }                           │
//! ├──────────────────────────────────────────────────────┤
//! │ Data: rows * dim values, C order                     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Only float arrays are accepted (`f4` and `f8`, any byte order). `f8`
//! values are narrowed to `f32`.

use std::path::Path;

use tracing::debug;

use super::{EmbeddingError, EmbeddingMatrix, EmbeddingResult};

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Element types the reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F32,
    F64,
}

impl Dtype {
    fn size(self) -> usize {
        match self {
            Dtype::F32 => 4,
            Dtype::F64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

/// Parsed header fields.
#[derive(Debug, PartialEq)]
struct Header {
    dtype: Dtype,
    order: ByteOrder,
    rows: usize,
    dimension: usize,
}

/// Read and parse an `.npy` file.
///
/// # Errors
/// Returns `EmbeddingError::Io` if the file cannot be read, or a format
/// error from [`parse`]
pub async fn load(path: impl AsRef<Path>) -> EmbeddingResult<EmbeddingMatrix> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    parse(&bytes)
}

/// Parse the bytes of an `.npy` file into a matrix.
pub fn parse(bytes: &[u8]) -> EmbeddingResult<EmbeddingMatrix> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(EmbeddingError::InvalidFormat("missing NUMPY magic".to_string()));
    }

    let major = bytes[6];
    let (header_len, header_start): (usize, usize) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(EmbeddingError::InvalidFormat("short header".to_string()));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
            (len, 12)
        }
        other => {
            return Err(EmbeddingError::Unsupported(format!("format version {}", other)));
        }
    };

    let data_start = header_start
        .checked_add(header_len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| EmbeddingError::InvalidFormat("header runs past end of file".to_string()))?;

    let header_text = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| EmbeddingError::InvalidFormat("header is not text".to_string()))?;
    let header = parse_header(header_text)?;

    let expected = header
        .rows
        .checked_mul(header.dimension)
        .and_then(|n| n.checked_mul(header.dtype.size()))
        .ok_or_else(|| {
            EmbeddingError::InvalidFormat(format!(
                "shape ({}, {}) is too large",
                header.rows, header.dimension
            ))
        })?;
    let data = &bytes[data_start..];
    if data.len() < expected {
        return Err(EmbeddingError::Truncated {
            expected,
            found: data.len(),
        });
    }

    let values = decode(&data[..expected], header.dtype, header.order);
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(EmbeddingError::InvalidFormat(format!(
            "non-finite value at row {}",
            i / header.dimension.max(1)
        )));
    }
    EmbeddingMatrix::new(header.rows, header.dimension, values)
}

fn decode(data: &[u8], dtype: Dtype, order: ByteOrder) -> Vec<f32> {
    match dtype {
        Dtype::F32 => data
            .chunks_exact(4)
            .map(|c| {
                let raw = [c[0], c[1], c[2], c[3]];
                match order {
                    ByteOrder::Little => f32::from_le_bytes(raw),
                    ByteOrder::Big => f32::from_be_bytes(raw),
                }
            })
            .collect(),
        Dtype::F64 => data
            .chunks_exact(8)
            .map(|c| {
                let raw = [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]];
                let value = match order {
                    ByteOrder::Little => f64::from_le_bytes(raw),
                    ByteOrder::Big => f64::from_be_bytes(raw),
                };
                value as f32
            })
            .collect(),
    }
}

fn parse_header(text: &str) -> EmbeddingResult<Header> {
    let descr = dict_value(text, "descr")
        .ok_or_else(|| EmbeddingError::InvalidFormat("header has no 'descr'".to_string()))?;
    let fortran = dict_value(text, "fortran_order")
        .ok_or_else(|| EmbeddingError::InvalidFormat("header has no 'fortran_order'".to_string()))?;
    let shape = dict_value(text, "shape")
        .ok_or_else(|| EmbeddingError::InvalidFormat("header has no 'shape'".to_string()))?;

    if fortran != "False" {
        return Err(EmbeddingError::Unsupported("Fortran-ordered arrays".to_string()));
    }

    let (dtype, order) = parse_descr(descr.trim_matches(|c| c == '\'' || c == '"'))?;

    let dims = shape
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| EmbeddingError::InvalidFormat(format!("bad shape entry '{}'", s)))
        })
        .collect::<EmbeddingResult<Vec<_>>>()?;

    let (rows, dimension) = match dims.as_slice() {
        [n] => (1, *n),
        [rows, dimension] => (*rows, *dimension),
        _ => {
            return Err(EmbeddingError::Unsupported(format!(
                "{}-dimensional arrays",
                dims.len()
            )));
        }
    };

    Ok(Header {
        dtype,
        order,
        rows,
        dimension,
    })
}

fn parse_descr(descr: &str) -> EmbeddingResult<(Dtype, ByteOrder)> {
    let mut chars = descr.chars();
    let order = match chars.next() {
        Some('<') => ByteOrder::Little,
        Some('>') => ByteOrder::Big,
        Some('=') if cfg!(target_endian = "big") => ByteOrder::Big,
        Some('=') => ByteOrder::Little,
        _ => return Err(EmbeddingError::Unsupported(format!("dtype '{}'", descr))),
    };

    match chars.as_str() {
        "f4" => Ok((Dtype::F32, order)),
        "f8" => Ok((Dtype::F64, order)),
        _ => Err(EmbeddingError::Unsupported(format!("dtype '{}'", descr))),
    }
}

/// Pull the raw value text for `key` out of the header dict literal.
fn dict_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let quoted = [format!("'{}'", key), format!("\"{}\"", key)];
    let after_key = quoted
        .iter()
        .find_map(|q| text.find(q.as_str()).map(|i| &text[i + q.len()..]))?;
    let value = after_key.trim_start().strip_prefix(':')?.trim_start();

    let end = match value.chars().next()? {
        '(' => value.find(')')? + 1,
        q @ ('\'' | '"') => value[1..].find(q)? + 2,
        _ => value.find([',', '}']).unwrap_or(value.len()),
    };

    Some(value[..end].trim())
}
