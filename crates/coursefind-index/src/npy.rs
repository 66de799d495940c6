//! Minimal `.npy` codec for a 2-D little-endian f32 matrix.
//!
//! Files are written as format version 1.0 with dtype `<f4`, C order and
//! the header padded so the data starts on a 64-byte boundary. Any
//! numpy-compatible reader can load them.

use std::io::{Read, Write};

use coursefind_core::error::{Error, Result};

use crate::matrix::EmbeddingMatrix;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;

pub fn write_npy<W: Write>(mut w: W, matrix: &EmbeddingMatrix) -> Result<()> {
    let (rows, dim) = matrix.shape();
    let mut header =
        format!("{{'descr': '<f4', 'fortran_order': False, 'shape': ({rows}, {dim}), }}");
    // magic(6) + version(2) + header_len(2) + header + '\n'
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    let pad = (ALIGN - unpadded % ALIGN) % ALIGN;
    header.extend(std::iter::repeat(' ').take(pad));
    header.push('\n');
    let header_len = u16::try_from(header.len())
        .map_err(|_| Error::persistence("npy header too long for format 1.0"))?;

    let io = |e: std::io::Error| Error::persistence(format!("failed to write npy data: {e}"));
    w.write_all(MAGIC).map_err(io)?;
    w.write_all(&[1, 0]).map_err(io)?;
    w.write_all(&header_len.to_le_bytes()).map_err(io)?;
    w.write_all(header.as_bytes()).map_err(io)?;

    let mut buf = Vec::with_capacity(matrix.as_slice().len() * 4);
    for v in matrix.as_slice() {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    w.write_all(&buf).map_err(io)?;
    Ok(())
}

pub fn read_npy<R: Read>(mut r: R) -> Result<EmbeddingMatrix> {
    let io = |e: std::io::Error| Error::persistence(format!("failed to read npy data: {e}"));

    let mut preamble = [0u8; 8];
    r.read_exact(&mut preamble).map_err(io)?;
    if &preamble[..6] != MAGIC {
        return Err(Error::persistence("not an npy file (bad magic)"));
    }
    let header_len = match preamble[6] {
        1 => {
            let mut b = [0u8; 2];
            r.read_exact(&mut b).map_err(io)?;
            u16::from_le_bytes(b) as usize
        }
        2 | 3 => {
            let mut b = [0u8; 4];
            r.read_exact(&mut b).map_err(io)?;
            u32::from_le_bytes(b) as usize
        }
        v => return Err(Error::persistence(format!("unsupported npy version {v}"))),
    };
    let mut header = vec![0u8; header_len];
    r.read_exact(&mut header).map_err(io)?;
    let header = String::from_utf8(header)
        .map_err(|_| Error::persistence("npy header is not valid text"))?;
    let (rows, dim) = parse_header(&header)?;

    let needed = rows
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::persistence(format!("npy shape ({rows}, {dim}) overflows")))?;
    // Read at most one byte past the declared size; the header alone never
    // sizes the buffer.
    let mut bytes = Vec::new();
    r.take(u64::try_from(needed).unwrap_or(u64::MAX).saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(io)?;
    if bytes.len() != needed {
        return Err(Error::persistence(format!(
            "npy payload has {} bytes, shape ({rows}, {dim}) needs {needed}",
            bytes.len()
        )));
    }
    let data = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    EmbeddingMatrix::from_flat(rows, dim, data)
}

fn parse_header(header: &str) -> Result<(usize, usize)> {
    let value_of = |key: &str| -> Option<&str> {
        let start = header.find(&format!("'{key}':"))? + key.len() + 3;
        Some(header[start..].trim_start())
    };

    let descr = value_of("descr").ok_or_else(|| Error::persistence("npy header has no descr"))?;
    if !descr.starts_with("'<f4'") {
        return Err(Error::persistence("npy dtype must be little-endian float32 ('<f4')"));
    }
    let order = value_of("fortran_order")
        .ok_or_else(|| Error::persistence("npy header has no fortran_order"))?;
    if !order.starts_with("False") {
        return Err(Error::persistence("npy data must be in C order"));
    }
    let shape = value_of("shape").ok_or_else(|| Error::persistence("npy header has no shape"))?;
    let inner = shape
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or_else(|| Error::persistence("malformed npy shape"))?;
    let dims = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| Error::persistence(format!("malformed npy shape ({inner})")))?;
    match dims.as_slice() {
        [rows, dim] => Ok((*rows, *dim)),
        _ => Err(Error::persistence(format!("expected a 2-D array, got shape ({inner})"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_aligned_and_numpy_shaped() {
        let m = EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
            .expect("matrix");
        let mut buf = Vec::new();
        write_npy(&mut buf, &m).expect("write");

        let header_len = u16::from_le_bytes([buf[8], buf[9]]) as usize;
        assert_eq!((10 + header_len) % 64, 0);
        let header = std::str::from_utf8(&buf[10..10 + header_len]).expect("ascii");
        assert!(header.contains("'shape': (2, 3)"));
        assert!(header.ends_with('\n'));
        assert_eq!(buf.len(), 10 + header_len + 6 * 4);

        let back = read_npy(buf.as_slice()).expect("read");
        assert_eq!(back, m);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let m = EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0]]).expect("matrix");
        let mut buf = Vec::new();
        write_npy(&mut buf, &m).expect("write");
        buf.pop();
        assert!(matches!(read_npy(buf.as_slice()), Err(Error::Persistence(_))));
    }

    fn header_only(shape: &str) -> Vec<u8> {
        let dict = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': {shape}, }}\n");
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&[1, 0]);
        buf.extend_from_slice(&u16::try_from(dict.len()).expect("short header").to_le_bytes());
        buf.extend_from_slice(dict.as_bytes());
        buf
    }

    #[test]
    fn oversized_shape_is_an_error_not_a_panic() {
        let mut buf = header_only("(4611686018427387904, 1)");
        buf.extend_from_slice(&[0u8; 8]);
        assert!(matches!(read_npy(buf.as_slice()), Err(Error::Persistence(_))));

        let mut buf = header_only("(1000000000, 1000)");
        buf.extend_from_slice(&[0u8; 8]);
        assert!(matches!(read_npy(buf.as_slice()), Err(Error::Persistence(_))));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut buf = header_only("(1, 2)");
        buf.extend_from_slice(&[0u8; 12]);
        assert!(matches!(read_npy(buf.as_slice()), Err(Error::Persistence(_))));
    }

    #[test]
    fn other_dtypes_are_rejected() {
        let header = "{'descr': '<f8', 'fortran_order': False, 'shape': (1, 1), }";
        assert!(parse_header(header).is_err());
        let header = "{'descr': '<f4', 'fortran_order': True, 'shape': (1, 1), }";
        assert!(parse_header(header).is_err());
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (4,), }";
        assert!(parse_header(header).is_err());
    }
}
