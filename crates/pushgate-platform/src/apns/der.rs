//! DER ECDSA signature to the raw `r || s` form used by JWS ES256.
//!
//! Input is `SEQUENCE { INTEGER r, INTEGER s }`. Each integer is stripped of
//! its sign-padding zeros and right-aligned into a 32-byte slot.

use thiserror::Error;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;
const COMPONENT_LEN: usize = 32;

/// Signature encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input is not a well-formed `SEQUENCE { INTEGER, INTEGER }`.
    #[error("malformed DER signature: {reason}")]
    Malformed {
        /// Which structural check failed.
        reason: &'static str,
    },
}

fn malformed(reason: &'static str) -> CodecError {
    CodecError::Malformed { reason }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn byte(&mut self, what: &'static str) -> Result<u8, CodecError> {
        let b = *self.bytes.get(self.pos).ok_or_else(|| malformed(what))?;
        self.pos += 1;
        Ok(b)
    }

    /// Short-form or single-byte long-form (`0x81 nn`) length.
    fn length(&mut self) -> Result<usize, CodecError> {
        match self.byte("truncated length")? {
            n if n < 0x80 => Ok(usize::from(n)),
            0x81 => Ok(usize::from(self.byte("truncated length")?)),
            _ => Err(malformed("unsupported length encoding")),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| malformed("declared length exceeds input"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn integer(&mut self) -> Result<&'a [u8], CodecError> {
        if self.byte("missing INTEGER")? != TAG_INTEGER {
            return Err(malformed("expected INTEGER tag"));
        }
        let len = self.length()?;
        self.take(len)
    }
}

/// Right-align `component` into `slot`, dropping leading zeros and keeping
/// only the low 32 bytes if it is still longer.
fn place(component: &[u8], slot: &mut [u8]) {
    let first_nonzero = component.iter().position(|b| *b != 0).unwrap_or(component.len());
    let mut digits = &component[first_nonzero..];
    if digits.len() > COMPONENT_LEN {
        digits = &digits[digits.len() - COMPONENT_LEN..];
    }
    let offset = COMPONENT_LEN - digits.len();
    slot[offset..].copy_from_slice(digits);
}

/// Convert a DER-encoded ECDSA signature into 64 raw bytes.
pub fn decode_der_signature(der: &[u8]) -> Result<[u8; 64], CodecError> {
    let mut reader = Reader { bytes: der, pos: 0 };

    if reader.byte("empty input")? != TAG_SEQUENCE {
        return Err(malformed("expected SEQUENCE tag"));
    }
    let seq_len = reader.length()?;
    let body = reader.take(seq_len)?;

    let mut inner = Reader { bytes: body, pos: 0 };
    let r = inner.integer()?;
    let s = inner.integer()?;

    let mut raw = [0u8; 64];
    let (r_slot, s_slot) = raw.split_at_mut(COMPONENT_LEN);
    place(r, r_slot);
    place(s, s_slot);
    Ok(raw)
}
