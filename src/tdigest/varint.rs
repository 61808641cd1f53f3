// src/tdigest/varint.rs
//
// Unsigned varints for centroid counts: 7-bit groups, least-significant group first,
// continuation bit 0x80 on every byte except the last.

use std::io::{Read, Write};

use byteorder::ReadBytesExt;

use crate::tdigest::wire::{WireError, WireResult};

/// Hard cap on emitted bytes. A `u32` needs at most 5; the cap is the format's limit.
pub const MAX_VARINT_BYTES: usize = 6;

/// Largest shift at which a continuation byte may still be consumed.
const MAX_DECODE_SHIFT: u32 = 28;

/// Encode `n`; bytes are staged first so nothing reaches `w` on overflow.
pub fn encode_uint<W: Write + ?Sized>(w: &mut W, n: u32) -> WireResult<()> {
    let mut staged = [0u8; MAX_VARINT_BYTES];
    let mut len = 0usize;
    let mut rest = n;
    while rest > 0x7f {
        staged[len] = 0x80 | (rest & 0x7f) as u8;
        rest >>= 7;
        len += 1;
        if len >= MAX_VARINT_BYTES {
            return Err(WireError::EncodingOverflow(n));
        }
    }
    staged[len] = rest as u8;
    len += 1;
    w.write_all(&staged[..len])?;
    Ok(())
}

/// Decode one varint. Hitting end of input surfaces as `WireError::Io(UnexpectedEof)`.
pub fn decode_uint<R: Read + ?Sized>(r: &mut R) -> WireResult<u32> {
    let mut v = r.read_u8()?;
    let mut z = u32::from(v & 0x7f);
    let mut shift = 7u32;
    while v & 0x80 != 0 {
        if shift > MAX_DECODE_SHIFT {
            return Err(WireError::DecodingOverflow);
        }
        v = r.read_u8()?;
        // At shift 28 only the low 4 payload bits fit; higher bits are dropped as the
        // reference decoder does.
        z |= u32::from(v & 0x7f).wrapping_shl(shift);
        shift += 7;
    }
    Ok(z)
}

/// Number of bytes `encode_uint` emits for `n` (1..=5).
#[inline]
pub fn uint_len(n: u32) -> usize {
    let bits = (32 - n.leading_zeros()).max(1) as usize;
    bits.div_ceil(7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::{Cursor, ErrorKind};

    fn enc(n: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_uint(&mut buf, n).expect("encode");
        buf
    }

    #[test]
    fn known_encodings() {
        assert_eq!(enc(0), vec![0x00]);
        assert_eq!(enc(1), vec![0x01]);
        assert_eq!(enc(0x7f), vec![0x7f]);
        assert_eq!(enc(0x80), vec![0x80, 0x01]);
        assert_eq!(enc(300), vec![0xac, 0x02]);
        assert_eq!(enc(u32::MAX), vec![0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn decode_stops_at_first_byte_without_continuation() {
        let mut r = Cursor::new(vec![0xac, 0x02, 0x07]);
        assert_eq!(decode_uint(&mut r).expect("first"), 300);
        assert_eq!(r.position(), 2);
        assert_eq!(decode_uint(&mut r).expect("second"), 7);
    }

    #[test]
    fn decode_rejects_sixth_byte() {
        let mut r = Cursor::new(vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(
            decode_uint(&mut r),
            Err(WireError::DecodingOverflow)
        ));
        // The overflow is detected before the sixth byte is consumed.
        assert_eq!(r.position(), 5);
    }

    #[test]
    fn decode_accepts_five_byte_max() {
        let mut r = Cursor::new(vec![0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(decode_uint(&mut r).expect("max"), u32::MAX);
    }

    #[test]
    fn decode_underflow_is_unexpected_eof() {
        for bytes in [vec![], vec![0x80], vec![0xff, 0xff, 0xff]] {
            match decode_uint(&mut Cursor::new(bytes)) {
                Err(WireError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
                other => panic!("expected unexpected-eof, got {other:?}"),
            }
        }
    }

    #[test]
    fn uint_len_matches_boundaries() {
        assert_eq!(uint_len(0), 1);
        assert_eq!(uint_len(0x7f), 1);
        assert_eq!(uint_len(0x80), 2);
        assert_eq!(uint_len(0x3fff), 2);
        assert_eq!(uint_len(0x4000), 3);
        assert_eq!(uint_len(0x0fff_ffff), 4);
        assert_eq!(uint_len(0x1000_0000), 5);
        assert_eq!(uint_len(u32::MAX), 5);
    }

    proptest! {
        #[test]
        fn prop_varint_roundtrip(n in any::<u32>()) {
            let buf = enc(n);
            let got = decode_uint(&mut Cursor::new(&buf)).expect("decode");
            prop_assert_eq!(got, n);
        }

        #[test]
        fn prop_varint_len_within_five_bytes(n in any::<u32>()) {
            let buf = enc(n);
            prop_assert!(buf.len() <= 5);
            prop_assert_eq!(buf.len(), uint_len(n));
            let last = *buf.last().expect("non-empty");
            prop_assert_eq!(last & 0x80, 0);
            prop_assert!(buf[..buf.len() - 1].iter().all(|b| b & 0x80 != 0));
        }
    }
}
