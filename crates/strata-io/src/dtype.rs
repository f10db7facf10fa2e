use byteorder::{ByteOrder, LittleEndian};

/// On-disk element type of a channel. Only unsigned integers carry labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    U8,
    U16,
    U32,
}

impl Dtype {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u8" | "uint8" => Some(Dtype::U8),
            "u16" | "uint16" => Some(Dtype::U16),
            "u32" | "uint32" => Some(Dtype::U32),
            _ => None,
        }
    }

    #[inline]
    pub fn size(self) -> usize {
        match self {
            Dtype::U8 => 1,
            Dtype::U16 => 2,
            Dtype::U32 => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::U8 => "u8",
            Dtype::U16 => "u16",
            Dtype::U32 => "u32",
        }
    }

    /// Widens little-endian elements to `u32`. `bytes.len()` must be a
    /// multiple of [`Self::size`]; a trailing partial element is ignored.
    pub(crate) fn decode(self, bytes: &[u8]) -> Vec<u32> {
        match self {
            Dtype::U8 => bytes.iter().map(|&b| u32::from(b)).collect(),
            Dtype::U16 => bytes
                .chunks_exact(2)
                .map(|c| u32::from(LittleEndian::read_u16(c)))
                .collect(),
            Dtype::U32 => {
                let mut out = vec![0u32; bytes.len() / 4];
                LittleEndian::read_u32_into(&bytes[..out.len() * 4], &mut out);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_integer_names_only() {
        assert_eq!(Dtype::parse("u8"), Some(Dtype::U8));
        assert_eq!(Dtype::parse(" UInt16 "), Some(Dtype::U16));
        assert_eq!(Dtype::parse("u32"), Some(Dtype::U32));
        assert_eq!(Dtype::parse("f32"), None);
        assert_eq!(Dtype::parse("i16"), None);
        assert_eq!(Dtype::parse(""), None);
    }

    #[test]
    fn decode_widens_little_endian() {
        assert_eq!(Dtype::U8.decode(&[0, 7, 255]), vec![0, 7, 255]);
        assert_eq!(Dtype::U16.decode(&[0x34, 0x12, 0xff, 0xff]), vec![0x1234, 0xffff]);
        assert_eq!(
            Dtype::U32.decode(&[1, 0, 0, 0, 0x78, 0x56, 0x34, 0x12]),
            vec![1, 0x1234_5678]
        );
    }
}
