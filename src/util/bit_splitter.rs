/// A structure for easily splitting a 32-bit instruction word
/// into its opcode, register and literal fields.
///
/// Bits are numbered from the most significant end, so `get(0, 6)`
/// is the opcode and `get(16, 32)` is the low half-word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSplitter(u32);

impl BitSplitter {

    pub fn new(word: u32) -> BitSplitter {
        BitSplitter(word)
    }

    /// Bits 31..26
    pub fn opcode(&self) -> u8 {
        self.bits(0, 6) as u8
    }

    /// Bits 25..21
    pub fn rc(&self) -> u8 {
        self.bits(6, 11) as u8
    }

    /// Bits 20..16
    pub fn ra(&self) -> u8 {
        self.bits(11, 16) as u8
    }

    /// Bits 15..11
    pub fn rb(&self) -> u8 {
        self.bits(16, 21) as u8
    }

    pub fn last_16_bits(&self) -> u16 {
        self.bits(16, 32) as u16
    }

    /// Take the bits in `start..end`, counted from the most significant bit,
    /// and shift them down to the lowest position.
    pub fn get(&self, start: usize, end: usize) -> Option<u32> {
        if start >= end || end > 32 {
            return None;
        }
        Some(self.bits(start, end))
    }

    fn bits(&self, start: usize, end: usize) -> u32 {
        let mut value = self.0 as u64;
        value &= 0xFFFF_FFFF >> start; // Remove start we don't want
        value >>= 32 - end; // Remove end we don't want and shift to lowest position
        value as u32
    }
}
