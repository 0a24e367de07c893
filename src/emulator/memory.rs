//! Flat byte-addressed memory, split into program, video and kernel regions.
//!
//! ```text
//! 0                program_size     + video_size          + kernel_size
//! | program ...... | video ......... | kernel: 400 reserved | handler code |
//! ```

use std::io::Read;

use crate::emulator::error::{ConfigError, LoadError, MemoryError};

/// Bytes at the start of the kernel region kept for interrupt metadata.
pub const KERNEL_RESERVED: u32 = 400;

const WORD_SIZE: u32 = 4;

/// Sizes of the three regions, fixed for the lifetime of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    pub program_size: u32,
    pub video_size: u32,
    pub kernel_size: u32,
}

impl MachineConfig {

    pub fn new(program_size: u32, video_size: u32, kernel_size: u32) -> MachineConfig {
        MachineConfig {
            program_size,
            video_size,
            kernel_size,
        }
    }

    /// Check that the layout can be addressed and has room for the reserved kernel bytes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kernel_size < KERNEL_RESERVED {
            return Err(ConfigError::KernelTooSmall {
                size: self.kernel_size,
                reserved: KERNEL_RESERVED,
            });
        }
        self.program_size
            .checked_add(self.video_size)
            .and_then(|size| size.checked_add(self.kernel_size))
            .map(|_| ())
            .ok_or(ConfigError::TooLarge)
    }

    pub fn memory_size(&self) -> u32 {
        self.program_size + self.video_size + self.kernel_size
    }

    /// First address of the video region.
    pub fn video_base(&self) -> u32 {
        self.program_size
    }

    /// First address of the kernel region.
    pub fn kernel_base(&self) -> u32 {
        self.program_size + self.video_size
    }

    /// Where interrupt handler code starts.
    pub fn handler_entry(&self) -> u32 {
        self.kernel_base() + KERNEL_RESERVED
    }

    pub fn region_of(&self, addr: u32) -> Option<Region> {
        if addr < self.video_base() {
            Some(Region::Program)
        } else if addr < self.kernel_base() {
            Some(Region::Video)
        } else if addr < self.memory_size() {
            Some(Region::Kernel)
        } else {
            None
        }
    }
}

/// 32 MiB of program memory, a 600x400 screen of 4-byte pixels and 800 bytes of kernel.
impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig::new(32 * 1024 * 1024, 600 * 400 * 4, 800)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Program,
    Video,
    Kernel,
}

pub struct Memory {
    bytes: Vec<u8>,
    config: MachineConfig,
    program_length: u32,
    last_accessed: Option<u32>,
}

impl Memory {

    /// Allocate zeroed memory for a validated layout.
    pub fn new(config: MachineConfig) -> Result<Memory, ConfigError> {
        config.validate()?;
        Ok(Memory {
            bytes: vec![0; config.memory_size() as usize],
            config,
            program_length: 0,
            last_accessed: None,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Zero every byte and forget the loaded program, keeping the layout.
    pub fn clear(&mut self) {
        self.bytes.iter_mut().for_each(|byte| *byte = 0);
        self.program_length = 0;
        self.last_accessed = None;
    }

    pub fn size(&self) -> u32 {
        self.config.memory_size()
    }

    /// Number of bytes placed by the last program load.
    pub fn program_length(&self) -> u32 {
        self.program_length
    }

    /// Address of the word most recently loaded, stored or written by interrupt delivery.
    pub fn last_accessed(&self) -> Option<u32> {
        self.last_accessed
    }

    fn out_of_range(&self, addr: u32) -> MemoryError {
        MemoryError::OutOfRange {
            addr,
            size: self.size(),
        }
    }

    /// Read a word without recording the access. Words that run past the end
    /// of memory are zero-padded on the high end.
    pub fn peek_word(&self, addr: u32) -> Result<i32, MemoryError> {
        let start = addr as usize;
        if start >= self.bytes.len() {
            return Err(self.out_of_range(addr));
        }
        let end = std::cmp::min(start + WORD_SIZE as usize, self.bytes.len());
        let mut word = [0; WORD_SIZE as usize];
        word[..end - start].copy_from_slice(&self.bytes[start..end]);
        Ok(i32::from_le_bytes(word))
    }

    /// Read a word and record `addr` as the last accessed address.
    pub fn read_word(&mut self, addr: u32) -> Result<i32, MemoryError> {
        let word = self.peek_word(addr)?;
        self.last_accessed = Some(addr);
        Ok(word)
    }

    /// Whether a full word can be written at `addr`.
    pub fn check_word(&self, addr: u32) -> Result<(), MemoryError> {
        match addr.checked_add(WORD_SIZE) {
            Some(end) if end <= self.size() => Ok(()),
            _ => Err(self.out_of_range(addr)),
        }
    }

    /// Write a word. All four bytes must fit, otherwise nothing is written.
    pub fn write_word(&mut self, addr: u32, value: i32) -> Result<(), MemoryError> {
        self.check_word(addr)?;
        let start = addr as usize;
        self.bytes[start..start + WORD_SIZE as usize].copy_from_slice(&value.to_le_bytes());
        self.last_accessed = Some(addr);
        Ok(())
    }

    pub fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), MemoryError> {
        let byte = self.bytes.get_mut(addr as usize).ok_or(MemoryError::OutOfRange {
            addr,
            size: self.config.memory_size(),
        })?;
        *byte = value;
        self.last_accessed = Some(addr);
        Ok(())
    }

    /// Copy a program image to the start of the program region.
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), LoadError> {
        self.copy_image(0, self.config.program_size, image)?;
        self.program_length = image.len() as u32;
        log::debug!("Loaded {} byte program", image.len());
        Ok(())
    }

    /// Copy an interrupt handler image behind the reserved bytes of the kernel region.
    pub fn load_handler(&mut self, image: &[u8]) -> Result<(), LoadError> {
        let entry = self.config.handler_entry();
        self.copy_image(entry, self.config.kernel_size - KERNEL_RESERVED, image)?;
        log::debug!("Loaded {} byte interrupt handler at {:#010x}", image.len(), entry);
        Ok(())
    }

    fn copy_image(&mut self, base: u32, capacity: u32, image: &[u8]) -> Result<(), LoadError> {
        check_capacity(image.len(), capacity)?;
        let start = base as usize;
        self.bytes[start..start + image.len()].copy_from_slice(image);

        // Point at the last word of the image
        let len = image.len() as u32;
        self.last_accessed = Some(if len >= WORD_SIZE { base + len - WORD_SIZE } else { base });
        Ok(())
    }
}

/// Fail with [`LoadError::TooLarge`] if `len` bytes do not fit in `capacity`.
pub fn check_capacity(len: usize, capacity: u32) -> Result<(), LoadError> {
    if len > capacity as usize {
        return Err(LoadError::TooLarge {
            len,
            capacity: capacity as usize,
        });
    }
    Ok(())
}

/// Read a whole image from `source`, refusing to read more than `capacity + 1`
/// bytes so an oversized source is detected without buffering all of it.
pub fn read_image<R: Read>(source: R, capacity: u32) -> Result<Vec<u8>, LoadError> {
    let mut image = Vec::new();
    source.take(capacity as u64 + 1).read_to_end(&mut image)?;
    check_capacity(image.len(), capacity)?;
    Ok(image)
}

#[cfg(test)]
mod tests {

    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn small() -> MachineConfig {
        MachineConfig::new(64, 16, 416)
    }

    #[test]
    fn regions_partition_memory() {
        let config = small();
        assert_eq!(config.memory_size(), 496);
        assert_eq!(config.region_of(0), Some(Region::Program));
        assert_eq!(config.region_of(63), Some(Region::Program));
        assert_eq!(config.region_of(64), Some(Region::Video));
        assert_eq!(config.region_of(80), Some(Region::Kernel));
        assert_eq!(config.region_of(495), Some(Region::Kernel));
        assert_eq!(config.region_of(496), None);
        assert_eq!(config.handler_entry(), 480);
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        assert_eq!(
            MachineConfig::new(64, 16, 399).validate(),
            Err(ConfigError::KernelTooSmall { size: 399, reserved: 400 })
        );
        assert_eq!(MachineConfig::new(u32::MAX, 0, 400).validate(), Err(ConfigError::TooLarge));
        assert!(MachineConfig::default().validate().is_ok());
    }

    #[test]
    fn words_are_little_endian() {
        let mut memory = Memory::new(small()).unwrap();
        memory.write_word(8, 0x1234_5678).unwrap();
        assert_eq!(&memory.bytes[8..12], &[0x78u8, 0x56, 0x34, 0x12]);
        assert_eq!(memory.read_word(8), Ok(0x1234_5678));
        assert_eq!(memory.last_accessed(), Some(8));
    }

    #[test]
    fn tail_reads_are_zero_padded() {
        let mut memory = Memory::new(small()).unwrap();
        let size = memory.size();
        memory.bytes[size as usize - 3..].copy_from_slice(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(memory.read_word(size - 3), Ok(0x00CC_BBAA));
        assert_eq!(memory.last_accessed(), Some(size - 3));
        assert_eq!(memory.read_word(size - 1), Ok(0xCC));
    }

    #[test]
    fn out_of_range_accesses_are_reported() {
        let mut memory = Memory::new(small()).unwrap();
        let size = memory.size();
        assert_eq!(memory.read_word(size), Err(MemoryError::OutOfRange { addr: size, size }));
        assert_eq!(memory.write_word(size - 2, 1), Err(MemoryError::OutOfRange { addr: size - 2, size }));
        assert_eq!(memory.write_word(u32::MAX, 1), Err(MemoryError::OutOfRange { addr: u32::MAX, size }));
        assert_eq!(memory.last_accessed(), None);
    }

    #[test]
    fn program_of_exact_capacity_loads() {
        let mut memory = Memory::new(small()).unwrap();
        let image = vec![0x11; 64];
        memory.load_program(&image).unwrap();
        assert_eq!(memory.program_length(), 64);
        assert_eq!(memory.last_accessed(), Some(60));
        assert_eq!(memory.peek_word(60), Ok(0x1111_1111));
    }

    #[test]
    fn oversized_program_leaves_memory_untouched() {
        let mut memory = Memory::new(small()).unwrap();
        memory.load_program(&[1, 2, 3]).unwrap();
        let result = memory.load_program(&vec![0xFF; 65]);
        assert!(matches!(result, Err(LoadError::TooLarge { len: 65, capacity: 64 })));
        assert_eq!(memory.program_length(), 3);
        assert_eq!(memory.peek_word(0), Ok(0x0003_0201));
        assert_eq!(memory.peek_word(4), Ok(0));
    }

    #[test]
    fn short_program_points_at_its_start() {
        let mut memory = Memory::new(small()).unwrap();
        memory.load_program(&[1, 2]).unwrap();
        assert_eq!(memory.last_accessed(), Some(0));
    }

    #[test]
    fn clear_zeroes_everything() {
        let mut memory = Memory::new(small()).unwrap();
        memory.load_program(&[1, 2, 3, 4, 5]).unwrap();
        memory.write_word(492, -1).unwrap();
        memory.clear();
        assert_eq!(memory.program_length(), 0);
        assert_eq!(memory.last_accessed(), None);
        assert!(memory.bytes.iter().all(|&byte| byte == 0));
        assert_eq!(memory.size(), 496);
    }

    #[test]
    fn handler_lands_after_reserved_bytes() {
        let mut memory = Memory::new(small()).unwrap();
        memory.load_handler(&[0xEF, 0xBE, 0xAD, 0xDE]).unwrap();
        assert_eq!(memory.peek_word(480), Ok(0xDEAD_BEEFu32 as i32));
        assert_eq!(memory.last_accessed(), Some(480));
        assert_eq!(memory.program_length(), 0);
    }

    #[test]
    fn oversized_handler_is_rejected() {
        let mut memory = Memory::new(small()).unwrap();
        assert!(memory.load_handler(&[0; 16]).is_ok());
        assert!(matches!(
            memory.load_handler(&[0; 17]),
            Err(LoadError::TooLarge { len: 17, capacity: 16 })
        ));
    }

    #[test]
    fn read_image_stops_past_capacity() {
        let source: &[u8] = &[0; 100];
        assert!(matches!(read_image(source, 10), Err(LoadError::TooLarge { len: 11, capacity: 10 })));
        let source: &[u8] = &[7; 10];
        assert_eq!(read_image(source, 10).unwrap(), vec![7; 10]);
    }

    proptest! {
        #[test]
        fn write_then_read_returns_value(addr in 0u32..=492, value in any::<i32>()) {
            let mut memory = Memory::new(small()).unwrap();
            memory.write_word(addr, value).unwrap();
            prop_assert_eq!(memory.read_word(addr), Ok(value));
        }
    }
}
