use crate::emulator::error::DisassembleError;
use crate::emulator::instruction::Instruction;
use crate::emulator::machine::Machine;

const INVALID: &str = "INVALID";

/// Render a word as its mnemonic, e.g. `LD(R1,8,R2)`.
///
/// Words with an unknown opcode yield [`DisassembleError::Invalid`],
/// which displays as `INVALID`.
pub fn disassemble(word: u32) -> Result<String, DisassembleError> {
    Instruction::from_u32(word)
        .map(|instruction| instruction.to_string())
        .ok_or(DisassembleError::Invalid { opcode: (word >> 26) as u8 })
}

/// Disassemble `words` consecutive words starting at `addr`, for listing code next to
/// the program counter. Unreadable or invalid words are rendered as `INVALID`.
pub fn listing(machine: &Machine, addr: u32, words: u32) -> Vec<(u32, String)> {
    (0..words)
        .map(|i| addr.wrapping_add(4 * i))
        .map(|at| {
            let text = machine
                .memory_word(at)
                .ok()
                .and_then(|word| disassemble(word as u32).ok())
                .unwrap_or_else(|| INVALID.to_string());
            (at, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::emulator::memory::MachineConfig;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(0x0000_0000, "HALT" ; "halt")]
    #[test_case(0x6041_0008, "LD(R1,8,R2)" ; "ld")]
    #[test_case(0x6441_FFFC, "ST(R2,-4,R1)" ; "st")]
    #[test_case(0x6F83_0000, "JMP(R3,R28)" ; "jmp")]
    #[test_case(0x77E1_FFFF, "BEQ(R1,-1,R31)" ; "beq")]
    #[test_case(0x7BE1_0002, "BNE(R1,2,R31)" ; "bne")]
    #[test_case(0x7C9F_0003, "LDR(3,R4)" ; "ldr")]
    #[test_case(0x8061_1000, "ADD(R1,R2,R3)" ; "add")]
    #[test_case(0x8461_1000, "SUB(R1,R2,R3)" ; "sub")]
    #[test_case(0x8861_1000, "MUL(R1,R2,R3)" ; "mul")]
    #[test_case(0x8C61_1000, "DIV(R1,R2,R3)" ; "div")]
    #[test_case(0x9061_1000, "CMPEQ(R1,R2,R3)" ; "cmpeq")]
    #[test_case(0x9461_1000, "CMPLT(R1,R2,R3)" ; "cmplt")]
    #[test_case(0x9861_1000, "CMPLE(R1,R2,R3)" ; "cmple")]
    #[test_case(0xA061_1000, "AND(R1,R2,R3)" ; "and")]
    #[test_case(0xA461_1000, "OR(R1,R2,R3)" ; "or")]
    #[test_case(0xA861_1000, "XOR(R1,R2,R3)" ; "xor")]
    #[test_case(0xB061_1000, "SHL(R1,R2,R3)" ; "shl")]
    #[test_case(0xB461_1000, "SHR(R1,R2,R3)" ; "shr")]
    #[test_case(0xB861_1000, "SRA(R1,R2,R3)" ; "sra")]
    #[test_case(0xC041_0005, "ADDC(R1,5,R2)" ; "addc")]
    #[test_case(0xC441_FFFB, "SUBC(R1,-5,R2)" ; "subc")]
    #[test_case(0xC841_0005, "MULC(R1,5,R2)" ; "mulc")]
    #[test_case(0xCC41_0005, "DIVC(R1,5,R2)" ; "divc")]
    #[test_case(0xD041_0005, "CMPEQC(R1,5,R2)" ; "cmpeqc")]
    #[test_case(0xD441_0005, "CMPLTC(R1,5,R2)" ; "cmpltc")]
    #[test_case(0xD841_0005, "CMPLEC(R1,5,R2)" ; "cmplec")]
    #[test_case(0xE041_0005, "ANDC(R1,5,R2)" ; "andc")]
    #[test_case(0xE441_0005, "ORC(R1,5,R2)" ; "orc")]
    #[test_case(0xE841_0005, "XORC(R1,5,R2)" ; "xorc")]
    #[test_case(0xF041_0005, "SHLC(R1,5,R2)" ; "shlc")]
    #[test_case(0xF441_0005, "SHRC(R1,5,R2)" ; "shrc")]
    #[test_case(0xF841_0005, "SRAC(R1,5,R2)" ; "srac")]
    fn known_words_disassemble(word: u32, expected: &str) {
        assert_eq!(Ok(expected.to_string()), disassemble(word));
    }

    #[test]
    fn invalid_word_renders_invalid() {
        let error = disassemble(0x0400_0000).unwrap_err();
        assert_eq!(DisassembleError::Invalid { opcode: 0x01 }, error);
        assert_eq!("INVALID", error.to_string());
    }

    #[test]
    fn listing_covers_consecutive_words() {
        let mut machine = Machine::new(MachineConfig::new(64, 16, 416)).unwrap();
        let mut image = 0xC041_0005u32.to_le_bytes().to_vec();
        image.extend_from_slice(&0x0400_0000u32.to_le_bytes());
        machine.load_program(&image).unwrap();
        assert_eq!(
            listing(&machine, 0, 3),
            vec![
                (0, "ADDC(R1,5,R2)".to_string()),
                (4, "INVALID".to_string()),
                (8, "HALT".to_string()),
            ]
        );
        assert_eq!(listing(&machine, 492, 2)[1], (496, "INVALID".to_string()));
    }

    proptest! {
        #[test]
        fn only_known_opcodes_disassemble(word in any::<u32>()) {
            let known = [
                0x00, 0x18, 0x19, 0x1B, 0x1D, 0x1E, 0x1F,
                0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x28, 0x29, 0x2A, 0x2C, 0x2D, 0x2E,
                0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x38, 0x39, 0x3A, 0x3C, 0x3D, 0x3E,
            ];
            let opcode = word >> 26;
            match disassemble(word) {
                Ok(text) => prop_assert!(known.contains(&opcode) && text != "INVALID"),
                Err(error) => {
                    prop_assert!(!known.contains(&opcode));
                    prop_assert_eq!("INVALID", error.to_string());
                }
            }
        }
    }
}
