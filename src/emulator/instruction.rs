use std::fmt;

use crate::util::bit_splitter::BitSplitter;

/// A wrapper for register indices. Always in `0..32` when produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u8);

/// A wrapper for sign-extended 16-bit literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lit(pub i32);

/// The arithmetic and logic operations. The register form of an operation has
/// opcode `0x20 | op` and the literal form `0x30 | op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add = 0x0,
    Sub = 0x1,
    Mul = 0x2,
    Div = 0x3,
    CmpEq = 0x4,
    CmpLt = 0x5,
    CmpLe = 0x6,
    And = 0x8,
    Or = 0x9,
    Xor = 0xA,
    Shl = 0xC,
    Shr = 0xD,
    Sra = 0xE,
}

impl AluOp {

    fn from_low_bits(bits: u8) -> Option<AluOp> {
        let op = match bits & 0xF {
            0x0 => AluOp::Add,
            0x1 => AluOp::Sub,
            0x2 => AluOp::Mul,
            0x3 => AluOp::Div,
            0x4 => AluOp::CmpEq,
            0x5 => AluOp::CmpLt,
            0x6 => AluOp::CmpLe,
            0x8 => AluOp::And,
            0x9 => AluOp::Or,
            0xA => AluOp::Xor,
            0xC => AluOp::Shl,
            0xD => AluOp::Shr,
            0xE => AluOp::Sra,
            _ => return None,
        };
        Some(op)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::Mul => "MUL",
            AluOp::Div => "DIV",
            AluOp::CmpEq => "CMPEQ",
            AluOp::CmpLt => "CMPLT",
            AluOp::CmpLe => "CMPLE",
            AluOp::And => "AND",
            AluOp::Or => "OR",
            AluOp::Xor => "XOR",
            AluOp::Shl => "SHL",
            AluOp::Shr => "SHR",
            AluOp::Sra => "SRA",
        }
    }

    /// Apply the operation with two's-complement wraparound.
    /// Shift counts only use their low 5 bits.
    /// Returns `None` when dividing by zero.
    pub fn apply(self, a: i32, b: i32) -> Option<i32> {
        let shift = (b & 0x1F) as u32;
        let value = match self {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::Mul => a.wrapping_mul(b),
            AluOp::Div => {
                if b == 0 {
                    return None;
                }
                a.wrapping_div(b)
            }
            AluOp::CmpEq => (a == b) as i32,
            AluOp::CmpLt => (a < b) as i32,
            AluOp::CmpLe => (a <= b) as i32,
            AluOp::And => a & b,
            AluOp::Or => a | b,
            AluOp::Xor => a ^ b,
            AluOp::Shl => ((a as u32) << shift) as i32,
            AluOp::Shr => ((a as u32) >> shift) as i32,
            AluOp::Sra => arithmetic_right_shift(a, shift),
        };
        Some(value)
    }
}

/// A single instruction of the 32-bit load/store instruction set.
///
/// Every instruction word is laid out as
/// `OOOOOO CCCCC AAAAA BBBBB ...........` (register form) or
/// `OOOOOO CCCCC AAAAA LLLLLLLLLLLLLLLL` (literal form), where
/// - O: 6-bit opcode
/// - C: destination register Rc
/// - A: first source register Ra
/// - B: second source register Rb
/// - L: 16-bit literal, sign-extended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Halt, // 0x00
    Ld(Reg, Lit, Reg), // 0x18, LD(Ra, literal, Rc)
    St(Reg, Lit, Reg), // 0x19, ST(Rc, literal, Ra)
    Jmp(Reg, Reg), // 0x1B, JMP(Ra, Rc)
    Beq(Reg, Lit, Reg), // 0x1D, BEQ(Ra, literal, Rc)
    Bne(Reg, Lit, Reg), // 0x1E, BNE(Ra, literal, Rc)
    Ldr(Lit, Reg), // 0x1F, LDR(literal, Rc)
    Op(AluOp, Reg, Reg, Reg), // 0x20-0x2E, OP(Ra, Rb, Rc)
    OpC(AluOp, Reg, Lit, Reg), // 0x30-0x3E, OPC(Ra, literal, Rc)
}

impl Instruction {

    /// Decode a word. Returns `None` if the opcode is not part of the instruction set.
    pub fn from_u32(word: u32) -> Option<Instruction> {
        let fields = BitSplitter::new(word);
        let rc = Reg(fields.rc());
        let ra = Reg(fields.ra());
        let rb = Reg(fields.rb());
        let lit = Lit(extract_literal(word));

        let instruction = match fields.opcode() {
            0x00 => Instruction::Halt,
            0x18 => Instruction::Ld(ra, lit, rc),
            0x19 => Instruction::St(rc, lit, ra),
            0x1B => Instruction::Jmp(ra, rc),
            0x1D => Instruction::Beq(ra, lit, rc),
            0x1E => Instruction::Bne(ra, lit, rc),
            0x1F => Instruction::Ldr(lit, rc),
            opcode @ 0x20..=0x2F => Instruction::Op(AluOp::from_low_bits(opcode)?, ra, rb, rc),
            opcode @ 0x30..=0x3F => Instruction::OpC(AluOp::from_low_bits(opcode)?, ra, lit, rc),
            _ => return None,
        };
        Some(instruction)
    }

    /// Encode the instruction back into a word. Unused fields are zero, except
    /// for LDR which names R31 as its Ra.
    pub fn to_u32(self) -> u32 {
        fn word(opcode: u8, rc: Reg, ra: Reg, low: u32) -> u32 {
            (opcode as u32) << 26 | (rc.0 as u32 & 0x1F) << 21 | (ra.0 as u32 & 0x1F) << 16 | (low & 0xFFFF)
        }
        match self {
            Instruction::Halt => 0,
            Instruction::Ld(ra, Lit(l), rc) => word(0x18, rc, ra, l as u32),
            Instruction::St(rc, Lit(l), ra) => word(0x19, rc, ra, l as u32),
            Instruction::Jmp(ra, rc) => word(0x1B, rc, ra, 0),
            Instruction::Beq(ra, Lit(l), rc) => word(0x1D, rc, ra, l as u32),
            Instruction::Bne(ra, Lit(l), rc) => word(0x1E, rc, ra, l as u32),
            Instruction::Ldr(Lit(l), rc) => word(0x1F, rc, Reg(31), l as u32),
            Instruction::Op(op, ra, Reg(rb), rc) => word(0x20 | op as u8, rc, ra, (rb as u32 & 0x1F) << 11),
            Instruction::OpC(op, ra, Lit(l), rc) => word(0x30 | op as u8, rc, ra, l as u32),
        }
    }
}

/// Renders the mnemonic form, e.g. `ADDC(R1,5,R2)`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Halt => write!(f, "HALT"),
            Instruction::Ld(Reg(ra), Lit(l), Reg(rc)) => write!(f, "LD(R{},{},R{})", ra, l, rc),
            Instruction::St(Reg(rc), Lit(l), Reg(ra)) => write!(f, "ST(R{},{},R{})", rc, l, ra),
            Instruction::Jmp(Reg(ra), Reg(rc)) => write!(f, "JMP(R{},R{})", ra, rc),
            Instruction::Beq(Reg(ra), Lit(l), Reg(rc)) => write!(f, "BEQ(R{},{},R{})", ra, l, rc),
            Instruction::Bne(Reg(ra), Lit(l), Reg(rc)) => write!(f, "BNE(R{},{},R{})", ra, l, rc),
            Instruction::Ldr(Lit(l), Reg(rc)) => write!(f, "LDR({},R{})", l, rc),
            Instruction::Op(op, Reg(ra), Reg(rb), Reg(rc)) => {
                write!(f, "{}(R{},R{},R{})", op.mnemonic(), ra, rb, rc)
            }
            Instruction::OpC(op, Reg(ra), Lit(l), Reg(rc)) => {
                write!(f, "{}C(R{},{},R{})", op.mnemonic(), ra, l, rc)
            }
        }
    }
}

/// Sign-extend the low 16 bits of `word` to 32 bits.
pub fn extract_literal(word: u32) -> i32 {
    let literal = BitSplitter::new(word).last_16_bits() as u32;
    if literal & 0x8000 != 0 {
        (literal | 0xFFFF_0000) as i32
    } else {
        literal as i32
    }
}

/// Shift `x` right by `shift` bits, filling the vacated high bits with the sign bit.
///
/// The shift is done on the unsigned bit pattern and the sign is put back
/// explicitly, so the result does not depend on how signed `>>` behaves.
pub fn arithmetic_right_shift(x: i32, shift: u32) -> i32 {
    let shift = shift & 0x1F;
    let logical = (x as u32) >> shift;
    if x < 0 {
        (logical | !(u32::MAX >> shift)) as i32
    } else {
        logical as i32
    }
}
