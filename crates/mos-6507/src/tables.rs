//! Per-opcode decode tables.
//!
//! Row `n` of each table covers opcodes `$n0..=$nF`.

/// How an opcode finds its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `JMP ($nnnn)` only.
    Indirect,
    /// `($nn,X)`
    IndirectX,
    /// `($nn),Y`
    IndirectY,
    Relative,
    Invalid,
}

/// Cycles an instruction may add on top of its base cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableCost {
    Fixed,
    /// One more cycle when indexing crossed a page.
    PageCross,
    /// One more when taken, two when taken onto another page.
    Branch,
}

use AddressingMode::{
    Absolute as Abs, AbsoluteX as AbX, AbsoluteY as AbY, Immediate as Imm, Implied as Imp,
    Indirect as Ind, IndirectX as IzX, IndirectY as IzY, Invalid as Inv, Relative as Rel,
    ZeroPage as Zp, ZeroPageX as ZpX, ZeroPageY as ZpY,
};
use VariableCost::{Branch as Brn, Fixed as Fix, PageCross as Pgx};

/// Addressing mode of each opcode.
#[rustfmt::skip]
pub const MODES: [AddressingMode; 256] = [
    Imp, IzX, Inv, IzX, Zp, Zp, Zp, Zp, Imp, Imm, Imp, Imm, Abs, Abs, Abs, Abs,
    Rel, IzY, Inv, IzY, ZpX, ZpX, ZpX, ZpX, Imp, AbY, Imp, AbY, AbX, AbX, AbX, AbX,
    Abs, IzX, Inv, IzX, Zp, Zp, Zp, Zp, Imp, Imm, Imp, Imm, Abs, Abs, Abs, Abs,
    Rel, IzY, Inv, IzY, ZpX, ZpX, ZpX, ZpX, Imp, AbY, Imp, AbY, AbX, AbX, AbX, AbX,
    Imp, IzX, Inv, IzX, Zp, Zp, Zp, Zp, Imp, Imm, Imp, Imm, Abs, Abs, Abs, Abs,
    Rel, IzY, Inv, IzY, ZpX, ZpX, ZpX, ZpX, Imp, AbY, Imp, AbY, AbX, AbX, AbX, AbX,
    Imp, IzX, Inv, IzX, Zp, Zp, Zp, Zp, Imp, Imm, Imp, Imm, Ind, Abs, Abs, Abs,
    Rel, IzY, Inv, IzY, ZpX, ZpX, ZpX, ZpX, Imp, AbY, Imp, AbY, AbX, AbX, AbX, AbX,
    Imm, IzX, Imm, IzX, Zp, Zp, Zp, Zp, Imp, Imm, Imp, Imm, Abs, Abs, Abs, Abs,
    Rel, IzY, Inv, IzY, ZpX, ZpX, ZpY, ZpY, Imp, AbY, Imp, AbY, AbX, AbX, AbY, AbY,
    Imm, IzX, Imm, IzX, Zp, Zp, Zp, Zp, Imp, Imm, Imp, Imm, Abs, Abs, Abs, Abs,
    Rel, IzY, Inv, IzY, ZpX, ZpX, ZpY, ZpY, Imp, AbY, Imp, AbY, AbX, AbX, AbY, AbY,
    Imm, IzX, Imm, IzX, Zp, Zp, Zp, Zp, Imp, Imm, Imp, Imm, Abs, Abs, Abs, Abs,
    Rel, IzY, Inv, IzY, ZpX, ZpX, ZpX, ZpX, Imp, AbY, Imp, AbY, AbX, AbX, AbX, AbX,
    Imm, IzX, Imm, IzX, Zp, Zp, Zp, Zp, Imp, Imm, Imp, Imm, Abs, Abs, Abs, Abs,
    Rel, IzY, Inv, IzY, ZpX, ZpX, ZpX, ZpX, Imp, AbY, Imp, AbY, AbX, AbX, AbX, AbX,
];

/// Base cycle count of each opcode.
#[rustfmt::skip]
pub const CYCLES: [u8; 256] = [
    7, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4,
    2, 6, 2, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5,
    2, 6, 2, 6, 3, 3, 3, 4, 2, 2, 2, 2, 4, 4, 4, 4,
    2, 5, 2, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4,
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,
];

/// Extra-cycle rule of each opcode.
#[rustfmt::skip]
pub const COSTS: [VariableCost; 256] = [
    Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Brn, Pgx, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Pgx, Fix, Fix, Fix, Pgx, Fix, Fix,
    Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Brn, Pgx, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Pgx, Fix, Fix, Fix, Pgx, Fix, Fix,
    Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Brn, Pgx, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Pgx, Fix, Fix, Fix, Pgx, Fix, Fix,
    Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Brn, Pgx, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Pgx, Fix, Fix, Fix, Pgx, Fix, Fix,
    Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Brn, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Brn, Pgx, Fix, Pgx, Fix, Fix, Fix, Fix, Fix, Pgx, Fix, Fix, Pgx, Pgx, Pgx, Pgx,
    Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Brn, Pgx, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Pgx, Fix, Fix, Fix, Pgx, Fix, Fix,
    Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Fix,
    Brn, Pgx, Fix, Fix, Fix, Fix, Fix, Fix, Fix, Pgx, Fix, Fix, Fix, Pgx, Fix, Fix,
];

/// Mnemonic of each opcode; lowercase marks undocumented ones.
#[rustfmt::skip]
pub const MNEMONICS: [&str; 256] = [
    "BRK", "ORA", "n/a", "slo", "nop", "ORA", "ASL", "slo", "PHP", "ORA", "ASLA", "anc", "nop", "ORA", "ASL", "slo",
    "BPL", "ORA", "n/a", "slo", "nop", "ORA", "ASL", "slo", "CLC", "ORA", "nop", "slo", "nop", "ORA", "ASL", "slo",
    "JSR", "AND", "n/a", "rla", "BIT", "AND", "ROL", "rla", "PLP", "AND", "ROLA", "anc", "BIT", "AND", "ROL", "rla",
    "BMI", "AND", "n/a", "rla", "nop", "AND", "ROL", "rla", "SEC", "AND", "nop", "rla", "nop", "AND", "ROL", "rla",
    "RTI", "EOR", "n/a", "sre", "nop", "EOR", "LSR", "sre", "PHA", "EOR", "LSRA", "asr", "JMP", "EOR", "LSR", "sre",
    "BVC", "EOR", "n/a", "sre", "nop", "EOR", "LSR", "sre", "CLI", "EOR", "nop", "sre", "nop", "EOR", "LSR", "sre",
    "RTS", "ADC", "n/a", "rra", "nop", "ADC", "ROR", "rra", "PLA", "ADC", "RORA", "arr", "JMP", "ADC", "ROR", "rra",
    "BVS", "ADC", "n/a", "rra", "nop", "ADC", "ROR", "rra", "SEI", "ADC", "nop", "rra", "nop", "ADC", "ROR", "rra",
    "nop", "STA", "nop", "sax", "STY", "STA", "STX", "sax", "DEY", "nop", "TXA", "ane", "STY", "STA", "STX", "sax",
    "BCC", "STA", "n/a", "sha", "STY", "STA", "STX", "sax", "TYA", "STA", "TXS", "shs", "shy", "STA", "shx", "sha",
    "LDY", "LDA", "LDX", "lax", "LDY", "LDA", "LDX", "lax", "TAY", "LDA", "TAX", "lxa", "LDY", "LDA", "LDX", "lax",
    "BCS", "LDA", "n/a", "lax", "LDY", "LDA", "LDX", "lax", "CLV", "LDA", "TSX", "las", "LDY", "LDA", "LDX", "lax",
    "CPY", "CMP", "nop", "dcp", "CPY", "CMP", "DEC", "dcp", "INY", "CMP", "DEX", "sbx", "CPY", "CMP", "DEC", "dcp",
    "BNE", "CMP", "n/a", "dcp", "nop", "CMP", "DEC", "dcp", "CLD", "CMP", "nop", "dcp", "nop", "CMP", "DEC", "dcp",
    "CPX", "SBC", "nop", "isb", "CPX", "SBC", "INC", "isb", "INX", "SBC", "NOP", "sbc", "CPX", "SBC", "INC", "isb",
    "BEQ", "SBC", "n/a", "isb", "nop", "SBC", "INC", "isb", "SED", "SBC", "nop", "isb", "nop", "SBC", "INC", "isb",
];

/// Packed BCD byte to its numeric value. Non-decimal nibbles are taken at
/// face value, which is what the adder does with them.
pub const BCD_TO_BINARY: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = ((i >> 4) * 10 + (i & 0x0F)) as u8;
        i += 1;
    }
    table
};

/// Number (mod 100) to packed BCD.
pub const BINARY_TO_BCD: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = ((((i % 100) / 10) << 4) | (i % 10)) as u8;
        i += 1;
    }
    table
};
