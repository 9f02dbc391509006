//! Opcode decoding helpers and the three cycle-count tables (`spec.md` §4.1,
//! §9's decoder-shape redesign note).
//!
//! Every SM83 opcode factors into three fields `(x, y, z)` taken from its
//! bits (`x = bits 7-6`, `y = bits 5-3`, `z = bits 2-0`), the same
//! decomposition used by most Z80/SM83 disassemblers. `r8`/`r16` index
//! helpers below translate `y`/`z` (or the 2-bit sub-fields `p`/`q` of `y`)
//! into concrete registers, so [`crate::cpu::ops`] never hand-writes a
//! 256-entry `match` over raw opcode bytes — only over these small decoded
//! fields.
//!
//! The cycle tables are plain `[u8; 256]` data, computed once at compile
//! time from the same `(x, y, z)` decomposition rather than transcribed by
//! hand, so the table a reader inspects is provably consistent with the
//! decode logic that walks the same opcode space in `ops.rs`.

/// The eight 8-bit operands addressable by a 3-bit register index:
/// B, C, D, E, H, L, (HL), A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R8 {
    B,
    C,
    D,
    E,
    H,
    L,
    IndHl,
    A,
}

pub const fn r8(index: u8) -> R8 {
    match index & 0x07 {
        0 => R8::B,
        1 => R8::C,
        2 => R8::D,
        3 => R8::E,
        4 => R8::H,
        5 => R8::L,
        6 => R8::IndHl,
        _ => R8::A,
    }
}

/// The four 16-bit register-pair operands used by arithmetic/load-immediate
/// instructions: BC, DE, HL, SP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16 {
    Bc,
    De,
    Hl,
    Sp,
}

pub const fn r16(index: u8) -> R16 {
    match index & 0x03 {
        0 => R16::Bc,
        1 => R16::De,
        2 => R16::Hl,
        _ => R16::Sp,
    }
}

/// The four memory-indirect operands of `LD A,(rr)` / `LD (rr),A`: BC, DE,
/// HL with post-increment, HL with post-decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16Ind {
    Bc,
    De,
    HlInc,
    HlDec,
}

pub const fn r16_ind(index: u8) -> R16Ind {
    match index & 0x03 {
        0 => R16Ind::Bc,
        1 => R16Ind::De,
        2 => R16Ind::HlInc,
        _ => R16Ind::HlDec,
    }
}

/// The PUSH/POP register-pair operand: BC, DE, HL, AF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R16Stack {
    Bc,
    De,
    Hl,
    Af,
}

pub const fn r16_stack(index: u8) -> R16Stack {
    match index & 0x03 {
        0 => R16Stack::Bc,
        1 => R16Stack::De,
        2 => R16Stack::Hl,
        _ => R16Stack::Af,
    }
}

/// The four branch conditions: NZ, Z, NC, C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Nz,
    Z,
    Nc,
    C,
}

pub const fn cond(index: u8) -> Cond {
    match index & 0x03 {
        0 => Cond::Nz,
        1 => Cond::Z,
        2 => Cond::Nc,
        _ => Cond::C,
    }
}

/// The eight ALU operations addressable by block-2 and the `z == 6`
/// immediate forms of block 3: ADD, ADC, SUB, SBC, AND, XOR, OR, CP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

pub const fn alu_op(index: u8) -> AluOp {
    match index & 0x07 {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbc,
        4 => AluOp::And,
        5 => AluOp::Xor,
        6 => AluOp::Or,
        _ => AluOp::Cp,
    }
}

/// The eight CB-prefixed rotate/shift operations addressable by `x == 0`:
/// RLC, RRC, RL, RR, SLA, SRA, SWAP, SRL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

pub const fn shift_op(index: u8) -> ShiftOp {
    match index & 0x07 {
        0 => ShiftOp::Rlc,
        1 => ShiftOp::Rrc,
        2 => ShiftOp::Rl,
        3 => ShiftOp::Rr,
        4 => ShiftOp::Sla,
        5 => ShiftOp::Sra,
        6 => ShiftOp::Swap,
        _ => ShiftOp::Srl,
    }
}

#[inline(always)]
const fn xyz(opcode: u8) -> (u8, u8, u8) {
    (opcode >> 6, (opcode >> 3) & 0x07, opcode & 0x07)
}

/// The eleven SM83 opcodes with no defined behavior (`spec.md` §7,
/// `Error::UnknownOpcode`): never reached by `CYCLES`/`BRANCH_CYCLES` lookup,
/// since `Cpu::step` returns an error before consuming a table entry.
pub const fn is_undefined(opcode: u8) -> bool {
    matches!(
        opcode,
        0xd3 | 0xdb | 0xdd | 0xe3 | 0xe4 | 0xeb | 0xec | 0xed | 0xf4 | 0xfc | 0xfd
    )
}

/// M-cycle cost of `opcode` when no conditional branch is taken (or the
/// instruction is unconditional). Undefined opcodes cost 0 — `step` never
/// looks them up.
const fn normal_m_cycles(opcode: u8) -> u8 {
    if is_undefined(opcode) {
        return 0;
    }
    let (x, y, z) = xyz(opcode);
    match x {
        0 => match z {
            0 => match y {
                0 => 1,       // NOP
                1 => 5,       // LD (a16), SP
                2 => 1,       // STOP
                3 => 3,       // JR e8
                _ => 2,       // JR cc, e8 (not taken)
            },
            1 => {
                if y & 1 == 0 {
                    3 // LD rr, d16
                } else {
                    2 // ADD HL, rr
                }
            }
            2 => 2, // LD (rr), A / LD A, (rr)
            3 => 2, // INC rr / DEC rr
            4 => {
                if y == 6 {
                    3
                } else {
                    1
                }
            } // INC r
            5 => {
                if y == 6 {
                    3
                } else {
                    1
                }
            } // DEC r
            6 => {
                if y == 6 {
                    3
                } else {
                    2
                }
            } // LD r, d8
            _ => 1, // RLCA/RRCA/RLA/RRA/DAA/CPL/SCF/CCF
        },
        1 => {
            if z == 6 || y == 6 {
                2 // LD r, (HL) / LD (HL), r / HALT
            } else {
                1 // LD r, r
            }
        }
        2 => {
            if z == 6 {
                2 // ALU A, (HL)
            } else {
                1 // ALU A, r
            }
        }
        _ => match z {
            0 => match y {
                0..=3 => 2, // RET cc (not taken)
                4 => 3,     // LDH (a8), A
                5 => 4,     // ADD SP, e8
                6 => 3,     // LDH A, (a8)
                _ => 3,     // LD HL, SP+e8
            },
            1 => {
                let p = y >> 1;
                if y & 1 == 0 {
                    3 // POP rr
                } else {
                    match p {
                        0 => 4, // RET
                        1 => 4, // RETI
                        2 => 1, // JP HL
                        _ => 2, // LD SP, HL
                    }
                }
            }
            2 => match y {
                0..=3 => 3, // JP cc, a16 (not taken)
                4 => 2,     // LD (C), A
                5 => 4,     // LD (a16), A
                6 => 2,     // LD A, (C)
                _ => 4,     // LD A, (a16)
            },
            3 => match y {
                0 => 4, // JP a16
                1 => 1, // CB prefix (own opcode fetch costs 1 M; the CB
                // table below accounts for the rest)
                6 => 1, // DI
                7 => 1, // EI
                _ => 0, // undefined (0xd3/0xdb/0xe3/0xeb)
            },
            4 => match y {
                0..=3 => 3, // CALL cc, a16 (not taken)
                _ => 0,     // undefined
            },
            5 => {
                let p = y >> 1;
                if y & 1 == 0 {
                    4 // PUSH rr
                } else if p == 0 {
                    6 // CALL a16
                } else {
                    0 // undefined
                }
            }
            6 => 2, // ALU A, d8
            _ => 4, // RST
        },
    }
}

/// M-cycle cost of `opcode` when a conditional branch IS taken; identical to
/// [`normal_m_cycles`] for every unconditional opcode.
const fn branch_m_cycles(opcode: u8) -> u8 {
    if is_undefined(opcode) {
        return 0;
    }
    let (x, y, z) = xyz(opcode);
    match (x, z) {
        (0, 0) if y >= 4 => 3,          // JR cc, e8 (taken)
        (3, 0) if y <= 3 => 5,          // RET cc (taken)
        (3, 2) if y <= 3 => 4,          // JP cc, a16 (taken)
        (3, 4) if y <= 3 => 6,          // CALL cc, a16 (taken)
        _ => normal_m_cycles(opcode),
    }
}

/// M-cycle cost of CB-prefixed `opcode`, complete (including the prefix
/// fetch): 2 M for a register operand, 3-4 M when the operand is `(HL)`.
const fn cb_m_cycles(opcode: u8) -> u8 {
    let (x, _y, z) = xyz(opcode);
    match x {
        0 => {
            if z == 6 {
                4
            } else {
                2
            }
        } // rotate/shift/swap
        1 => {
            if z == 6 {
                3
            } else {
                2
            }
        } // BIT
        _ => {
            if z == 6 {
                4
            } else {
                2
            }
        } // RES/SET
    }
}

// Fn pointers can't be invoked in const evaluation on stable Rust, so each
// table below is built by a macro expansion that calls its source function
// directly rather than sharing one generic const fn.
macro_rules! build_table {
    ($name:ident) => {{
        let mut table = [0u8; 256];
        let mut op: u16 = 0;
        while op < 256 {
            table[op as usize] = $name(op as u8).wrapping_mul(4);
            op += 1;
        }
        table
    }};
}

/// T-cycle cost per opcode when no conditional branch is taken.
pub static CYCLES: [u8; 256] = build_table!(normal_m_cycles);

/// T-cycle cost per opcode when a conditional branch is taken.
pub static BRANCH_CYCLES: [u8; 256] = build_table!(branch_m_cycles);

/// T-cycle cost per CB-prefixed opcode, complete — `Cpu::step` returns this
/// value directly for a CB-prefixed instruction, not added to `CYCLES[0xcb]`.
pub static CB_CYCLES: [u8; 256] = build_table!(cb_m_cycles);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nop_costs_four_t_cycles() {
        assert_eq!(CYCLES[0x00], 4);
    }

    #[test]
    fn jr_cc_costs_more_when_taken() {
        assert_eq!(CYCLES[0x20], 8);
        assert_eq!(BRANCH_CYCLES[0x20], 12);
    }

    #[test]
    fn call_a16_costs_24_t_cycles() {
        assert_eq!(CYCLES[0xcd], 24);
    }

    #[test]
    fn cb_bit_on_register_is_cheaper_than_on_indirect_hl() {
        assert_eq!(CB_CYCLES[0x40], 8); // BIT 0, B
        assert_eq!(CB_CYCLES[0x46], 12); // BIT 0, (HL)
    }

    #[test]
    fn undefined_opcodes_are_zeroed_and_flagged() {
        for op in [0xd3u8, 0xdb, 0xdd, 0xe3, 0xe4, 0xeb, 0xec, 0xed, 0xf4, 0xfc, 0xfd] {
            assert!(is_undefined(op));
            assert_eq!(CYCLES[op as usize], 0);
        }
    }

    #[test]
    fn r8_index_six_is_indirect_hl() {
        assert_eq!(r8(6), R8::IndHl);
        assert_eq!(r8(7), R8::A);
    }
}
