//! Per-block instruction execution, split the way `spec.md` §4.1 splits the
//! opcode space: blocks 0-3 of the main page, plus the CB-prefixed page.
//! Every function here consumes the small decoded operands from
//! [`super::decode`] rather than matching on raw opcode bytes directly.

use crate::mmu::BusComponent;

use super::decode::{alu_op, cond, r16, r16_ind, r16_stack, r8, shift_op, AluOp, Cond, R16Stack, ShiftOp};
use super::Cpu;

impl Cpu {
    /// Executes one non-CB opcode. Returns whether a conditional branch was
    /// taken, so `step` can pick the right cycle table.
    pub(super) fn execute(&mut self, opcode: u8) -> bool {
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        match opcode >> 6 {
            0 => self.exec_block0(y, z),
            1 => self.exec_block1(y, z),
            2 => self.exec_block2(y, z),
            _ => self.exec_block3(y, z),
        }
    }

    fn exec_block0(&mut self, y: u8, z: u8) -> bool {
        match z {
            0 => match y {
                0 => false, // NOP
                1 => {
                    // LD (a16), SP
                    let addr = self.read_u16();
                    let sp = self.sp();
                    self.mmu.write16(addr, sp);
                    false
                }
                2 => false, // STOP: no speed-switch/low-power modeling in scope.
                3 => {
                    let e = self.read_u8();
                    self.jr(e);
                    false
                }
                _ => {
                    let e = self.read_u8();
                    if self.test_cond(cond(y - 4)) {
                        self.jr(e);
                        true
                    } else {
                        false
                    }
                }
            },
            1 => {
                let p = y >> 1;
                if y & 1 == 0 {
                    let value = self.read_u16();
                    self.set_r16(r16(p), value);
                } else {
                    let value = self.get_r16(r16(p));
                    self.add_hl(value);
                }
                false
            }
            2 => {
                let ind = r16_ind(y >> 1);
                if y & 1 == 0 {
                    let addr = self.addr_r16_ind(ind);
                    let a = self.a();
                    self.mmu.write(addr, a);
                } else {
                    let addr = self.addr_r16_ind(ind);
                    let value = self.mmu.read(addr);
                    self.set_a(value);
                }
                false
            }
            3 => {
                let reg = r16(y >> 1);
                let value = self.get_r16(reg);
                if y & 1 == 0 {
                    self.set_r16(reg, value.wrapping_add(1));
                } else {
                    self.set_r16(reg, value.wrapping_sub(1));
                }
                false
            }
            4 => {
                let reg = r8(y);
                let value = self.get_r8(reg);
                let result = self.inc8(value);
                self.set_r8(reg, result);
                false
            }
            5 => {
                let reg = r8(y);
                let value = self.get_r8(reg);
                let result = self.dec8(value);
                self.set_r8(reg, result);
                false
            }
            6 => {
                let value = self.read_u8();
                self.set_r8(r8(y), value);
                false
            }
            _ => {
                match y {
                    0 => self.rlca(),
                    1 => self.rrca(),
                    2 => self.rla(),
                    3 => self.rra(),
                    4 => self.daa(),
                    5 => self.cpl(),
                    6 => self.scf(),
                    _ => self.ccf(),
                }
                false
            }
        }
    }

    fn exec_block1(&mut self, y: u8, z: u8) -> bool {
        if y == 6 && z == 6 {
            self.set_halted(true);
        } else {
            let value = self.get_r8(r8(z));
            self.set_r8(r8(y), value);
        }
        false
    }

    fn exec_block2(&mut self, y: u8, z: u8) -> bool {
        let value = self.get_r8(r8(z));
        self.alu(alu_op(y), value);
        false
    }

    fn exec_block3(&mut self, y: u8, z: u8) -> bool {
        match z {
            0 => match y {
                0..=3 => {
                    if self.test_cond(cond(y)) {
                        let addr = self.pop_word();
                        self.set_pc(addr);
                        true
                    } else {
                        false
                    }
                }
                4 => {
                    let n = self.read_u8();
                    let a = self.a();
                    self.mmu.write(0xff00 + n as u16, a);
                    false
                }
                5 => {
                    let e = self.read_u8();
                    let sp = self.sp();
                    let result = self.add_sp_e8(sp, e);
                    self.set_sp(result);
                    false
                }
                6 => {
                    let n = self.read_u8();
                    let value = self.mmu.read(0xff00 + n as u16);
                    self.set_a(value);
                    false
                }
                _ => {
                    let e = self.read_u8();
                    let sp = self.sp();
                    let result = self.add_sp_e8(sp, e);
                    self.set_hl(result);
                    false
                }
            },
            1 => {
                let p = y >> 1;
                if y & 1 == 0 {
                    let value = self.pop_word();
                    self.set_r16_stack(r16_stack(p), value);
                    false
                } else {
                    match p {
                        0 => {
                            let addr = self.pop_word();
                            self.set_pc(addr);
                            false
                        }
                        1 => {
                            let addr = self.pop_word();
                            self.set_pc(addr);
                            self.set_ime(true);
                            false
                        }
                        2 => {
                            self.set_pc(self.hl());
                            false
                        }
                        _ => {
                            self.set_sp(self.hl());
                            false
                        }
                    }
                }
            }
            2 => match y {
                0..=3 => {
                    let addr = self.read_u16();
                    if self.test_cond(cond(y)) {
                        self.set_pc(addr);
                        true
                    } else {
                        false
                    }
                }
                4 => {
                    let a = self.a();
                    self.mmu.write(0xff00 + self.c() as u16, a);
                    false
                }
                5 => {
                    let addr = self.read_u16();
                    let a = self.a();
                    self.mmu.write(addr, a);
                    false
                }
                6 => {
                    let value = self.mmu.read(0xff00 + self.c() as u16);
                    self.set_a(value);
                    false
                }
                _ => {
                    let addr = self.read_u16();
                    let value = self.mmu.read(addr);
                    self.set_a(value);
                    false
                }
            },
            3 => match y {
                0 => {
                    let addr = self.read_u16();
                    self.set_pc(addr);
                    false
                }
                6 => {
                    self.set_ime(false);
                    false
                }
                7 => {
                    // Real hardware delays EI's effect by one instruction;
                    // not modeled here.
                    self.set_ime(true);
                    false
                }
                _ => unreachable!("CB prefix and undefined opcodes handled by step()"),
            },
            4 => {
                let addr = self.read_u16();
                if self.test_cond(cond(y)) {
                    let pc = self.pc();
                    self.push_word(pc);
                    self.set_pc(addr);
                    true
                } else {
                    false
                }
            }
            5 => {
                let p = y >> 1;
                if y & 1 == 0 {
                    let value = self.get_r16_stack(r16_stack(p));
                    self.push_word(value);
                } else {
                    let addr = self.read_u16();
                    let pc = self.pc();
                    self.push_word(pc);
                    self.set_pc(addr);
                }
                false
            }
            6 => {
                let n = self.read_u8();
                self.alu(alu_op(y), n);
                false
            }
            _ => {
                let pc = self.pc();
                self.push_word(pc);
                self.set_pc((y as u16) * 8);
                false
            }
        }
    }

    /// Executes a CB-prefixed opcode: rotate/shift (`x==0`), BIT (`x==1`),
    /// RES (`x==2`), SET (`x==3`) over the `z`-indexed operand.
    pub(super) fn execute_cb(&mut self, opcode: u8) {
        let x = opcode >> 6;
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        let reg = r8(z);
        let value = self.get_r8(reg);
        let result = match x {
            0 => self.shift(shift_op(y), value),
            1 => {
                self.bit(y, value);
                return;
            }
            2 => res_bit(y, value),
            _ => set_bit(y, value),
        };
        self.set_r8(reg, result);
    }

    fn jr(&mut self, offset: u8) {
        let delta = offset as i8 as i16;
        let pc = self.pc();
        self.set_pc((pc as i16).wrapping_add(delta) as u16);
    }

    fn test_cond(&self, c: Cond) -> bool {
        match c {
            Cond::Nz => !self.zero(),
            Cond::Z => self.zero(),
            Cond::Nc => !self.carry(),
            Cond::C => self.carry(),
        }
    }

    fn get_r8(&mut self, r: super::decode::R8) -> u8 {
        use super::decode::R8;
        match r {
            R8::B => self.b(),
            R8::C => self.c(),
            R8::D => self.d(),
            R8::E => self.e(),
            R8::H => self.h(),
            R8::L => self.l(),
            R8::A => self.a(),
            R8::IndHl => {
                let addr = self.hl();
                self.mmu.read(addr)
            }
        }
    }

    fn set_r8(&mut self, r: super::decode::R8, value: u8) {
        use super::decode::R8;
        match r {
            R8::B => self.set_b(value),
            R8::C => self.set_c(value),
            R8::D => self.set_d(value),
            R8::E => self.set_e(value),
            R8::H => self.set_h(value),
            R8::L => self.set_l(value),
            R8::A => self.set_a(value),
            R8::IndHl => {
                let addr = self.hl();
                self.mmu.write(addr, value);
            }
        }
    }

    fn get_r16(&self, r: super::decode::R16) -> u16 {
        use super::decode::R16;
        match r {
            R16::Bc => self.bc(),
            R16::De => self.de(),
            R16::Hl => self.hl(),
            R16::Sp => self.sp(),
        }
    }

    fn set_r16(&mut self, r: super::decode::R16, value: u16) {
        use super::decode::R16;
        match r {
            R16::Bc => self.set_bc(value),
            R16::De => self.set_de(value),
            R16::Hl => self.set_hl(value),
            R16::Sp => self.set_sp(value),
        }
    }

    fn addr_r16_ind(&mut self, r: super::decode::R16Ind) -> u16 {
        use super::decode::R16Ind;
        match r {
            R16Ind::Bc => self.bc(),
            R16Ind::De => self.de(),
            R16Ind::HlInc => {
                let addr = self.hl();
                self.set_hl(addr.wrapping_add(1));
                addr
            }
            R16Ind::HlDec => {
                let addr = self.hl();
                self.set_hl(addr.wrapping_sub(1));
                addr
            }
        }
    }

    fn get_r16_stack(&self, r: R16Stack) -> u16 {
        match r {
            R16Stack::Bc => self.bc(),
            R16Stack::De => self.de(),
            R16Stack::Hl => self.hl(),
            R16Stack::Af => self.af(),
        }
    }

    fn set_r16_stack(&mut self, r: R16Stack, value: u16) {
        match r {
            R16Stack::Bc => self.set_bc(value),
            R16Stack::De => self.set_de(value),
            R16Stack::Hl => self.set_hl(value),
            R16Stack::Af => self.set_af(value),
        }
    }

    fn alu(&mut self, op: AluOp, value: u8) {
        match op {
            AluOp::Add => self.alu_add(value, false),
            AluOp::Adc => self.alu_add(value, true),
            AluOp::Sub => self.alu_sub(value, false),
            AluOp::Sbc => self.alu_sub(value, true),
            AluOp::And => self.alu_and(value),
            AluOp::Xor => self.alu_xor(value),
            AluOp::Or => self.alu_or(value),
            AluOp::Cp => {
                self.alu_sub_core(value, false);
            }
        }
    }

    fn alu_add(&mut self, value: u8, carry_in: bool) {
        let c: u16 = if carry_in && self.carry() { 1 } else { 0 };
        let a = self.a() as u16;
        let v = value as u16;
        let sum = a + v + c;
        self.set_half_carry((a & 0xf) + (v & 0xf) + c > 0xf);
        self.set_carry(sum > 0xff);
        self.set_a(sum as u8);
        self.set_zero(self.a() == 0);
        self.set_sub(false);
    }

    fn alu_sub_core(&mut self, value: u8, carry_in: bool) -> u8 {
        let c: u16 = if carry_in && self.carry() { 1 } else { 0 };
        let a = self.a() as u16;
        let v = value as u16;
        let diff = a.wrapping_sub(v).wrapping_sub(c);
        self.set_half_carry((a & 0xf) < (v & 0xf) + c);
        self.set_carry(a < v + c);
        self.set_sub(true);
        let result = diff as u8;
        self.set_zero(result == 0);
        result
    }

    fn alu_sub(&mut self, value: u8, carry_in: bool) {
        let result = self.alu_sub_core(value, carry_in);
        self.set_a(result);
    }

    fn alu_and(&mut self, value: u8) {
        self.set_a(self.a() & value);
        self.set_zero(self.a() == 0);
        self.set_sub(false);
        self.set_half_carry(true);
        self.set_carry(false);
    }

    fn alu_xor(&mut self, value: u8) {
        self.set_a(self.a() ^ value);
        self.set_zero(self.a() == 0);
        self.set_sub(false);
        self.set_half_carry(false);
        self.set_carry(false);
    }

    fn alu_or(&mut self, value: u8) {
        self.set_a(self.a() | value);
        self.set_zero(self.a() == 0);
        self.set_sub(false);
        self.set_half_carry(false);
        self.set_carry(false);
    }

    fn inc8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_zero(result == 0);
        self.set_sub(false);
        self.set_half_carry(value & 0x0f == 0x0f);
        result
    }

    fn dec8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_zero(result == 0);
        self.set_sub(true);
        self.set_half_carry(value & 0x0f == 0x00);
        result
    }

    fn add_hl(&mut self, value: u16) {
        let hl = self.hl();
        let (result, carry) = hl.overflowing_add(value);
        self.set_half_carry((hl & 0x0fff) + (value & 0x0fff) > 0x0fff);
        self.set_carry(carry);
        self.set_sub(false);
        self.set_hl(result);
    }

    /// Shared by `ADD SP, e8` and `LD HL, SP+e8`: flags computed from the
    /// raw displacement byte's unsigned low nibble/byte, per `spec.md` §4.1.
    fn add_sp_e8(&mut self, sp: u16, e_byte: u8) -> u16 {
        let e = e_byte as i8 as i16;
        let result = (sp as i16).wrapping_add(e) as u16;
        self.set_half_carry((sp & 0x0f) + (e_byte as u16 & 0x0f) > 0x0f);
        self.set_carry((sp & 0xff) + e_byte as u16 > 0xff);
        self.set_zero(false);
        self.set_sub(false);
        result
    }

    fn daa(&mut self) {
        let mut a = self.a();
        let mut carry = self.carry();
        if !self.sub() {
            if self.half_carry() || (a & 0x0f) > 0x09 {
                a = a.wrapping_add(0x06);
            }
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
        } else {
            if self.half_carry() {
                a = a.wrapping_sub(0x06);
            }
            if carry {
                a = a.wrapping_sub(0x60);
            }
        }
        self.set_a(a);
        self.set_zero(a == 0);
        self.set_half_carry(false);
        self.set_carry(carry);
    }

    fn cpl(&mut self) {
        let a = self.a();
        self.set_a(!a);
        self.set_sub(true);
        self.set_half_carry(true);
    }

    fn scf(&mut self) {
        self.set_sub(false);
        self.set_half_carry(false);
        self.set_carry(true);
    }

    fn ccf(&mut self) {
        self.set_sub(false);
        self.set_half_carry(false);
        let carry = self.carry();
        self.set_carry(!carry);
    }

    fn rlca(&mut self) {
        let a = self.a();
        let carry = a & 0x80 != 0;
        self.set_a(a.rotate_left(1));
        self.set_zero(false);
        self.set_sub(false);
        self.set_half_carry(false);
        self.set_carry(carry);
    }

    fn rrca(&mut self) {
        let a = self.a();
        let carry = a & 0x01 != 0;
        self.set_a(a.rotate_right(1));
        self.set_zero(false);
        self.set_sub(false);
        self.set_half_carry(false);
        self.set_carry(carry);
    }

    fn rla(&mut self) {
        let a = self.a();
        let carry_in = self.carry();
        let carry_out = a & 0x80 != 0;
        self.set_a((a << 1) | carry_in as u8);
        self.set_zero(false);
        self.set_sub(false);
        self.set_half_carry(false);
        self.set_carry(carry_out);
    }

    fn rra(&mut self) {
        let a = self.a();
        let carry_in = self.carry();
        let carry_out = a & 0x01 != 0;
        self.set_a((a >> 1) | ((carry_in as u8) << 7));
        self.set_zero(false);
        self.set_sub(false);
        self.set_half_carry(false);
        self.set_carry(carry_out);
    }

    fn shift(&mut self, op: ShiftOp, value: u8) -> u8 {
        let (result, carry) = match op {
            ShiftOp::Rlc => (value.rotate_left(1), value & 0x80 != 0),
            ShiftOp::Rrc => (value.rotate_right(1), value & 0x01 != 0),
            ShiftOp::Rl => {
                let carry_out = value & 0x80 != 0;
                ((value << 1) | self.carry() as u8, carry_out)
            }
            ShiftOp::Rr => {
                let carry_out = value & 0x01 != 0;
                ((value >> 1) | ((self.carry() as u8) << 7), carry_out)
            }
            ShiftOp::Sla => (value << 1, value & 0x80 != 0),
            ShiftOp::Sra => (((value as i8) >> 1) as u8, value & 0x01 != 0),
            ShiftOp::Swap => ((value >> 4) | (value << 4), false),
            ShiftOp::Srl => (value >> 1, value & 0x01 != 0),
        };
        self.set_zero(result == 0);
        self.set_sub(false);
        self.set_half_carry(false);
        self.set_carry(carry);
        result
    }

    fn bit(&mut self, n: u8, value: u8) {
        self.set_zero(value & (1 << n) == 0);
        self.set_sub(false);
        self.set_half_carry(true);
    }
}

const fn res_bit(n: u8, value: u8) -> u8 {
    value & !(1 << n)
}

const fn set_bit(n: u8, value: u8) -> u8 {
    value | (1 << n)
}
