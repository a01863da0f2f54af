//! 6507 instruction interpreter.
//!
//! One call to [`Mos6507::step`] executes one whole instruction. Reads are
//! announced to the cycle sink one cycle at a time, just before they hit the
//! bus; writes are never announced. When the instruction is done, whatever
//! is left of its table cost is reported in one lump.

use emu_core::{Bus, Cpu, CycleSink, Observable, Value};
use log::debug;

use crate::tables::{
    AddressingMode, BCD_TO_BINARY, BINARY_TO_BCD, COSTS, CYCLES, MNEMONICS, MODES, VariableCost,
};
use crate::{DecodeError, Flags, Registers};

/// The MOS 6507 CPU.
#[derive(Debug)]
pub struct Mos6507 {
    /// CPU registers.
    pub regs: Registers,

    /// Opcode of the instruction in flight.
    opcode: u8,

    /// Effective address of the last operand fetch; stores and
    /// read-modify-write instructions write back here.
    operand_address: u16,

    /// Set by indexed fetches that had to fix up the high address byte.
    page_crossed: bool,

    /// 0, 1 or 2 extra cycles from the last branch.
    branch_extra: u8,

    /// Cycles already reported during the instruction in flight.
    cycles_signaled: u32,

    /// Instructions retired since power-on.
    instructions: u64,
}

impl Default for Mos6507 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6507 {
    /// A CPU in its reset register state. Call [`Mos6507::reset`] to load PC.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            opcode: 0,
            operand_address: 0,
            page_crossed: false,
            branch_extra: 0,
            cycles_signaled: 0,
            instructions: 0,
        }
    }

    /// Clear the registers and jump through the reset vector.
    pub fn reset<B: Bus + CycleSink>(&mut self, bus: &mut B) {
        self.regs = Registers::new();
        self.cycles_signaled = 0;
        self.page_crossed = false;
        self.branch_extra = 0;

        let lo = self.peek(bus, 0xFFFC);
        let hi = self.peek(bus, 0xFFFD);
        self.regs.pc = u16::from_le_bytes([lo, hi]);
        self.cycles_signaled = 0;
        debug!("6507 reset, PC={:#06X}", self.regs.pc);
    }

    /// Execute instructions until `max_instructions` have run or the sink
    /// asks for a stop.
    ///
    /// The stop request is only checked after an instruction has completed.
    pub fn run<B: Bus + CycleSink>(
        &mut self,
        bus: &mut B,
        max_instructions: usize,
    ) -> Result<usize, DecodeError> {
        let mut executed = 0;
        while executed < max_instructions {
            executed += 1;
            self.step(bus)?;
            if bus.stop_requested() {
                break;
            }
        }
        Ok(executed)
    }

    /// Execute one instruction and return the cycles it consumed.
    pub fn step<B: Bus + CycleSink>(&mut self, bus: &mut B) -> Result<u32, DecodeError> {
        let address = self.regs.pc;
        self.opcode = self.fetch(bus);
        self.page_crossed = false;
        self.branch_extra = 0;

        self.execute(bus, address)?;

        let total = self.instruction_cycles();
        let remaining = total.saturating_sub(self.cycles_signaled);
        if remaining > 0 {
            bus.cycles_elapsed(remaining);
        }
        let consumed = self.cycles_signaled + remaining;
        self.cycles_signaled = 0;
        self.instructions += 1;
        Ok(consumed)
    }

    /// Cycle cost of the instruction just executed, from the tables.
    fn instruction_cycles(&self) -> u32 {
        let opcode = usize::from(self.opcode);
        let extra = match COSTS[opcode] {
            VariableCost::Fixed => 0,
            VariableCost::PageCross => u8::from(self.page_crossed),
            VariableCost::Branch => self.branch_extra,
        };
        u32::from(CYCLES[opcode] + extra)
    }

    /// Instructions retired since power-on.
    #[must_use]
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    // ---- bus access ----

    fn peek<B: Bus + CycleSink>(&mut self, bus: &mut B, address: u16) -> u8 {
        bus.cycles_elapsed(1);
        self.cycles_signaled += 1;
        bus.read(address)
    }

    /// A read whose cycle is accounted for in the instruction's lump.
    fn peek_unsignaled<B: Bus>(bus: &mut B, address: u16) -> u8 {
        bus.read(address)
    }

    fn poke<B: Bus>(bus: &mut B, address: u16, value: u8) {
        bus.write(address, value);
    }

    fn fetch<B: Bus + CycleSink>(&mut self, bus: &mut B) -> u8 {
        let value = self.peek(bus, self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word<B: Bus + CycleSink>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let address = self.regs.push();
        Self::poke(bus, address, value);
    }

    /// Fetch an operand with a base address plus index, noting page crossings.
    fn indexed<B: Bus + CycleSink>(&mut self, bus: &mut B, base: u16, index: u8) -> u8 {
        let address = base.wrapping_add(u16::from(index));
        self.operand_address = address;
        self.page_crossed = (base & 0x00FF) + u16::from(index) > 0x00FF;
        if self.page_crossed {
            self.peek(bus, address);
        }
        self.peek(bus, address)
    }

    /// Resolve the current opcode's addressing mode and read the operand.
    fn read_operand<B: Bus + CycleSink>(&mut self, bus: &mut B) -> u8 {
        match MODES[usize::from(self.opcode)] {
            AddressingMode::Immediate | AddressingMode::Relative => {
                self.operand_address = self.regs.pc;
                self.fetch(bus)
            }
            AddressingMode::ZeroPage => {
                self.operand_address = u16::from(self.fetch(bus));
                self.peek(bus, self.operand_address)
            }
            AddressingMode::ZeroPageX => self.zero_page_indexed(bus, self.regs.x),
            AddressingMode::ZeroPageY => self.zero_page_indexed(bus, self.regs.y),
            AddressingMode::Absolute => {
                self.operand_address = self.fetch_word(bus);
                self.page_crossed = false;
                self.peek(bus, self.operand_address)
            }
            AddressingMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                self.indexed(bus, base, self.regs.x)
            }
            AddressingMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                self.indexed(bus, base, self.regs.y)
            }
            AddressingMode::IndirectX => {
                let pointer = self.fetch(bus).wrapping_add(self.regs.x);
                let lo = self.peek(bus, u16::from(pointer));
                let hi = self.peek(bus, u16::from(pointer.wrapping_add(1)));
                self.operand_address = u16::from_le_bytes([lo, hi]);
                self.peek(bus, self.operand_address)
            }
            AddressingMode::IndirectY => {
                let pointer = self.fetch(bus);
                let lo = self.peek(bus, u16::from(pointer));
                let hi = self.peek(bus, u16::from(pointer.wrapping_add(1)));
                self.indexed(bus, u16::from_le_bytes([lo, hi]), self.regs.y)
            }
            AddressingMode::Indirect | AddressingMode::Implied | AddressingMode::Invalid => 0,
        }
    }

    fn zero_page_indexed<B: Bus + CycleSink>(&mut self, bus: &mut B, index: u8) -> u8 {
        let base = self.fetch(bus);
        self.peek(bus, u16::from(base));
        self.operand_address = u16::from(base.wrapping_add(index));
        self.peek(bus, self.operand_address)
    }

    /// Read the operand, transform it, write it back.
    fn modify<B: Bus + CycleSink>(&mut self, bus: &mut B, op: fn(&mut Self, u8) -> u8) {
        let value = self.read_operand(bus);
        let address = self.operand_address;
        let result = op(self, value);
        Self::poke(bus, address, result);
    }

    /// Resolve the operand address (the 6507 reads it first), then store.
    fn store<B: Bus + CycleSink>(&mut self, bus: &mut B, value: u8) {
        self.read_operand(bus);
        Self::poke(bus, self.operand_address, value);
    }

    // ---- dispatch ----

    fn execute<B: Bus + CycleSink>(
        &mut self,
        bus: &mut B,
        address: u16,
    ) -> Result<(), DecodeError> {
        match self.opcode {
            0x00 => self.brk(bus),

            0x69 | 0x65 | 0x75 | 0x6D | 0x7D | 0x79 | 0x61 | 0x71 => {
                let value = self.read_operand(bus);
                self.adc(value);
            }
            0xE9 | 0xE5 | 0xF5 | 0xED | 0xFD | 0xF9 | 0xE1 | 0xF1 => {
                let value = self.read_operand(bus);
                self.sbc(value);
            }
            0x29 | 0x25 | 0x35 | 0x2D | 0x3D | 0x39 | 0x21 | 0x31 => {
                let value = self.read_operand(bus);
                self.regs.a &= value;
                self.regs.p.update_nz(self.regs.a);
            }
            0x09 | 0x05 | 0x15 | 0x0D | 0x1D | 0x19 | 0x01 | 0x11 => {
                let value = self.read_operand(bus);
                self.regs.a |= value;
                self.regs.p.update_nz(self.regs.a);
            }
            0x49 | 0x45 | 0x55 | 0x4D | 0x5D | 0x59 | 0x41 | 0x51 => {
                let value = self.read_operand(bus);
                self.regs.a ^= value;
                self.regs.p.update_nz(self.regs.a);
            }
            0xC9 | 0xC5 | 0xD5 | 0xCD | 0xDD | 0xD9 | 0xC1 | 0xD1 => {
                let value = self.read_operand(bus);
                self.compare(self.regs.a, value);
            }
            0xE0 | 0xE4 | 0xEC => {
                let value = self.read_operand(bus);
                self.compare(self.regs.x, value);
            }
            0xC0 | 0xC4 | 0xCC => {
                let value = self.read_operand(bus);
                self.compare(self.regs.y, value);
            }
            0x24 | 0x2C => {
                let value = self.read_operand(bus);
                self.regs.p.not_z = self.regs.a & value != 0;
                self.regs.p.n = value & 0x80 != 0;
                self.regs.p.v = value & 0x40 != 0;
            }

            // Loads
            0xA9 | 0xA5 | 0xB5 | 0xAD | 0xBD | 0xB9 | 0xA1 | 0xB1 => {
                self.regs.a = self.read_operand(bus);
                self.regs.p.update_nz(self.regs.a);
            }
            0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE => {
                self.regs.x = self.read_operand(bus);
                self.regs.p.update_nz(self.regs.x);
            }
            0xA0 | 0xA4 | 0xB4 | 0xAC | 0xBC => {
                self.regs.y = self.read_operand(bus);
                self.regs.p.update_nz(self.regs.y);
            }

            // Stores
            0x85 | 0x95 | 0x8D | 0x9D | 0x99 | 0x81 | 0x91 => self.store(bus, self.regs.a),
            0x86 | 0x96 | 0x8E => self.store(bus, self.regs.x),
            0x84 | 0x94 | 0x8C => self.store(bus, self.regs.y),

            // Shifts and increments
            0x0A => self.regs.a = self.asl(self.regs.a),
            0x06 | 0x16 | 0x0E | 0x1E => self.modify(bus, Self::asl),
            0x4A => self.regs.a = self.lsr(self.regs.a),
            0x46 | 0x56 | 0x4E | 0x5E => self.modify(bus, Self::lsr),
            0x2A => self.regs.a = self.rol(self.regs.a),
            0x26 | 0x36 | 0x2E | 0x3E => self.modify(bus, Self::rol),
            0x6A => self.regs.a = self.ror(self.regs.a),
            0x66 | 0x76 | 0x6E | 0x7E => self.modify(bus, Self::ror),
            0xE6 | 0xF6 | 0xEE | 0xFE => self.modify(bus, |cpu, v| {
                let result = v.wrapping_add(1);
                cpu.regs.p.update_nz(result);
                result
            }),
            0xC6 | 0xD6 | 0xCE | 0xDE => self.modify(bus, |cpu, v| {
                let result = v.wrapping_sub(1);
                cpu.regs.p.update_nz(result);
                result
            }),

            // Flags
            0x18 => self.regs.p.c = false,
            0x38 => self.regs.p.c = true,
            0x58 => self.regs.p.i = false,
            0x78 => self.regs.p.i = true,
            0xB8 => self.regs.p.v = false,
            0xD8 => self.regs.p.d = false,
            0xF8 => self.regs.p.d = true,

            // Register transfers and counters
            0xAA => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
            }
            0x8A => {
                self.regs.a = self.regs.x;
                self.regs.p.update_nz(self.regs.a);
            }
            0xA8 => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
            }
            0x98 => {
                self.regs.a = self.regs.y;
                self.regs.p.update_nz(self.regs.a);
            }
            0xCA => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.x);
            }
            0xE8 => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.update_nz(self.regs.x);
            }
            0x88 => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.y);
            }
            0xC8 => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.update_nz(self.regs.y);
            }
            0x9A => self.regs.sp = self.regs.x,
            0xBA => {
                self.regs.x = self.regs.sp;
                self.regs.p.update_nz(self.regs.x);
            }

            // Stack
            0x48 => self.push(bus, self.regs.a),
            0x08 => self.push(bus, self.regs.p.to_byte()),
            0x68 => {
                self.regs.a = self.pull(bus);
                self.regs.p.update_nz(self.regs.a);
            }
            0x28 => self.regs.p = Flags::from_byte(self.pull(bus)),

            // Control flow
            0x4C => {
                let target = self.fetch_word(bus);
                Self::peek_unsignaled(bus, target);
                self.regs.pc = target;
            }
            0x6C => self.jmp_indirect(bus),
            0x20 => self.jsr(bus),
            0x60 => self.rts(bus),
            0x40 => self.rti(bus),
            0x10 => self.branch(bus, !self.regs.p.n),
            0x30 => self.branch(bus, self.regs.p.n),
            0x50 => self.branch(bus, !self.regs.p.v),
            0x70 => self.branch(bus, self.regs.p.v),
            0x90 => self.branch(bus, !self.regs.p.c),
            0xB0 => self.branch(bus, self.regs.p.c),
            0xD0 => self.branch(bus, self.regs.p.not_z),
            0xF0 => self.branch(bus, !self.regs.p.not_z),

            0xEA => {}

            // Undocumented opcodes the console's software is known to use
            0x87 | 0x97 | 0x83 | 0x8F => self.store(bus, self.regs.a & self.regs.x),
            0xA3 | 0xA7 | 0xB3 | 0xAF | 0xB7 | 0xBF => {
                let value = self.read_operand(bus);
                self.regs.a = value;
                self.regs.x = value;
                self.regs.p.update_nz(value);
            }
            0xCB => {
                let value = self.read_operand(bus);
                let difference =
                    u16::from(self.regs.a & self.regs.x).wrapping_sub(u16::from(value));
                self.regs.p.c = difference & 0x100 == 0;
                self.regs.x = difference as u8;
                self.regs.p.update_nz(self.regs.x);
            }
            0x04 | 0x0C | 0x14 | 0x1C | 0x1A | 0x34 | 0x3C | 0x3A | 0x44 | 0x54 | 0x5C | 0x5A
            | 0x64 | 0x74 | 0x7C | 0x7A | 0x80 | 0x82 | 0x89 | 0xC2 | 0xD4 | 0xDC | 0xDA
            | 0xE2 | 0xF4 | 0xFC | 0xFA => {
                self.read_operand(bus);
            }
            0xC3 | 0xC7 | 0xCF | 0xD3 | 0xD7 | 0xDB | 0xDF => self.modify(bus, |cpu, v| {
                let result = v.wrapping_sub(1);
                cpu.compare(cpu.regs.a, result);
                result
            }),
            0xE3 | 0xE7 | 0xEF | 0xF3 | 0xF7 | 0xFB | 0xFF => self.modify(bus, |cpu, v| {
                let result = v.wrapping_add(1);
                cpu.isb(result);
                result
            }),
            0x03 | 0x07 | 0x0F | 0x13 | 0x17 | 0x1B | 0x1F => self.modify(bus, |cpu, v| {
                let result = cpu.asl(v);
                cpu.regs.a |= result;
                cpu.regs.p.update_nz(cpu.regs.a);
                result
            }),
            0x27 | 0x37 | 0x2F | 0x3F | 0x3B | 0x23 | 0x33 => self.modify(bus, |cpu, v| {
                let result = (v << 1) | u8::from(cpu.regs.p.c);
                cpu.regs.a &= result;
                cpu.regs.p.c = v & 0x80 != 0;
                cpu.regs.p.update_nz(cpu.regs.a);
                result
            }),
            0x4B => {
                let value = self.read_operand(bus) & self.regs.a;
                self.regs.p.c = value & 0x01 != 0;
                self.regs.a = value >> 1;
                self.regs.p.update_nz(self.regs.a);
            }

            opcode => return Err(DecodeError::UnknownOpcode { address, opcode }),
        }
        Ok(())
    }

    // ---- control flow ----

    fn brk<B: Bus + CycleSink>(&mut self, bus: &mut B) {
        self.fetch(bus);
        self.regs.p.b = true;
        let [lo, hi] = self.regs.pc.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
        self.push(bus, self.regs.p.to_byte());
        self.regs.p.i = true;
        let lo = self.peek(bus, 0xFFFE);
        let hi = self.peek(bus, 0xFFFF);
        self.regs.pc = u16::from_le_bytes([lo, hi]);
    }

    fn jmp_indirect<B: Bus + CycleSink>(&mut self, bus: &mut B) {
        let pointer = self.fetch_word(bus);
        let lo = self.peek(bus, pointer);
        let hi = self.peek(bus, pointer.wrapping_add(1));
        let target = u16::from_le_bytes([lo, hi]);
        Self::peek_unsignaled(bus, target);
        self.regs.pc = target;
    }

    fn jsr<B: Bus + CycleSink>(&mut self, bus: &mut B) {
        let lo = self.fetch(bus);
        self.peek(bus, self.regs.stack_addr());
        let [ret_lo, ret_hi] = self.regs.pc.to_le_bytes();
        self.push(bus, ret_hi);
        self.push(bus, ret_lo);
        let hi = self.fetch(bus);
        self.regs.pc = u16::from_le_bytes([lo, hi]);
    }

    fn rts<B: Bus + CycleSink>(&mut self, bus: &mut B) {
        self.peek(bus, self.regs.stack_addr());
        let address = self.regs.pop();
        let lo = self.peek(bus, address);
        let address = self.regs.pop();
        let hi = self.peek(bus, address);
        self.regs.pc = u16::from_le_bytes([lo, hi]);
        self.fetch(bus);
    }

    fn rti<B: Bus + CycleSink>(&mut self, bus: &mut B) {
        self.peek(bus, self.regs.stack_addr());
        let address = self.regs.pop();
        let status = self.peek(bus, address);
        self.regs.p = Flags::from_byte(status);
        let address = self.regs.pop();
        let lo = self.peek(bus, address);
        let address = self.regs.pop();
        let hi = self.peek(bus, address);
        self.regs.pc = u16::from_le_bytes([lo, hi]);
    }

    /// Dummy read of the current top of stack, then read the new top.
    fn pull<B: Bus + CycleSink>(&mut self, bus: &mut B) -> u8 {
        self.peek(bus, self.regs.stack_addr());
        let address = self.regs.pop();
        self.peek(bus, address)
    }

    fn branch<B: Bus + CycleSink>(&mut self, bus: &mut B, condition: bool) {
        let offset = self.read_operand(bus) as i8;
        if condition {
            self.peek(bus, self.regs.pc);
            let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
            self.branch_extra = if target & 0xFF00 == self.regs.pc & 0xFF00 { 1 } else { 2 };
            self.regs.pc = target;
        }
    }

    // ---- ALU ----

    fn adc(&mut self, value: u8) {
        let a = self.regs.a;
        let carry = u8::from(self.regs.p.c);
        let binary = u16::from(a) + u16::from(value) + u16::from(carry);

        if self.regs.p.d {
            let sum = u16::from(BCD_TO_BINARY[usize::from(a)])
                + u16::from(BCD_TO_BINARY[usize::from(value)])
                + u16::from(carry);
            self.regs.p.c = sum > 99;
            self.regs.p.not_z = a.wrapping_add(value) != 0;
            self.regs.a = BINARY_TO_BCD[usize::from(sum & 0xFF)];
            self.regs.p.n = self.regs.a & 0x80 != 0;
            self.regs.p.v = (a ^ self.regs.a) & 0x80 != 0 && (self.regs.a ^ value) & 0x80 != 0;
        } else {
            let result = binary as u8;
            self.regs.p.v = (a ^ result) & (value ^ result) & 0x80 != 0;
            self.regs.p.c = binary > 0xFF;
            self.regs.a = result;
            self.regs.p.update_nz(result);
        }
    }

    fn sbc(&mut self, value: u8) {
        let a = self.regs.a;
        if self.regs.p.d {
            self.regs.p.not_z = a.wrapping_add(!value).wrapping_add(u8::from(self.regs.p.c)) != 0;
            self.regs.a = self.decimal_subtract(a, value);
            self.regs.p.n = self.regs.a & 0x80 != 0;
        } else {
            self.binary_subtract(a, value);
            self.regs.p.update_nz(self.regs.a);
        }
    }

    /// The subtract half of `isb`.
    fn isb(&mut self, value: u8) {
        let a = self.regs.a;
        if self.regs.p.d {
            self.regs.a = self.decimal_subtract(a, value);
        } else {
            self.binary_subtract(a, value);
        }
        self.regs.p.update_nz(self.regs.a);
    }

    /// A = A + !value + C, with V and C from the signed/unsigned views.
    fn binary_subtract(&mut self, a: u8, value: u8) {
        let carry = u8::from(self.regs.p.c);
        let signed = i16::from(a as i8) + i16::from(!value as i8) + i16::from(carry);
        self.regs.p.v = !(-128..=127).contains(&signed);
        self.regs.p.c = u16::from(value) + u16::from(1 - carry) <= u16::from(a);
        self.regs.a = a.wrapping_add(!value).wrapping_add(carry);
    }

    /// BCD subtraction through the pack/unpack tables. Sets C and V.
    fn decimal_subtract(&mut self, a: u8, value: u8) -> u8 {
        let borrow = i16::from(!self.regs.p.c);
        let mut difference = i16::from(BCD_TO_BINARY[usize::from(a)])
            - i16::from(BCD_TO_BINARY[usize::from(value)])
            - borrow;
        if difference < 0 {
            difference += 100;
        }
        let result = BINARY_TO_BCD[(difference & 0xFF) as usize];
        self.regs.p.c = i16::from(a) >= i16::from(value) + borrow;
        self.regs.p.v = (a ^ result) & 0x80 != 0 && (result ^ value) & 0x80 != 0;
        result
    }

    fn compare(&mut self, register: u8, value: u8) {
        let difference = u16::from(register).wrapping_sub(u16::from(value));
        self.regs.p.not_z = difference & 0xFF != 0;
        self.regs.p.n = difference & 0x80 != 0;
        self.regs.p.c = difference & 0x100 == 0;
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.regs.p.c = value & 0x80 != 0;
        let result = value << 1;
        self.regs.p.update_nz(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.regs.p.c = value & 0x01 != 0;
        let result = value >> 1;
        self.regs.p.update_nz(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let result = (value << 1) | u8::from(self.regs.p.c);
        self.regs.p.c = value & 0x80 != 0;
        self.regs.p.update_nz(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let result = (value >> 1) | (u8::from(self.regs.p.c) << 7);
        self.regs.p.c = value & 0x01 != 0;
        self.regs.p.update_nz(result);
        result
    }
}

/// Mnemonic of an opcode, for diagnostics.
#[must_use]
pub fn mnemonic(opcode: u8) -> &'static str {
    MNEMONICS[usize::from(opcode)]
}

impl Cpu for Mos6507 {
    type Registers = Registers;
    type Error = DecodeError;

    fn run<B: Bus + CycleSink>(
        &mut self,
        bus: &mut B,
        max_instructions: usize,
    ) -> Result<usize, DecodeError> {
        Mos6507::run(self, bus, max_instructions)
    }

    fn reset<B: Bus + CycleSink>(&mut self, bus: &mut B) {
        Mos6507::reset(self, bus);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }
}

impl Observable for Mos6507 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "sp" => Some(self.regs.sp.into()),
            "p" => Some(self.regs.p.to_byte().into()),
            "flags.n" => Some(self.regs.p.n.into()),
            "flags.v" => Some(self.regs.p.v.into()),
            "flags.b" => Some(self.regs.p.b.into()),
            "flags.d" => Some(self.regs.p.d.into()),
            "flags.i" => Some(self.regs.p.i.into()),
            "flags.z" => Some(self.regs.p.zero().into()),
            "flags.c" => Some(self.regs.p.c.into()),
            "opcode" => Some(self.opcode.into()),
            "mnemonic" => Some(mnemonic(self.opcode).into()),
            "instructions" => Some(u32::try_from(self.instructions).unwrap_or(u32::MAX).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "x",
            "y",
            "sp",
            "p",
            "flags.n",
            "flags.v",
            "flags.b",
            "flags.d",
            "flags.i",
            "flags.z",
            "flags.c",
            "opcode",
            "mnemonic",
            "instructions",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 64 KiB of RAM that counts signalled cycles.
    struct TestBus {
        ram: Vec<u8>,
        cycles: u32,
    }

    impl TestBus {
        fn with_program(program: &[u8]) -> Self {
            let mut ram = vec![0; 0x10000];
            ram[0x1000..0x1000 + program.len()].copy_from_slice(program);
            Self { ram, cycles: 0 }
        }
    }

    impl Bus for TestBus {
        fn read(&mut self, address: u16) -> u8 {
            self.ram[usize::from(address)]
        }

        fn write(&mut self, address: u16, value: u8) {
            self.ram[usize::from(address)] = value;
        }
    }

    impl CycleSink for TestBus {
        fn cycles_elapsed(&mut self, cycles: u32) {
            self.cycles += cycles;
        }

        fn stop_requested(&self) -> bool {
            false
        }
    }

    fn cpu_at(pc: u16) -> Mos6507 {
        let mut cpu = Mos6507::new();
        cpu.regs.pc = pc;
        cpu
    }

    #[test]
    fn test_lda_immediate() {
        let mut bus = TestBus::with_program(&[0xA9, 0x00]);
        let mut cpu = cpu_at(0x1000);
        cpu.regs.a = 0x55;

        assert_eq!(cpu.step(&mut bus), Ok(2));
        assert_eq!(cpu.regs.a, 0);
        assert!(cpu.regs.p.zero());
        assert!(!cpu.regs.p.n);
        assert_eq!(cpu.regs.pc, 0x1002);
        assert_eq!(bus.cycles, 2);
    }

    #[test]
    fn test_adc_overflow() {
        // LDA #$50; ADC #$50
        let mut bus = TestBus::with_program(&[0xA9, 0x50, 0x69, 0x50]);
        let mut cpu = cpu_at(0x1000);
        cpu.run(&mut bus, 2).unwrap();
        assert_eq!(cpu.regs.a, 0xA0);
        assert!(cpu.regs.p.v, "positive + positive = negative sets V");
        assert!(cpu.regs.p.n);
        assert!(!cpu.regs.p.c);
    }

    #[test]
    fn test_sbc_borrow() {
        // SEC; LDA #$10; SBC #$20
        let mut bus = TestBus::with_program(&[0x38, 0xA9, 0x10, 0xE9, 0x20]);
        let mut cpu = cpu_at(0x1000);
        cpu.run(&mut bus, 3).unwrap();
        assert_eq!(cpu.regs.a, 0xF0);
        assert!(!cpu.regs.p.c, "borrow clears carry");
        assert!(cpu.regs.p.n);
    }

    #[test]
    fn test_decimal_adc() {
        // SED; CLC; LDA #$19; ADC #$28
        let mut bus = TestBus::with_program(&[0xF8, 0x18, 0xA9, 0x19, 0x69, 0x28]);
        let mut cpu = cpu_at(0x1000);
        cpu.run(&mut bus, 4).unwrap();
        assert_eq!(cpu.regs.a, 0x47);
        assert!(!cpu.regs.p.c);
    }

    #[test]
    fn test_decimal_adc_carry_out() {
        // SED; SEC; LDA #$99; ADC #$00
        let mut bus = TestBus::with_program(&[0xF8, 0x38, 0xA9, 0x99, 0x69, 0x00]);
        let mut cpu = cpu_at(0x1000);
        cpu.run(&mut bus, 4).unwrap();
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.c);
    }

    #[test]
    fn test_unknown_opcode_reports_address() {
        let mut bus = TestBus::with_program(&[0xEA, 0x02]);
        let mut cpu = cpu_at(0x1000);
        let err = cpu.run(&mut bus, 5).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownOpcode {
                address: 0x1001,
                opcode: 0x02
            }
        );
    }

    #[test]
    fn test_reset_reads_vector() {
        let mut bus = TestBus::with_program(&[]);
        bus.ram[0xFFFC] = 0x00;
        bus.ram[0xFFFD] = 0xF0;
        let mut cpu = Mos6507::new();
        cpu.regs.a = 9;
        cpu.reset(&mut bus);
        assert_eq!(cpu.regs.pc, 0xF000);
        assert_eq!(cpu.regs.a, 0);
        assert_eq!(cpu.regs.sp, 0xFF);
        assert_eq!(bus.cycles, 2, "each vector read costs a cycle");
    }

    #[test]
    fn test_observable_paths() {
        let cpu = cpu_at(0x1234);
        assert_eq!(cpu.query("pc"), Some(Value::U16(0x1234)));
        assert_eq!(cpu.query("flags.z"), Some(Value::Bool(false)));
        assert!(cpu.query("bogus").is_none());
        for path in cpu.query_paths() {
            assert!(cpu.query(path).is_some(), "{path}");
        }
    }
}
