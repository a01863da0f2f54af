//! Instruction behaviour and cycle counts against a flat RAM bus.

use emu_core::{Bus, Cpu, CycleSink};
use mos_6507::{Mos6507, flags};

/// Flat 64KB RAM that records every access in order.
struct TestBus {
    ram: Vec<u8>,
    cycles: u32,
    reads: Vec<(u32, u16)>,
    writes: Vec<(u32, u16, u8)>,
    stop_after: Option<u32>,
}

impl TestBus {
    fn new() -> Self {
        Self {
            ram: vec![0; 0x10000],
            cycles: 0,
            reads: Vec::new(),
            writes: Vec::new(),
            stop_after: None,
        }
    }

    fn load(&mut self, address: u16, data: &[u8]) {
        let start = usize::from(address);
        self.ram[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    fn read(&mut self, address: u16) -> u8 {
        self.reads.push((self.cycles, address));
        self.ram[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.writes.push((self.cycles, address, value));
        self.ram[usize::from(address)] = value;
    }
}

impl CycleSink for TestBus {
    fn cycles_elapsed(&mut self, cycles: u32) {
        self.cycles += cycles;
    }

    fn stop_requested(&self) -> bool {
        self.stop_after.is_some_and(|limit| self.cycles >= limit)
    }
}

/// Load a program at $F000 and set PC there.
fn setup_program(program: &[u8]) -> (Mos6507, TestBus) {
    let mut bus = TestBus::new();
    bus.load(0xF000, program);
    let mut cpu = Mos6507::new();
    cpu.regs.pc = 0xF000;
    (cpu, bus)
}

#[test]
fn test_stack_pha_pla() {
    // LDA #$42; PHA; LDA #$00; PLA
    let (mut cpu, mut bus) = setup_program(&[0xA9, 0x42, 0x48, 0xA9, 0x00, 0x68]);
    cpu.run(&mut bus, 4).unwrap();

    assert_eq!(cpu.regs.a, 0x42, "PLA should restore A");
    assert_eq!(cpu.regs.sp, 0xFF, "SP should be back to $FF after PLA");
    assert_eq!(bus.ram[0x01FF], 0x42);
    assert_eq!(bus.cycles, 2 + 3 + 2 + 4);
}

#[test]
fn test_stack_php_plp() {
    // SEC; PHP; CLC; PLP
    let (mut cpu, mut bus) = setup_program(&[0x38, 0x08, 0x18, 0x28]);
    cpu.run(&mut bus, 4).unwrap();

    assert!(cpu.regs.p.c, "PLP should restore carry flag");
    assert_eq!(bus.ram[0x01FF] & flags::C, flags::C);
    assert_eq!(bus.ram[0x01FF] & flags::U, flags::U);
    assert_eq!(cpu.regs.sp, 0xFF);
}

#[test]
fn test_jsr_rts() {
    // $F000: JSR $F010; LDX #$01
    // $F010: LDY #$02; RTS
    let (mut cpu, mut bus) = setup_program(&[0x20, 0x10, 0xF0, 0xA2, 0x01]);
    bus.load(0xF010, &[0xA0, 0x02, 0x60]);
    cpu.run(&mut bus, 4).unwrap();

    assert_eq!(cpu.regs.x, 0x01);
    assert_eq!(cpu.regs.y, 0x02);
    assert_eq!(cpu.regs.pc, 0xF005);
    assert_eq!(cpu.regs.sp, 0xFF);
    // Return address is the last byte of the JSR.
    assert_eq!(bus.ram[0x01FF], 0xF0);
    assert_eq!(bus.ram[0x01FE], 0x02);
    assert_eq!(bus.cycles, 6 + 2 + 6 + 2);
}

#[test]
fn test_brk_stack_layout() {
    let (mut cpu, mut bus) = setup_program(&[0x00, 0xEA]);
    bus.load(0xFFFE, &[0x00, 0xF8]);
    cpu.run(&mut bus, 1).unwrap();

    assert_eq!(cpu.regs.pc, 0xF800);
    assert!(cpu.regs.p.i);
    assert_eq!(bus.ram[0x01FF], 0xF0, "PC high");
    assert_eq!(bus.ram[0x01FE], 0x02, "PC low skips the padding byte");
    assert_eq!(bus.ram[0x01FD] & flags::B, flags::B);
    assert_eq!(cpu.regs.sp, 0xFC);
    assert_eq!(bus.cycles, 7);
}

#[test]
fn test_rti_restores_status_and_pc() {
    let (mut cpu, mut bus) = setup_program(&[0x40]);
    cpu.regs.sp = 0xFC;
    bus.load(0x01FD, &[flags::C | flags::N, 0x34, 0xF2]);
    cpu.run(&mut bus, 1).unwrap();

    assert_eq!(cpu.regs.pc, 0xF234);
    assert!(cpu.regs.p.c);
    assert!(cpu.regs.p.n);
    assert_eq!(cpu.regs.sp, 0xFF);
    assert_eq!(bus.cycles, 6);
}

#[test]
fn test_beq_taken_across_page() {
    // $F0FD: BEQ +$10 lands on $F10F
    let mut bus = TestBus::new();
    bus.load(0xF0FD, &[0xF0, 0x10]);
    let mut cpu = Mos6507::new();
    cpu.regs.pc = 0xF0FD;
    cpu.regs.p.not_z = false;

    assert_eq!(cpu.step(&mut bus), Ok(4));
    assert_eq!(cpu.regs.pc, 0xF10F);
}

#[test]
fn test_branch_timing() {
    // BNE not taken, BEQ taken same page
    let (mut cpu, mut bus) = setup_program(&[0xD0, 0x10, 0xF0, 0x02]);
    cpu.regs.p.not_z = false;

    assert_eq!(cpu.step(&mut bus), Ok(2));
    assert_eq!(cpu.step(&mut bus), Ok(3));
    assert_eq!(cpu.regs.pc, 0xF006);
}

#[test]
fn test_backward_branch() {
    // $F000: DEX; BNE -3
    let (mut cpu, mut bus) = setup_program(&[0xCA, 0xD0, 0xFD]);
    cpu.regs.x = 3;
    cpu.run(&mut bus, 6).unwrap();

    assert_eq!(cpu.regs.x, 0);
    assert_eq!(cpu.regs.pc, 0xF003);
    // Two taken loops at 2+3, final pass at 2+2.
    assert_eq!(bus.cycles, 5 + 5 + 4);
}

#[test]
fn test_absolute_x_page_cross_penalty() {
    // LDA $F0F0,X with X = $20 crosses into $F1
    let (mut cpu, mut bus) = setup_program(&[0xBD, 0xF0, 0xF0, 0xBD, 0x00, 0xF2]);
    bus.ram[0xF110] = 0x77;
    bus.ram[0xF220] = 0x11;
    cpu.regs.x = 0x20;

    assert_eq!(cpu.step(&mut bus), Ok(5));
    assert_eq!(cpu.regs.a, 0x77);
    assert_eq!(cpu.step(&mut bus), Ok(4));
    assert_eq!(cpu.regs.a, 0x11);
}

#[test]
fn test_indirect_y() {
    // LDA ($80),Y
    let (mut cpu, mut bus) = setup_program(&[0xB1, 0x80]);
    bus.load(0x0080, &[0xFF, 0xF3]);
    bus.ram[0xF401] = 0x5A;
    cpu.regs.y = 2;

    assert_eq!(cpu.step(&mut bus), Ok(6));
    assert_eq!(cpu.regs.a, 0x5A);
}

#[test]
fn test_indirect_x_wraps_in_zero_page() {
    // LDA ($FF,X) with X = 0 reads the pointer from $FF/$00
    let (mut cpu, mut bus) = setup_program(&[0xA1, 0xFF]);
    bus.ram[0x00FF] = 0x00;
    bus.ram[0x0000] = 0xF5;
    bus.ram[0xF500] = 0x99;

    assert_eq!(cpu.step(&mut bus), Ok(6));
    assert_eq!(cpu.regs.a, 0x99);
}

#[test]
fn test_zero_page_x_wraps() {
    // STA $F0,X with X = $20 lands on $10
    let (mut cpu, mut bus) = setup_program(&[0x95, 0xF0]);
    cpu.regs.a = 0xAB;
    cpu.regs.x = 0x20;

    assert_eq!(cpu.step(&mut bus), Ok(4));
    assert_eq!(bus.ram[0x0010], 0xAB);
}

#[test]
fn test_store_reads_target_before_writing() {
    // STA $0085
    let (mut cpu, mut bus) = setup_program(&[0x8D, 0x85, 0x00]);
    cpu.regs.a = 0x3C;
    cpu.step(&mut bus).unwrap();

    assert_eq!(bus.reads.last(), Some(&(4, 0x0085)));
    assert_eq!(bus.writes, vec![(4, 0x0085, 0x3C)]);
    assert_eq!(bus.cycles, 4);
}

#[test]
fn test_reads_see_clock_after_their_cycle() {
    // LDA $80: opcode at cycle 1, operand at 2, data at 3
    let (mut cpu, mut bus) = setup_program(&[0xA5, 0x80]);
    cpu.step(&mut bus).unwrap();

    assert_eq!(bus.reads, vec![(1, 0xF000), (2, 0xF001), (3, 0x0080)]);
}

#[test]
fn test_rmw_writes_once() {
    // INC $80
    let (mut cpu, mut bus) = setup_program(&[0xE6, 0x80]);
    bus.ram[0x80] = 0xFF;

    assert_eq!(cpu.step(&mut bus), Ok(5));
    assert_eq!(bus.ram[0x80], 0x00);
    assert!(cpu.regs.p.zero());
    assert_eq!(bus.writes.len(), 1);
}

#[test]
fn test_jmp_indirect_no_page_wrap_bug() {
    // JMP ($F0FF) reads the high byte from $F100
    let (mut cpu, mut bus) = setup_program(&[0x6C, 0xFF, 0xF0]);
    bus.ram[0xF0FF] = 0x34;
    bus.ram[0xF100] = 0xF2;

    assert_eq!(cpu.step(&mut bus), Ok(5));
    assert_eq!(cpu.regs.pc, 0xF234);
}

#[test]
fn test_jmp_absolute_cycles() {
    let (mut cpu, mut bus) = setup_program(&[0x4C, 0x00, 0xF4]);
    assert_eq!(cpu.step(&mut bus), Ok(3));
    assert_eq!(cpu.regs.pc, 0xF400);
}

#[test]
fn test_compare_sets_carry_and_zero() {
    // LDA #$40; CMP #$40; CPX #$01; CPY #$00
    let (mut cpu, mut bus) = setup_program(&[0xA9, 0x40, 0xC9, 0x40, 0xE0, 0x01, 0xC0, 0x00]);
    cpu.run(&mut bus, 2).unwrap();
    assert!(cpu.regs.p.zero());
    assert!(cpu.regs.p.c);

    cpu.run(&mut bus, 1).unwrap();
    assert!(!cpu.regs.p.c, "X=0 < 1");
    assert!(cpu.regs.p.n);

    cpu.run(&mut bus, 1).unwrap();
    assert!(cpu.regs.p.zero());
    assert!(cpu.regs.p.c);
}

#[test]
fn test_bit_copies_high_bits() {
    // BIT $80
    let (mut cpu, mut bus) = setup_program(&[0x24, 0x80]);
    bus.ram[0x80] = 0xC0;
    cpu.regs.a = 0x01;
    cpu.step(&mut bus).unwrap();

    assert!(cpu.regs.p.n);
    assert!(cpu.regs.p.v);
    assert!(cpu.regs.p.zero());
}

#[test]
fn test_rotates_through_carry() {
    // SEC; ROL A; ROR $80
    let (mut cpu, mut bus) = setup_program(&[0x38, 0x2A, 0x66, 0x80]);
    cpu.regs.a = 0x80;
    bus.ram[0x80] = 0x01;
    cpu.run(&mut bus, 3).unwrap();

    assert_eq!(cpu.regs.a, 0x01);
    assert_eq!(bus.ram[0x80], 0x80, "carry from ROL rotates in");
    assert!(cpu.regs.p.c, "bit 0 rotated out");
}

#[test]
fn test_decimal_sbc() {
    // SED; SEC; LDA #$42; SBC #$13
    let (mut cpu, mut bus) = setup_program(&[0xF8, 0x38, 0xA9, 0x42, 0xE9, 0x13]);
    cpu.run(&mut bus, 4).unwrap();
    assert_eq!(cpu.regs.a, 0x29);
    assert!(cpu.regs.p.c);

    // SEC; LDA #$00; SBC #$01 wraps to 99 with borrow
    let (mut cpu, mut bus) = setup_program(&[0xF8, 0x38, 0xA9, 0x00, 0xE9, 0x01]);
    cpu.run(&mut bus, 4).unwrap();
    assert_eq!(cpu.regs.a, 0x99);
    assert!(!cpu.regs.p.c);
}

#[test]
fn test_lax_and_sax() {
    // LAX $80; SAX $81
    let (mut cpu, mut bus) = setup_program(&[0xA7, 0x80, 0x87, 0x81]);
    bus.ram[0x80] = 0x0F;
    cpu.run(&mut bus, 1).unwrap();
    assert_eq!((cpu.regs.a, cpu.regs.x), (0x0F, 0x0F));

    cpu.regs.x = 0x3C;
    cpu.run(&mut bus, 1).unwrap();
    assert_eq!(bus.ram[0x81], 0x0C);
}

#[test]
fn test_dcp_decrements_then_compares() {
    // DCP $80
    let (mut cpu, mut bus) = setup_program(&[0xC7, 0x80]);
    bus.ram[0x80] = 0x11;
    cpu.regs.a = 0x10;

    assert_eq!(cpu.step(&mut bus), Ok(5));
    assert_eq!(bus.ram[0x80], 0x10);
    assert!(cpu.regs.p.zero());
    assert!(cpu.regs.p.c);
}

#[test]
fn test_isb_increments_then_subtracts() {
    // SEC; ISB $80
    let (mut cpu, mut bus) = setup_program(&[0x38, 0xE7, 0x80]);
    bus.ram[0x80] = 0x04;
    cpu.regs.a = 0x10;
    cpu.run(&mut bus, 2).unwrap();

    assert_eq!(bus.ram[0x80], 0x05);
    assert_eq!(cpu.regs.a, 0x0B);
    assert!(cpu.regs.p.c);
}

#[test]
fn test_slo_and_rla() {
    // SLO $80; RLA $81
    let (mut cpu, mut bus) = setup_program(&[0x07, 0x80, 0x27, 0x81]);
    bus.ram[0x80] = 0x81;
    bus.ram[0x81] = 0x40;
    cpu.regs.a = 0x10;

    cpu.run(&mut bus, 1).unwrap();
    assert_eq!(bus.ram[0x80], 0x02);
    assert_eq!(cpu.regs.a, 0x12);
    assert!(cpu.regs.p.c);

    cpu.run(&mut bus, 1).unwrap();
    assert_eq!(bus.ram[0x81], 0x81, "carry rotates into bit 0");
    assert_eq!(cpu.regs.a, 0x00);
    assert!(!cpu.regs.p.c);
    assert!(cpu.regs.p.zero());
}

#[test]
fn test_asr_and_sbx() {
    // LDA #$FF; ASR #$0F; LDX #$0F; SBX #$02
    let (mut cpu, mut bus) = setup_program(&[0xA9, 0xFF, 0x4B, 0x0F, 0xA2, 0x0F, 0xCB, 0x02]);
    cpu.run(&mut bus, 2).unwrap();
    assert_eq!(cpu.regs.a, 0x07);
    assert!(cpu.regs.p.c);

    cpu.run(&mut bus, 2).unwrap();
    assert_eq!(cpu.regs.x, 0x05);
    assert!(cpu.regs.p.c);
}

#[test]
fn test_undocumented_nops_consume_operands() {
    // NOP $80; NOP $F000,X; NOP #$00; NOP (implied)
    let (mut cpu, mut bus) = setup_program(&[0x04, 0x80, 0x1C, 0x00, 0xF0, 0x80, 0x00, 0x1A]);
    cpu.run(&mut bus, 4).unwrap();
    assert_eq!(cpu.regs.pc, 0xF008);
    assert_eq!(bus.cycles, 3 + 4 + 2 + 2);
}

#[test]
fn test_run_stops_after_instruction_when_requested() {
    // Four NOPs; the sink asks to stop once 3 cycles have passed.
    let (mut cpu, mut bus) = setup_program(&[0xEA, 0xEA, 0xEA, 0xEA]);
    bus.stop_after = Some(3);

    assert_eq!(cpu.run(&mut bus, 10), Ok(2));
    assert_eq!(cpu.regs.pc, 0xF002);
    assert_eq!(bus.cycles, 4);
}

#[test]
fn test_run_counts_failed_instruction() {
    let (mut cpu, mut bus) = setup_program(&[0xEA, 0x12]);
    assert!(cpu.run(&mut bus, 10).is_err());
    assert_eq!(cpu.instructions(), 1);
}

#[test]
fn test_reset_through_trait() {
    let mut bus = TestBus::new();
    bus.load(0xFFFC, &[0x00, 0xF0]);
    let mut cpu = Mos6507::new();
    Cpu::reset(&mut cpu, &mut bus);
    assert_eq!(Cpu::pc(&cpu), 0xF000);
    assert_eq!(cpu.registers().sp, 0xFF);
}
