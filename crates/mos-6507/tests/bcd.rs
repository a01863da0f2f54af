//! Decimal-mode arithmetic properties.

use emu_core::{Bus, CycleSink};
use mos_6507::Mos6507;
use mos_6507::tables::{BCD_TO_BINARY, BINARY_TO_BCD};
use quickcheck::quickcheck;

struct Ram(Vec<u8>);

impl Bus for Ram {
    fn read(&mut self, address: u16) -> u8 {
        self.0[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.0[usize::from(address)] = value;
    }
}

impl CycleSink for Ram {
    fn cycles_elapsed(&mut self, _cycles: u32) {}

    fn stop_requested(&self) -> bool {
        false
    }
}

/// Run `SED; CLC/SEC; LDA #a; <op> #b` and return (A, C).
fn decimal(op: u8, a: u8, b: u8, carry: bool) -> (u8, bool) {
    let mut ram = Ram(vec![0; 0x10000]);
    let program = [0xF8, if carry { 0x38 } else { 0x18 }, 0xA9, a, op, b];
    ram.0[0xF000..0xF006].copy_from_slice(&program);
    let mut cpu = Mos6507::new();
    cpu.regs.pc = 0xF000;
    cpu.run(&mut ram, 4).unwrap();
    (cpu.regs.a, cpu.regs.p.c)
}

fn to_bcd(n: u8) -> u8 {
    BINARY_TO_BCD[usize::from(n % 100)]
}

quickcheck! {
    fn bcd_tables_invert(n: u8) -> bool {
        let n = n % 100;
        BCD_TO_BINARY[usize::from(BINARY_TO_BCD[usize::from(n)])] == n
    }

    fn decimal_adc_matches_base_ten(a: u8, b: u8, carry: bool) -> bool {
        let (a, b) = (a % 100, b % 100);
        let sum = u16::from(a) + u16::from(b) + u16::from(carry);
        let (result, carry_out) = decimal(0x69, to_bcd(a), to_bcd(b), carry);
        result == to_bcd((sum % 100) as u8) && carry_out == (sum > 99)
    }

    fn decimal_sbc_matches_base_ten(a: u8, b: u8, carry: bool) -> bool {
        let (a, b) = (a % 100, b % 100);
        let difference = i16::from(a) - i16::from(b) - i16::from(!carry);
        let (result, carry_out) = decimal(0xE9, to_bcd(a), to_bcd(b), carry);
        result == to_bcd(difference.rem_euclid(100) as u8) && carry_out == (difference >= 0)
    }
}
