//! Whole-console tests with hand-assembled cartridges.

use emu_atari_2600::{
    AudioLog, ConsoleSwitch, FrameStatus, JoystickInput, Machine, MachineConfig, TvStandard,
    capture,
};
use emu_core::{Jack, Observable, Value};

/// Place `code` at 0xF000 of a 4K image with the reset vector pointing at it.
fn rom_4k(code: &[u8]) -> Vec<u8> {
    let mut rom = vec![0xEA; 4096];
    rom[..code.len()].copy_from_slice(code);
    rom[0xFFC] = 0x00;
    rom[0xFFD] = 0xF0;
    rom
}

fn ntsc() -> MachineConfig {
    MachineConfig {
        tv: Some(TvStandard::Ntsc),
        display_height: Some(192),
        y_start: Some(37),
        seed: Some(2600),
        hmove_blanks: true,
    }
}

/// A standard NTSC kernel: 3 lines VSYNC, 37 VBLANK, 192 visible with the
/// background set to 0x44, 30 overscan.
fn kernel() -> Vec<u8> {
    rom_4k(&[
        0x78, //             F000 SEI
        0xD8, //             F001 CLD
        0xA2, 0xFF, //       F002 LDX #$FF
        0x9A, //             F004 TXS
        0xA9, 0x02, //       F005 frame: LDA #2
        0x85, 0x01, //       F007 STA VBLANK
        0x85, 0x00, //       F009 STA VSYNC
        0x85, 0x02, //       F00B STA WSYNC
        0x85, 0x02, //       F00D STA WSYNC
        0x85, 0x02, //       F00F STA WSYNC
        0xA9, 0x00, //       F011 LDA #0
        0x85, 0x00, //       F013 STA VSYNC
        0xA2, 37, //         F015 LDX #37
        0x85, 0x02, //       F017 vb: STA WSYNC
        0xCA, //             F019 DEX
        0xD0, 0xFB, //       F01A BNE vb
        0xA9, 0x44, //       F01C LDA #$44
        0x85, 0x09, //       F01E STA COLUBK
        0xA9, 0x00, //       F020 LDA #0
        0x85, 0x01, //       F022 STA VBLANK
        0xA2, 192, //        F024 LDX #192
        0x85, 0x02, //       F026 vis: STA WSYNC
        0xCA, //             F028 DEX
        0xD0, 0xFB, //       F029 BNE vis
        0xA9, 0x02, //       F02B LDA #2
        0x85, 0x01, //       F02D STA VBLANK
        0xA2, 30, //         F02F LDX #30
        0x85, 0x02, //       F031 os: STA WSYNC
        0xCA, //             F033 DEX
        0xD0, 0xFB, //       F034 BNE os
        0x4C, 0x05, 0xF0, // F036 JMP frame
    ])
}

#[test]
fn kernel_draws_262_line_frames() {
    let mut machine = Machine::new(&ntsc());
    machine.insert_cartridge(&kernel()).expect("4K image");
    for _ in 0..4 {
        assert_eq!(machine.process_frame().expect("runs"), FrameStatus::Complete);
    }
    let lines = machine.bus().tia().last_frame_scanlines();
    assert!((261..=263).contains(&lines), "{lines} scanlines");

    let row = &machine.frame_buffer()[100 * 160..101 * 160];
    assert!(row.iter().all(|&c| c == 0x44), "visible line shows background");

    let rgb = machine.rgb_frame();
    assert_eq!(rgb.len(), 160 * 192);
    assert_eq!(rgb[100 * 160], TvStandard::Ntsc.palette()[0x44 >> 1]);
}

#[test]
fn detection_finds_ntsc_and_visible_window() {
    let mut machine = Machine::new(&MachineConfig {
        seed: Some(1),
        ..MachineConfig::default()
    });
    machine.insert_cartridge(&kernel()).expect("4K image");
    assert_eq!(machine.tv(), TvStandard::Ntsc);
    let height = machine.display_height();
    assert!((190..=194).contains(&height), "height {height}");
    let y_start = machine.y_start();
    assert!((35..=40).contains(&y_start), "y_start {y_start}");
}

#[test]
fn f8_switches_bank_under_program_control() {
    let mut rom = vec![0xEA; 8192];
    // Bank 1 (power-on): read the bank 0 hotspot, then fall into bank 0.
    let bank1 = [
        0xAD, 0xF8, 0x1F, // F000 LDA $1FF8
        0xA9, 0xA5, //       F003 LDA #$A5
        0x85, 0x80, //       F005 STA $80
        0x4C, 0x07, 0xF0, // F007 JMP F007
    ];
    let bank0 = [
        0xEA, 0xEA, 0xEA, // F000 (not reached)
        0xA9, 0x5A, //       F003 LDA #$5A
        0x85, 0x80, //       F005 STA $80
        0x4C, 0x07, 0xF0, // F007 JMP F007
    ];
    rom[..bank0.len()].copy_from_slice(&bank0);
    rom[4096..4096 + bank1.len()].copy_from_slice(&bank1);
    for bank in [0, 4096] {
        rom[bank + 0xFFC] = 0x00;
        rom[bank + 0xFFD] = 0xF0;
    }

    let mut machine = Machine::new(&ntsc());
    machine.insert_cartridge(&rom).expect("8K image");
    assert_eq!(machine.query("cartridge.bank"), Some(Value::U8(1)));

    assert_eq!(machine.process_frame().expect("runs"), FrameStatus::Overrun);
    assert_eq!(machine.bus().peek(0x80), Some(0x5A));
    assert_eq!(machine.query("cartridge.bank"), Some(Value::U8(0)));
}

#[test]
fn program_reads_fire_button_and_switches() {
    let rom = rom_4k(&[
        0xA5, 0x0C, //       F000 LDA INPT4
        0x85, 0x81, //       F002 STA $81
        0xAD, 0x82, 0x02, // F004 LDA SWCHB
        0x85, 0x82, //       F007 STA $82
        0xAD, 0x80, 0x02, // F009 LDA SWCHA
        0x85, 0x83, //       F00C STA $83
        0x4C, 0x0E, 0xF0, // F00E JMP F00E
    ]);
    let mut machine = Machine::new(&ntsc());
    machine.insert_cartridge(&rom).expect("4K image");
    machine
        .controllers_mut()
        .jack_mut(Jack::Left)
        .set_joystick(JoystickInput::Fire, true);
    machine
        .controllers_mut()
        .jack_mut(Jack::Left)
        .set_joystick(JoystickInput::Up, true);
    machine.switches_mut().set(ConsoleSwitch::Select, true);
    machine.process_frame().expect("runs");

    let inpt4 = machine.bus().peek(0x81).expect("RAM");
    assert_eq!(inpt4 & 0x80, 0, "pressed button reads low");
    assert_eq!(machine.bus().peek(0x82), Some(0xFD));
    // Left stick up is bit 4 of SWCHA.
    assert_eq!(machine.bus().peek(0x83), Some(0xEF));
}

#[test]
fn runaway_program_hits_scanline_ceiling() {
    let rom = rom_4k(&[
        0x85, 0x02, //       F000 STA WSYNC
        0x4C, 0x00, 0xF0, // F002 JMP F000
    ]);
    let mut machine = Machine::new(&ntsc());
    machine.insert_cartridge(&rom).expect("4K image");
    assert_eq!(machine.process_frame().expect("runs"), FrameStatus::Overrun);
    assert!(machine.bus().tia().scanline_overrun());
    assert_eq!(machine.query("tia.frame.overrun"), Some(Value::Bool(true)));
}

#[test]
fn audio_writes_reach_the_log() {
    let rom = rom_4k(&[
        0xA9, 0x0F, //       F000 LDA #15
        0x85, 0x19, //       F002 STA AUDV0
        0xA9, 0x04, //       F004 LDA #4
        0x85, 0x15, //       F006 STA AUDC0
        0x85, 0x02, //       F008 STA WSYNC
        0x4C, 0x08, 0xF0, // F00A JMP F008
    ]);
    let mut machine = Machine::new(&ntsc());
    machine.insert_cartridge(&rom).expect("4K image");
    let log = AudioLog::new();
    machine.set_audio_sink(Box::new(log.clone()));
    machine.process_frame().expect("runs");

    let writes = log.drain();
    assert_eq!(writes.len(), 2);
    assert_eq!((writes[0].register, writes[0].value), (0x19, 0x0F));
    assert_eq!((writes[1].register, writes[1].value), (0x15, 0x04));
    assert!(writes[0].cycle < writes[1].cycle);
}

#[test]
fn screenshot_is_written() {
    let mut machine = Machine::new(&ntsc());
    machine.insert_cartridge(&kernel()).expect("4K image");
    machine.run_frames(3).expect("runs");

    let path = std::env::temp_dir().join(format!("emu2600-{}.png", std::process::id()));
    capture::save_screenshot(&machine, &path).expect("write PNG");
    let bytes = std::fs::read(&path).expect("read back");
    std::fs::remove_file(&path).ok();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}
