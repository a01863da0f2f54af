//! The TIA proper: register file, beam catch-up and frame bookkeeping.

use std::rc::Rc;

use emu_core::{
    AddressSpace, AnalogPin, Device, DeviceId, DigitalPin, Jack, Observable, PAGE_COUNT,
    PAGE_SHIFT, PageBinding, RESISTANCE_MAX, RESISTANCE_MIN, Value,
};

use crate::audio::AudioSink;
use crate::masks::{MaskDescriptor, MaskTables, ResetTiming};
use crate::registers::{object, read, write};
use crate::tables::{
    COLLISION_TABLE, COMPLETE_MOTION, HMOVE_BLANK_ENABLE, PLAYFIELD_DELAY, PLAYFIELD_MASK,
    POKE_DELAY, PRIORITY_ENCODER, REFLECT, collision_bits,
};
use crate::video::{FRAME_HEIGHT_MAX, FRAME_HEIGHT_MIN, FrameBuffers};
use crate::{CLOCKS_PER_CPU_CYCLE, CLOCKS_PER_LINE_BLANK, CLOCKS_PER_LINE_TOTAL, CYCLES_PER_LINE};

const VISIBLE: i64 = crate::CLOCKS_PER_LINE_VISIBLE;

/// Colour clock at which the HMOVE blank ends: eight pixels into the line.
const HMOVE_BLANK_END: i64 = CLOCKS_PER_LINE_BLANK + 8;

/// VSYNC finish clock while no sync is in progress.
const VSYNC_IDLE: i64 = 0x7FFF_FFFF;

/// Missile 0 displacement per line while the star-field glitch runs.
const COSMIC_MOVEMENT: [i32; 4] = [18, 33, 0, 17];

/// What the TIA needs from the system around it on each access.
pub trait TiaContext {
    /// Processor cycles since the last counter reset.
    fn cycles(&self) -> u32;

    /// Stall the processor (WSYNC).
    fn add_cycles(&mut self, cycles: u32);

    /// Last value seen on the data bus; undriven read bits float to it.
    fn data_bus(&self) -> u8;

    /// Ask the processor to stop after the current instruction.
    fn stop_cpu(&mut self);

    /// Whether the processor's previous bus access was a read.
    fn last_access_was_read(&self) -> bool;

    fn digital(&self, jack: Jack, pin: DigitalPin) -> bool;

    fn resistance(&self, jack: Jack, pin: AnalogPin) -> u32;

    fn audio(&mut self) -> &mut dyn AudioSink;
}

/// Display window and format-dependent behaviour, applied at reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    /// First scanline copied into the frame buffer.
    pub y_start: u16,
    /// Scanlines copied into the frame buffer.
    pub height: u16,
    /// A frame running past this many scanlines without VSYNC is cut off.
    pub scanline_ceiling: u16,
    /// PAL colour loss: odd-length frames drop the chroma of the next.
    pub color_loss: bool,
    /// Whether early HMOVEs blank the left edge of the line.
    pub hmove_blanks: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            y_start: 34,
            height: 210,
            scanline_ceiling: 290,
            color_loss: false,
            hmove_blanks: true,
        }
    }
}

/// Television Interface Adapter.
pub struct Tia {
    masks: Rc<MaskTables>,
    settings: VideoSettings,
    video: FrameBuffers,

    /// Stored write registers, indexed by address.
    regs: [u8; write::COUNT],

    // Beam bookkeeping, in colour clocks relative to the current cycle origin.
    frame_pointer: usize,
    clock_when_frame_started: i64,
    clock_start_display: i64,
    clock_stop_display: i64,
    clock_at_last_update: i64,
    clocks_to_end_of_line: i64,
    vsync_finish_clock: i64,
    last_hmove_clock: i64,

    current_scanline: i64,
    last_frame_scanlines: i64,
    frames: u64,
    partial_frame: bool,
    scanline_overrun: bool,

    // Picture height detection.
    vsync_on: i64,
    vblank_on: i64,
    vblank_off: i64,
    detected_y_start: i64,
    detected_y_stop: i64,

    enabled_objects: u8,
    priority_score: u8,
    /// `PF0 >> 4 | PF1 << 4 | PF2 << 12`.
    playfield: u32,
    collision: u16,

    pos_p: [u8; 2],
    pos_m: [u8; 2],
    pos_bl: u8,
    p_mask: [MaskDescriptor; 2],
    /// `None` while the star-field glitch hides missile 0.
    m_mask: [Option<MaskDescriptor>; 2],
    bl_mask: MaskDescriptor,

    /// Player graphics after vertical delay and reflection.
    current_grp: [u8; 2],
    /// Vertically delayed GRP0/GRP1.
    dgrp: [u8; 2],
    /// Vertically delayed ENABL.
    denabl: bool,

    hmove_blank_enabled: bool,
    cosmic_enabled: bool,
    cosmic_counter: u8,

    dump_enabled: bool,
    dump_disabled_cycle: i64,
}

impl Tia {
    /// A TIA with its own mask tables.
    #[must_use]
    pub fn new(settings: VideoSettings) -> Self {
        Self::with_tables(Rc::new(MaskTables::new()), settings)
    }

    /// A TIA sharing already-built mask tables.
    #[must_use]
    pub fn with_tables(masks: Rc<MaskTables>, settings: VideoSettings) -> Self {
        Self {
            masks,
            settings: clamp_settings(settings),
            video: FrameBuffers::new(),
            regs: [0; write::COUNT],
            frame_pointer: 0,
            clock_when_frame_started: 0,
            clock_start_display: 0,
            clock_stop_display: 0,
            clock_at_last_update: 0,
            clocks_to_end_of_line: CLOCKS_PER_LINE_TOTAL,
            vsync_finish_clock: VSYNC_IDLE,
            last_hmove_clock: 0,
            current_scanline: 0,
            last_frame_scanlines: 0,
            frames: 0,
            partial_frame: false,
            scanline_overrun: false,
            vsync_on: -1,
            vblank_on: 0,
            vblank_off: 0,
            detected_y_start: 0,
            detected_y_stop: 0,
            enabled_objects: 0,
            priority_score: 0,
            playfield: 0,
            collision: 0,
            pos_p: [0; 2],
            pos_m: [0; 2],
            pos_bl: 0,
            p_mask: [MaskDescriptor::default(); 2],
            m_mask: [Some(MaskDescriptor::default()); 2],
            bl_mask: MaskDescriptor::default(),
            current_grp: [0; 2],
            dgrp: [0; 2],
            denabl: false,
            hmove_blank_enabled: false,
            cosmic_enabled: false,
            cosmic_counter: 0,
            dump_enabled: false,
            dump_disabled_cycle: 0,
        }
    }

    #[must_use]
    pub fn settings(&self) -> VideoSettings {
        self.settings
    }

    /// Replace the display settings. They take effect at the next reset.
    pub fn set_settings(&mut self, settings: VideoSettings) {
        self.settings = clamp_settings(settings);
    }

    /// The frame being drawn, or the one just completed once
    /// [`finish_frame`](Self::finish_frame) returns true. One colour
    /// register value per pixel, 160 wide.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        self.video.current()
    }

    /// The frame before [`frame_buffer`](Self::frame_buffer).
    #[must_use]
    pub fn previous_frame(&self) -> &[u8] {
        self.video.previous()
    }

    /// Scanlines since the frame started, at processor cycle `cycles`.
    #[must_use]
    pub fn scanlines(&self, cycles: u32) -> i64 {
        self.scanline_at(clock_of(cycles))
    }

    /// Colour clocks into the current scanline at processor cycle `cycles`.
    #[must_use]
    pub fn line_clock(&self, cycles: u32) -> i64 {
        self.line_clock_at(clock_of(cycles))
    }

    /// True between [`begin_frame`](Self::begin_frame) and the VSYNC (or
    /// scanline ceiling) that ends the frame.
    #[must_use]
    pub fn partial_frame(&self) -> bool {
        self.partial_frame
    }

    /// Whether the frame in progress (or just finished) was cut off at the
    /// scanline ceiling rather than ended by VSYNC.
    #[must_use]
    pub fn scanline_overrun(&self) -> bool {
        self.scanline_overrun
    }

    /// Scanline count of the last completed frame.
    #[must_use]
    pub fn last_frame_scanlines(&self) -> i64 {
        self.last_frame_scanlines
    }

    /// Completed frames since power-on.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Scanline on which VSYNC was last raised, or -1 if never.
    #[must_use]
    pub fn vsync_on(&self) -> i64 {
        self.vsync_on
    }

    /// First picture line inferred from VBLANK, relative to VSYNC.
    #[must_use]
    pub fn detected_y_start(&self) -> i64 {
        self.detected_y_start
    }

    #[must_use]
    pub fn detected_y_stop(&self) -> i64 {
        self.detected_y_stop
    }

    /// The 15 collision latches.
    #[must_use]
    pub fn collisions(&self) -> u16 {
        self.collision
    }

    /// Stored value of write register `address & 0x3F`, if it is one.
    #[must_use]
    pub fn register(&self, address: u8) -> Option<u8> {
        self.regs.get(usize::from(address & 0x3F)).copied()
    }

    /// Start a new frame. Call after the system cycle counter has been
    /// reset, with `carry` = [`line_clock`](Self::line_clock) taken just
    /// before the reset so that the beam keeps its place in the line.
    pub fn begin_frame(&mut self, carry: i64) {
        self.video.swap();
        self.clock_when_frame_started = -carry;
        self.place_display_window();
        self.clock_at_last_update = self.clock_start_display;
        self.clocks_to_end_of_line = CLOCKS_PER_LINE_TOTAL;
        self.frame_pointer = 0;
        self.scanline_overrun = false;

        if self.settings.color_loss {
            let odd = self.last_frame_scanlines & 1 != 0;
            for reg in [write::COLUP0, write::COLUP1, write::COLUPF, write::COLUBK] {
                let value = &mut self.regs[usize::from(reg)];
                *value = if odd { *value | 0x01 } else { *value & 0xFE };
            }
        }
        self.partial_frame = true;
    }

    /// Record where the beam is after an execution slice. Returns true if
    /// the frame is complete.
    pub fn finish_frame(&mut self, cycles: u32) -> bool {
        self.current_scanline = self.scanlines(cycles);
        if self.partial_frame {
            return false;
        }
        self.last_frame_scanlines = self.current_scanline;
        self.frames += 1;
        true
    }

    fn power_on(&mut self, cycles: u32) {
        self.regs = [0; write::COUNT];
        self.enabled_objects = 0;
        self.priority_score = 0;
        self.playfield = 0;
        self.dgrp = [0; 2];
        self.denabl = false;
        self.collision = 0;
        self.pos_p = [0; 2];
        self.pos_m = [0; 2];
        self.pos_bl = 0;
        self.current_grp = [0; 2];
        self.p_mask = [MaskDescriptor::default(); 2];
        self.m_mask = [Some(MaskDescriptor::default()); 2];
        self.bl_mask = MaskDescriptor::default();
        self.last_hmove_clock = 0;
        self.hmove_blank_enabled = false;
        self.cosmic_enabled = false;
        self.cosmic_counter = 0;
        self.dump_enabled = false;
        self.dump_disabled_cycle = 0;
        self.vblank_off = 0;
        self.vblank_on = 0;
        self.vsync_on = -1;
        self.detected_y_start = 0;
        self.detected_y_stop = 0;
        self.scanline_overrun = false;
        self.partial_frame = false;
        self.frame_reset(cycles);
    }

    fn frame_reset(&mut self, cycles: u32) {
        self.video.clear();
        self.frame_pointer = 0;
        self.clock_when_frame_started = clock_of(cycles);
        self.place_display_window();
        self.clock_at_last_update = self.clock_when_frame_started;
        self.clocks_to_end_of_line = CLOCKS_PER_LINE_TOTAL;
        self.vsync_finish_clock = VSYNC_IDLE;
        self.last_frame_scanlines = 0;
        self.current_scanline = 0;
    }

    fn place_display_window(&mut self) {
        let y_start = i64::from(self.settings.y_start);
        let height = i64::from(self.settings.height);
        self.clock_start_display = self.clock_when_frame_started + CLOCKS_PER_LINE_TOTAL * y_start;
        self.clock_stop_display =
            self.clock_when_frame_started + CLOCKS_PER_LINE_TOTAL * (y_start + height);
    }

    fn scanline_at(&self, clock: i64) -> i64 {
        (clock - self.clock_when_frame_started).div_euclid(CLOCKS_PER_LINE_TOTAL)
    }

    fn line_clock_at(&self, clock: i64) -> i64 {
        (clock - self.clock_when_frame_started).rem_euclid(CLOCKS_PER_LINE_TOTAL)
    }

    // ---------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------

    /// Draw everything between the last update and `clock`.
    fn update_frame(&mut self, clock: i64) {
        if clock < self.clock_start_display
            || clock <= self.clock_at_last_update
            || self.clock_at_last_update >= self.clock_stop_display
        {
            return;
        }
        let clock = clock.min(self.clock_stop_display);

        loop {
            let mut from_line_start = CLOCKS_PER_LINE_TOTAL - self.clocks_to_end_of_line;
            let mut count;
            if clock > self.clock_at_last_update + self.clocks_to_end_of_line {
                count = self.clocks_to_end_of_line;
                self.clocks_to_end_of_line = CLOCKS_PER_LINE_TOTAL;
                self.clock_at_last_update += count;
            } else {
                count = clock - self.clock_at_last_update;
                self.clocks_to_end_of_line -= count;
                self.clock_at_last_update = clock;
            }

            if from_line_start < CLOCKS_PER_LINE_BLANK {
                let skipped = (CLOCKS_PER_LINE_BLANK - from_line_start).min(count);
                from_line_start += skipped;
                count -= skipped;
            }

            let segment_start = self.frame_pointer;
            if count > 0 {
                self.render_segment(
                    count as usize,
                    (from_line_start - CLOCKS_PER_LINE_BLANK) as usize,
                );
            }

            if self.hmove_blank_enabled && from_line_start < HMOVE_BLANK_END {
                let blanks = (HMOVE_BLANK_END - from_line_start).min(count);
                self.video.fill(segment_start, blanks as usize, 0);
                if count + from_line_start >= HMOVE_BLANK_END {
                    self.hmove_blank_enabled = false;
                }
            }

            if self.clocks_to_end_of_line == CLOCKS_PER_LINE_TOTAL {
                self.end_of_line();
            }

            if self.clock_at_last_update >= clock {
                break;
            }
        }
    }

    /// Composite `count` pixels starting at visible column `hpos`.
    fn render_segment(&mut self, count: usize, hpos: usize) {
        debug_assert!(hpos + count <= VISIBLE as usize);
        let start = self.frame_pointer;
        self.frame_pointer += count;

        if self.regs[usize::from(write::VBLANK)] & 0x02 != 0 {
            self.video.fill(start, count, 0);
            return;
        }

        let objects = self.enabled_objects;
        let reflected = usize::from(self.regs[usize::from(write::CTRLPF)] & 0x01);
        let masks = Rc::clone(&self.masks);

        for i in 0..count {
            let x = hpos + i;
            let mut on = 0;
            if objects & object::PF != 0 && self.playfield & PLAYFIELD_MASK[reflected][x] != 0 {
                on |= object::PF;
            }
            if objects & object::BL != 0 && masks.ball(self.bl_mask, x) {
                on |= object::BL;
            }
            if objects & object::P1 != 0
                && self.current_grp[1] & masks.player(self.p_mask[1], x) != 0
            {
                on |= object::P1;
            }
            if objects & object::M1 != 0 && self.m_mask[1].is_some_and(|m| masks.missile(m, x)) {
                on |= object::M1;
            }
            if objects & object::P0 != 0
                && self.current_grp[0] & masks.player(self.p_mask[0], x) != 0
            {
                on |= object::P0;
            }
            if objects & object::M0 != 0 && self.m_mask[0].is_some_and(|m| masks.missile(m, x)) {
                on |= object::M0;
            }

            self.collision |= COLLISION_TABLE[usize::from(on)];
            let half = usize::from(x >= 80);
            let color = self.color(PRIORITY_ENCODER[half][usize::from(on | self.priority_score)]);
            self.video.set(start + i, color);
        }
    }

    fn color(&self, index: u8) -> u8 {
        let reg = match index {
            0 => write::COLUBK,
            1 => write::COLUPF,
            2 => write::COLUP0,
            _ => write::COLUP1,
        };
        self.regs[usize::from(reg)]
    }

    fn end_of_line(&mut self) {
        for which in 0..2 {
            self.p_mask[which] =
                MaskDescriptor::player(self.pos_p[which], false, self.nusiz(which));
        }
        if self.cosmic_enabled {
            self.emulate_cosmic_bug();
        }
    }

    /// Missile 0 after an HMM0 7x to 6x change right behind HMOVE: it
    /// keeps moving every line, and is stretched, hidden then normal in turn.
    fn emulate_cosmic_bug(&mut self) {
        self.cosmic_counter = (self.cosmic_counter + 1) & 3;
        let moved = i32::from(self.pos_m[0]) - COSMIC_MOVEMENT[usize::from(self.cosmic_counter)];
        self.pos_m[0] = wrap_position(moved);

        let nusiz = self.nusiz(0);
        let size = self.missile_size(0);
        self.m_mask[0] = match self.cosmic_counter {
            1 => Some(MaskDescriptor::missile(self.pos_m[0], nusiz, size | 0x01)),
            2 => None,
            _ => Some(MaskDescriptor::missile(self.pos_m[0], nusiz, size)),
        };
    }

    // ---------------------------------------------------------------
    // Register access
    // ---------------------------------------------------------------

    fn peek<C: TiaContext>(&mut self, address: u16, ctx: &mut C) -> u8 {
        let cycles = ctx.cycles();
        self.update_frame(clock_of(cycles));
        let noise = ctx.data_bus() & 0x3F;

        let register = (address & 0x0F) as u8;
        let level = match register {
            read::CXM0P..=read::CXPPMM => {
                let (d7, d6) = collision_bits(register);
                let mut bits = 0;
                if self.collision & d7 != 0 {
                    bits |= 0x80;
                }
                if self.collision & d6 != 0 {
                    bits |= 0x40;
                }
                bits
            }
            read::INPT0 => self.paddle(ctx, Jack::Left, AnalogPin::Nine, cycles),
            read::INPT1 => self.paddle(ctx, Jack::Left, AnalogPin::Five, cycles),
            read::INPT2 => self.paddle(ctx, Jack::Right, AnalogPin::Nine, cycles),
            read::INPT3 => self.paddle(ctx, Jack::Right, AnalogPin::Five, cycles),
            read::INPT4 => high_bit(ctx.digital(Jack::Left, DigitalPin::Six)),
            read::INPT5 => high_bit(ctx.digital(Jack::Right, DigitalPin::Six)),
            _ => 0,
        };
        level | noise
    }

    /// Paddle capacitor: dumped to ground while VBLANK bit 7 is set, then
    /// charging through the pot at a rate set by its resistance.
    fn paddle<C: TiaContext>(&self, ctx: &C, jack: Jack, pin: AnalogPin, cycles: u32) -> u8 {
        let resistance = ctx.resistance(jack, pin);
        if resistance == RESISTANCE_MIN {
            return 0x80;
        }
        if resistance == RESISTANCE_MAX || self.dump_enabled {
            return 0;
        }
        let seconds = 1.6 * f64::from(resistance) * 0.01e-6;
        let needed = (seconds * 1.19e6).floor() as i64;
        high_bit(i64::from(cycles) > self.dump_disabled_cycle + needed)
    }

    fn poke<C: TiaContext>(&mut self, address: u16, value: u8, ctx: &mut C) {
        let addr = (address & 0x3F) as u8;
        let cycles = ctx.cycles();
        let clock = clock_of(cycles);

        let delay = match POKE_DELAY[usize::from(addr)] {
            -1 => PLAYFIELD_DELAY[((self.line_clock_at(clock) / 3) & 3) as usize],
            d => i64::from(d),
        };
        self.update_frame(clock + delay);

        if self.scanline_at(clock) > i64::from(self.settings.scanline_ceiling) {
            ctx.stop_cpu();
            self.partial_frame = false;
            if !self.scanline_overrun {
                log::debug!(
                    "TIA: frame passed {} scanlines without VSYNC",
                    self.settings.scanline_ceiling
                );
            }
            self.scanline_overrun = true;
        }

        let Some(slot) = self.regs.get_mut(usize::from(addr)) else {
            return;
        };
        let previous = std::mem::replace(slot, value);

        match addr {
            write::VSYNC => self.write_vsync(previous, value, clock, ctx),
            write::VBLANK => self.write_vblank(previous, value, clock, cycles),
            write::WSYNC => {
                if ctx.last_access_was_read() {
                    self.wait_horizontal_sync(ctx);
                }
            }
            write::NUSIZ0 | write::NUSIZ1 => {
                let which = usize::from(addr - write::NUSIZ0);
                self.p_mask[which] =
                    MaskDescriptor::player(self.pos_p[which], false, self.nusiz(which));
                self.refresh_missile_mask(which);
            }
            write::COLUP0 | write::COLUP1 | write::COLUPF | write::COLUBK => {
                let mut color = value & 0xFE;
                if self.settings.color_loss && self.last_frame_scanlines & 1 != 0 {
                    color |= 0x01;
                }
                self.regs[usize::from(addr)] = color;
            }
            write::CTRLPF => {
                self.priority_score = (value & 0x06) << 5;
                self.refresh_ball_mask();
            }
            write::REFP0 | write::REFP1 => {
                if (previous ^ value) & 0x08 != 0 {
                    let which = usize::from(addr - write::REFP0);
                    self.current_grp[which] = REFLECT[usize::from(self.current_grp[which])];
                }
            }
            write::PF0 | write::PF1 | write::PF2 => self.refresh_playfield(),
            write::RESP0 | write::RESP1 => {
                self.reset_player(usize::from(addr - write::RESP0), clock);
            }
            write::RESM0 | write::RESM1 | write::RESBL => self.reset_line_object(addr, clock),
            write::AUDC0..=write::AUDV1 => ctx.audio().register_write(addr, value, cycles),
            write::GRP0 => {
                self.dgrp[1] = self.regs[usize::from(write::GRP1)];
                self.refresh_player_graphic(0);
                self.refresh_player_graphic(1);
            }
            write::GRP1 => {
                self.dgrp[0] = self.regs[usize::from(write::GRP0)];
                self.denabl = self.regs[usize::from(write::ENABL)] & 0x02 != 0;
                self.refresh_player_graphic(0);
                self.refresh_player_graphic(1);
                self.refresh_ball_enable();
            }
            write::ENAM0 | write::ENAM1 => {
                self.refresh_missile_enable(usize::from(addr - write::ENAM0));
            }
            write::ENABL | write::VDELBL => self.refresh_ball_enable(),
            write::VDELP0 | write::VDELP1 => {
                self.refresh_player_graphic(usize::from(addr - write::VDELP0));
            }
            write::HMM0 => {
                if clock == self.last_hmove_clock + 21 * CLOCKS_PER_CPU_CYCLE
                    && previous >> 4 == 7
                    && value >> 4 == 6
                {
                    log::trace!("TIA: missile 0 star-field glitch armed");
                    self.cosmic_enabled = true;
                    self.cosmic_counter = 0;
                }
            }
            write::RESMP0 | write::RESMP1 => {
                let which = usize::from(addr - write::RESMP0);
                if previous & 0x02 != 0 && value & 0x02 == 0 {
                    let middle = match self.nusiz(which) {
                        5 => 8,
                        7 => 16,
                        _ => 4,
                    };
                    self.pos_m[which] = ((u16::from(self.pos_p[which]) + middle) % 160) as u8;
                    self.refresh_missile_mask(which);
                }
                self.refresh_missile_enable(which);
            }
            write::HMOVE => self.apply_motion(clock),
            write::HMCLR => {
                for reg in write::HMP0..=write::HMBL {
                    self.regs[usize::from(reg)] = 0;
                }
            }
            write::CXCLR => self.collision = 0,
            _ => {}
        }
    }

    fn write_vsync<C: TiaContext>(&mut self, previous: u8, value: u8, clock: i64, ctx: &mut C) {
        if value & 0x02 != 0 && previous & 0x02 == 0 {
            self.vsync_on = self.scanline_at(clock);
        }
        if value & 0x02 != 0 {
            self.vsync_finish_clock = clock + CLOCKS_PER_LINE_TOTAL;
        } else if clock >= self.vsync_finish_clock {
            self.vsync_finish_clock = VSYNC_IDLE;
            ctx.stop_cpu();
            self.partial_frame = false;
        }
    }

    fn write_vblank(&mut self, previous: u8, value: u8, clock: i64, cycles: u32) {
        let was_on = previous & 0x02 != 0;
        let is_on = value & 0x02 != 0;
        if is_on && !was_on {
            self.vblank_on = self.scanline_at(clock);
            let mut height = self.vblank_on - self.vblank_off;
            if height < 0 {
                height += self.vsync_on;
            }
            if height >= FRAME_HEIGHT_MIN as i64 {
                self.detected_y_start = self.vblank_off;
                if self.detected_y_start >= self.vsync_on {
                    self.detected_y_start -= self.vsync_on;
                }
                self.detected_y_stop = self.detected_y_start + height;
            }
        } else if was_on && !is_on {
            self.vblank_off = self.scanline_at(clock);
        }

        if previous & 0x80 == 0 && value & 0x80 != 0 {
            self.dump_enabled = true;
        } else if previous & 0x80 != 0 && value & 0x80 == 0 {
            self.dump_enabled = false;
            self.dump_disabled_cycle = i64::from(cycles);
        }
    }

    /// Stall the processor until the start of the next scanline.
    fn wait_horizontal_sync<C: TiaContext>(&mut self, ctx: &mut C) {
        let cycles = i64::from(ctx.cycles());
        let frame_start = self.clock_when_frame_started.div_euclid(CLOCKS_PER_CPU_CYCLE);
        let to_end = CYCLES_PER_LINE - (cycles - frame_start).rem_euclid(CYCLES_PER_LINE);
        if to_end < CYCLES_PER_LINE {
            ctx.add_cycles(to_end as u32);
        }
    }

    fn reset_player(&mut self, which: usize, clock: i64) {
        let hpos = self.line_clock_at(clock);
        let new = if hpos < CLOCKS_PER_LINE_BLANK {
            3
        } else {
            ((hpos - CLOCKS_PER_LINE_BLANK + 5) % VISIBLE) as u8
        };
        let mode = self.nusiz(which);
        let skip_first = match self.masks.position_reset(mode, self.pos_p[which], new) {
            ResetTiming::MidCopy => {
                self.update_frame(clock + 11);
                true
            }
            ResetTiming::Clear => true,
            ResetTiming::InDelay => false,
        };
        self.pos_p[which] = new;
        self.p_mask[which] = MaskDescriptor::player(new, skip_first, mode);
    }

    /// RESM0, RESM1 or RESBL, including the positions a strobe lands on
    /// when it follows HMOVE by a few cycles.
    fn reset_line_object(&mut self, addr: u8, clock: i64) {
        let hpos = self.line_clock_at(clock);
        let mut pos = if hpos < CLOCKS_PER_LINE_BLANK {
            2
        } else {
            ((hpos - CLOCKS_PER_LINE_BLANK + 4) % VISIBLE) as u8
        };
        let since_hmove = clock - self.last_hmove_clock;

        match addr {
            write::RESM0 => {
                if since_hmove == 20 * CLOCKS_PER_CPU_CYCLE && hpos == 69 {
                    pos = 8;
                }
                self.pos_m[0] = pos;
                self.refresh_missile_mask(0);
            }
            write::RESM1 => {
                if since_hmove == 3 * CLOCKS_PER_CPU_CYCLE && hpos == 18 {
                    pos = 3;
                }
                self.pos_m[1] = pos;
                self.refresh_missile_mask(1);
            }
            _ => {
                pos = match (
                    since_hmove / CLOCKS_PER_CPU_CYCLE,
                    since_hmove % CLOCKS_PER_CPU_CYCLE,
                    hpos,
                ) {
                    (18, 0, 60 | 69) => 10,
                    (3, 0, 18) => 3,
                    (7, 0, 30) => 6,
                    (6, 0, 27) => 5,
                    _ => pos,
                };
                self.pos_bl = pos;
                self.refresh_ball_mask();
            }
        }
    }

    fn apply_motion(&mut self, clock: i64) {
        let x = (self.line_clock_at(clock) / CLOCKS_PER_CPU_CYCLE) as usize;
        if self.settings.hmove_blanks && HMOVE_BLANK_ENABLE[x] {
            self.hmove_blank_enabled = true;
        }

        let motion = &COMPLETE_MOTION[x];
        let shift = |pos: u8, reg: u8| -> u8 {
            let nibble = usize::from(self.regs[usize::from(reg)] >> 4);
            wrap_position(i32::from(pos) + i32::from(motion[nibble]))
        };
        let p0 = shift(self.pos_p[0], write::HMP0);
        let p1 = shift(self.pos_p[1], write::HMP1);
        let m0 = shift(self.pos_m[0], write::HMM0);
        let m1 = shift(self.pos_m[1], write::HMM1);
        let bl = shift(self.pos_bl, write::HMBL);
        self.pos_p = [p0, p1];
        self.pos_m = [m0, m1];
        self.pos_bl = bl;

        self.refresh_ball_mask();
        for which in 0..2 {
            self.p_mask[which] =
                MaskDescriptor::player(self.pos_p[which], false, self.nusiz(which));
            self.refresh_missile_mask(which);
        }

        self.last_hmove_clock = clock;
        self.cosmic_enabled = false;
    }

    // ---------------------------------------------------------------
    // Derived state
    // ---------------------------------------------------------------

    fn nusiz(&self, which: usize) -> u8 {
        self.regs[usize::from(write::NUSIZ0) + which] & 0x07
    }

    fn missile_size(&self, which: usize) -> u8 {
        (self.regs[usize::from(write::NUSIZ0) + which] & 0x30) >> 4
    }

    fn refresh_missile_mask(&mut self, which: usize) {
        self.m_mask[which] = Some(MaskDescriptor::missile(
            self.pos_m[which],
            self.nusiz(which),
            self.missile_size(which),
        ));
    }

    fn refresh_ball_mask(&mut self) {
        let size = (self.regs[usize::from(write::CTRLPF)] & 0x30) >> 4;
        self.bl_mask = MaskDescriptor::ball(self.pos_bl, size);
    }

    fn refresh_playfield(&mut self) {
        let pf0 = self.regs[usize::from(write::PF0)];
        let pf1 = self.regs[usize::from(write::PF1)];
        let pf2 = self.regs[usize::from(write::PF2)];
        self.playfield = u32::from(pf0 >> 4) | u32::from(pf1) << 4 | u32::from(pf2) << 12;
        self.set_enabled(object::PF, self.playfield != 0);
    }

    fn refresh_player_graphic(&mut self, which: usize) {
        let vdel = self.regs[usize::from(write::VDELP0) + which] & 0x01 != 0;
        let graphic = if vdel {
            self.dgrp[which]
        } else {
            self.regs[usize::from(write::GRP0) + which]
        };
        let reflected = self.regs[usize::from(write::REFP0) + which] & 0x08 != 0;
        self.current_grp[which] = if reflected { REFLECT[usize::from(graphic)] } else { graphic };
        let bit = if which == 0 { object::P0 } else { object::P1 };
        self.set_enabled(bit, self.current_grp[which] != 0);
    }

    fn refresh_missile_enable(&mut self, which: usize) {
        let enabled = self.regs[usize::from(write::ENAM0) + which] & 0x02 != 0;
        let locked = self.regs[usize::from(write::RESMP0) + which] & 0x02 != 0;
        let bit = if which == 0 { object::M0 } else { object::M1 };
        self.set_enabled(bit, enabled && !locked);
    }

    fn refresh_ball_enable(&mut self) {
        let on = if self.regs[usize::from(write::VDELBL)] & 0x01 != 0 {
            self.denabl
        } else {
            self.regs[usize::from(write::ENABL)] & 0x02 != 0
        };
        self.set_enabled(object::BL, on);
    }

    fn set_enabled(&mut self, bit: u8, on: bool) {
        if on {
            self.enabled_objects |= bit;
        } else {
            self.enabled_objects &= !bit;
        }
    }
}

fn clock_of(cycles: u32) -> i64 {
    i64::from(cycles) * CLOCKS_PER_CPU_CYCLE
}

fn wrap_position(pos: i32) -> u8 {
    pos.rem_euclid(VISIBLE as i32) as u8
}

fn high_bit(on: bool) -> u8 {
    if on { 0x80 } else { 0 }
}

fn clamp_settings(mut settings: VideoSettings) -> VideoSettings {
    settings.height = settings.height.min(FRAME_HEIGHT_MAX as u16);
    settings
}

impl<C: TiaContext> Device<C> for Tia {
    fn install(&mut self, pages: &mut AddressSpace, id: DeviceId) {
        for page in 0..PAGE_COUNT {
            let address = (page as u16) << PAGE_SHIFT;
            if address & 0x1080 == 0 {
                pages.bind(page, PageBinding::device(id));
            }
        }
    }

    fn reset(&mut self, ctx: &mut C) {
        ctx.audio().reset();
        self.power_on(ctx.cycles());
        log::debug!(
            "TIA reset: lines {}..{}, ceiling {}",
            self.settings.y_start,
            self.settings.y_start + self.settings.height,
            self.settings.scanline_ceiling
        );
    }

    fn read(&mut self, address: u16, ctx: &mut C) -> u8 {
        self.peek(address, ctx)
    }

    fn write(&mut self, address: u16, value: u8, ctx: &mut C) {
        self.poke(address, value, ctx);
    }

    fn cycles_reset(&mut self, cycles: u32) {
        let clocks = clock_of(cycles);
        self.dump_disabled_cycle -= i64::from(cycles);
        self.clock_when_frame_started -= clocks;
        self.clock_start_display -= clocks;
        self.clock_stop_display -= clocks;
        self.clock_at_last_update -= clocks;
        self.vsync_finish_clock -= clocks;
        self.last_hmove_clock -= clocks;
    }
}

impl Observable for Tia {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "frame.count" => Some(u32::try_from(self.frames).unwrap_or(u32::MAX).into()),
            "frame.partial" => Some(self.partial_frame.into()),
            "frame.scanlines" => Some(self.last_frame_scanlines.into()),
            "frame.overrun" => Some(self.scanline_overrun.into()),
            "collisions" => Some(self.collision.into()),
            "enabled" => Some(self.enabled_objects.into()),
            "p0.x" => Some(self.pos_p[0].into()),
            "p1.x" => Some(self.pos_p[1].into()),
            "m0.x" => Some(self.pos_m[0].into()),
            "m1.x" => Some(self.pos_m[1].into()),
            "bl.x" => Some(self.pos_bl.into()),
            "m0.glitch" => Some(self.cosmic_enabled.into()),
            "hmove.blank" => Some(self.hmove_blank_enabled.into()),
            "vsync_on" => Some(self.vsync_on.into()),
            "detected.y_start" => Some(self.detected_y_start.into()),
            "detected.y_stop" => Some(self.detected_y_stop.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "frame.count",
            "frame.partial",
            "frame.scanlines",
            "frame.overrun",
            "collisions",
            "enabled",
            "p0.x",
            "p1.x",
            "m0.x",
            "m1.x",
            "bl.x",
            "m0.glitch",
            "hmove.blank",
            "vsync_on",
            "detected.y_start",
            "detected.y_stop",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(u8, u8, u32)>);

    impl AudioSink for Recorder {
        fn register_write(&mut self, register: u8, value: u8, cycle: u32) {
            self.0.push((register, value, cycle));
        }
    }

    /// Just enough system around a TIA to drive it by hand.
    struct Bench {
        cycles: u32,
        data_bus: u8,
        stopped: bool,
        last_read: bool,
        fire: [bool; 2],
        pots: [u32; 4],
        audio: Recorder,
    }

    impl Default for Bench {
        fn default() -> Self {
            Self {
                cycles: 0,
                data_bus: 0,
                stopped: false,
                last_read: true,
                fire: [true; 2],
                pots: [RESISTANCE_MAX; 4],
                audio: Recorder::default(),
            }
        }
    }

    impl TiaContext for Bench {
        fn cycles(&self) -> u32 {
            self.cycles
        }
        fn add_cycles(&mut self, cycles: u32) {
            self.cycles += cycles;
        }
        fn data_bus(&self) -> u8 {
            self.data_bus
        }
        fn stop_cpu(&mut self) {
            self.stopped = true;
        }
        fn last_access_was_read(&self) -> bool {
            self.last_read
        }
        fn digital(&self, jack: Jack, _pin: DigitalPin) -> bool {
            self.fire[jack.index()]
        }
        fn resistance(&self, jack: Jack, pin: AnalogPin) -> u32 {
            let slot = jack.index() * 2 + usize::from(pin == AnalogPin::Five);
            self.pots[slot]
        }
        fn audio(&mut self) -> &mut dyn AudioSink {
            &mut self.audio
        }
    }

    /// Display starts on line 0 so every line is rendered.
    fn settings() -> VideoSettings {
        VideoSettings {
            y_start: 0,
            ..VideoSettings::default()
        }
    }

    fn powered() -> (Tia, Bench) {
        let mut tia = Tia::new(settings());
        let mut bench = Bench::default();
        tia.reset(&mut bench);
        tia.begin_frame(0);
        (tia, bench)
    }

    fn poke(tia: &mut Tia, bench: &mut Bench, cycle: u32, reg: u8, value: u8) {
        bench.cycles = cycle;
        tia.write(u16::from(reg), value, bench);
    }

    fn peek(tia: &mut Tia, bench: &mut Bench, cycle: u32, reg: u8) -> u8 {
        bench.cycles = cycle;
        tia.read(u16::from(reg), bench)
    }

    const LINE: u32 = CYCLES_PER_LINE as u32;

    #[test]
    fn background_fills_line() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::COLUBK, 0x1F);
        peek(&mut tia, &mut bench, LINE, read::CXM0P);
        assert!(tia.frame_buffer()[..160].iter().all(|&p| p == 0x1E));
        assert_eq!(tia.frame_buffer()[160], 0);
    }

    #[test]
    fn vblank_renders_black() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::COLUBK, 0x1E);
        poke(&mut tia, &mut bench, 1, write::VBLANK, 0x02);
        peek(&mut tia, &mut bench, LINE, read::CXM0P);
        assert!(tia.frame_buffer()[..160].iter().all(|&p| p == 0));
    }

    #[test]
    fn rendering_catches_up_mid_line() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::COLUBK, 0x20);
        // Cycle 43 is colour clock 129, pixel 61; COLUBK takes effect at once.
        poke(&mut tia, &mut bench, 43, write::COLUBK, 0x40);
        peek(&mut tia, &mut bench, LINE, read::CXM0P);
        let line = &tia.frame_buffer()[..160];
        assert!(line[..61].iter().all(|&p| p == 0x20));
        assert!(line[61..].iter().all(|&p| p == 0x40));
    }

    #[test]
    fn collision_latches_until_cleared() {
        let (mut tia, mut bench) = powered();
        // A one-pixel ball at 0 overlaps the first playfield block.
        poke(&mut tia, &mut bench, 0, write::CTRLPF, 0x00);
        poke(&mut tia, &mut bench, 1, write::PF0, 0x10);
        poke(&mut tia, &mut bench, 2, write::ENABL, 0x02);
        assert_eq!(peek(&mut tia, &mut bench, LINE, read::CXBLPF) & 0xC0, 0x80);
        assert_ne!(tia.collisions(), 0);

        bench.data_bus = 0x2A;
        assert_eq!(peek(&mut tia, &mut bench, LINE + 1, read::CXBLPF), 0x80 | 0x2A);

        poke(&mut tia, &mut bench, LINE + 2, write::CXCLR, 0);
        assert_eq!(peek(&mut tia, &mut bench, LINE + 3, read::CXBLPF) & 0xC0, 0);
    }

    #[test]
    fn player_missile_collision_reads_d7() {
        let (mut tia, mut bench) = powered();
        // P0 and M1 both sit at position 0 after power-on.
        poke(&mut tia, &mut bench, 0, write::NUSIZ0, 0x00);
        poke(&mut tia, &mut bench, 1, write::NUSIZ1, 0x00);
        poke(&mut tia, &mut bench, 2, write::GRP0, 0x80);
        poke(&mut tia, &mut bench, 3, write::ENAM1, 0x02);
        assert_eq!(peek(&mut tia, &mut bench, LINE, read::CXM1P) & 0xC0, 0x80);
        assert_eq!(peek(&mut tia, &mut bench, LINE, read::CXM0P) & 0xC0, 0);
    }

    #[test]
    fn reset_player_twice_at_same_clock_is_stable() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 40, write::RESP0, 0);
        let first = tia.pos_p[0];
        poke(&mut tia, &mut bench, 40, write::RESP0, 0);
        assert_eq!(tia.pos_p[0], first);
        assert_eq!(first, 57, "colour clock 120 is pixel 52, plus 5");
        assert_eq!(tia.p_mask[0], MaskDescriptor::player(first, false, 0));
    }

    #[test]
    fn reset_during_hblank_lands_at_three() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 5, write::RESP1, 0);
        poke(&mut tia, &mut bench, 6, write::RESM0, 0);
        assert_eq!(tia.pos_p[1], 3);
        assert_eq!(tia.pos_m[0], 2);
    }

    #[test]
    fn hmove_moves_by_nibble() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 40, write::RESBL, 0);
        assert_eq!(tia.pos_bl, 56);
        poke(&mut tia, &mut bench, 41, write::HMBL, 0x80);
        poke(&mut tia, &mut bench, LINE, write::HMOVE, 0);
        assert_eq!(tia.pos_bl, 64);
        poke(&mut tia, &mut bench, LINE + 1, write::HMCLR, 0);
        assert_eq!(tia.register(write::HMBL), Some(0));
    }

    #[test]
    fn hmove_blank_hides_left_edge() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::COLUBK, 0x0E);
        poke(&mut tia, &mut bench, 1, write::HMOVE, 0);
        peek(&mut tia, &mut bench, LINE, read::CXM0P);
        let line = &tia.frame_buffer()[..160];
        assert!(line[..8].iter().all(|&p| p == 0));
        assert!(line[8..].iter().all(|&p| p == 0x0E));
        assert!(!tia.hmove_blank_enabled);
    }

    #[test]
    fn late_hmove_does_not_blank() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::COLUBK, 0x0E);
        poke(&mut tia, &mut bench, 40, write::HMOVE, 0);
        assert!(!tia.hmove_blank_enabled);
    }

    #[test]
    fn star_field_glitch_stretches_hides_then_restores_missile() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 40, write::RESM0, 0);
        poke(&mut tia, &mut bench, 41, write::HMM0, 0x70);
        poke(&mut tia, &mut bench, LINE, write::HMOVE, 0);
        assert_eq!(tia.pos_m[0], 49);
        poke(&mut tia, &mut bench, LINE + 21, write::HMM0, 0x60);
        assert!(tia.cosmic_enabled);

        peek(&mut tia, &mut bench, 2 * LINE + 1, read::CXM0P);
        assert_eq!(tia.pos_m[0], 16);
        assert_eq!(tia.m_mask[0], Some(MaskDescriptor::missile(16, 0, 1)));

        peek(&mut tia, &mut bench, 3 * LINE + 1, read::CXM0P);
        assert_eq!(tia.pos_m[0], 16);
        assert_eq!(tia.m_mask[0], None);

        peek(&mut tia, &mut bench, 4 * LINE + 1, read::CXM0P);
        assert_eq!(tia.pos_m[0], 159);
        assert_eq!(tia.m_mask[0], Some(MaskDescriptor::missile(159, 0, 0)));

        poke(&mut tia, &mut bench, 4 * LINE + 2, write::HMOVE, 0);
        assert!(!tia.cosmic_enabled);
    }

    #[test]
    fn glitch_needs_exact_timing() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 1, write::HMM0, 0x70);
        poke(&mut tia, &mut bench, LINE, write::HMOVE, 0);
        poke(&mut tia, &mut bench, LINE + 22, write::HMM0, 0x60);
        assert!(!tia.cosmic_enabled);
    }

    #[test]
    fn wsync_stalls_to_line_end() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 10, write::WSYNC, 0);
        assert_eq!(bench.cycles, LINE);

        bench.last_read = false;
        poke(&mut tia, &mut bench, LINE + 10, write::WSYNC, 0);
        assert_eq!(bench.cycles, LINE + 10);
    }

    #[test]
    fn cycles_reset_keeps_line_phase() {
        let (mut tia, mut bench) = powered();
        bench.cycles = 100;
        let before = tia.line_clock(bench.cycles);
        <Tia as Device<Bench>>::cycles_reset(&mut tia, LINE);
        assert_eq!(tia.line_clock(100 - LINE), before);
        poke(&mut tia, &mut bench, 100 - LINE, write::WSYNC, 0);
        assert_eq!(bench.cycles, LINE);
    }

    #[test]
    fn vsync_held_a_full_line_ends_frame() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::VSYNC, 0x02);
        poke(&mut tia, &mut bench, 50, write::VSYNC, 0x00);
        assert!(!bench.stopped, "released too early");

        poke(&mut tia, &mut bench, 60, write::VSYNC, 0x02);
        poke(&mut tia, &mut bench, 60 + LINE, write::VSYNC, 0x00);
        assert!(bench.stopped);
        assert!(!tia.partial_frame());
        assert!(tia.finish_frame(bench.cycles));
        assert_eq!(tia.frame_count(), 1);
        assert_eq!(tia.last_frame_scanlines(), 1);
        assert!(!tia.scanline_overrun());
    }

    #[test]
    fn ceiling_cuts_runaway_frame() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 290 * LINE, write::COLUBK, 0);
        assert!(!bench.stopped);
        poke(&mut tia, &mut bench, 291 * LINE, write::COLUBK, 0);
        assert!(bench.stopped);
        assert!(tia.scanline_overrun());
        assert!(tia.finish_frame(bench.cycles));
    }

    #[test]
    fn vblank_window_sets_detected_height() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::VSYNC, 0x02);
        poke(&mut tia, &mut bench, 3 * LINE, write::VSYNC, 0x00);
        poke(&mut tia, &mut bench, 3 * LINE + 1, write::VBLANK, 0x02);
        poke(&mut tia, &mut bench, 40 * LINE, write::VBLANK, 0x00);
        poke(&mut tia, &mut bench, 232 * LINE, write::VBLANK, 0x02);
        assert_eq!(tia.vsync_on(), 0);
        assert_eq!(tia.detected_y_start(), 40);
        assert_eq!(tia.detected_y_stop(), 232);
    }

    #[test]
    fn paddle_charges_after_dump() {
        let (mut tia, mut bench) = powered();
        bench.pots[0] = 500_000;
        poke(&mut tia, &mut bench, 0, write::VBLANK, 0x80);
        assert_eq!(peek(&mut tia, &mut bench, 5, read::INPT0) & 0x80, 0);
        poke(&mut tia, &mut bench, 10, write::VBLANK, 0x00);
        assert_eq!(peek(&mut tia, &mut bench, 100, read::INPT0) & 0x80, 0);
        assert_eq!(peek(&mut tia, &mut bench, 20_000, read::INPT0) & 0x80, 0x80);

        bench.pots[2] = RESISTANCE_MIN;
        assert_eq!(peek(&mut tia, &mut bench, 20_001, read::INPT2) & 0x80, 0x80);
        assert_eq!(peek(&mut tia, &mut bench, 20_002, read::INPT1) & 0x80, 0);
    }

    #[test]
    fn fire_buttons_read_d7() {
        let (mut tia, mut bench) = powered();
        bench.fire = [false, true];
        assert_eq!(peek(&mut tia, &mut bench, 1, read::INPT4) & 0x80, 0);
        assert_eq!(peek(&mut tia, &mut bench, 2, read::INPT5) & 0x80, 0x80);
    }

    #[test]
    fn audio_writes_are_forwarded() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 7, write::AUDV0, 0x0F);
        poke(&mut tia, &mut bench, 9, write::AUDF1, 0x1F);
        assert_eq!(bench.audio.0, vec![(write::AUDV0, 0x0F, 7), (write::AUDF1, 0x1F, 9)]);
    }

    #[test]
    fn color_loss_follows_odd_frames() {
        let mut tia = Tia::new(VideoSettings {
            color_loss: true,
            ..settings()
        });
        let mut bench = Bench::default();
        tia.reset(&mut bench);
        tia.begin_frame(0);
        tia.last_frame_scanlines = 313;
        poke(&mut tia, &mut bench, 0, write::COLUP0, 0x44);
        assert_eq!(tia.register(write::COLUP0), Some(0x45));

        tia.last_frame_scanlines = 312;
        tia.begin_frame(0);
        assert_eq!(tia.register(write::COLUP0), Some(0x44));
    }

    #[test]
    fn reflect_flips_current_graphic() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::GRP0, 0xC0);
        poke(&mut tia, &mut bench, 1, write::REFP0, 0x08);
        assert_eq!(tia.current_grp[0], 0x03);
        poke(&mut tia, &mut bench, 2, write::REFP0, 0x08);
        assert_eq!(tia.current_grp[0], 0x03, "no change without a bit-3 edge");
    }

    #[test]
    fn vertical_delay_shows_previous_graphic() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 0, write::VDELP0, 0x01);
        poke(&mut tia, &mut bench, 1, write::GRP0, 0xAA);
        assert_eq!(tia.current_grp[0], 0);
        poke(&mut tia, &mut bench, 2, write::GRP1, 0x00);
        assert_eq!(tia.current_grp[0], 0xAA);
    }

    #[test]
    fn install_claims_tia_pages_only() {
        let mut tia = Tia::new(settings());
        let mut pages = AddressSpace::new();
        Device::<Bench>::install(&mut tia, &mut pages, DeviceId(0));
        assert_eq!(pages.binding(AddressSpace::page_of(0x0000)).owner, Some(DeviceId(0)));
        assert_eq!(pages.binding(AddressSpace::page_of(0x0040)).owner, Some(DeviceId(0)));
        assert_eq!(pages.binding(AddressSpace::page_of(0x0080)).owner, None);
        assert_eq!(pages.binding(AddressSpace::page_of(0x1000)).owner, None);
    }

    #[test]
    fn observable_positions() {
        let (mut tia, mut bench) = powered();
        poke(&mut tia, &mut bench, 40, write::RESP0, 0);
        assert_eq!(tia.query("p0.x"), Some(Value::U8(57)));
        assert_eq!(tia.query("vsync_on"), Some(Value::I64(-1)));
        for path in tia.query_paths() {
            assert!(tia.query(path).is_some(), "{path}");
        }
    }
}
