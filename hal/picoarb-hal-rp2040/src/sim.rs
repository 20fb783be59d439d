//! Software register model
//!
//! An in-memory RP2040 that implements the register semantics the arbiter
//! relies on, so every layer above [`RegisterBus`] runs unchanged on the
//! host:
//!
//! - power-on reset values and the RESET / RESET_DONE handshake
//! - atomic XOR / SET / CLR aliases for the peripheral space
//! - SIO output and output-enable SET / CLR / XOR registers
//! - `GPIO_IN` derived from output enable, external drive, pulls, input
//!   enable and overrides
//! - edge latching into `INTR` (write 1 to clear) and per-core
//!   `INTS = (INTR | INTF) & INTE`
//! - PWM `EN` aliasing the `CSR.EN` bits, self-clearing `PH_ADV` / `PH_RET`,
//!   wrap flags (write 1 to clear)
//! - ADC single conversions, round robin, the 4-entry FIFO
//! - one NVIC per core
//!
//! Faults are injected with [`SimBus::stick`], which forces bits of a
//! register to a fixed level on every read. [`SimBus::write_log`] keeps the
//! most recent writes in issue order, alias address included.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::{Deque, FnvIndexMap, Vec};
use picoarb_core::{AdcChannel, Core, Events, Pin, Slice, NUM_BANK0_GPIOS};

use crate::regs::io_bank0::{ctrl, EDGE_BITS, IRQ_BANKS};
use crate::regs::pads::pad;
use crate::regs::{
    adc, has_atomic_aliases, pwm, reset_bits, ADC_BASE, ALIAS_CLR, ALIAS_SET, ALIAS_XOR,
    IO_BANK0_BASE, NVIC_ICER, NVIC_ICPR, NVIC_ISER, NVIC_ISPR, PADS_BANK0_BASE, PWM_BASE,
    RESETS_BASE, SIO_BASE,
};
use crate::regs::RegisterBus;

const MAX_REGS: usize = 512;
const MAX_STUCK: usize = 16;

/// Writes kept by the write log
pub const WRITE_LOG_DEPTH: usize = 32;

const PIN_BITS: u32 = (1 << NUM_BANK0_GPIOS) - 1;
const FUNC_SIO: u32 = 5;

const SIO_CPUID: u32 = SIO_BASE;
const SIO_GPIO_IN: u32 = SIO_BASE + 0x04;
const SIO_GPIO_OUT: u32 = SIO_BASE + 0x10;
const SIO_GPIO_OE: u32 = SIO_BASE + 0x20;

const IO_INTR0: u32 = IO_BANK0_BASE + 0x0f0;
const IO_PROC0_INTE0: u32 = IO_BANK0_BASE + 0x100;
const IO_PROC1_INTE0: u32 = IO_BANK0_BASE + 0x130;

const PWM_EN: u32 = PWM_BASE + 0xa0;
const PWM_INTR: u32 = PWM_BASE + 0xa4;
const PWM_INTE: u32 = PWM_BASE + 0xa8;
const PWM_INTF: u32 = PWM_BASE + 0xac;
const PWM_INTS: u32 = PWM_BASE + 0xb0;

const ADC_CS: u32 = ADC_BASE;
const ADC_RESULT: u32 = ADC_BASE + 0x04;
const ADC_FCS: u32 = ADC_BASE + 0x08;
const ADC_FIFO: u32 = ADC_BASE + 0x0c;

const RESETS_RESET: u32 = RESETS_BASE;
const RESETS_DONE: u32 = RESETS_BASE + 0x08;

/// Raw sample the temperature sensor returns until told otherwise (~27 °C)
pub const DEFAULT_TEMPERATURE_SAMPLE: u16 = 876;

struct SimState {
    regs: FnvIndexMap<u32, u32, MAX_REGS>,
    stuck: FnvIndexMap<u32, (u32, u32), MAX_STUCK>,
    external: [Option<bool>; NUM_BANK0_GPIOS],
    levels: u32,
    gpio_edges: [u32; IRQ_BANKS],
    pwm_intr: u32,
    nvic_enabled: [u32; 2],
    nvic_pending: [u32; 2],
    adc_samples: [u16; 5],
    adc_fifo: Deque<u16, { adc::FIFO_DEPTH }>,
    adc_fifo_flags: u32,
    reads: u32,
    writes: u32,
    log: Deque<(u32, u32), WRITE_LOG_DEPTH>,
}

/// Shared register model for both cores
pub struct SimBus {
    state: Mutex<RefCell<SimState>>,
}

/// One core's view of a [`SimBus`]
///
/// Differs from the other core's view only in `CPUID` and the NVIC.
#[derive(Clone, Copy)]
pub struct SimCore<'a> {
    sim: &'a SimBus,
    core: Core,
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBus {
    /// A chip straight out of reset
    pub fn new() -> Self {
        let mut state = SimState {
            regs: FnvIndexMap::new(),
            stuck: FnvIndexMap::new(),
            external: [None; NUM_BANK0_GPIOS],
            levels: 0,
            gpio_edges: [0; IRQ_BANKS],
            pwm_intr: 0,
            nvic_enabled: [0; 2],
            nvic_pending: [0; 2],
            adc_samples: [0, 0, 0, 0, DEFAULT_TEMPERATURE_SAMPLE],
            adc_fifo: Deque::new(),
            adc_fifo_flags: 0,
            reads: 0,
            writes: 0,
            log: Deque::new(),
        };
        state.levels = state.compute_levels();
        Self {
            state: Mutex::new(RefCell::new(state)),
        }
    }

    /// Bus for code running on `core`
    pub fn core(&self, core: Core) -> SimCore<'_> {
        SimCore { sim: self, core }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs)))
    }

    /// Read a register without side effects or access counting
    pub fn peek(&self, addr: u32) -> u32 {
        self.with(|s| s.read(Core::Core0, addr, false))
    }

    /// Number of register reads so far
    pub fn read_count(&self) -> u32 {
        self.with(|s| s.reads)
    }

    /// Number of register writes so far
    pub fn write_count(&self) -> u32 {
        self.with(|s| s.writes)
    }

    /// The last [`WRITE_LOG_DEPTH`] writes as `(address, value)`, oldest first
    pub fn write_log(&self) -> Vec<(u32, u32), WRITE_LOG_DEPTH> {
        self.with(|s| s.log.iter().copied().collect())
    }

    pub fn clear_write_log(&self) {
        self.with(|s| s.log.clear());
    }

    /// Drive a pin from outside the chip, or release it with `None`
    pub fn drive_input(&self, pin: Pin, level: Option<bool>) {
        self.with(|s| {
            s.external[pin.index()] = level;
            s.update_levels();
        });
    }

    /// Latch edge events for a pin as if the pad had seen them
    ///
    /// Level events follow the pad and cannot be latched.
    pub fn raise_gpio_events(&self, pin: Pin, events: Events) {
        self.with(|s| {
            s.gpio_edges[pin.bank()] |= (events.bits() << pin.irq_shift()) & EDGE_BITS;
        });
    }

    /// The slice counter wrapped
    pub fn pwm_wrap(&self, slice: Slice) {
        self.with(|s| {
            s.pwm_intr |= slice.mask();
            s.store(slice_addr(slice, 0x08), 0);
        });
    }

    /// Value the next conversion of `channel` returns
    pub fn set_adc_sample(&self, channel: AdcChannel, raw: u16) {
        self.with(|s| s.adc_samples[channel.index()] = raw & adc::RESULT_MASK as u16);
    }

    /// Run `count` free-running conversions if `CS.START_MANY` is set
    pub fn adc_free_run(&self, count: usize) {
        self.with(|s| {
            for _ in 0..count {
                let cs = s.raw(ADC_CS);
                if cs & adc::cs::START_MANY == 0 || cs & adc::cs::EN == 0 {
                    break;
                }
                s.convert();
            }
        });
    }

    /// Force `mask` bits of `addr` to read as `level` until unstuck
    pub fn stick(&self, addr: u32, mask: u32, level: u32) {
        self.with(|s| {
            if s.stuck.insert(addr, (mask, level)).is_err() {
                panic!("too many stuck registers in the model");
            }
        });
    }

    pub fn unstick(&self, addr: u32) {
        self.with(|s| {
            s.stuck.remove(&addr);
        });
    }
}

impl RegisterBus for SimCore<'_> {
    fn read(&self, addr: u32) -> u32 {
        self.sim.with(|s| {
            s.reads = s.reads.wrapping_add(1);
            s.read(self.core, addr, true)
        })
    }

    fn write(&self, addr: u32, value: u32) {
        self.sim.with(|s| {
            s.writes = s.writes.wrapping_add(1);
            if s.log.is_full() {
                s.log.pop_front();
            }
            // Room was just made
            let _ = s.log.push_back((addr, value));
            s.write(self.core, addr, value);
            s.update_levels();
        })
    }
}

impl SimCore<'_> {
    pub fn core(&self) -> Core {
        self.core
    }

    pub fn sim(&self) -> &SimBus {
        self.sim
    }
}

fn slice_addr(slice: Slice, offset: u32) -> u32 {
    PWM_BASE + 0x14 * slice.number() as u32 + offset
}

fn in_block(addr: u32, base: u32, len: u32) -> bool {
    addr >= base && addr < base + len
}

fn reset_value(addr: u32) -> u32 {
    if in_block(addr, IO_BANK0_BASE, 8 * NUM_BANK0_GPIOS as u32) && addr % 8 == 4 {
        ctrl::FUNCSEL_MASK
    } else if in_block(addr, PADS_BANK0_BASE + 4, 4 * NUM_BANK0_GPIOS as u32) {
        pad::RESET
    } else if in_block(addr, PWM_BASE, 0xa0) {
        match (addr - PWM_BASE) % 0x14 {
            0x04 => pwm::div::RESET,
            0x10 => pwm::TOP_RESET,
            _ => 0,
        }
    } else if addr == RESETS_RESET {
        reset_bits::ALL
    } else {
        0
    }
}

/// INTS register of either core: (INTE0 address of that core, bank)
fn ints_bank(addr: u32) -> Option<(u32, usize)> {
    [IO_PROC0_INTE0, IO_PROC1_INTE0].into_iter().find_map(|proc| {
        (proc + 0x20..proc + 0x30)
            .contains(&addr)
            .then(|| (proc, ((addr - proc - 0x20) / 4) as usize))
    })
}

/// Overrides shared by OUTOVER / OEOVER / INOVER
fn apply_override(bits: u32, value: bool) -> bool {
    match bits & 0b11 {
        1 => !value,
        2 => false,
        3 => true,
        _ => value,
    }
}

impl SimState {
    fn raw(&self, addr: u32) -> u32 {
        self.regs
            .get(&addr)
            .copied()
            .unwrap_or_else(|| reset_value(addr))
    }

    fn store(&mut self, addr: u32, value: u32) {
        if self.regs.insert(addr, value).is_err() {
            panic!("register model table full");
        }
    }

    fn compute_levels(&self) -> u32 {
        let out = self.raw(SIO_GPIO_OUT);
        let oe = self.raw(SIO_GPIO_OE);
        let mut levels = 0;
        for n in 0..NUM_BANK0_GPIOS as u32 {
            let ctrl_reg = self.raw(IO_BANK0_BASE + 8 * n + 4);
            let pad_reg = self.raw(PADS_BANK0_BASE + 4 + 4 * n);
            let is_sio = ctrl_reg & ctrl::FUNCSEL_MASK == FUNC_SIO;

            let drive = apply_override(
                ctrl_reg >> ctrl::OEOVER_SHIFT,
                is_sio && oe & (1 << n) != 0,
            );
            let output = apply_override(ctrl_reg >> ctrl::OUTOVER_SHIFT, out & (1 << n) != 0);

            let pad_level = if drive {
                output
            } else if let Some(level) = self.external[n as usize] {
                level
            } else {
                pad_reg & pad::PUE != 0
            };

            let input = pad_reg & pad::IE != 0 && pad_level;
            if apply_override(ctrl_reg >> ctrl::INOVER_SHIFT, input) {
                levels |= 1 << n;
            }
        }
        levels
    }

    fn update_levels(&mut self) {
        let new = self.compute_levels();
        let rose = new & !self.levels;
        let fell = self.levels & !new;
        for n in 0..NUM_BANK0_GPIOS as u32 {
            let bank = (n / 8) as usize;
            let shift = (n % 8) * 4;
            if rose & (1 << n) != 0 {
                self.gpio_edges[bank] |= Events::EDGE_RISE.bits() << shift;
            }
            if fell & (1 << n) != 0 {
                self.gpio_edges[bank] |= Events::EDGE_FALL.bits() << shift;
            }
        }
        self.levels = new;
    }

    fn gpio_intr(&self, bank: usize) -> u32 {
        let mut value = self.gpio_edges[bank];
        for i in 0..8u32 {
            let n = bank as u32 * 8 + i;
            if n >= NUM_BANK0_GPIOS as u32 {
                break;
            }
            let level = if self.levels & (1 << n) != 0 {
                Events::LEVEL_HIGH
            } else {
                Events::LEVEL_LOW
            };
            value |= level.bits() << (i * 4);
        }
        value
    }

    fn pwm_en(&self) -> u32 {
        Slice::all()
            .filter(|s| self.raw(slice_addr(*s, 0)) & pwm::csr::EN != 0)
            .fold(0, |acc, s| acc | s.mask())
    }

    fn adc_fcs(&self) -> u32 {
        let mut fcs = self.raw(ADC_FCS) | self.adc_fifo_flags;
        fcs |= (self.adc_fifo.len() as u32) << adc::fcs::LEVEL_SHIFT;
        if self.adc_fifo.is_empty() {
            fcs |= adc::fcs::EMPTY;
        }
        if self.adc_fifo.is_full() {
            fcs |= adc::fcs::FULL;
        }
        fcs
    }

    fn read(&mut self, core: Core, addr: u32, side_effects: bool) -> u32 {
        let value = self.current(core, addr, side_effects);
        match self.stuck.get(&addr) {
            Some(&(mask, level)) => (value & !mask) | (level & mask),
            None => value,
        }
    }

    /// Register value before fault injection
    fn current(&mut self, core: Core, addr: u32, side_effects: bool) -> u32 {
        let ci = core.index();
        if let Some((proc, bank)) = ints_bank(addr) {
            let inte = self.raw(proc + 4 * bank as u32);
            let intf = self.raw(proc + 0x10 + 4 * bank as u32);
            return (self.gpio_intr(bank) | intf) & inte;
        }
        match addr {
            SIO_CPUID => ci as u32,
            SIO_GPIO_IN => self.levels,
            a if (IO_INTR0..IO_INTR0 + 16).contains(&a) => {
                self.gpio_intr(((a - IO_INTR0) / 4) as usize)
            }
            PWM_EN => self.pwm_en(),
            PWM_INTR => self.pwm_intr,
            PWM_INTS => (self.pwm_intr | self.raw(PWM_INTF)) & self.raw(PWM_INTE),
            ADC_CS => {
                let cs = self.raw(ADC_CS);
                if cs & adc::cs::EN != 0 {
                    cs | adc::cs::READY
                } else {
                    cs
                }
            }
            ADC_FCS => self.adc_fcs(),
            ADC_FIFO => {
                let entry = if side_effects {
                    self.adc_fifo.pop_front()
                } else {
                    self.adc_fifo.front().copied()
                };
                match entry {
                    Some(v) => v as u32,
                    None => {
                        if side_effects {
                            self.adc_fifo_flags |= adc::fcs::UNDER;
                        }
                        0
                    }
                }
            }
            RESETS_DONE => !self.raw(RESETS_RESET) & reset_bits::ALL,
            NVIC_ISER | NVIC_ICER => self.nvic_enabled[ci],
            NVIC_ISPR | NVIC_ICPR => self.nvic_pending[ci],
            a => self.raw(a),
        }
    }

    fn write(&mut self, core: Core, addr: u32, value: u32) {
        let ci = core.index();

        let (addr, value) = if has_atomic_aliases(addr) {
            let base = addr & !ALIAS_CLR;
            let old = self.current(core, base, false);
            let value = match addr & ALIAS_CLR {
                ALIAS_XOR => old ^ value,
                ALIAS_SET => old | value,
                ALIAS_CLR => old & !value,
                _ => value,
            };
            (base, value)
        } else {
            (addr, value)
        };

        match addr {
            SIO_CPUID | SIO_GPIO_IN => {}
            a if (SIO_GPIO_OUT..SIO_GPIO_OUT + 0x20).contains(&a) => {
                let reg = if a < SIO_GPIO_OE { SIO_GPIO_OUT } else { SIO_GPIO_OE };
                let old = self.raw(reg);
                let new = match a - reg {
                    0x0 => value,
                    0x4 => old | value,
                    0x8 => old & !value,
                    _ => old ^ value,
                };
                self.store(reg, new & PIN_BITS);
            }
            a if (IO_INTR0..IO_INTR0 + 16).contains(&a) => {
                let bank = ((a - IO_INTR0) / 4) as usize;
                self.gpio_edges[bank] &= !(value & EDGE_BITS);
            }
            a if ints_bank(a).is_some() => {}
            a if in_block(a, PWM_BASE, 0xa0) && (a - PWM_BASE) % 0x14 == 0 => {
                self.write_pwm_csr(a, value);
            }
            PWM_EN => {
                for slice in Slice::all() {
                    let csr_addr = slice_addr(slice, 0);
                    let csr = self.raw(csr_addr) & !pwm::csr::EN;
                    let en = if value & slice.mask() != 0 { pwm::csr::EN } else { 0 };
                    self.store(csr_addr, csr | en);
                }
            }
            PWM_INTR => self.pwm_intr &= !value,
            PWM_INTS => {}
            ADC_CS => {
                self.store(ADC_CS, value & !(adc::cs::START_ONCE | adc::cs::READY));
                if value & adc::cs::START_ONCE != 0 && value & adc::cs::EN != 0 {
                    self.convert();
                }
            }
            ADC_FCS => {
                self.adc_fifo_flags &= !(value & (adc::fcs::UNDER | adc::fcs::OVER));
                let writable = adc::fcs::EN
                    | adc::fcs::SHIFT
                    | adc::fcs::ERR
                    | adc::fcs::DREQ_EN
                    | adc::fcs::THRESH_MASK;
                self.store(ADC_FCS, value & writable);
            }
            ADC_RESULT | ADC_FIFO => {}
            RESETS_RESET => {
                let asserted = value & !self.raw(RESETS_RESET);
                self.store(RESETS_RESET, value & reset_bits::ALL);
                self.reset_blocks(asserted);
            }
            RESETS_DONE => {}
            NVIC_ISER => self.nvic_enabled[ci] |= value,
            NVIC_ICER => self.nvic_enabled[ci] &= !value,
            NVIC_ISPR => self.nvic_pending[ci] |= value,
            NVIC_ICPR => self.nvic_pending[ci] &= !value,
            a => self.store(a, value),
        }
    }

    fn write_pwm_csr(&mut self, addr: u32, value: u32) {
        let ctr_addr = addr + 0x08;
        let top = self.raw(addr + 0x10) & 0xffff;
        let ctr = self.raw(ctr_addr) & 0xffff;
        if value & pwm::csr::PH_ADV != 0 {
            self.store(ctr_addr, if ctr >= top { 0 } else { ctr + 1 });
        } else if value & pwm::csr::PH_RET != 0 {
            self.store(ctr_addr, if ctr == 0 { top } else { ctr - 1 });
        }
        self.store(addr, value & !(pwm::csr::PH_ADV | pwm::csr::PH_RET));
    }

    /// One conversion of the selected input
    fn convert(&mut self) {
        let cs = self.raw(ADC_CS);
        let ainsel = (cs & adc::cs::AINSEL_MASK) >> adc::cs::AINSEL_SHIFT;
        let sample = self
            .adc_samples
            .get(ainsel as usize)
            .copied()
            .unwrap_or(0);
        self.store(ADC_RESULT, sample as u32);

        let fcs = self.raw(ADC_FCS);
        if fcs & adc::fcs::EN != 0 {
            let entry = if fcs & adc::fcs::SHIFT != 0 {
                sample >> 4
            } else {
                sample
            };
            if self.adc_fifo.push_back(entry).is_err() {
                self.adc_fifo_flags |= adc::fcs::OVER;
            }
        }

        let rrobin = (cs & adc::cs::RROBIN_MASK) >> adc::cs::RROBIN_SHIFT;
        if rrobin != 0 {
            let next = (1..=5)
                .map(|step| (ainsel + step) % 5)
                .find(|ch| rrobin & (1 << ch) != 0)
                .unwrap_or(ainsel);
            self.store(
                ADC_CS,
                (cs & !adc::cs::AINSEL_MASK) | (next << adc::cs::AINSEL_SHIFT),
            );
        }
    }

    fn reset_blocks(&mut self, asserted: u32) {
        let blocks = [
            (reset_bits::ADC, ADC_BASE),
            (reset_bits::IO_BANK0, IO_BANK0_BASE),
            (reset_bits::PADS_BANK0, PADS_BANK0_BASE),
            (reset_bits::PWM, PWM_BASE),
        ];
        for (bit, base) in blocks {
            if asserted & bit == 0 {
                continue;
            }
            let keys: Vec<u32, MAX_REGS> = self
                .regs
                .keys()
                .copied()
                .filter(|a| in_block(*a, base, 0x1000))
                .collect();
            for key in keys {
                self.regs.remove(&key);
            }
            match bit {
                reset_bits::ADC => {
                    self.adc_fifo.clear();
                    self.adc_fifo_flags = 0;
                }
                reset_bits::IO_BANK0 => self.gpio_edges = [0; IRQ_BANKS],
                reset_bits::PWM => self.pwm_intr = 0,
                _ => {}
            }
        }
    }
}
