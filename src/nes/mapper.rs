use anyhow::{Result, bail};

use super::cartridge::{Cartridge, Mirroring};
use super::ppu::Ppu;

/// Cartridge mapper logic. Reads and writes cover both the CPU window
/// ($6000-$FFFF) and the PPU pattern-table window ($0000-$1FFF); `step`
/// runs once per PPU tick so scanline-counting mappers can drive their IRQ.
pub trait Mapper {
    fn read(&self, cart: &Cartridge, addr: u16) -> u8;
    fn write(&mut self, cart: &mut Cartridge, addr: u16, value: u8);
    fn step(&mut self, _ppu: &Ppu) {}
    /// Consumes a pending IRQ edge, if any.
    fn take_irq(&mut self) -> bool {
        false
    }
}

pub fn create_mapper(cart: &Cartridge) -> Result<Box<dyn Mapper>> {
    let mapper: Box<dyn Mapper> = match cart.mapper_id {
        // NROM is the UxROM circuit with the bank select wired to nothing.
        0 | 2 => Box::new(Mapper2::new(cart)),
        1 => Box::new(Mapper1::new(cart)),
        3 => Box::new(Mapper3::new(cart)),
        4 => Box::new(Mapper4::new(cart)),
        7 => Box::new(Mapper7::new(cart)),
        id => bail!("unsupported mapper {id}"),
    };
    Ok(mapper)
}

/// Resolves a bank index (negative counts from the end) to a byte offset.
fn bank_offset(data_len: usize, bank_size: usize, index: i32) -> usize {
    let mut index = index;
    if index >= 0x80 {
        index -= 0x100;
    }
    let banks = ((data_len / bank_size) as i32).max(1);
    index %= banks;
    let mut offset = index * bank_size as i32;
    if offset < 0 {
        offset += data_len as i32;
    }
    offset as usize
}

/// UxROM: fixed last 16 KiB bank, switchable first bank. Also serves NROM.
struct Mapper2 {
    prg_banks: usize,
    prg_bank1: usize,
    prg_bank2: usize,
}

impl Mapper2 {
    fn new(cart: &Cartridge) -> Self {
        let prg_banks = (cart.prg.len() / 0x4000).max(1);
        Self {
            prg_banks,
            prg_bank1: 0,
            prg_bank2: prg_banks - 1,
        }
    }
}

impl Mapper for Mapper2 {
    fn read(&self, cart: &Cartridge, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => cart.chr[addr as usize % cart.chr.len()],
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize],
            0x8000..=0xBFFF => {
                let idx = self.prg_bank1 * 0x4000 + (addr - 0x8000) as usize;
                cart.prg[idx % cart.prg.len()]
            }
            0xC000..=0xFFFF => {
                let idx = self.prg_bank2 * 0x4000 + (addr - 0xC000) as usize;
                cart.prg[idx % cart.prg.len()]
            }
            _ => 0,
        }
    }

    fn write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => {
                let idx = addr as usize % cart.chr.len();
                cart.chr[idx] = value;
            }
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize] = value,
            0x8000..=0xFFFF => self.prg_bank1 = value as usize % self.prg_banks,
            _ => panic!("mapper 2: write to unmapped address ${addr:04X}"),
        }
    }
}

/// MMC1: serial shift-register programming of mirroring, PRG and CHR banks.
struct Mapper1 {
    shift_register: u8,
    control: u8,
    prg_mode: u8,
    chr_mode: u8,
    prg_bank: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_offsets: [usize; 2],
    chr_offsets: [usize; 2],
}

impl Mapper1 {
    fn new(cart: &Cartridge) -> Self {
        Self {
            shift_register: 0x10,
            control: 0,
            prg_mode: 0,
            chr_mode: 0,
            prg_bank: 0,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_offsets: [0, bank_offset(cart.prg.len(), 0x4000, -1)],
            chr_offsets: [0, 0],
        }
    }

    fn load_register(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        if value & 0x80 != 0 {
            self.shift_register = 0x10;
            self.write_control(cart, self.control | 0x0C);
            return;
        }

        let complete = self.shift_register & 0x01 != 0;
        self.shift_register >>= 1;
        self.shift_register |= (value & 0x01) << 4;
        if complete {
            let data = self.shift_register;
            self.write_register(cart, addr, data);
            self.shift_register = 0x10;
        }
    }

    fn write_register(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        match addr {
            0x8000..=0x9FFF => self.write_control(cart, value),
            0xA000..=0xBFFF => {
                self.chr_bank0 = value;
                self.update_offsets(cart);
            }
            0xC000..=0xDFFF => {
                self.chr_bank1 = value;
                self.update_offsets(cart);
            }
            _ => {
                self.prg_bank = value & 0x0F;
                self.update_offsets(cart);
            }
        }
    }

    fn write_control(&mut self, cart: &mut Cartridge, value: u8) {
        self.control = value;
        self.chr_mode = (value >> 4) & 0x01;
        self.prg_mode = (value >> 2) & 0x03;
        cart.mirroring = match value & 0x03 {
            0 => Mirroring::Single0,
            1 => Mirroring::Single1,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        };
        self.update_offsets(cart);
    }

    fn update_offsets(&mut self, cart: &Cartridge) {
        let prg = |index: i32| bank_offset(cart.prg.len(), 0x4000, index);
        let chr = |index: i32| bank_offset(cart.chr.len(), 0x1000, index);

        match self.prg_mode {
            0 | 1 => {
                // 32 KiB switch: low bit of the bank index is ignored.
                self.prg_offsets[0] = prg((self.prg_bank & 0xFE) as i32);
                self.prg_offsets[1] = prg((self.prg_bank | 0x01) as i32);
            }
            2 => {
                self.prg_offsets[0] = prg(0);
                self.prg_offsets[1] = prg(self.prg_bank as i32);
            }
            _ => {
                self.prg_offsets[0] = prg(self.prg_bank as i32);
                self.prg_offsets[1] = prg(-1);
            }
        }

        if self.chr_mode == 0 {
            self.chr_offsets[0] = chr((self.chr_bank0 & 0xFE) as i32);
            self.chr_offsets[1] = chr((self.chr_bank0 | 0x01) as i32);
        } else {
            self.chr_offsets[0] = chr(self.chr_bank0 as i32);
            self.chr_offsets[1] = chr(self.chr_bank1 as i32);
        }
    }
}

impl Mapper for Mapper1 {
    fn read(&self, cart: &Cartridge, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => {
                let bank = (addr / 0x1000) as usize;
                let idx = self.chr_offsets[bank] + (addr % 0x1000) as usize;
                cart.chr[idx % cart.chr.len()]
            }
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => {
                let a = (addr - 0x8000) as usize;
                let idx = self.prg_offsets[a / 0x4000] + a % 0x4000;
                cart.prg[idx % cart.prg.len()]
            }
            _ => 0,
        }
    }

    fn write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => {
                if cart.chr_is_ram {
                    let bank = (addr / 0x1000) as usize;
                    let idx =
                        (self.chr_offsets[bank] + (addr % 0x1000) as usize) % cart.chr.len();
                    cart.chr[idx] = value;
                }
            }
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize] = value,
            0x8000..=0xFFFF => self.load_register(cart, addr, value),
            _ => panic!("mapper 1: write to unmapped address ${addr:04X}"),
        }
    }
}

/// CNROM: two fixed PRG banks, 2-bit CHR bank select.
struct Mapper3 {
    chr_bank: usize,
    prg_bank2: usize,
}

impl Mapper3 {
    fn new(cart: &Cartridge) -> Self {
        Self {
            chr_bank: 0,
            prg_bank2: (cart.prg.len() / 0x4000).max(1) - 1,
        }
    }
}

impl Mapper for Mapper3 {
    fn read(&self, cart: &Cartridge, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => {
                let idx = self.chr_bank * 0x2000 + addr as usize;
                cart.chr[idx % cart.chr.len()]
            }
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize],
            0x8000..=0xBFFF => cart.prg[(addr - 0x8000) as usize % cart.prg.len()],
            0xC000..=0xFFFF => {
                let idx = self.prg_bank2 * 0x4000 + (addr - 0xC000) as usize;
                cart.prg[idx % cart.prg.len()]
            }
            _ => 0,
        }
    }

    fn write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => {
                if cart.chr_is_ram {
                    let idx = (self.chr_bank * 0x2000 + addr as usize) % cart.chr.len();
                    cart.chr[idx] = value;
                }
            }
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize] = value,
            0x8000..=0xFFFF => self.chr_bank = (value & 0x03) as usize,
            _ => panic!("mapper 3: write to unmapped address ${addr:04X}"),
        }
    }
}

/// MMC3: eight bank registers behind a select latch, plus a scanline IRQ.
struct Mapper4 {
    register: u8,
    registers: [u8; 8],
    prg_mode: u8,
    chr_mode: u8,
    prg_offsets: [usize; 4],
    chr_offsets: [usize; 8],
    reload: u8,
    counter: u8,
    irq_enable: bool,
    irq_flag: bool,
}

impl Mapper4 {
    fn new(cart: &Cartridge) -> Self {
        let prg = |index: i32| bank_offset(cart.prg.len(), 0x2000, index);
        Self {
            register: 0,
            registers: [0; 8],
            prg_mode: 0,
            chr_mode: 0,
            prg_offsets: [prg(0), prg(1), prg(-2), prg(-1)],
            chr_offsets: [0; 8],
            reload: 0,
            counter: 0,
            irq_enable: false,
            irq_flag: false,
        }
    }

    fn write_register(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        match (addr, addr & 0x01) {
            (0x8000..=0x9FFF, 0) => self.write_bank_select(cart, value),
            (0x8000..=0x9FFF, _) => {
                self.registers[self.register as usize] = value;
                self.update_offsets(cart);
            }
            (0xA000..=0xBFFF, 0) => {
                cart.mirroring = if value & 0x01 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                };
            }
            (0xA000..=0xBFFF, _) => {} // PRG-RAM protect, not modeled
            (0xC000..=0xDFFF, 0) => self.reload = value,
            (0xC000..=0xDFFF, _) => self.counter = 0,
            (0xE000..=0xFFFF, 0) => {
                self.irq_enable = false;
                self.irq_flag = false;
            }
            _ => self.irq_enable = true,
        }
    }

    fn write_bank_select(&mut self, cart: &mut Cartridge, value: u8) {
        self.prg_mode = (value >> 6) & 0x01;
        self.chr_mode = (value >> 7) & 0x01;
        self.register = value & 0x07;
        self.update_offsets(cart);
    }

    fn update_offsets(&mut self, cart: &Cartridge) {
        let prg = |index: i32| bank_offset(cart.prg.len(), 0x2000, index);
        let chr = |index: i32| bank_offset(cart.chr.len(), 0x0400, index);
        let r = &self.registers;

        self.prg_offsets = if self.prg_mode == 0 {
            [prg(r[6] as i32), prg(r[7] as i32), prg(-2), prg(-1)]
        } else {
            [prg(-2), prg(r[7] as i32), prg(r[6] as i32), prg(-1)]
        };

        // R0/R1 address 2 KiB pairs; their low bit is forced even.
        let pairs = [
            chr((r[0] & 0xFE) as i32),
            chr((r[0] | 0x01) as i32),
            chr((r[1] & 0xFE) as i32),
            chr((r[1] | 0x01) as i32),
        ];
        let singles = [
            chr(r[2] as i32),
            chr(r[3] as i32),
            chr(r[4] as i32),
            chr(r[5] as i32),
        ];
        self.chr_offsets = if self.chr_mode == 0 {
            [
                pairs[0], pairs[1], pairs[2], pairs[3], singles[0], singles[1], singles[2],
                singles[3],
            ]
        } else {
            [
                singles[0], singles[1], singles[2], singles[3], pairs[0], pairs[1], pairs[2],
                pairs[3],
            ]
        };
    }

    fn handle_scanline(&mut self) {
        if self.counter == 0 {
            self.counter = self.reload;
        } else {
            self.counter -= 1;
            if self.counter == 0 && self.irq_enable {
                self.irq_flag = true;
            }
        }
    }
}

impl Mapper for Mapper4 {
    fn read(&self, cart: &Cartridge, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => {
                let idx = self.chr_offsets[(addr / 0x0400) as usize] + (addr % 0x0400) as usize;
                cart.chr[idx % cart.chr.len()]
            }
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => {
                let a = (addr - 0x8000) as usize;
                let idx = self.prg_offsets[a / 0x2000] + a % 0x2000;
                cart.prg[idx % cart.prg.len()]
            }
            _ => 0,
        }
    }

    fn write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => {
                if cart.chr_is_ram {
                    let idx = (self.chr_offsets[(addr / 0x0400) as usize]
                        + (addr % 0x0400) as usize)
                        % cart.chr.len();
                    cart.chr[idx] = value;
                }
            }
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize] = value,
            0x8000..=0xFFFF => self.write_register(cart, addr, value),
            _ => panic!("mapper 4: write to unmapped address ${addr:04X}"),
        }
    }

    // The scanline counter is driven from PPU timing rather than A12 edges.
    // Cycle 280 matches observed behavior; the documented edge is nearer 260.
    fn step(&mut self, ppu: &Ppu) {
        if ppu.cycle != 280 {
            return;
        }
        if ppu.scanline > 239 && ppu.scanline != 261 {
            return;
        }
        if !ppu.rendering_enabled() {
            return;
        }
        self.handle_scanline();
    }

    fn take_irq(&mut self) -> bool {
        std::mem::take(&mut self.irq_flag)
    }
}

/// AxROM: 32 KiB PRG switching with single-screen mirroring select.
struct Mapper7 {
    prg_bank: usize,
}

impl Mapper7 {
    fn new(_cart: &Cartridge) -> Self {
        Self { prg_bank: 0 }
    }
}

impl Mapper for Mapper7 {
    fn read(&self, cart: &Cartridge, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => cart.chr[addr as usize % cart.chr.len()],
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize],
            0x8000..=0xFFFF => {
                let idx = self.prg_bank * 0x8000 + (addr - 0x8000) as usize;
                cart.prg[idx % cart.prg.len()]
            }
            _ => 0,
        }
    }

    fn write(&mut self, cart: &mut Cartridge, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => {
                if cart.chr_is_ram {
                    let idx = addr as usize % cart.chr.len();
                    cart.chr[idx] = value;
                }
            }
            0x6000..=0x7FFF => cart.sram[(addr - 0x6000) as usize] = value,
            0x8000..=0xFFFF => {
                self.prg_bank = (value & 0x07) as usize;
                cart.mirroring = if value & 0x10 != 0 {
                    Mirroring::Single1
                } else {
                    Mirroring::Single0
                };
            }
            _ => panic!("mapper 7: write to unmapped address ${addr:04X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterned_banks(total_size: usize, bank_size: usize) -> Vec<u8> {
        let mut data = vec![0u8; total_size];
        for (bank, chunk) in data.chunks_mut(bank_size).enumerate() {
            chunk.fill((bank as u8).wrapping_add(1));
        }
        data
    }

    fn make_cart(mapper_id: u8, prg: Vec<u8>, chr: Vec<u8>, chr_is_ram: bool) -> Cartridge {
        Cartridge {
            prg,
            chr,
            sram: vec![0; 8 * 1024],
            mapper_id,
            mirroring: Mirroring::Horizontal,
            battery: false,
            chr_is_ram,
        }
    }

    #[test]
    fn unsupported_mapper_is_rejected() {
        let cart = make_cart(5, patterned_banks(0x8000, 0x4000), vec![0; 0x2000], true);
        assert!(create_mapper(&cart).is_err());
    }

    #[test]
    fn mapper0_mirrors_a_single_prg_bank() {
        let mut cart = make_cart(0, patterned_banks(0x4000, 0x4000), vec![0; 0x2000], true);
        cart.prg[0x1234] = 0x42;
        let mapper = create_mapper(&cart).unwrap();
        assert_eq!(mapper.read(&cart, 0x9234), 0x42);
        assert_eq!(mapper.read(&cart, 0xD234), 0x42);
    }

    #[test]
    fn mapper2_keeps_last_bank_fixed() {
        let cart = make_cart(2, patterned_banks(3 * 0x4000, 0x4000), vec![0; 0x2000], true);
        let mut mapper = create_mapper(&cart).unwrap();
        let mut cart = cart;

        mapper.write(&mut cart, 0x8000, 1);
        assert_eq!(mapper.read(&cart, 0x8000), 2);
        assert_eq!(mapper.read(&cart, 0xC000), 3);
    }

    #[test]
    fn mapper2_treats_chr_as_ram() {
        let mut cart = make_cart(2, patterned_banks(0x8000, 0x4000), vec![0; 0x2000], false);
        let mut mapper = Mapper2::new(&cart);
        mapper.write(&mut cart, 0x0010, 0xAB);
        assert_eq!(mapper.read(&cart, 0x0010), 0xAB);
    }

    #[test]
    fn mapper2_sram_round_trips() {
        let mut cart = make_cart(2, patterned_banks(0x8000, 0x4000), vec![0; 0x2000], true);
        let mut mapper = Mapper2::new(&cart);
        mapper.write(&mut cart, 0x6123, 0x77);
        assert_eq!(mapper.read(&cart, 0x6123), 0x77);
    }

    #[test]
    fn mapper1_serial_write_programs_prg_bank() {
        let mut cart = make_cart(
            1,
            patterned_banks(4 * 0x4000, 0x4000),
            patterned_banks(0x2000, 0x1000),
            false,
        );
        let mut mapper = Mapper1::new(&cart);

        // PRG bank 2, LSB first; mode is 0 so this selects the 32 KiB pair.
        for bit in [0u8, 1, 0, 0, 0] {
            mapper.write(&mut cart, 0xE000, bit);
        }
        assert_eq!(mapper.shift_register, 0x10);
        assert_eq!(mapper.read(&cart, 0x8000), 3);
        assert_eq!(mapper.read(&cart, 0xC000), 4);
    }

    #[test]
    fn mapper1_reset_bit_restores_shift_register_and_prg_mode() {
        let mut cart = make_cart(
            1,
            patterned_banks(4 * 0x4000, 0x4000),
            patterned_banks(0x2000, 0x1000),
            false,
        );
        let mut mapper = Mapper1::new(&cart);

        mapper.write(&mut cart, 0x8000, 1);
        mapper.write(&mut cart, 0x8000, 1);
        mapper.write(&mut cart, 0x8000, 0x80);
        assert_eq!(mapper.shift_register, 0x10);
        // Reset ORs 0x0C into control: fix last bank, switch first.
        assert_eq!(mapper.prg_mode, 3);

        for bit in [0u8, 1, 0, 0, 0] {
            mapper.write(&mut cart, 0xE000, bit);
        }
        assert_eq!(mapper.read(&cart, 0x8000), 3);
        assert_eq!(mapper.read(&cart, 0xC000), 4);
    }

    #[test]
    fn mapper1_control_rewrites_mirroring() {
        let mut cart = make_cart(
            1,
            patterned_banks(2 * 0x4000, 0x4000),
            patterned_banks(0x2000, 0x1000),
            false,
        );
        let mut mapper = Mapper1::new(&cart);

        // Control = 0b00010: vertical mirroring.
        for bit in [0u8, 1, 0, 0, 0] {
            mapper.write(&mut cart, 0x8000, bit);
        }
        assert_eq!(cart.mirroring, Mirroring::Vertical);
    }

    #[test]
    fn mapper3_switches_chr_bank() {
        let mut cart = make_cart(
            3,
            patterned_banks(0x8000, 0x4000),
            patterned_banks(2 * 0x2000, 0x2000),
            false,
        );
        let mut mapper = Mapper3::new(&cart);

        mapper.write(&mut cart, 0x8000, 1);
        assert_eq!(mapper.read(&cart, 0x0000), 2);
        assert_eq!(mapper.read(&cart, 0x8000), 1);
        assert_eq!(mapper.read(&cart, 0xC000), 2);
    }

    #[test]
    fn mapper4_prg_modes_swap_fixed_bank() {
        let mut cart = make_cart(
            4,
            patterned_banks(4 * 0x2000, 0x2000),
            patterned_banks(8 * 0x0400, 0x0400),
            false,
        );
        let mut mapper = Mapper4::new(&cart);

        mapper.write(&mut cart, 0x8000, 6);
        mapper.write(&mut cart, 0x8001, 1); // R6 = 1
        assert_eq!(mapper.read(&cart, 0x8000), 2);
        assert_eq!(mapper.read(&cart, 0xC000), 3); // second-to-last fixed
        assert_eq!(mapper.read(&cart, 0xE000), 4); // last fixed

        mapper.write(&mut cart, 0x8000, 0x46); // PRG mode 1
        assert_eq!(mapper.read(&cart, 0x8000), 3);
        assert_eq!(mapper.read(&cart, 0xC000), 2);
    }

    #[test]
    fn mapper4_chr_mode_swaps_groupings() {
        let mut cart = make_cart(
            4,
            patterned_banks(4 * 0x2000, 0x2000),
            patterned_banks(8 * 0x0400, 0x0400),
            false,
        );
        let mut mapper = Mapper4::new(&cart);

        mapper.write(&mut cart, 0x8000, 0);
        mapper.write(&mut cart, 0x8001, 4); // R0 = 4: 2 KiB pair at $0000
        assert_eq!(mapper.read(&cart, 0x0000), 5);
        assert_eq!(mapper.read(&cart, 0x0400), 6);

        mapper.write(&mut cart, 0x8000, 0x80); // CHR mode 1: pair moves to $1000
        assert_eq!(mapper.read(&cart, 0x1000), 5);
        assert_eq!(mapper.read(&cart, 0x1400), 6);
    }

    #[test]
    fn mapper4_scanline_counter_raises_irq() {
        let mut cart = make_cart(
            4,
            patterned_banks(4 * 0x2000, 0x2000),
            patterned_banks(8 * 0x0400, 0x0400),
            false,
        );
        let mut mapper = Mapper4::new(&cart);
        let mut ppu = Ppu::new();
        ppu.cycle = 280;
        ppu.scanline = 0;
        ppu.mask = 0x18; // background + sprites on

        mapper.write(&mut cart, 0xC000, 1); // latch
        mapper.write(&mut cart, 0xC001, 0); // reload on next clock
        mapper.write(&mut cart, 0xE001, 0); // enable

        mapper.step(&ppu); // counter <- latch
        assert!(!mapper.take_irq());
        mapper.step(&ppu); // decrement to zero
        assert!(mapper.take_irq());
        assert!(!mapper.take_irq());

        // Disabling acknowledges any pending IRQ.
        mapper.handle_scanline();
        mapper.handle_scanline();
        mapper.write(&mut cart, 0xE000, 0);
        assert!(!mapper.take_irq());
    }

    #[test]
    fn mapper4_step_ignores_blanked_lines() {
        let cart = make_cart(
            4,
            patterned_banks(4 * 0x2000, 0x2000),
            patterned_banks(8 * 0x0400, 0x0400),
            false,
        );
        let mut mapper = Mapper4::new(&cart);
        mapper.reload = 0;
        mapper.irq_enable = true;
        let mut ppu = Ppu::new();
        ppu.cycle = 280;
        ppu.scanline = 241; // vblank line
        ppu.mask = 0x18;

        mapper.step(&ppu);
        assert!(!mapper.take_irq());

        ppu.scanline = 261; // pre-render line does clock the counter
        mapper.counter = 1;
        mapper.step(&ppu);
        assert!(mapper.take_irq());
    }

    #[test]
    fn mapper7_selects_32k_bank_and_single_screen() {
        let mut cart = make_cart(
            7,
            patterned_banks(4 * 0x8000, 0x8000),
            vec![0; 0x2000],
            true,
        );
        let mut mapper = Mapper7::new(&cart);

        mapper.write(&mut cart, 0x8000, 0x12);
        assert_eq!(mapper.read(&cart, 0x8000), 3);
        assert_eq!(cart.mirroring, Mirroring::Single1);

        mapper.write(&mut cart, 0x8000, 0x01);
        assert_eq!(mapper.read(&cart, 0x8000), 2);
        assert_eq!(cart.mirroring, Mirroring::Single0);
    }
}
