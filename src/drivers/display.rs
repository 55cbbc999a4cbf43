// Slap AI - GC9A01A Round TFT Driver
//
// 128x128 RGB565 panel on SPI2. Writes go straight to panel RAM, there is
// no framebuffer. Text is drawn with embedded-graphics mono fonts, scaled by
// whole pixels for the larger sizes.

use std::thread;
use std::time::Duration;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{ContainsPoint, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver};
use esp_idf_sys::EspError;
use slap_core::view::{Panel, TextSize};

use crate::config::*;

// GC9A01A commands
const CMD_SLPOUT: u8 = 0x11;
const CMD_DISPON: u8 = 0x29;
const CMD_CASET: u8 = 0x2A;
const CMD_RASET: u8 = 0x2B;
const CMD_RAMWR: u8 = 0x2C;
const CMD_MADCTL: u8 = 0x36;
const CMD_COLMOD: u8 = 0x3A;

const MADCTL_ROTATION_0: u8 = 0x68;
const COLMOD_16BIT: u8 = 0x05;

/// Vendor register unlock and power/gamma setup.
const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (0xEF, &[]),
    (0xEB, &[0x14]),
    (0xFE, &[]),
    (0xEF, &[]),
    (0xEB, &[0x14]),
    (0x84, &[0x40]),
    (0x85, &[0xFF]),
    (0x86, &[0xFF]),
    (0x87, &[0xFF]),
    (0x88, &[0x0A]),
    (0x89, &[0x21]),
    (0x8A, &[0x00]),
    (0x8B, &[0x80]),
    (0x8C, &[0x01]),
    (0x8D, &[0x01]),
    (0x8E, &[0xFF]),
    (0x8F, &[0xFF]),
    (0xB6, &[0x00, 0x00]),
    (CMD_MADCTL, &[MADCTL_ROTATION_0]),
    (CMD_COLMOD, &[COLMOD_16BIT]),
];

/// Bytes pushed per SPI transaction when streaming a solid fill.
const FILL_CHUNK: usize = 512;

pub struct RoundDisplay {
    spi: SpiDeviceDriver<'static, SpiDriver<'static>>,
    dc: PinDriver<'static, AnyOutputPin, Output>,
    rst: PinDriver<'static, AnyOutputPin, Output>,
    backlight: PinDriver<'static, AnyOutputPin, Output>,
}

impl RoundDisplay {
    pub fn new(
        spi: SpiDeviceDriver<'static, SpiDriver<'static>>,
        dc: PinDriver<'static, AnyOutputPin, Output>,
        rst: PinDriver<'static, AnyOutputPin, Output>,
        backlight: PinDriver<'static, AnyOutputPin, Output>,
    ) -> Self {
        Self {
            spi,
            dc,
            rst,
            backlight,
        }
    }

    /// Hardware reset, panel init, then backlight on.
    pub fn init(&mut self) -> anyhow::Result<()> {
        self.dc.set_high()?;
        self.rst.set_high()?;
        thread::sleep(Duration::from_millis(10));
        self.rst.set_low()?;
        thread::sleep(Duration::from_millis(10));
        self.rst.set_high()?;
        thread::sleep(Duration::from_millis(120));

        for (cmd, data) in INIT_SEQUENCE {
            self.command(*cmd, data)?;
        }

        self.command(CMD_SLPOUT, &[])?;
        thread::sleep(Duration::from_millis(120));
        self.command(CMD_DISPON, &[])?;
        thread::sleep(Duration::from_millis(20));

        self.fill_area(0, 0, SCREEN_WIDTH as u16, SCREEN_HEIGHT as u16, 0)?;
        self.backlight.set_high()?;

        log::info!(
            "GC9A01A initialised ({}x{}, {} MHz)",
            SCREEN_WIDTH,
            SCREEN_HEIGHT,
            SPI_BAUDRATE_MHZ
        );
        Ok(())
    }

    fn command(&mut self, cmd: u8, data: &[u8]) -> Result<(), EspError> {
        self.dc.set_low()?;
        self.spi.write(&[cmd])?;
        if !data.is_empty() {
            self.dc.set_high()?;
            self.spi.write(data)?;
        }
        Ok(())
    }

    fn set_window(&mut self, x: u16, y: u16, w: u16, h: u16) -> Result<(), EspError> {
        let (x2, y2) = (x + w - 1, y + h - 1);
        let [x_hi, x_lo] = x.to_be_bytes();
        let [x2_hi, x2_lo] = x2.to_be_bytes();
        let [y_hi, y_lo] = y.to_be_bytes();
        let [y2_hi, y2_lo] = y2.to_be_bytes();
        self.command(CMD_CASET, &[x_hi, x_lo, x2_hi, x2_lo])?;
        self.command(CMD_RASET, &[y_hi, y_lo, y2_hi, y2_lo])?;
        self.command(CMD_RAMWR, &[])
    }

    /// Fill an on-screen rectangle. Callers clip first.
    fn fill_area(&mut self, x: u16, y: u16, w: u16, h: u16, color: u16) -> Result<(), EspError> {
        if w == 0 || h == 0 {
            return Ok(());
        }
        self.set_window(x, y, w, h)?;
        self.dc.set_high()?;

        let mut chunk = [0u8; FILL_CHUNK];
        for pair in chunk.chunks_exact_mut(2) {
            pair.copy_from_slice(&color.to_be_bytes());
        }

        let mut remaining = w as usize * h as usize * 2;
        while remaining > 0 {
            let n = remaining.min(FILL_CHUNK);
            self.spi.write(&chunk[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    fn fill_clipped(&mut self, area: &Rectangle, color: u16) -> Result<(), EspError> {
        let area = area.intersection(&self.bounding_box());
        if area.is_zero_sized() {
            return Ok(());
        }
        self.fill_area(
            area.top_left.x as u16,
            area.top_left.y as u16,
            area.size.width as u16,
            area.size.height as u16,
            color,
        )
    }
}

fn raw(color: Rgb565) -> u16 {
    RawU16::from(color).into_inner()
}

impl OriginDimensions for RoundDisplay {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for RoundDisplay {
    type Color = Rgb565;
    type Error = EspError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.fill_area(point.x as u16, point.y as u16, 1, 1, raw(color))?;
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_clipped(area, raw(color))
    }
}

// ---------------------------------------------------------------------------
// Text scaling
// ---------------------------------------------------------------------------

/// Draws every pixel of the wrapped target as a `factor` x `factor` block,
/// offset by `origin`.
struct Scaled<'a> {
    display: &'a mut RoundDisplay,
    origin: Point,
    factor: u32,
}

impl OriginDimensions for Scaled<'_> {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH / self.factor, SCREEN_HEIGHT / self.factor)
    }
}

impl DrawTarget for Scaled<'_> {
    type Color = Rgb565;
    type Error = EspError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let f = self.factor as i32;
        for Pixel(point, color) in pixels {
            let block = Rectangle::new(
                self.origin + Point::new(point.x * f, point.y * f),
                Size::new_equal(self.factor),
            );
            self.display.fill_solid(&block, color)?;
        }
        Ok(())
    }
}

fn scale(size: TextSize) -> u32 {
    match size {
        TextSize::Small => 1,
        TextSize::Medium => 2,
        TextSize::Large => 3,
    }
}

impl Panel for RoundDisplay {
    type Error = EspError;

    fn fill_screen(&mut self, color: u16) -> Result<(), EspError> {
        self.fill_area(0, 0, SCREEN_WIDTH as u16, SCREEN_HEIGHT as u16, color)
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: u16) -> Result<(), EspError> {
        self.fill_clipped(&Rectangle::new(Point::new(x, y), Size::new(w, h)), color)
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        size: TextSize,
        color: u16,
    ) -> Result<(), EspError> {
        let style = MonoTextStyle::new(&FONT_6X10, Rgb565::from(RawU16::new(color)));
        let mut target = Scaled {
            display: self,
            origin: Point::new(x, y),
            factor: scale(size),
        };
        Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut target)?;
        Ok(())
    }

    fn text_width(&self, text: &str, size: TextSize) -> u32 {
        text.chars().count() as u32 * FONT_6X10.character_size.width * scale(size)
    }
}
