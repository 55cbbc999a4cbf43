// Slap AI - QMI8658C IMU Driver
//
// Register-level driver over the dedicated IMU I2C bus. Only the
// accelerometer feeds slap detection; gyro and temperature are read in the
// same burst for logging.

use std::thread;
use std::time::Duration;

use anyhow::bail;
use esp_idf_hal::i2c::I2cDriver;
use slap_core::Vector3;

use crate::config::*;
use crate::events::ImuSample;

// QMI8658C register addresses
const REG_WHO_AM_I: u8 = 0x00;
const REG_CTRL1: u8 = 0x02; // SPI/I2C interface, address auto-increment
const REG_CTRL2: u8 = 0x03; // Accelerometer range + ODR
const REG_CTRL3: u8 = 0x04; // Gyroscope range + ODR
const REG_CTRL7: u8 = 0x08; // Sensor enable
const REG_TEMP_L: u8 = 0x33; // Start of 14-byte temp/accel/gyro burst
const WHO_AM_I_EXPECTED: u8 = 0x05;

const CTRL1_ADDR_AUTO_INCREMENT: u8 = 0x40;
const CTRL2_ACCEL_2G_ODR: u8 = 0x15;
const CTRL3_GYRO_250DPS_ODR: u8 = 0x55;
const CTRL7_ACCEL_GYRO_ENABLE: u8 = 0x03;

pub struct Qmi8658 {
    i2c: I2cDriver<'static>,
}

impl Qmi8658 {
    pub fn new(i2c: I2cDriver<'static>) -> Self {
        Self { i2c }
    }

    pub fn chip_id(&mut self) -> anyhow::Result<u8> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(
            I2C_ADDR_QMI8658C,
            &[REG_WHO_AM_I],
            &mut buf,
            I2C_TIMEOUT_TICKS,
        )?;
        Ok(buf[0])
    }

    /// Verify the chip and configure accel (±2 g), gyro (±250 °/s), both enabled.
    pub fn init(&mut self) -> anyhow::Result<()> {
        let id = self.chip_id()?;
        if id != WHO_AM_I_EXPECTED {
            bail!(
                "QMI8658C not found at 0x{:02X} (WHO_AM_I = 0x{:02X})",
                I2C_ADDR_QMI8658C,
                id
            );
        }
        log::info!("QMI8658C found (WHO_AM_I = 0x{:02X})", id);

        self.write_reg(REG_CTRL1, CTRL1_ADDR_AUTO_INCREMENT)?;
        self.write_reg(REG_CTRL2, CTRL2_ACCEL_2G_ODR)?;
        self.write_reg(REG_CTRL3, CTRL3_GYRO_250DPS_ODR)?;
        self.write_reg(REG_CTRL7, CTRL7_ACCEL_GYRO_ENABLE)?;

        thread::sleep(Duration::from_millis(IMU_SETTLE_MS));

        log::info!("QMI8658C initialised (±2g, ±250°/s)");
        Ok(())
    }

    /// Burst-read temperature and all 6 axes, converted to physical units.
    pub fn read(&mut self) -> anyhow::Result<ImuSample> {
        let mut raw = [0u8; 14];
        self.i2c
            .write_read(I2C_ADDR_QMI8658C, &[REG_TEMP_L], &mut raw, I2C_TIMEOUT_TICKS)?;

        let word = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]) as f32;

        Ok(ImuSample {
            temperature: word(0) * TEMP_SCALE,
            accel: Vector3::new(
                word(2) * ACCEL_SCALE_2G,
                word(4) * ACCEL_SCALE_2G,
                word(6) * ACCEL_SCALE_2G,
            ),
            gyro: Vector3::new(
                word(8) * GYRO_SCALE_250,
                word(10) * GYRO_SCALE_250,
                word(12) * GYRO_SCALE_250,
            ),
        })
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> anyhow::Result<()> {
        self.i2c
            .write(I2C_ADDR_QMI8658C, &[reg, value], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }
}
