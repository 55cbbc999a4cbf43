// Slap AI - Hardware & System Configuration
// Target: WEMOS S3 Mini Pro (ESP32-S3)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_BUTTON: i32 = 0;      // BOOT button (pull-up, active LOW)
pub const PIN_I2C_SDA: i32 = 12;    // IMU data line
pub const PIN_I2C_SCL: i32 = 11;    // IMU clock line
pub const PIN_TFT_SCLK: i32 = 40;
pub const PIN_TFT_MOSI: i32 = 38;
pub const PIN_TFT_CS: i32 = 4;
pub const PIN_TFT_DC: i32 = 2;
pub const PIN_TFT_RST: i32 = 1;
pub const PIN_TFT_BL: i32 = 3;
pub const PIN_LED_PWR: i32 = 7;     // On-board power LED, held LOW (off)

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_QMI8658C: u8 = 0x6B;
pub const I2C_BAUDRATE_KHZ: u32 = 400;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (GC9A01A-class round TFT)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 128;
pub const SPI_BAUDRATE_MHZ: u32 = 27;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 4096;
pub const STACK_UI: usize = 8192;
pub const STACK_NETWORK: usize = 6144;
pub const HTTP_STACK_SIZE: usize = 10240;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SENSOR_POLL_INTERVAL_MS: u64 = 10;  // pipeline gates ticks to 10 Hz
pub const UI_POLL_INTERVAL_MS: u64 = 20;
pub const NETWORK_POLL_INTERVAL_MS: u64 = 250;
pub const DEBOUNCE_MS: u64 = 50;
pub const RESTART_DELAY_MS: u64 = 1000;
pub const IMU_SETTLE_MS: u64 = 100;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------
pub const AP_SSID: &str = "slap-ai";
pub const AP_ADDRESS: [u8; 4] = [10, 0, 0, 1];
pub const AP_CHANNEL: u8 = 1;
pub const HTTP_PORT: u16 = 80;
pub const MDNS_HOSTNAME: &str = "slap-ai";
pub const OTA_CHUNK_SIZE: usize = 4096;

// ---------------------------------------------------------------------------
// Persistent settings (NVS)
// ---------------------------------------------------------------------------
pub const NVS_NAMESPACE: &str = "slap-ai";

// ---------------------------------------------------------------------------
// QMI8658C Sensor Scale Factors
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_2G: f32 = 2.0 / 32768.0;   // g per LSB at ±2 g
pub const GYRO_SCALE_250: f32 = 250.0 / 32768.0; // °/s per LSB at ±250 °/s
pub const TEMP_SCALE: f32 = 1.0 / 256.0;          // °C per LSB
