//! Demo Mode - Simulated VE.Direct device
//!
//! Generates realistic VE.Direct text frames for testing without hardware.
//! Simulates a 200 Ah 12 V battery bank with a solar array and a household
//! load. Every simulated frame advances the clock by one minute so a full day
//! passes in under half an hour of frames.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::io;

use crate::protocol::{FieldId, Transport};

const SECONDS_PER_FRAME: f64 = 60.0;
const START_OF_DAY_S: f64 = 10.0 * 3600.0;
const CAPACITY_WH: f64 = 200.0 * 12.8;
const PANEL_PEAK_W: f64 = 400.0;
const LOW_VOLTAGE_ALARM_MV: i32 = 11_800;

/// Values carried by the most recently generated frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoReadings {
    /// Battery voltage in mV
    pub voltage_mv: i32,
    /// Battery current in mA, positive while charging
    pub current_ma: i32,
    /// Battery power in W
    pub power_w: i32,
    /// Panel power in W
    pub pv_power_w: i32,
    /// State of charge in permille
    pub soc_permille: i32,
    /// Low-voltage alarm active
    pub alarm: bool,
}

impl DemoReadings {
    /// Value of `field` as the reader would decode it
    pub fn value(&self, field: FieldId) -> Option<i32> {
        match field {
            FieldId::Dump => None,
            FieldId::StateOfCharge => Some(self.soc_permille),
            FieldId::BatteryVoltage => Some(self.voltage_mv),
            FieldId::BatteryPower => Some(self.power_w),
            FieldId::PvPower => Some(self.pv_power_w),
            FieldId::BatteryCurrent => Some(self.current_ma),
            FieldId::Alarm => Some(self.alarm as i32),
        }
    }
}

/// Simulated battery monitor streaming VE.Direct frames
pub struct DemoDevice {
    /// Frame bytes not yet read
    pending: VecDeque<u8>,
    /// Frames generated so far
    frames: u64,
    /// Simulated time of day in seconds
    clock_s: f64,
    /// State of charge (0.0 - 1000.0)
    soc: f64,
    /// Readings of the last frame
    readings: DemoReadings,
    /// Cable pulled: no more frames
    silent: bool,
    rng: StdRng,
}

impl Default for DemoDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoDevice {
    /// Create a device seeded from entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a reproducible device
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: StdRng) -> Self {
        let soc = rng.gen_range(550.0..850.0);
        Self {
            pending: VecDeque::new(),
            frames: 0,
            clock_s: START_OF_DAY_S,
            soc,
            readings: DemoReadings::default(),
            silent: false,
            rng,
        }
    }

    /// Readings carried by the most recently generated frame
    pub fn readings(&self) -> DemoReadings {
        self.readings
    }

    /// Number of frames generated
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Stop (or resume) sending. Going silent drops any half-sent frame.
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
        if silent {
            self.pending.clear();
        }
    }

    /// Advance the simulation one frame and return its wire bytes
    pub fn next_frame(&mut self) -> Vec<u8> {
        self.step();
        self.frames += 1;
        let r = self.readings;

        let consumed_mah = -((1000.0 - self.soc) / 1000.0 * 200_000.0) as i64;
        let alarm = if r.alarm { "ON" } else { "OFF" };

        let fields = [
            ("PID", "0x203".to_string()),
            ("V", r.voltage_mv.to_string()),
            ("I", r.current_ma.to_string()),
            ("P", r.power_w.to_string()),
            ("CE", consumed_mah.to_string()),
            ("SOC", r.soc_permille.to_string()),
            ("TTG", "-1".to_string()),
            ("Alarm", alarm.to_string()),
            ("Relay", "OFF".to_string()),
            ("AR", if r.alarm { "2" } else { "0" }.to_string()),
            ("PPV", r.pv_power_w.to_string()),
        ];

        let mut frame = Vec::with_capacity(128);
        for (label, value) in fields {
            frame.extend_from_slice(b"\r\n");
            frame.extend_from_slice(label.as_bytes());
            frame.push(b'\t');
            frame.extend_from_slice(value.as_bytes());
        }
        frame.extend_from_slice(b"\r\nChecksum\t");

        // All bytes of a frame, checksum included, sum to zero mod 256
        let sum = frame.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        frame.push(0u8.wrapping_sub(sum));
        frame
    }

    fn step(&mut self) {
        self.clock_s = (self.clock_s + SECONDS_PER_FRAME) % 86_400.0;
        let hour = self.clock_s / 3600.0;

        // Sun between 06:00 and 18:00 with passing clouds
        let pv_w = if (6.0..18.0).contains(&hour) {
            let sun = (std::f64::consts::PI * (hour - 6.0) / 12.0).sin();
            PANEL_PEAK_W * sun * self.rng.gen_range(0.85..1.0)
        } else {
            0.0
        };

        // Base load with the occasional kettle
        let mut load_w = 120.0 + self.rng.gen_range(0.0..60.0);
        if self.rng.gen_bool(0.05) {
            load_w += 1500.0;
        }

        let net_w = pv_w - load_w;
        let delta_wh = net_w * SECONDS_PER_FRAME / 3600.0;
        self.soc = (self.soc + delta_wh / CAPACITY_WH * 1000.0).clamp(0.0, 1000.0);

        // Resting voltage from SOC, sagging or rising with current
        let voltage_mv = (12_000.0 + self.soc * 1.3 + net_w * 0.8).clamp(10_500.0, 14_600.0);
        let current_ma = net_w / (voltage_mv / 1000.0) * 1000.0;

        self.readings = DemoReadings {
            voltage_mv: voltage_mv.round() as i32,
            current_ma: current_ma.round() as i32,
            power_w: net_w.round() as i32,
            pv_power_w: pv_w.round() as i32,
            soc_permille: self.soc.round() as i32,
            alarm: (voltage_mv.round() as i32) < LOW_VOLTAGE_ALARM_MV,
        };
    }

    fn refill(&mut self) {
        if self.pending.is_empty() && !self.silent {
            let frame = self.next_frame();
            self.pending.extend(frame);
        }
    }
}

impl Transport for DemoDevice {
    fn set_baud_rate(&mut self, _baud_rate: u32) -> io::Result<()> {
        Ok(())
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.refill();
        Ok(self.pending.len() as u32)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.refill();
        Ok(self.pending.pop_front())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
