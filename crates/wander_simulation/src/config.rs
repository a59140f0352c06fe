//! Конфигурация walker'ов и headless сценариев
//!
//! Всё задаётся до активации и дальше только читается.
//! Формат файлов сценариев — JSON (serde).

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Ошибки конфигурации
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Файл сценария не прочитался
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON не распарсился
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("speed must be positive and finite, got {0}")]
    InvalidSpeed(f32),

    #[error("arrival threshold must be non-negative and finite, got {0}")]
    InvalidArrivalThreshold(f32),

    #[error("rotation rate must be positive and finite, got {0}")]
    InvalidRotationRate(f32),

    #[error("waypoint #{index} is not finite: {position:?}")]
    NonFiniteWaypoint { index: usize, position: Vec3 },

    #[error("tick rate must be positive and finite, got {0}")]
    InvalidTickRate(f64),
}

/// Скорость по умолчанию (м/с)
pub const DEFAULT_SPEED: f32 = 2.0;
/// Дистанция, на которой точка считается достигнутой
pub const DEFAULT_ARRIVAL_THRESHOLD: f32 = 0.1;
/// Коэффициент сглаживания поворота (доля `rate * dt` за тик)
pub const DEFAULT_ROTATION_RATE: f32 = 5.0;
/// Имя bool-параметра анимации "идёт"
pub const DEFAULT_MOVING_PARAMETER: &str = "isMoving";

/// Параметры одного walker'а
///
/// Пустой `waypoints` — не ошибка конфигурации: walker при активации
/// выключается с warning'ом.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct WalkerConfig {
    /// Точки, между которыми ходит entity (world coordinates)
    pub waypoints: Vec<Vec3>,
    /// Скорость (units/sec)
    pub speed: f32,
    /// Радиус прибытия (units)
    pub arrival_threshold: f32,
    /// Скорость сглаживания поворота
    pub rotation_rate: f32,
    /// Bool-параметр анимации, выставляется в true во время движения
    pub moving_parameter: String,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            waypoints: Vec::new(),
            speed: DEFAULT_SPEED,
            arrival_threshold: DEFAULT_ARRIVAL_THRESHOLD,
            rotation_rate: DEFAULT_ROTATION_RATE,
            moving_parameter: DEFAULT_MOVING_PARAMETER.to_string(),
        }
    }
}

impl WalkerConfig {
    pub fn with_waypoints(waypoints: impl Into<Vec<Vec3>>) -> Self {
        Self {
            waypoints: waypoints.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        if !(self.arrival_threshold.is_finite() && self.arrival_threshold >= 0.0) {
            return Err(ConfigError::InvalidArrivalThreshold(self.arrival_threshold));
        }
        if !(self.rotation_rate.is_finite() && self.rotation_rate > 0.0) {
            return Err(ConfigError::InvalidRotationRate(self.rotation_rate));
        }
        if let Some((index, position)) = self
            .waypoints
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite())
        {
            return Err(ConfigError::NonFiniteWaypoint {
                index,
                position: *position,
            });
        }
        Ok(())
    }
}

/// Стартовая позиция + конфиг walker'а в сценарии
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerSpawn {
    pub start: Vec3,
    pub walker: WalkerConfig,
}

impl Default for WalkerSpawn {
    fn default() -> Self {
        Self {
            start: Vec3::ZERO,
            walker: WalkerConfig::default(),
        }
    }
}

/// Headless сценарий (для runner'а)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub seed: u64,
    /// Частота FixedUpdate (Hz)
    pub tick_rate_hz: f64,
    /// Сколько тиков прогнать
    pub ticks: usize,
    pub walkers: Vec<WalkerSpawn>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        // Один walker на квадрате 10x10
        Self {
            seed: 42,
            tick_rate_hz: 60.0,
            ticks: 1000,
            walkers: vec![WalkerSpawn {
                start: Vec3::ZERO,
                walker: WalkerConfig::with_waypoints([
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(10.0, 0.0, 0.0),
                    Vec3::new(10.0, 0.0, 10.0),
                    Vec3::new(0.0, 0.0, 10.0),
                ]),
            }],
        }
    }
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(ConfigError::InvalidTickRate(self.tick_rate_hz));
        }
        for spawn in &self.walkers {
            spawn.walker.validate()?;
        }
        Ok(())
    }
}
