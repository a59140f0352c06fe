//! Waypoint walker: ходьба между случайными waypoint'ами
//!
//! Логика не зависит от scheduler'а: host вызывает `tick(dt)` сам
//! (ECS система, тест, любой другой loop).
//!
//! Цикл без терминального состояния:
//! traveling → arrived (выбор новой точки) → traveling → ...

use bevy::prelude::*;
use rand::Rng;

use crate::config::{ConfigError, WalkerConfig};
use crate::walker::animation::AnimationFlagSink;

/// Ошибки walker'а (не фатальные для процесса)
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WalkerError {
    /// Пустой набор waypoint'ов → walker выключен навсегда
    #[error("no waypoints configured, walker disabled")]
    NoWaypoints,
}

/// Фаза жизненного цикла walker'а
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum WalkerPhase {
    /// Создан, ещё не активирован (активация на первом тике)
    #[default]
    Pending,
    /// Ходит
    Active,
    /// Выключен (нет waypoint'ов), тики игнорируются
    Disabled,
}

/// Результат одного тика
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Активация провалилась на этом тике (warning уже залогирован)
    Disabled,
    /// Walker выключен раньше, ничего не делали
    Inert,
    /// Дошли до target, выбрали следующий (движения в этом тике нет)
    Arrived { previous: usize, next: usize },
    /// Сдвинулись к target
    Moved { remaining: f32 },
}

/// Поза entity: позиция + ориентация
///
/// Владелец — host. Walker только читает и пишет её в `tick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn write_to(&self, transform: &mut Transform) {
        transform.translation = self.translation;
        transform.rotation = self.rotation;
    }
}

impl From<&Transform> for Pose {
    fn from(transform: &Transform) -> Self {
        Self {
            translation: transform.translation,
            rotation: transform.rotation,
        }
    }
}

/// Waypoint walker
///
/// Инварианты:
/// - в `Active` фазе `target_index < waypoints.len()`
/// - target меняется только при активации и при прибытии
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct WaypointWalker {
    config: WalkerConfig,
    target_index: usize,
    phase: WalkerPhase,
}

impl WaypointWalker {
    /// Валидирует параметры движения. Пустой набор точек допустим
    /// (walker выключится при активации).
    pub fn new(config: WalkerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            target_index: 0,
            phase: WalkerPhase::Pending,
        })
    }

    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.config.waypoints
    }

    pub fn phase(&self) -> WalkerPhase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.phase != WalkerPhase::Disabled
    }

    /// Индекс текущей цели (только после активации)
    pub fn target_index(&self) -> Option<usize> {
        match self.phase {
            WalkerPhase::Active => Some(self.target_index),
            WalkerPhase::Pending | WalkerPhase::Disabled => None,
        }
    }

    /// Позиция текущей цели (только после активации)
    pub fn target(&self) -> Option<Vec3> {
        self.target_index()
            .and_then(|index| self.config.waypoints.get(index).copied())
    }

    /// Активация: выбор начальной случайной цели
    ///
    /// До активации "текущий" индекс = 0, поэтому при N > 1 первой целью
    /// никогда не будет waypoint #0.
    /// Повторный вызов ничего не меняет; warning пишется только один раз.
    pub fn activate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, WalkerError> {
        match self.phase {
            WalkerPhase::Active => return Ok(self.target_index),
            WalkerPhase::Disabled => return Err(WalkerError::NoWaypoints),
            WalkerPhase::Pending => {}
        }

        match pick_next_index(self.target_index, self.config.waypoints.len(), rng) {
            Some(index) => {
                self.target_index = index;
                self.phase = WalkerPhase::Active;
                crate::log(&format!(
                    "walker activated: {} waypoints, first target #{}",
                    self.config.waypoints.len(),
                    index
                ));
                Ok(index)
            }
            None => {
                self.phase = WalkerPhase::Disabled;
                crate::log_warning("No waypoints configured, disabling walker");
                Err(WalkerError::NoWaypoints)
            }
        }
    }

    /// Один тик симуляции (`dt` — секунды с прошлого тика)
    ///
    /// Прибытие и движение взаимоисключающие в пределах одного тика.
    /// Флаг анимации выставляется в true при движении и никогда не
    /// сбрасывается walker'ом.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        pose: &mut Pose,
        dt: f32,
        rng: &mut R,
        animator: Option<&mut dyn AnimationFlagSink>,
    ) -> TickOutcome {
        match self.phase {
            WalkerPhase::Disabled => return TickOutcome::Inert,
            WalkerPhase::Pending => {
                if self.activate(rng).is_err() {
                    return TickOutcome::Disabled;
                }
            }
            WalkerPhase::Active => {}
        }

        let Some(target) = self.target() else {
            return TickOutcome::Inert;
        };

        let distance = pose.translation.distance(target);
        if distance <= self.config.arrival_threshold {
            let previous = self.target_index;
            if let Some(next) = pick_next_index(previous, self.config.waypoints.len(), rng) {
                self.target_index = next;
            }
            return TickOutcome::Arrived {
                previous,
                next: self.target_index,
            };
        }

        if let Some(animator) = animator {
            animator.set_bool(&self.config.moving_parameter, true);
        }

        // Направление считаем до сдвига
        let direction = (target - pose.translation).normalize_or_zero();
        pose.translation = move_towards(pose.translation, target, self.config.speed * dt);

        if direction != Vec3::ZERO {
            if let Some(facing) = facing_rotation(direction) {
                // Экспоненциальное сглаживание: доля rate*dt за тик (зависит от FPS)
                let t = (self.config.rotation_rate * dt).clamp(0.0, 1.0);
                pose.rotation = pose.rotation.slerp(facing, t);
            }
        }

        TickOutcome::Moved {
            remaining: pose.translation.distance(target),
        }
    }
}

/// Случайный индекс в `[0, count)`, отличный от `current` если есть из чего выбирать
///
/// Rejection sampling без лимита итераций: при N > 1 ожидаемое число
/// попыток N/(N-1). `None` для пустого набора.
pub fn pick_next_index<R: Rng + ?Sized>(current: usize, count: usize, rng: &mut R) -> Option<usize> {
    if count == 0 {
        return None;
    }

    loop {
        let candidate = rng.gen_range(0..count);
        if candidate != current || count == 1 {
            return Some(candidate);
        }
    }
}

/// Сдвиг `current` к `target` максимум на `max_delta`, без перелёта
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let offset = target - current;
    let distance = offset.length();

    if distance <= max_delta || distance == 0.0 {
        return target;
    }

    current + offset / distance * max_delta
}

/// Ориентация, при которой forward (-Z) смотрит вдоль `direction`, up = Y
pub fn facing_rotation(direction: Vec3) -> Option<Quat> {
    let direction = Dir3::new(direction).ok()?;
    Some(Transform::IDENTITY.looking_to(direction, Dir3::Y).rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::animation::AnimatorParams;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scenario_walker() -> WaypointWalker {
        let mut config = WalkerConfig::with_waypoints([Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)]);
        config.speed = 2.0;
        config.arrival_threshold = 0.1;
        WaypointWalker::new(config).unwrap()
    }

    #[test]
    fn test_pick_next_index_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(pick_next_index(0, 0, &mut rng), None);
    }

    #[test]
    fn test_pick_next_index_single() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(pick_next_index(0, 1, &mut rng), Some(0));
        }
    }

    #[test]
    fn test_pick_next_index_never_repeats() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = [false; 5];

        for _ in 0..1000 {
            let next = pick_next_index(2, 5, &mut rng).unwrap();
            assert!(next < 5);
            assert_ne!(next, 2);
            seen[next] = true;
        }

        // Все остальные индексы достижимы
        assert_eq!(seen, [true, true, false, true, true]);
    }

    #[test]
    fn test_move_towards_clamps() {
        let target = Vec3::new(3.0, 0.0, 4.0);
        assert_eq!(move_towards(Vec3::ZERO, target, 10.0), target);
        assert_eq!(move_towards(Vec3::ZERO, target, 5.0), target);

        let halfway = move_towards(Vec3::ZERO, target, 2.5);
        assert!((halfway - Vec3::new(1.5, 0.0, 2.0)).length() < 1e-5);

        assert_eq!(move_towards(target, target, 0.0), target);
    }

    #[test]
    fn test_new_rejects_bad_params() {
        let mut config = WalkerConfig::with_waypoints([Vec3::ZERO]);
        config.speed = -1.0;
        assert!(WaypointWalker::new(config).is_err());
    }

    #[test]
    fn test_pending_until_first_tick() {
        let walker = scenario_walker();
        assert_eq!(walker.phase(), WalkerPhase::Pending);
        assert_eq!(walker.target_index(), None);
        assert_eq!(walker.target(), None);
    }

    #[test]
    fn test_initial_target_skips_first_waypoint() {
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut walker = WaypointWalker::new(WalkerConfig::with_waypoints([
                Vec3::ZERO,
                Vec3::X,
                Vec3::Y,
                Vec3::Z,
            ]))
            .unwrap();

            let first = walker.activate(&mut rng).unwrap();
            assert_ne!(first, 0);
            assert_eq!(walker.phase(), WalkerPhase::Active);
        }
    }

    #[test]
    fn test_activate_is_idempotent() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut walker = scenario_walker();

        let first = walker.activate(&mut rng).unwrap();
        for _ in 0..10 {
            assert_eq!(walker.activate(&mut rng), Ok(first));
        }
    }

    #[test]
    fn test_scenario_two_waypoints() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut walker = scenario_walker();
        let mut pose = Pose::from_translation(Vec3::ZERO);

        for _ in 0..4 {
            let outcome = walker.tick(&mut pose, 1.0, &mut rng, None);
            assert!(matches!(outcome, TickOutcome::Moved { .. }));
        }
        assert_eq!(walker.target(), Some(Vec3::new(10.0, 0.0, 0.0)));
        assert!((pose.translation - Vec3::new(8.0, 0.0, 0.0)).length() < 1e-5);

        let outcome = walker.tick(&mut pose, 1.0, &mut rng, None);
        assert_eq!(outcome, TickOutcome::Moved { remaining: 0.0 });
        assert_eq!(pose.translation, Vec3::new(10.0, 0.0, 0.0));

        // Следующий тик: прибытие, движения нет, цель → (0,0,0)
        let outcome = walker.tick(&mut pose, 1.0, &mut rng, None);
        assert_eq!(outcome, TickOutcome::Arrived { previous: 1, next: 0 });
        assert_eq!(pose.translation, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(walker.target(), Some(Vec3::ZERO));
    }

    #[test]
    fn test_empty_waypoints_disable_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut walker = WaypointWalker::new(WalkerConfig::default()).unwrap();
        let start = Pose::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let mut pose = start;
        let mut animator = AnimatorParams::default();

        let mut disabled = 0;
        for _ in 0..20 {
            match walker.tick(&mut pose, 0.5, &mut rng, Some(&mut animator)) {
                TickOutcome::Disabled => disabled += 1,
                TickOutcome::Inert => {}
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        assert_eq!(disabled, 1);
        assert_eq!(pose, start);
        assert!(!walker.is_enabled());
        assert_eq!(walker.target(), None);
        assert_eq!(animator.get_bool("isMoving"), None);
        assert_eq!(walker.activate(&mut rng), Err(WalkerError::NoWaypoints));
    }

    #[test]
    fn test_single_waypoint_target_never_changes() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let point = Vec3::new(2.0, 0.0, -3.0);
        let mut walker = WaypointWalker::new(WalkerConfig::with_waypoints([point])).unwrap();
        let mut pose = Pose::from_translation(Vec3::ZERO);

        let mut arrivals = 0;
        for _ in 0..200 {
            if let TickOutcome::Arrived { previous, next } =
                walker.tick(&mut pose, 0.1, &mut rng, None)
            {
                assert_eq!((previous, next), (0, 0));
                arrivals += 1;
            }
            assert_eq!(walker.target(), Some(point));
        }

        // Дошли и дальше "прибываем" каждый тик
        assert!(arrivals > 0);
        assert_eq!(pose.translation, point);
    }

    #[test]
    fn test_monotonic_approach_and_target_membership() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let waypoints: Vec<Vec3> = (0..6)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-2.0..2.0),
                    rng.gen_range(-20.0..20.0),
                )
            })
            .collect();

        let mut config = WalkerConfig::with_waypoints(waypoints.clone());
        config.speed = 4.0;
        config.arrival_threshold = 0.25;
        let mut walker = WaypointWalker::new(config).unwrap();
        let mut pose = Pose::from_translation(Vec3::ZERO);

        for _ in 0..5000 {
            let dt = rng.gen_range(0.001..0.1);
            let before_target = walker.target();
            let before = before_target.map(|t| pose.translation.distance(t));

            match walker.tick(&mut pose, dt, &mut rng, None) {
                TickOutcome::Moved { remaining } => {
                    if let Some(before) = before {
                        assert!(remaining <= before + 1e-4);
                    }
                }
                TickOutcome::Arrived { previous, next } => {
                    assert_ne!(previous, next);
                    if let Some(target) = before_target {
                        assert_eq!(target, waypoints[previous]);
                    }
                }
                other => panic!("unexpected outcome {:?}", other),
            }

            let target = walker.target().unwrap();
            assert!(waypoints.contains(&target));
        }
    }

    #[test]
    fn test_moving_flag_never_cleared() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut walker = scenario_walker();
        let mut pose = Pose::from_translation(Vec3::ZERO);
        let mut animator = AnimatorParams::default();

        for _ in 0..5 {
            walker.tick(&mut pose, 1.0, &mut rng, Some(&mut animator));
        }
        assert_eq!(animator.get_bool("isMoving"), Some(true));

        let outcome = walker.tick(&mut pose, 1.0, &mut rng, Some(&mut animator));
        assert!(matches!(outcome, TickOutcome::Arrived { .. }));
        assert_eq!(animator.get_bool("isMoving"), Some(true));
    }

    #[test]
    fn test_custom_moving_parameter() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut config = WalkerConfig::with_waypoints([Vec3::ZERO, Vec3::X * 5.0]);
        config.moving_parameter = "walking".to_string();
        let mut walker = WaypointWalker::new(config).unwrap();
        let mut pose = Pose::default();
        let mut animator = AnimatorParams::default();

        walker.tick(&mut pose, 0.1, &mut rng, Some(&mut animator));
        assert_eq!(animator.get_bool("walking"), Some(true));
        assert_eq!(animator.get_bool("isMoving"), None);
    }

    #[test]
    fn test_rotation_faces_movement() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut walker = scenario_walker();
        let mut pose = Pose::from_translation(Vec3::ZERO);

        // rate 5 * dt 1 → t зажимается в 1: сразу смотрим на цель
        walker.tick(&mut pose, 1.0, &mut rng, None);
        let forward = pose.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_rotation_is_smoothed() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut walker = scenario_walker();
        let mut pose = Pose::from_translation(Vec3::ZERO);
        let facing = facing_rotation(Vec3::X).unwrap();

        let initial_angle = pose.rotation.angle_between(facing);
        walker.tick(&mut pose, 0.05, &mut rng, None);
        let angle_after_one = pose.rotation.angle_between(facing);
        walker.tick(&mut pose, 0.05, &mut rng, None);
        let angle_after_two = pose.rotation.angle_between(facing);

        // Доля 0.25 за тик: приближаемся, но не мгновенно
        assert!(angle_after_one < initial_angle);
        assert!(angle_after_one > 1e-3);
        assert!(angle_after_two < angle_after_one);
    }

    #[test]
    fn test_facing_rotation_zero_direction() {
        assert_eq!(facing_rotation(Vec3::ZERO), None);
        // Вертикальное направление не ломает look-at
        assert!(facing_rotation(Vec3::Y).is_some());
    }

    #[test]
    fn test_pose_transform_roundtrip() {
        let transform = Transform::from_xyz(1.0, 2.0, 3.0).with_rotation(Quat::from_rotation_y(0.5));
        let pose = Pose::from(&transform);

        let mut written = Transform::IDENTITY;
        pose.write_to(&mut written);
        assert_eq!(written, transform);
    }
}
