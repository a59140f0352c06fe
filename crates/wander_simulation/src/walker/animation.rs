//! Animation sink: куда walker пишет bool-флаг "идёт"
//!
//! Сама анимация — забота host'а. Walker только выставляет параметр по имени.

use std::collections::HashMap;

use bevy::prelude::*;

/// Получатель bool-параметров анимации (аналог animator.SetBool)
pub trait AnimationFlagSink {
    fn set_bool(&mut self, parameter: &str, value: bool);
}

/// Набор bool-параметров анимации entity
///
/// Опциональный компонент: если его нет, walker просто двигается без флагов.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AnimatorParams {
    bools: HashMap<String, bool>,
}

impl AnimatorParams {
    /// `None` если параметр ни разу не выставлялся
    pub fn get_bool(&self, parameter: &str) -> Option<bool> {
        self.bools.get(parameter).copied()
    }
}

impl AnimationFlagSink for AnimatorParams {
    fn set_bool(&mut self, parameter: &str, value: bool) {
        // Без аллокации, если параметр уже есть
        if let Some(slot) = self.bools.get_mut(parameter) {
            *slot = value;
        } else {
            self.bools.insert(parameter.to_string(), value);
        }
    }
}
