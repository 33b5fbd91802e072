//! Weapon data - статические шаблоны + runtime запись экземпляра
//!
//! # Архитектура
//!
//! **WeaponStaticData** - immutable шаблон класса оружия:
//! - Хранится в `WeaponCatalog` (lookup по ключу)
//! - При spawn копируется, magazine attachment может переопределить поля
//!
//! **AttachmentData** - шаблон обвеса (Barrel/Magazine/Sights/Stock/Grip):
//! - Impacts суммируются в `AttachmentModifiers`
//! - Magazine несёт overrides (патроны, магазин, темп, кривые отдачи)
//!
//! **WeaponRuntimeData** - mutable состояние экземпляра:
//! - clip, health, список обвесов
//! - Переживает equip/unequip, уходит в pickup при выбросе

use serde::{Deserialize, Serialize};

use crate::ammo::AmmoType;
use crate::weapon::recoil::RecoilCurve;

/// Архетип оружия (обычное / дробовик / с патронником)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum WeaponArchetype {
    #[default]
    Standard,
    /// +1 патрон в патроннике при перезарядке непустого магазина
    Chambered,
    /// `pellets` независимых трассировок за выстрел, дальность `range`
    Shotgun { pellets: u32, range: f32 },
}

impl WeaponArchetype {
    pub fn pellets(&self) -> u32 {
        match self {
            WeaponArchetype::Shotgun { pellets, .. } => (*pellets).max(1),
            _ => 1,
        }
    }

    pub fn is_shotgun(&self) -> bool {
        matches!(self, WeaponArchetype::Shotgun { .. })
    }

    pub fn can_be_chambered(&self) -> bool {
        matches!(self, WeaponArchetype::Chambered)
    }
}

/// Длительности cue (анимаций). `None` = у оружия нет такой анимации.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueDurations {
    pub shot: Option<f32>,
    /// Второй выстрел дробовика (чередуется с `shot`)
    pub shot_alt: Option<f32>,
    pub reload: Option<f32>,
    pub empty_reload: Option<f32>,
    pub equip: Option<f32>,
    pub unequip: Option<f32>,
    pub inspect: Option<f32>,
}

/// Static weapon template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponStaticData {
    pub key: String,
    pub display_name: String,
    pub archetype: WeaponArchetype,

    // === Урон / точность ===
    pub base_damage: f32,
    pub headshot_multiplier: f32,
    /// Разброс (градусы), итоговый = (variation + modifier) × accuracy multiplier
    pub pitch_variation: f32,
    pub yaw_variation: f32,
    /// Дальность трассировки для не-дробовиков
    pub trace_length: f32,
    /// Множитель разброса в Sprint (> 1)
    pub accuracy_debuff: f32,

    // === Стрельба ===
    /// Выстрелов в минуту
    pub rate_of_fire: f32,
    pub automatic: bool,
    pub wait_for_anim: bool,
    pub prevent_rapid_manual_fire: bool,
    pub silenced: bool,

    // === Магазин ===
    pub ammo_type: AmmoType,
    pub clip_capacity: u32,
    /// Стартовое количество патронов в магазине
    pub clip_size: u32,

    /// Потеря weapon health за выстрел
    pub degradation_rate: f32,
    pub has_attachments: bool,

    // === Отдача ===
    pub vertical_recoil: RecoilCurve,
    pub horizontal_recoil: RecoilCurve,
    pub recovery: RecoilCurve,

    pub cues: CueDurations,
}

impl Default for WeaponStaticData {
    fn default() -> Self {
        Self {
            key: String::new(),
            display_name: String::new(),
            archetype: WeaponArchetype::Standard,
            base_damage: 10.0,
            headshot_multiplier: 2.0,
            pitch_variation: 0.0,
            yaw_variation: 0.0,
            trace_length: 10_000.0,
            accuracy_debuff: 1.25,
            rate_of_fire: 600.0,
            automatic: false,
            wait_for_anim: false,
            prevent_rapid_manual_fire: false,
            silenced: false,
            ammo_type: AmmoType::Rifle,
            clip_capacity: 30,
            clip_size: 30,
            degradation_rate: 0.0,
            has_attachments: false,
            vertical_recoil: RecoilCurve::default(),
            horizontal_recoil: RecoilCurve::default(),
            recovery: RecoilCurve::linear(1.0, 0.0, 1.0),
            cues: CueDurations::default(),
        }
    }
}

impl WeaponStaticData {
    /// Дальность трассировки с учётом архетипа
    pub fn max_range(&self) -> f32 {
        match self.archetype {
            WeaponArchetype::Shotgun { range, .. } => range,
            _ => self.trace_length,
        }
    }

    /// Бонусный патрон в патроннике (0/1) при текущем clip
    pub fn chamber_bonus(&self, clip_size: u32) -> u32 {
        u32::from(self.archetype.can_be_chambered() && clip_size > 0)
    }

    /// Максимум магазина с учётом патронника
    pub fn max_clip(&self, clip_capacity: u32) -> u32 {
        clip_capacity + u32::from(self.archetype.can_be_chambered())
    }
}

/// Тип обвеса (один на категорию)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttachmentType {
    #[default]
    Barrel,
    Magazine,
    Sights,
    Stock,
    Grip,
}

/// Overrides, которые несёт magazine attachment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MagazineOverrides {
    pub ammo_type: Option<AmmoType>,
    pub clip_capacity: Option<u32>,
    pub clip_size: Option<u32>,
    pub rate_of_fire: Option<f32>,
    pub automatic: Option<bool>,
    pub archetype: Option<WeaponArchetype>,
    pub accuracy_debuff: Option<f32>,
    pub wait_for_anim: Option<bool>,
    pub prevent_rapid_manual_fire: Option<bool>,
    pub vertical_recoil: Option<RecoilCurve>,
    pub horizontal_recoil: Option<RecoilCurve>,
    pub reload_duration: Option<f32>,
    pub empty_reload_duration: Option<f32>,
}

impl MagazineOverrides {
    /// Применить overrides к копии шаблона
    pub fn apply(&self, data: &mut WeaponStaticData) {
        if let Some(ammo_type) = self.ammo_type {
            data.ammo_type = ammo_type;
        }
        if let Some(capacity) = self.clip_capacity {
            data.clip_capacity = capacity;
        }
        if let Some(size) = self.clip_size {
            data.clip_size = size;
        }
        if let Some(rate) = self.rate_of_fire {
            data.rate_of_fire = rate;
        }
        if let Some(automatic) = self.automatic {
            data.automatic = automatic;
        }
        if let Some(archetype) = &self.archetype {
            data.archetype = archetype.clone();
        }
        if let Some(debuff) = self.accuracy_debuff {
            data.accuracy_debuff = debuff;
        }
        if let Some(wait) = self.wait_for_anim {
            data.wait_for_anim = wait;
        }
        if let Some(prevent) = self.prevent_rapid_manual_fire {
            data.prevent_rapid_manual_fire = prevent;
        }
        if let Some(curve) = &self.vertical_recoil {
            data.vertical_recoil = curve.clone();
        }
        if let Some(curve) = &self.horizontal_recoil {
            data.horizontal_recoil = curve.clone();
        }
        if self.reload_duration.is_some() {
            data.cues.reload = self.reload_duration;
        }
        if self.empty_reload_duration.is_some() {
            data.cues.empty_reload = self.empty_reload_duration;
        }
    }
}

/// Static attachment template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentData {
    pub key: String,
    pub attachment_type: AttachmentType,
    pub damage_impact: f32,
    pub pitch_variation_impact: f32,
    pub yaw_variation_impact: f32,
    /// Добавляется к модификатору отдачи (база 1.0)
    pub vertical_recoil_impact: f32,
    pub horizontal_recoil_impact: f32,
    /// Ключи обвесов, с которыми этот не ставится
    pub incompatible: Vec<String>,
    /// Barrel: глушитель
    pub silenced: bool,
    /// Grip: своя анимация equip
    pub equip_duration: Option<f32>,
    pub magazine: Option<MagazineOverrides>,
}

/// Суммарные модификаторы обвесов
///
/// Считаются один раз при spawn, дальше immutable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentModifiers {
    pub damage: f32,
    pub pitch_variance: f32,
    pub yaw_variance: f32,
    pub vertical_recoil: f32,
    pub horizontal_recoil: f32,
}

impl Default for AttachmentModifiers {
    fn default() -> Self {
        Self {
            damage: 0.0,
            pitch_variance: 0.0,
            yaw_variance: 0.0,
            vertical_recoil: 1.0,
            horizontal_recoil: 1.0,
        }
    }
}

impl AttachmentModifiers {
    pub fn accumulate(&mut self, attachment: &AttachmentData) {
        self.damage += attachment.damage_impact;
        self.pitch_variance += attachment.pitch_variation_impact;
        self.yaw_variance += attachment.yaw_variation_impact;
        self.vertical_recoil += attachment.vertical_recoil_impact;
        self.horizontal_recoil += attachment.horizontal_recoil_impact;
    }
}

/// Runtime данные экземпляра оружия
///
/// Инвариант: `clip_size ≤ clip_capacity + chamber bonus`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponRuntimeData {
    pub weapon_key: String,
    pub clip_capacity: u32,
    pub clip_size: u32,
    pub ammo_type: AmmoType,
    /// 0..=100
    pub weapon_health: f32,
    pub attachments: Vec<String>,
}

impl WeaponRuntimeData {
    /// Свежий экземпляр из (уже разрешённого) шаблона
    pub fn from_static(data: &WeaponStaticData, attachments: Vec<String>) -> Self {
        Self {
            weapon_key: data.key.clone(),
            clip_capacity: data.clip_capacity,
            clip_size: data.clip_size.min(data.max_clip(data.clip_capacity)),
            ammo_type: data.ammo_type,
            weapon_health: 100.0,
            attachments,
        }
    }
}
