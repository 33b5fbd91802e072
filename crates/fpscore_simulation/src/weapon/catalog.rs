//! WeaponCatalog - immutable lookup шаблонов оружия и обвесов
//!
//! # Архитектура
//!
//! - Ключ (String) → `WeaponStaticData` / `AttachmentData`
//! - Создаётся один раз при старте: hardcoded `Default` или из RON
//! - При spawn `resolve` склеивает шаблон + обвесы в итоговые данные экземпляра
//!
//! # RON формат
//!
//! ```ron
//! (
//!     weapons: [ (key: "rifle", display_name: "Rifle", rate_of_fire: 600.0, automatic: true) ],
//!     attachments: [ (key: "rifle_extended_mag", attachment_type: Magazine,
//!                     magazine: Some((clip_capacity: Some(45)))) ],
//! )
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ammo::AmmoType;
use crate::weapon::data::*;
use crate::weapon::recoil::RecoilCurve;
use crate::{log_error, log_warning};

/// Содержимое RON файла каталога
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub weapons: Vec<WeaponStaticData>,
    pub attachments: Vec<AttachmentData>,
}

/// Шаблон + обвесы, сведённые для конкретного экземпляра
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWeapon {
    pub data: WeaponStaticData,
    pub modifiers: AttachmentModifiers,
}

#[derive(Resource, Debug, Clone)]
pub struct WeaponCatalog {
    weapons: HashMap<String, WeaponStaticData>,
    attachments: HashMap<String, AttachmentData>,
}

impl WeaponCatalog {
    pub fn empty() -> Self {
        Self {
            weapons: HashMap::new(),
            attachments: HashMap::new(),
        }
    }

    pub fn from_file(file: CatalogFile) -> Self {
        let mut catalog = Self::empty();
        for weapon in file.weapons {
            catalog.insert_weapon(weapon);
        }
        for attachment in file.attachments {
            catalog.insert_attachment(attachment);
        }
        catalog
    }

    /// Загрузка из RON текста (ошибка парсинга → наверх, это startup)
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        let file: CatalogFile = ron::from_str(text)?;
        Ok(Self::from_file(file))
    }

    pub fn insert_weapon(&mut self, weapon: WeaponStaticData) {
        if self.weapons.contains_key(&weapon.key) {
            log_warning(&format!("WeaponCatalog: weapon '{}' переопределён", weapon.key));
        }
        self.weapons.insert(weapon.key.clone(), weapon);
    }

    pub fn insert_attachment(&mut self, attachment: AttachmentData) {
        self.attachments.insert(attachment.key.clone(), attachment);
    }

    pub fn weapon(&self, key: &str) -> Option<&WeaponStaticData> {
        self.weapons.get(key)
    }

    pub fn attachment(&self, key: &str) -> Option<&AttachmentData> {
        self.attachments.get(key)
    }

    pub fn weapon_keys(&self) -> impl Iterator<Item = &str> {
        self.weapons.keys().map(String::as_str)
    }

    /// Собрать итоговые данные экземпляра: шаблон + обвесы.
    ///
    /// Отсутствующий/несовместимый обвес логируется и пропускается.
    /// `None` только если нет самого шаблона оружия.
    pub fn resolve(&self, weapon_key: &str, attachments: &[String]) -> Option<ResolvedWeapon> {
        let Some(template) = self.weapon(weapon_key) else {
            log_error(&format!("WeaponCatalog: weapon '{}' not found", weapon_key));
            return None;
        };

        let mut data = template.clone();
        let mut modifiers = AttachmentModifiers::default();

        if !template.has_attachments {
            if !attachments.is_empty() {
                log_warning(&format!(
                    "WeaponCatalog: '{}' не поддерживает обвесы, {} проигнорировано",
                    weapon_key,
                    attachments.len()
                ));
            }
            return Some(ResolvedWeapon { data, modifiers });
        }

        let mut applied: Vec<&AttachmentData> = Vec::new();
        for key in attachments {
            let Some(attachment) = self.attachment(key) else {
                log_warning(&format!("WeaponCatalog: attachment '{}' not found", key));
                continue;
            };

            let conflict = applied.iter().any(|other| {
                other.attachment_type == attachment.attachment_type
                    || other.incompatible.contains(&attachment.key)
                    || attachment.incompatible.contains(&other.key)
            });
            if conflict {
                log_warning(&format!(
                    "WeaponCatalog: attachment '{}' несовместим с уже установленными",
                    key
                ));
                continue;
            }

            modifiers.accumulate(attachment);
            if attachment.silenced {
                data.silenced = true;
            }
            if attachment.equip_duration.is_some() {
                data.cues.equip = attachment.equip_duration;
            }
            if let Some(magazine) = &attachment.magazine {
                magazine.apply(&mut data);
            }
            applied.push(attachment);
        }

        Some(ResolvedWeapon { data, modifiers })
    }

    /// Runtime данные нового экземпляра (стартовое оружие / спавн из магазина).
    ///
    /// Магазин берётся из magazine обвеса, если он есть, иначе из шаблона.
    pub fn fresh_runtime(&self, weapon_key: &str, attachments: &[String]) -> Option<WeaponRuntimeData> {
        let resolved = self.resolve(weapon_key, attachments)?;
        Some(WeaponRuntimeData::from_static(&resolved.data, attachments.to_vec()))
    }
}

impl Default for WeaponCatalog {
    fn default() -> Self {
        Self::from_file(CatalogFile {
            weapons: vec![preset_pistol(), preset_rifle(), preset_shotgun()],
            attachments: preset_rifle_attachments(),
        })
    }
}

/// Пистолет: патронник, ручной огонь, anti-spam
pub fn preset_pistol() -> WeaponStaticData {
    WeaponStaticData {
        key: "pistol".into(),
        display_name: "Pistol".into(),
        archetype: WeaponArchetype::Chambered,
        base_damage: 18.0,
        headshot_multiplier: 2.5,
        pitch_variation: 0.6,
        yaw_variation: 0.6,
        rate_of_fire: 400.0,
        automatic: false,
        prevent_rapid_manual_fire: true,
        ammo_type: AmmoType::Pistol,
        clip_capacity: 12,
        clip_size: 12,
        degradation_rate: 0.05,
        vertical_recoil: RecoilCurve::constant(1.2),
        horizontal_recoil: RecoilCurve::constant(0.2),
        recovery: RecoilCurve::linear(0.25, 0.0, 1.0),
        cues: CueDurations {
            reload: Some(1.6),
            empty_reload: Some(2.1),
            equip: Some(0.4),
            unequip: Some(0.3),
            inspect: Some(2.0),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Автомат: automatic, обвесы
pub fn preset_rifle() -> WeaponStaticData {
    WeaponStaticData {
        key: "rifle".into(),
        display_name: "Assault Rifle".into(),
        archetype: WeaponArchetype::Standard,
        base_damage: 22.0,
        headshot_multiplier: 2.0,
        pitch_variation: 0.4,
        yaw_variation: 0.4,
        rate_of_fire: 600.0,
        automatic: true,
        ammo_type: AmmoType::Rifle,
        clip_capacity: 30,
        clip_size: 30,
        degradation_rate: 0.02,
        has_attachments: true,
        vertical_recoil: RecoilCurve::new(vec![(0.0, 0.6), (0.5, 0.9), (1.0, 0.4)]),
        horizontal_recoil: RecoilCurve::new(vec![(0.0, 0.0), (0.3, 0.3), (0.6, -0.3), (1.0, 0.2)]),
        recovery: RecoilCurve::linear(0.4, 0.0, 1.0),
        cues: CueDurations {
            reload: Some(2.2),
            empty_reload: Some(2.6),
            equip: Some(0.5),
            unequip: Some(0.4),
            inspect: Some(2.5),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Дробовик: 8 дробин, ждёт анимацию выстрела
pub fn preset_shotgun() -> WeaponStaticData {
    WeaponStaticData {
        key: "shotgun".into(),
        display_name: "Pump Shotgun".into(),
        archetype: WeaponArchetype::Shotgun {
            pellets: 8,
            range: 3_000.0,
        },
        base_damage: 9.0,
        headshot_multiplier: 1.5,
        pitch_variation: 3.0,
        yaw_variation: 3.0,
        rate_of_fire: 70.0,
        automatic: false,
        wait_for_anim: true,
        ammo_type: AmmoType::Shotgun,
        clip_capacity: 6,
        clip_size: 6,
        degradation_rate: 0.1,
        vertical_recoil: RecoilCurve::constant(4.0),
        horizontal_recoil: RecoilCurve::constant(-0.5),
        recovery: RecoilCurve::linear(0.6, 0.0, 1.0),
        cues: CueDurations {
            shot: Some(0.8),
            shot_alt: Some(0.85),
            reload: Some(3.0),
            equip: Some(0.6),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn preset_rifle_attachments() -> Vec<AttachmentData> {
    vec![
        AttachmentData {
            key: "rifle_extended_mag".into(),
            attachment_type: AttachmentType::Magazine,
            magazine: Some(MagazineOverrides {
                clip_capacity: Some(45),
                clip_size: Some(45),
                reload_duration: Some(2.6),
                empty_reload_duration: Some(3.0),
                ..Default::default()
            }),
            ..Default::default()
        },
        AttachmentData {
            key: "rifle_compensator".into(),
            attachment_type: AttachmentType::Barrel,
            damage_impact: 1.0,
            vertical_recoil_impact: -0.3,
            horizontal_recoil_impact: -0.2,
            ..Default::default()
        },
        AttachmentData {
            key: "rifle_suppressor".into(),
            attachment_type: AttachmentType::Barrel,
            damage_impact: -2.0,
            silenced: true,
            ..Default::default()
        },
        AttachmentData {
            key: "rifle_foregrip".into(),
            attachment_type: AttachmentType::Grip,
            pitch_variation_impact: -0.1,
            yaw_variation_impact: -0.1,
            equip_duration: Some(0.6),
            incompatible: vec!["rifle_drum_mag".into()],
            ..Default::default()
        },
        AttachmentData {
            key: "rifle_drum_mag".into(),
            attachment_type: AttachmentType::Magazine,
            magazine: Some(MagazineOverrides {
                clip_capacity: Some(75),
                clip_size: Some(75),
                rate_of_fire: Some(700.0),
                reload_duration: Some(3.4),
                ..Default::default()
            }),
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets() {
        let catalog = WeaponCatalog::default();
        assert!(catalog.weapon("pistol").is_some());
        assert!(catalog.weapon("rifle").is_some());
        assert!(catalog.weapon("shotgun").is_some());
        assert!(catalog.weapon("railgun").is_none());
    }

    #[test]
    fn test_resolve_without_attachments() {
        let catalog = WeaponCatalog::default();
        let resolved = catalog.resolve("rifle", &[]).expect("rifle exists");
        assert_eq!(resolved.data.clip_capacity, 30);
        assert_eq!(resolved.modifiers, AttachmentModifiers::default());
    }

    #[test]
    fn test_resolve_magazine_and_barrel() {
        let catalog = WeaponCatalog::default();
        let attachments = vec!["rifle_extended_mag".to_string(), "rifle_compensator".to_string()];
        let resolved = catalog.resolve("rifle", &attachments).expect("rifle exists");

        assert_eq!(resolved.data.clip_capacity, 45);
        assert_eq!(resolved.data.cues.reload, Some(2.6));
        assert_eq!(resolved.modifiers.damage, 1.0);
        assert!((resolved.modifiers.vertical_recoil - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_skips_conflicts() {
        let catalog = WeaponCatalog::default();
        // Два barrel + несовместимые grip/drum
        let attachments = vec![
            "rifle_compensator".to_string(),
            "rifle_suppressor".to_string(),
            "rifle_foregrip".to_string(),
            "rifle_drum_mag".to_string(),
            "missing_part".to_string(),
        ];
        let resolved = catalog.resolve("rifle", &attachments).expect("rifle exists");

        assert!(!resolved.data.silenced);
        assert_eq!(resolved.data.clip_capacity, 30);
        assert_eq!(resolved.data.cues.equip, Some(0.6));
        assert!((resolved.modifiers.pitch_variance + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_attachments_ignored_on_plain_weapon() {
        let catalog = WeaponCatalog::default();
        let resolved = catalog
            .resolve("pistol", &["rifle_extended_mag".to_string()])
            .expect("pistol exists");
        assert_eq!(resolved.data.clip_capacity, 12);
    }

    #[test]
    fn test_fresh_runtime_uses_magazine() {
        let catalog = WeaponCatalog::default();
        let runtime = catalog
            .fresh_runtime("rifle", &["rifle_drum_mag".to_string()])
            .expect("rifle exists");
        assert_eq!(runtime.clip_capacity, 75);
        assert_eq!(runtime.clip_size, 75);
        assert_eq!(runtime.weapon_health, 100.0);
        assert_eq!(runtime.attachments, vec!["rifle_drum_mag".to_string()]);
    }

    #[test]
    fn test_from_ron() {
        let text = r#"(
            weapons: [
                (
                    key: "smg",
                    display_name: "SMG",
                    rate_of_fire: 900.0,
                    automatic: true,
                    ammo_type: Pistol,
                    clip_capacity: 25,
                    clip_size: 25,
                ),
            ],
        )"#;
        let catalog = WeaponCatalog::from_ron(text).expect("valid RON");
        let smg = catalog.weapon("smg").expect("smg loaded");
        assert_eq!(smg.clip_capacity, 25);
        assert_eq!(smg.ammo_type, AmmoType::Pistol);
        // Поля не из файла → defaults
        assert_eq!(smg.accuracy_debuff, 1.25);
    }

    #[test]
    fn test_from_ron_error() {
        assert!(WeaponCatalog::from_ron("(weapons: [ (key: ) ])").is_err());
    }

    #[test]
    fn test_bundled_config_parses() {
        let catalog = WeaponCatalog::from_ron(include_str!("../../config/weapons.ron"))
            .expect("config/weapons.ron должен парситься");
        assert!(catalog.weapon("rifle").is_some());
        assert!(catalog.attachment("rifle_extended_mag").is_some());
    }
}
