//! Weapons, passive items and shop offers.

use serde::{Deserialize, Serialize};

use crate::components::BulletMods;

/// Weapon identifiers. Stats come from [`WeaponId::spec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponId {
    Pistol,
    Shotgun,
    Smg,
    Railgun,
    Launcher,
    Tesla,
    Cryo,
}

/// Static weapon stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    pub damage: f32,
    /// Seconds between shots.
    pub interval: f32,
    pub clip: u32,
    pub reload: f32,
    pub bullet_speed: f32,
    pub bullet_radius: f32,
    pub lifetime: f32,
    pub pellets: u32,
    /// Total fan angle across all pellets, radians.
    pub spread: f32,
    pub mods: BulletMods,
}

impl WeaponId {
    pub fn spec(self) -> WeaponSpec {
        let base = BulletMods::default();
        match self {
            WeaponId::Pistol => WeaponSpec {
                damage: 3.0,
                interval: 0.28,
                clip: 12,
                reload: 0.9,
                bullet_speed: 420.0,
                bullet_radius: 4.0,
                lifetime: 1.2,
                pellets: 1,
                spread: 0.0,
                mods: base,
            },
            WeaponId::Shotgun => WeaponSpec {
                damage: 1.6,
                interval: 0.7,
                clip: 6,
                reload: 1.3,
                bullet_speed: 380.0,
                bullet_radius: 3.5,
                lifetime: 0.45,
                pellets: 6,
                spread: 0.5,
                mods: base,
            },
            WeaponId::Smg => WeaponSpec {
                damage: 1.4,
                interval: 0.09,
                clip: 30,
                reload: 1.1,
                bullet_speed: 460.0,
                bullet_radius: 3.0,
                lifetime: 0.9,
                pellets: 1,
                spread: 0.12,
                mods: base,
            },
            WeaponId::Railgun => WeaponSpec {
                damage: 7.0,
                interval: 0.9,
                clip: 4,
                reload: 1.5,
                bullet_speed: 900.0,
                bullet_radius: 3.0,
                lifetime: 0.8,
                pellets: 1,
                spread: 0.0,
                mods: BulletMods { pierce: 3, ..base },
            },
            WeaponId::Launcher => WeaponSpec {
                damage: 5.0,
                interval: 0.85,
                clip: 3,
                reload: 1.6,
                bullet_speed: 300.0,
                bullet_radius: 6.0,
                lifetime: 1.4,
                pellets: 1,
                spread: 0.0,
                mods: BulletMods {
                    explode_radius: 56.0,
                    ..base
                },
            },
            WeaponId::Tesla => WeaponSpec {
                damage: 2.2,
                interval: 0.35,
                clip: 10,
                reload: 1.2,
                bullet_speed: 480.0,
                bullet_radius: 4.0,
                lifetime: 0.8,
                pellets: 1,
                spread: 0.0,
                mods: BulletMods {
                    chain: 2,
                    shock: true,
                    ..base
                },
            },
            WeaponId::Cryo => WeaponSpec {
                damage: 2.0,
                interval: 0.4,
                clip: 8,
                reload: 1.2,
                bullet_speed: 360.0,
                bullet_radius: 5.0,
                lifetime: 1.0,
                pellets: 1,
                spread: 0.0,
                mods: BulletMods {
                    freeze: true,
                    ..base
                },
            },
        }
    }

    pub fn all() -> &'static [WeaponId] {
        &[
            WeaponId::Pistol,
            WeaponId::Shotgun,
            WeaponId::Smg,
            WeaponId::Railgun,
            WeaponId::Launcher,
            WeaponId::Tesla,
            WeaponId::Cryo,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            WeaponId::Pistol => "Pistol",
            WeaponId::Shotgun => "Shotgun",
            WeaponId::Smg => "SMG",
            WeaponId::Railgun => "Railgun",
            WeaponId::Launcher => "Launcher",
            WeaponId::Tesla => "Tesla Coil",
            WeaponId::Cryo => "Cryo Lance",
        }
    }
}

/// Passive items. Each one stacks onto the player's modifiers when taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemId {
    Whetstone,
    CritLens,
    PiercingRound,
    RubberShot,
    SeekerChip,
    VampireFang,
    ThornMail,
    Magnet,
    SwiftBoots,
    ShieldCore,
    LuckyCharm,
    CryoCore,
    StaticCore,
    HeartVessel,
}

impl ItemId {
    pub fn all() -> &'static [ItemId] {
        &[
            ItemId::Whetstone,
            ItemId::CritLens,
            ItemId::PiercingRound,
            ItemId::RubberShot,
            ItemId::SeekerChip,
            ItemId::VampireFang,
            ItemId::ThornMail,
            ItemId::Magnet,
            ItemId::SwiftBoots,
            ItemId::ShieldCore,
            ItemId::LuckyCharm,
            ItemId::CryoCore,
            ItemId::StaticCore,
            ItemId::HeartVessel,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            ItemId::Whetstone => "Whetstone",
            ItemId::CritLens => "Crit Lens",
            ItemId::PiercingRound => "Piercing Round",
            ItemId::RubberShot => "Rubber Shot",
            ItemId::SeekerChip => "Seeker Chip",
            ItemId::VampireFang => "Vampire Fang",
            ItemId::ThornMail => "Thorn Mail",
            ItemId::Magnet => "Magnet",
            ItemId::SwiftBoots => "Swift Boots",
            ItemId::ShieldCore => "Shield Core",
            ItemId::LuckyCharm => "Lucky Charm",
            ItemId::CryoCore => "Cryo Core",
            ItemId::StaticCore => "Static Core",
            ItemId::HeartVessel => "Heart Vessel",
        }
    }

    /// Shop price in coins.
    pub fn price(self) -> u32 {
        match self {
            ItemId::HeartVessel | ItemId::ShieldCore => 15,
            ItemId::Whetstone | ItemId::CritLens | ItemId::SeekerChip => 12,
            _ => 10,
        }
    }
}

/// What a shop slot sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopOffer {
    Heart,
    Key,
    Item(ItemId),
    Weapon(WeaponId),
}

impl ShopOffer {
    pub fn price(self) -> u32 {
        match self {
            ShopOffer::Heart => 4,
            ShopOffer::Key => 6,
            ShopOffer::Item(item) => item.price(),
            ShopOffer::Weapon(_) => 14,
        }
    }

    pub fn label(self) -> String {
        match self {
            ShopOffer::Heart => "Heart".to_string(),
            ShopOffer::Key => "Key".to_string(),
            ShopOffer::Item(item) => item.name().to_string(),
            ShopOffer::Weapon(w) => w.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weapon_specs_are_sane() {
        for w in WeaponId::all() {
            let s = w.spec();
            assert!(s.damage > 0.0, "{w:?}");
            assert!(s.interval > 0.0 && s.reload > 0.0, "{w:?}");
            assert!(s.clip > 0 && s.pellets > 0, "{w:?}");
        }
    }

    #[test]
    fn railgun_pierces_and_launcher_explodes() {
        assert_eq!(WeaponId::Railgun.spec().mods.pierce, 3);
        assert!(WeaponId::Launcher.spec().mods.explode_radius > 0.0);
        assert!(WeaponId::Tesla.spec().mods.chain > 0);
    }

    #[test]
    fn every_offer_has_a_price() {
        for item in ItemId::all() {
            assert!(ShopOffer::Item(*item).price() > 0);
        }
        assert!(ShopOffer::Key.price() > ShopOffer::Heart.price());
    }
}
