//! Entity kinds, their wire ids and the static property tables derived from them.
//!
//! Every kind has a numeric id used in messages and a lowercase name used by
//! map files. Armor and weapon levels come from their rank in the upgrade
//! ladders below; mob levels come from [`MobProperties`].

macro_rules! define_kinds {
    ($($variant:ident = $id:literal => $name:literal),* $(,)?) => {
        /// Concrete subtype of an entity.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Kind {
            $($variant = $id,)*
        }

        impl Kind {
            pub const ALL: &'static [Kind] = &[$(Kind::$variant,)*];

            /// Looks a kind up by its wire id.
            pub fn from_id(id: i64) -> Option<Kind> {
                match id {
                    $($id => Some(Kind::$variant),)*
                    _ => None,
                }
            }

            /// Looks a kind up by the name used in map files.
            pub fn from_name(name: &str) -> Option<Kind> {
                match name {
                    $($name => Some(Kind::$variant),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Kind::$variant => $name,)*
                }
            }
        }
    };
}

define_kinds! {
    Warrior = 1 => "warrior",

    Rat = 2 => "rat",
    Skeleton = 3 => "skeleton",
    Goblin = 4 => "goblin",
    Ogre = 5 => "ogre",
    Spectre = 6 => "spectre",
    Crab = 7 => "crab",
    Bat = 8 => "bat",
    Wizard = 9 => "wizard",
    Eye = 10 => "eye",
    Snake = 11 => "snake",
    Skeleton2 = 12 => "skeleton2",
    Boss = 13 => "boss",
    Deathknight = 14 => "deathknight",

    Firefox = 20 => "firefox",
    ClothArmor = 21 => "clotharmor",
    LeatherArmor = 22 => "leatherarmor",
    MailArmor = 23 => "mailarmor",
    PlateArmor = 24 => "platearmor",
    RedArmor = 25 => "redarmor",
    GoldenArmor = 26 => "goldenarmor",

    Flask = 35 => "flask",
    Burger = 36 => "burger",
    Chest = 37 => "chest",
    Firepotion = 38 => "firepotion",
    Cake = 39 => "cake",

    Guard = 40 => "guard",
    King = 41 => "king",
    Octocat = 42 => "octocat",
    VillageGirl = 43 => "villagegirl",
    Villager = 44 => "villager",
    Priest = 45 => "priest",
    Scientist = 46 => "scientist",
    Agent = 47 => "agent",
    Rick = 48 => "rick",
    Nyan = 49 => "nyan",
    Sorcerer = 50 => "sorcerer",
    BeachNpc = 51 => "beachnpc",
    ForestNpc = 52 => "forestnpc",
    DesertNpc = 53 => "desertnpc",
    LavaNpc = 54 => "lavanpc",
    Coder = 55 => "coder",

    Sword1 = 60 => "sword1",
    Sword2 = 61 => "sword2",
    RedSword = 62 => "redsword",
    GoldenSword = 63 => "goldensword",
    MorningStar = 64 => "morningstar",
    Axe = 65 => "axe",
    BlueSword = 66 => "bluesword",
}

const RANKED_ARMORS: [Kind; 6] = [
    Kind::ClothArmor,
    Kind::LeatherArmor,
    Kind::MailArmor,
    Kind::PlateArmor,
    Kind::RedArmor,
    Kind::GoldenArmor,
];

const RANKED_WEAPONS: [Kind; 7] = [
    Kind::Sword1,
    Kind::Sword2,
    Kind::Axe,
    Kind::MorningStar,
    Kind::BlueSword,
    Kind::RedSword,
    Kind::GoldenSword,
];

/// Combat statistics and loot table of a mob kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobProperties {
    pub hit_points: i32,
    pub armor: i32,
    pub weapon: i32,
    /// Drop chances in percent, evaluated cumulatively in order.
    pub drops: &'static [(Kind, u32)],
}

static RAT: MobProperties = MobProperties {
    hit_points: 25,
    armor: 1,
    weapon: 1,
    drops: &[(Kind::Flask, 40), (Kind::Burger, 10), (Kind::Firepotion, 5)],
};

static SKELETON: MobProperties = MobProperties {
    hit_points: 110,
    armor: 2,
    weapon: 2,
    drops: &[
        (Kind::Flask, 40),
        (Kind::MailArmor, 10),
        (Kind::Axe, 20),
        (Kind::Firepotion, 5),
    ],
};

static GOBLIN: MobProperties = MobProperties {
    hit_points: 90,
    armor: 2,
    weapon: 1,
    drops: &[
        (Kind::Flask, 50),
        (Kind::LeatherArmor, 20),
        (Kind::Axe, 10),
        (Kind::Firepotion, 5),
    ],
};

static OGRE: MobProperties = MobProperties {
    hit_points: 200,
    armor: 3,
    weapon: 2,
    drops: &[
        (Kind::Burger, 10),
        (Kind::Flask, 50),
        (Kind::PlateArmor, 20),
        (Kind::MorningStar, 20),
        (Kind::Firepotion, 5),
    ],
};

static SPECTRE: MobProperties = MobProperties {
    hit_points: 250,
    armor: 2,
    weapon: 4,
    drops: &[
        (Kind::Flask, 30),
        (Kind::RedArmor, 40),
        (Kind::RedSword, 30),
        (Kind::Firepotion, 5),
    ],
};

static DEATHKNIGHT: MobProperties = MobProperties {
    hit_points: 250,
    armor: 3,
    weapon: 3,
    drops: &[(Kind::Burger, 95), (Kind::Firepotion, 5)],
};

static CRAB: MobProperties = MobProperties {
    hit_points: 60,
    armor: 2,
    weapon: 1,
    drops: &[
        (Kind::Flask, 50),
        (Kind::Axe, 20),
        (Kind::LeatherArmor, 10),
        (Kind::Firepotion, 5),
    ],
};

static SNAKE: MobProperties = MobProperties {
    hit_points: 150,
    armor: 3,
    weapon: 2,
    drops: &[
        (Kind::Flask, 50),
        (Kind::MailArmor, 10),
        (Kind::MorningStar, 10),
        (Kind::Firepotion, 5),
    ],
};

static SKELETON2: MobProperties = MobProperties {
    hit_points: 200,
    armor: 3,
    weapon: 3,
    drops: &[
        (Kind::Flask, 60),
        (Kind::PlateArmor, 15),
        (Kind::BlueSword, 15),
        (Kind::Firepotion, 5),
    ],
};

static EYE: MobProperties = MobProperties {
    hit_points: 200,
    armor: 3,
    weapon: 3,
    drops: &[
        (Kind::Flask, 50),
        (Kind::RedSword, 10),
        (Kind::RedArmor, 20),
        (Kind::Firepotion, 5),
    ],
};

static BAT: MobProperties = MobProperties {
    hit_points: 80,
    armor: 2,
    weapon: 1,
    drops: &[(Kind::Flask, 50), (Kind::Axe, 10), (Kind::Firepotion, 5)],
};

static WIZARD: MobProperties = MobProperties {
    hit_points: 100,
    armor: 2,
    weapon: 6,
    drops: &[(Kind::Flask, 50), (Kind::PlateArmor, 20), (Kind::Firepotion, 5)],
};

static BOSS: MobProperties = MobProperties {
    hit_points: 700,
    armor: 6,
    weapon: 7,
    drops: &[(Kind::GoldenSword, 100)],
};

impl Kind {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn is_player(self) -> bool {
        matches!(self, Kind::Warrior)
    }

    pub fn is_mob(self) -> bool {
        self.mob_properties().is_some()
    }

    pub fn is_npc(self) -> bool {
        (Kind::Guard.id()..=Kind::Coder.id()).contains(&self.id())
    }

    pub fn is_armor(self) -> bool {
        (Kind::Firefox.id()..=Kind::GoldenArmor.id()).contains(&self.id())
    }

    pub fn is_weapon(self) -> bool {
        (Kind::Sword1.id()..=Kind::BlueSword.id()).contains(&self.id())
    }

    pub fn is_object(self) -> bool {
        (Kind::Flask.id()..=Kind::Cake.id()).contains(&self.id())
    }

    pub fn is_chest(self) -> bool {
        self == Kind::Chest
    }

    /// Anything a player can pick up.
    pub fn is_item(self) -> bool {
        self.is_weapon() || self.is_armor() || (self.is_object() && !self.is_chest())
    }

    /// Hit points restored by a healing consumable.
    pub fn healing_amount(self) -> Option<i32> {
        match self {
            Kind::Flask => Some(40),
            Kind::Burger => Some(100),
            _ => None,
        }
    }

    pub fn mob_properties(self) -> Option<&'static MobProperties> {
        match self {
            Kind::Rat => Some(&RAT),
            Kind::Skeleton => Some(&SKELETON),
            Kind::Goblin => Some(&GOBLIN),
            Kind::Ogre => Some(&OGRE),
            Kind::Spectre => Some(&SPECTRE),
            Kind::Deathknight => Some(&DEATHKNIGHT),
            Kind::Crab => Some(&CRAB),
            Kind::Snake => Some(&SNAKE),
            Kind::Skeleton2 => Some(&SKELETON2),
            Kind::Eye => Some(&EYE),
            Kind::Bat => Some(&BAT),
            Kind::Wizard => Some(&WIZARD),
            Kind::Boss => Some(&BOSS),
            _ => None,
        }
    }

    /// Defensive level of this kind.
    ///
    /// Mobs read it from their property table; armors use their rank in the
    /// upgrade ladder, starting at 1. The firefox costume is outside the
    /// ladder and yields 0, as does every other kind.
    pub fn armor_level(self) -> i32 {
        if let Some(properties) = self.mob_properties() {
            return properties.armor;
        }
        rank_of(&RANKED_ARMORS, self)
    }

    /// Offensive level of this kind, following the same rules as [`Kind::armor_level`].
    pub fn weapon_level(self) -> i32 {
        if let Some(properties) = self.mob_properties() {
            return properties.weapon;
        }
        rank_of(&RANKED_WEAPONS, self)
    }

    /// Maximum hit points of a mob kind.
    pub fn mob_hit_points(self) -> Option<i32> {
        self.mob_properties().map(|p| p.hit_points)
    }
}

fn rank_of(ladder: &[Kind], kind: Kind) -> i32 {
    ladder
        .iter()
        .position(|k| *k == kind)
        .map(|rank| rank as i32 + 1)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_and_names_round_trip() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_id(kind.id() as i64), Some(*kind));
            assert_eq!(Kind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(Kind::from_id(999), None);
        assert_eq!(Kind::from_name("dragon"), None);
    }

    #[test]
    fn categories() {
        assert!(Kind::Rat.is_mob());
        assert!(!Kind::Guard.is_mob());
        assert!(Kind::Guard.is_npc());
        assert!(Kind::Firefox.is_armor());
        assert!(Kind::Axe.is_weapon());
        assert!(Kind::Flask.is_item());
        assert!(!Kind::Chest.is_item());
        assert!(Kind::Chest.is_object());
        assert!(Kind::Warrior.is_player());
    }

    #[test]
    fn levels_follow_ranks() {
        assert_eq!(Kind::ClothArmor.armor_level(), 1);
        assert_eq!(Kind::GoldenArmor.armor_level(), 6);
        assert_eq!(Kind::Firefox.armor_level(), 0);
        assert_eq!(Kind::Sword1.weapon_level(), 1);
        assert_eq!(Kind::Axe.weapon_level(), 3);
        assert_eq!(Kind::GoldenSword.weapon_level(), 7);
        assert_eq!(Kind::Boss.armor_level(), 6);
        assert_eq!(Kind::Wizard.weapon_level(), 6);
    }

    #[test]
    fn drop_tables_stay_within_a_hundred_percent() {
        for kind in Kind::ALL.iter().filter(|k| k.is_mob()) {
            let total: u32 = kind
                .mob_properties()
                .map(|p| p.drops.iter().map(|(_, chance)| *chance).sum())
                .unwrap_or(0);
            assert!(total <= 100, "{} drops {}%", kind.name(), total);
        }
    }
}
