// ============================
// crates/backend-lib/src/catalog.rs
// ============================
//! Static cosmetics catalog.
//!
//! Ids are the symbols clients render directly, so `url` is always `None`.
//! The first entry of each category is the default a new player wears.
use sledrun_common::{CosmeticCategory, CosmeticItem};

const CHARACTERS: &[(&str, &str)] = &[
    ("🏂", "Snowboarder"),
    ("🎅", "Santa"),
    ("👽", "Alien"),
    ("🤖", "Robot"),
    ("🧟", "Zombie"),
    ("🦸", "Hero"),
    ("🥷", "Ninja"),
    ("🧍", "Person"),
];

const SLEDS: &[(&str, &str)] = &[
    ("🛷", "Classic Sled"),
    ("🛸", "Saucer"),
    ("🛶", "Canoe"),
    ("📦", "Box"),
    ("🚽", "Toilet"),
    ("🛹", "Skateboard"),
];

const HATS: &[(&str, &str)] = &[
    ("🧢", "Cap"),
    ("🎩", "Hat"),
    ("👑", "Crown"),
    ("⛑️", "Helmet"),
    ("🎧", "Headphones"),
    ("🦄", "Unicorn"),
];

fn entries(category: CosmeticCategory) -> &'static [(&'static str, &'static str)] {
    match category {
        CosmeticCategory::Characters => CHARACTERS,
        CosmeticCategory::Sleds => SLEDS,
        CosmeticCategory::Hats => HATS,
    }
}

/// Items of one category, in display order
pub fn items(category: CosmeticCategory) -> Vec<CosmeticItem> {
    entries(category)
        .iter()
        .map(|(id, name)| CosmeticItem {
            id: (*id).to_string(),
            name: (*name).to_string(),
            url: None,
        })
        .collect()
}

/// Items for a raw URL segment; unknown categories are simply empty
pub fn items_for(name: &str) -> Vec<CosmeticItem> {
    CosmeticCategory::parse(name).map(items).unwrap_or_default()
}
