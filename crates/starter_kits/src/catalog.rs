//! Catalog of item types a kit may reference.
//!
//! Names are matched case-sensitively, the same way the host spells its
//! item identifiers.

use std::collections::BTreeSet;

/// Item identifiers known to a stock server.
const BUILTIN_ITEMS: &[&str] = &[
    "STONE",
    "COBBLESTONE",
    "DIRT",
    "GRASS_BLOCK",
    "SAND",
    "GRAVEL",
    "OAK_LOG",
    "OAK_PLANKS",
    "STICK",
    "TORCH",
    "CRAFTING_TABLE",
    "FURNACE",
    "CHEST",
    "WHITE_BED",
    "COAL",
    "IRON_INGOT",
    "GOLD_INGOT",
    "DIAMOND",
    "WOODEN_SWORD",
    "WOODEN_PICKAXE",
    "WOODEN_AXE",
    "WOODEN_SHOVEL",
    "STONE_SWORD",
    "STONE_PICKAXE",
    "STONE_AXE",
    "STONE_SHOVEL",
    "IRON_SWORD",
    "IRON_PICKAXE",
    "LEATHER_HELMET",
    "LEATHER_CHESTPLATE",
    "LEATHER_LEGGINGS",
    "LEATHER_BOOTS",
    "SHIELD",
    "BOW",
    "ARROW",
    "FISHING_ROD",
    "BREAD",
    "APPLE",
    "COOKED_BEEF",
    "COOKED_CHICKEN",
    "BAKED_POTATO",
    "WATER_BUCKET",
    "BUCKET",
    "MAP",
    "COMPASS",
    "CLOCK",
];

/// Set of item type names that kit entries are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCatalog {
    names: BTreeSet<String>,
}

impl ItemCatalog {
    /// Catalog containing the stock item identifiers.
    pub fn builtin() -> Self {
        Self::from_names(BUILTIN_ITEMS.iter().copied())
    }

    /// Builds a catalog from host-supplied item names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds extra item names on top of the existing catalog.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
    }

    /// Returns the canonical name if `name` is a known item type.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ItemCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
