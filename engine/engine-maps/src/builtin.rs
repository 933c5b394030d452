//! Maps compiled into the binary so a fresh install is playable.

use engine_core::GameMap;

pub const CLASSIC_ID: &str = "classic";

const CLASSIC_LAYOUT: [&str; 15] = [
    "BBBWBBBPBBBWBBB",
    "BRRRRRRRRRRRRRB",
    "BRBBBRRSRBBBRPB",
    "BRBPBRRRRRBPBRB",
    "BRBRBBBRBBBRBBB",
    "BRRRRRRRRRRRRRB",
    "BBBBRWWWWWBBBBB",
    "PRRRRHHHHHRRRRP",
    "BBBBRWWWWWBBBBB",
    "BRRRRRRRRRRRRRB",
    "BRBRBBBRBBBRBBB",
    "BRBPBRRRRRBPBRB",
    "BRBBBRRSRBBBRPB",
    "BRRRRRRRRRRRRRB",
    "BBBWBBBPBBBWBBB",
];

/// Ids of every built-in map
pub fn builtin_ids() -> &'static [&'static str] {
    &[CLASSIC_ID]
}

pub fn builtin(id: &str) -> Option<GameMap> {
    match id {
        CLASSIC_ID => classic(),
        _ => None,
    }
}

/// The 15x15 symmetric starter map
fn classic() -> Option<GameMap> {
    GameMap::from_layout("Classic", &CLASSIC_LAYOUT, 10, 10)
        .ok()
        .map(|map| map.with_description("The classic 15x15 road trip with 10 parks"))
}
