//! Random attrition — stands in for combat when a mission runs headless.
//!
//! RULE: All randomness flows through the seeded generator. The same
//! mission, seed and hit chance always produce the same losses.

use armada_script::{battle::Battlefield, types::SpacecraftId};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Hull fraction removed by a single hit.
const MIN_DAMAGE: f64 = 0.05;
const MAX_DAMAGE: f64 = 0.35;

pub struct Attrition {
    rng:        Pcg64Mcg,
    /// Probability per tick that a given spacecraft is hit.
    hit_chance: f64,
}

impl Attrition {
    pub fn new(seed: u64, hit_chance: f64) -> Self {
        Self {
            rng:        Pcg64Mcg::seed_from_u64(seed),
            hit_chance: hit_chance.clamp(0.0, 1.0),
        }
    }

    /// Rolls one round of hits against every live, present spacecraft
    /// except the piloted one. Returns the ids destroyed this round.
    pub fn apply(&mut self, world: &mut Battlefield) -> Vec<SpacecraftId> {
        if self.hit_chance <= 0.0 {
            return Vec::new();
        }
        let piloted = world.piloted().map(|sc| sc.id().to_string());
        let targets: Vec<_> = world
            .spacecrafts()
            .filter(|(_, sc)| sc.is_alive() && !sc.is_away())
            .filter(|(_, sc)| piloted.as_deref() != Some(sc.id()))
            .map(|(handle, _)| handle)
            .collect();

        let mut destroyed = Vec::new();
        for handle in targets {
            if self.rng.gen::<f64>() >= self.hit_chance {
                continue;
            }
            let damage = self.rng.gen_range(MIN_DAMAGE..MAX_DAMAGE);
            let sc = world.get_mut(handle);
            sc.set_hull_integrity(sc.hull_integrity() - damage);
            if !sc.is_alive() {
                log::info!("attrition destroyed '{}'", sc.id());
                destroyed.push(sc.id().to_string());
            }
        }
        destroyed
    }
}
