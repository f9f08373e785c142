//! Muted display colors for flat surfaces and marker shapes.
//!
//! Each palette is a dark/light pair. A stable value picks one of eleven evenly
//! spaced mixes between them, so neighbouring surfaces or markers stay
//! distinguishable without looking random.

pub type Palette = ([f32; 4], [f32; 4]);

pub const ENVIRONMENT: Palette = ([0.23, 0.28, 0.26, 1.0], [0.34, 0.40, 0.36, 1.0]);
pub const PROP: Palette = ([0.31, 0.29, 0.23, 1.0], [0.42, 0.39, 0.29, 1.0]);
pub const ACTOR: Palette = ([0.36, 0.29, 0.26, 1.0], [0.49, 0.37, 0.31, 1.0]);

pub fn lerp(palette: Palette, t: f32) -> [f32; 4] {
    let (dark, light) = palette;
    let t = t.clamp(0.0, 1.0);
    std::array::from_fn(|i| dark[i] + (light[i] - dark[i]) * t)
}

/// Mix factor in `{0.0, 0.1, ..., 1.0}` from an integer key.
pub fn mix_for_id(id: i64) -> f32 {
    id.rem_euclid(11) as f32 / 10.0
}

/// Mix factor from a case-insensitive FNV-1a hash of `name`.
pub fn mix_for_name(name: &str) -> f32 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.bytes().map(|b| b.to_ascii_lowercase()) {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash % 11) as f32 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lerp_hits_both_ends() {
        assert_eq!(lerp(PROP, 0.0), PROP.0);
        let light = lerp(PROP, 1.0);
        for (got, want) in light.iter().zip(PROP.1) {
            assert_relative_eq!(*got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn mixes_stay_in_range() {
        for id in [-23, -1, 0, 5, 10, 11, 1234] {
            let t = mix_for_id(id);
            assert!((0.0..=1.0).contains(&t));
        }
        assert_eq!(mix_for_id(11), 0.0);
        assert_eq!(mix_for_name("Crate_01"), mix_for_name("crate_01"));
    }
}
