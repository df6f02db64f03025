//! Fixed-point math used by scripts
//!
//! Angles are integers: a full turn is 512 steps for [`sin512`]/[`cos512`]
//! and 256 steps for [`sin256`]/[`cos256`] and [`atan2`]. Results are scaled
//! by the same factor.

use std::sync::OnceLock;

struct TrigTables {
    sin512: [i32; 0x200],
    cos512: [i32; 0x200],
    sin256: [i32; 0x100],
    cos256: [i32; 0x100],
    atan: Vec<u8>,
}

fn tables() -> &'static TrigTables {
    static TABLES: OnceLock<TrigTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut sin512 = [0; 0x200];
        let mut cos512 = [0; 0x200];
        for i in 0..0x200 {
            let angle = (i as f32 / 256.0) * std::f32::consts::PI;
            sin512[i] = (angle.sin() * 512.0) as i32;
            cos512[i] = (angle.cos() * 512.0) as i32;
        }
        // exact quarter turns
        cos512[0] = 0x200;
        cos512[128] = 0;
        cos512[256] = -0x200;
        cos512[384] = 0;
        sin512[0] = 0;
        sin512[128] = 0x200;
        sin512[256] = 0;
        sin512[384] = -0x200;

        let mut sin256 = [0; 0x100];
        let mut cos256 = [0; 0x100];
        for i in 0..0x100 {
            sin256[i] = sin512[i * 2] >> 1;
            cos256[i] = cos512[i * 2] >> 1;
        }

        let mut atan = vec![0u8; 0x10000];
        for x in 0..0x100usize {
            for y in 0..0x100usize {
                let angle = (y as f32).atan2(x as f32);
                atan[(x << 8) + y] = (angle * 40.743664) as i32 as u8;
            }
        }

        TrigTables {
            sin512,
            cos512,
            sin256,
            cos256,
            atan,
        }
    })
}

fn wrap(angle: i32, turn: i32) -> usize {
    let angle = if angle < 0 {
        turn.wrapping_sub(angle)
    } else {
        angle
    };
    (angle & (turn - 1)) as usize
}

/// Sine with 512 steps per turn, scaled by 512
pub fn sin512(angle: i32) -> i32 {
    tables().sin512[wrap(angle, 0x200)]
}

/// Cosine with 512 steps per turn, scaled by 512
pub fn cos512(angle: i32) -> i32 {
    tables().cos512[wrap(angle, 0x200)]
}

/// Sine with 256 steps per turn, scaled by 256
pub fn sin256(angle: i32) -> i32 {
    tables().sin256[wrap(angle, 0x100)]
}

/// Cosine with 256 steps per turn, scaled by 256
pub fn cos256(angle: i32) -> i32 {
    tables().cos256[wrap(angle, 0x100)]
}

/// Angle of the vector `(x, y)` with 256 steps per turn
pub fn atan2(x: i32, y: i32) -> i32 {
    let mut ax = x.unsigned_abs();
    let mut ay = y.unsigned_abs();
    if ax <= ay {
        while ay > 0xFF {
            ax >>= 4;
            ay >>= 4;
        }
    } else {
        while ax > 0xFF {
            ax >>= 4;
            ay >>= 4;
        }
    }
    let base = tables().atan[((ax as usize) << 8) + ay as usize];
    let angle = if x <= 0 {
        if y <= 0 {
            base.wrapping_add(0x80)
        } else {
            0x80u8.wrapping_sub(base)
        }
    } else if y <= 0 {
        0u8.wrapping_sub(base)
    } else {
        base
    };
    i32::from(angle)
}

/// Linear interpolation between `from` and `to` by `percent` out of 256
pub fn interpolate(from: i32, to: i32, percent: i32) -> i32 {
    from.wrapping_mul(0x100i32.wrapping_sub(percent))
        .wrapping_add(percent.wrapping_mul(to))
        >> 8
}

/// xorshift64 random number source
#[derive(Debug, Clone)]
pub struct XorShift {
    state: u64,
}

impl Default for XorShift {
    fn default() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0x853c49e6748fea9b);
        Self::with_seed(seed)
    }
}

impl XorShift {
    /// Create a generator with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x853c49e6748fea9b } else { seed },
        }
    }

    /// Next non-negative value
    pub fn next_value(&mut self) -> i32 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.state = s;
        ((s >> 33) & 0x7FFF_FFFF) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_turns() {
        assert_eq!(sin512(0), 0);
        assert_eq!(sin512(128), 512);
        assert_eq!(cos512(256), -512);
        assert_eq!(sin512(384), -512);
        assert_eq!(sin256(64), 256);
        assert_eq!(cos256(0), 256);
        assert_eq!(cos256(128), -256);
    }

    #[test]
    fn test_angles_wrap() {
        assert_eq!(sin512(128 + 512), 512);
        assert_eq!(cos512(-256), cos512(256 + 512));
    }

    #[test]
    fn test_atan2_quadrants() {
        assert_eq!(atan2(16, 0), 0);
        assert_eq!(atan2(-16, 0), 0x80);
        assert_eq!(atan2(16, 1), 2);
        assert_eq!(atan2(16, -1), 0xFE);
        assert_eq!(atan2(0x1000, 0), 0);
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate(0, 256, 128), 128);
        assert_eq!(interpolate(100, 200, 0), 100);
        assert_eq!(interpolate(100, 200, 256), 200);
    }

    #[test]
    fn test_interpolate_extreme_percent_wraps() {
        assert_eq!(
            interpolate(1, 2, i32::MIN),
            0x100i32
                .wrapping_sub(i32::MIN)
                .wrapping_add(i32::MIN.wrapping_mul(2))
                >> 8
        );
        interpolate(i32::MAX, i32::MIN, i32::MAX);
    }

    #[test]
    fn test_xorshift_is_deterministic() {
        let mut a = XorShift::with_seed(7);
        let mut b = XorShift::with_seed(7);
        for _ in 0..16 {
            let value = a.next_value();
            assert!(value >= 0);
            assert_eq!(value, b.next_value());
        }
    }
}
