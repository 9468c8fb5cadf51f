use plotters::style::RGBColor;

/// Number of distinct colours before the palette repeats.
pub const BASE_COLORS: usize = 32;

/// Per-set colours for a direct-mapped cache.
///
/// Hues are spread evenly around the wheel and saturation/value alternate in
/// a period of four so neighbouring sets stay apart. Beyond
/// [`BASE_COLORS`] sets the colours cycle, so set `s` and set `s + 32` look
/// the same.
#[derive(Debug, Clone)]
pub struct Palette {
    base: [RGBColor; BASE_COLORS],
    sets_count: u64,
}

impl Palette {
    pub fn new(sets_count: u64) -> Self {
        Palette { base: base_colors(), sets_count }
    }

    pub fn sets_count(&self) -> u64 {
        self.sets_count
    }

    pub fn color(&self, set: u64) -> RGBColor {
        self.base[(set % BASE_COLORS as u64) as usize]
    }
}

fn base_colors() -> [RGBColor; BASE_COLORS] {
    std::array::from_fn(|k| {
        let hue = k as f64 / BASE_COLORS as f64;
        let (sat, val) = match k % 4 {
            0 => (0.95, 0.85),
            1 => (0.8, 0.95),
            2 => (0.9, 0.9),
            _ => (0.7, 1.0),
        };
        hsv_to_rgb(hue, sat, val)
    })
}

/// `h`, `s`, `v` all in `[0, 1]`.
fn hsv_to_rgb(h: f64, s: f64, v: f64) -> RGBColor {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector as i64 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let channel = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
    RGBColor(channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_colors_are_distinct() {
        let colors = base_colors();
        for i in 0..BASE_COLORS {
            for j in (i + 1)..BASE_COLORS {
                assert_ne!(colors[i], colors[j], "colours {i} and {j} collide");
            }
        }
    }

    #[test]
    fn first_hue_is_red() {
        let RGBColor(r, g, b) = hsv_to_rgb(0.0, 0.95, 0.85);
        assert_eq!(r, 217);
        assert_eq!(g, b);
    }

    #[test]
    fn cycles_past_thirty_two_sets() {
        let palette = Palette::new(64);
        assert_eq!(palette.sets_count(), 64);
        assert_eq!(palette.color(3), palette.color(35));
        assert_ne!(palette.color(3), palette.color(4));
    }

    #[test]
    fn huge_set_counts_stay_cheap() {
        let palette = Palette::new(1 << 32);
        assert_eq!(palette.sets_count(), 1 << 32);
        assert_eq!(palette.color((1 << 32) + 3), palette.color(3));
    }

    #[test]
    fn small_cache_uses_prefix() {
        let small = Palette::new(4);
        let full = Palette::new(32);
        for s in 0..4 {
            assert_eq!(small.color(s), full.color(s));
        }
    }
}
