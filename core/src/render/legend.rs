/// Plain RGB colour so any surface can paint with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const ORANGE: Rgb = Rgb(255, 165, 0);
    pub const STROKE_ORANGE: Rgb = Rgb(0xff, 0x78, 0x00);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const YELLOW_GREEN: Rgb = Rgb(154, 205, 50);
    pub const BLUE: Rgb = Rgb(0, 0, 255);

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    pub fn to_f32(self) -> [f32; 3] {
        [
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        ]
    }
}

/// Abundance legend bands shown next to every map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbundanceBand {
    High,
    Medium,
    Slight,
    Low,
}

impl AbundanceBand {
    pub const ALL: [AbundanceBand; 4] = [
        AbundanceBand::High,
        AbundanceBand::Medium,
        AbundanceBand::Slight,
        AbundanceBand::Low,
    ];

    pub const TITLE: &'static str = "Squid Abundance Legend";

    pub fn label(self) -> &'static str {
        match self {
            AbundanceBand::High => "High Abundance",
            AbundanceBand::Medium => "Medium Abundance",
            AbundanceBand::Slight => "Slight Abundance",
            AbundanceBand::Low => "Low Abundance",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            AbundanceBand::High => Rgb::RED,
            AbundanceBand::Medium => Rgb::YELLOW,
            AbundanceBand::Slight => Rgb::YELLOW_GREEN,
            AbundanceBand::Low => Rgb::BLUE,
        }
    }

    /// Lower bound of the band on the normalised `0..=1` intensity scale.
    pub fn threshold(self) -> f32 {
        match self {
            AbundanceBand::High => 0.75,
            AbundanceBand::Medium => 0.5,
            AbundanceBand::Slight => 0.25,
            AbundanceBand::Low => 0.0,
        }
    }

    pub fn for_intensity(intensity: f32) -> AbundanceBand {
        Self::ALL
            .into_iter()
            .find(|band| intensity >= band.threshold())
            .unwrap_or(AbundanceBand::Low)
    }
}

/// Continuous heat colour: blue, yellow-green, yellow, red.
pub fn heat_color(intensity: f32) -> Rgb {
    let t = intensity.clamp(0.0, 1.0);
    let stops = [Rgb::BLUE, Rgb::YELLOW_GREEN, Rgb::YELLOW, Rgb::RED];
    let scaled = t * (stops.len() - 1) as f32;
    let index = (scaled.floor() as usize).min(stops.len() - 2);
    stops[index].lerp(stops[index + 1], scaled - index as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(AbundanceBand::for_intensity(1.0), AbundanceBand::High);
        assert_eq!(AbundanceBand::for_intensity(0.6), AbundanceBand::Medium);
        assert_eq!(AbundanceBand::for_intensity(0.3), AbundanceBand::Slight);
        assert_eq!(AbundanceBand::for_intensity(0.0), AbundanceBand::Low);
        assert_eq!(AbundanceBand::for_intensity(f32::NAN), AbundanceBand::Low);
    }

    #[test]
    fn heat_color_spans_legend_endpoints() {
        assert_eq!(heat_color(0.0), Rgb::BLUE);
        assert_eq!(heat_color(1.0), Rgb::RED);
        assert_eq!(heat_color(2.0), Rgb::RED);
    }
}
