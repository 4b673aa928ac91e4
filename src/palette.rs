//! Dominant-color extraction for sprite artwork.
//!
//! The image is downscaled, reduced to 5 bits per channel, cleaned of colors
//! that make poor backgrounds, and split with median cut into a small palette.
//! The most populous swatch wins. Every step is deterministic so the same
//! image always yields the same color.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tokio::task::JoinError;

pub const DEFAULT_MAX_COLORS: usize = 16;
pub const DEFAULT_RESIZE_AREA: u32 = 112 * 112;

/// Pixels at or below this alpha are treated as background.
const MIN_ALPHA: u8 = 125;
const QUANTIZE_BITS: u8 = 5;
const QUANTIZE_MAX: u32 = (1 << QUANTIZE_BITS) - 1;
const HISTOGRAM_SIZE: usize = 1 << (QUANTIZE_BITS * 3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Neutral surface color returned when no usable swatch exists.
    pub const FALLBACK: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn packed(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Hue in degrees, saturation and lightness in `0.0..=1.0`.
    pub fn to_hsl(self) -> [f32; 3] {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        let l = (max + min) / 2.0;

        if delta == 0.0 {
            return [0.0, 0.0, l];
        }

        let h = if max == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        let s = delta / (1.0 - (2.0 * l - 1.0).abs());

        [(h * 60.0).rem_euclid(360.0), s, l]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub rgb: Rgb,
    pub population: u32,
}

/// Rejects near-black, near-white and the skin-tone band next to red.
fn is_allowed(rgb: Rgb) -> bool {
    let [h, s, l] = rgb.to_hsl();
    let is_black = l <= 0.05;
    let is_white = l >= 0.95;
    let is_near_red_i_line = (10.0..=37.0).contains(&h) && s <= 0.82;
    !is_black && !is_white && !is_near_red_i_line
}

fn quantize(pixel: [u8; 4]) -> u16 {
    let shift = 8 - QUANTIZE_BITS;
    let r = (pixel[0] >> shift) as u16;
    let g = (pixel[1] >> shift) as u16;
    let b = (pixel[2] >> shift) as u16;
    r << (2 * QUANTIZE_BITS) | g << QUANTIZE_BITS | b
}

fn component(color: u16, channel: usize) -> u32 {
    let shift = (2 - channel) as u16 * QUANTIZE_BITS as u16;
    (color >> shift) as u32 & QUANTIZE_MAX
}

fn widen(value: u32) -> u8 {
    // Spread 0..=31 back over 0..=255.
    ((value << 3) | (value >> 2)) as u8
}

fn approximate(color: u16) -> Rgb {
    Rgb::new(
        widen(component(color, 0)),
        widen(component(color, 1)),
        widen(component(color, 2)),
    )
}

/// A box of the quantized color space, covering `colors[lower..=upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Vbox {
    lower: usize,
    upper: usize,
    population: u32,
    min: [u32; 3],
    max: [u32; 3],
}

impl Vbox {
    fn new(colors: &[u16], histogram: &[u32], lower: usize, upper: usize) -> Self {
        let mut min = [u32::MAX; 3];
        let mut max = [0; 3];
        let mut population = 0;

        for &color in &colors[lower..=upper] {
            population += histogram[color as usize];
            for channel in 0..3 {
                let value = component(color, channel);
                min[channel] = min[channel].min(value);
                max[channel] = max[channel].max(value);
            }
        }

        Self {
            lower,
            upper,
            population,
            min,
            max,
        }
    }

    fn volume(&self) -> u32 {
        (0..3).map(|c| self.max[c] - self.min[c] + 1).product()
    }

    fn can_split(&self) -> bool {
        self.upper > self.lower
    }

    fn longest_channel(&self) -> usize {
        let spans: Vec<u32> = (0..3).map(|c| self.max[c] - self.min[c]).collect();
        // Ties prefer red, then green.
        let mut best = 0;
        for channel in 1..3 {
            if spans[channel] > spans[best] {
                best = channel;
            }
        }
        best
    }

    /// Sorts the box along its longest channel and returns the population median index.
    fn split_point(&self, colors: &mut [u16], histogram: &[u32]) -> usize {
        let channel = self.longest_channel();
        colors[self.lower..=self.upper]
            .sort_unstable_by_key(|&color| (component(color, channel), color));

        let midpoint = self.population / 2;
        let mut count = 0;
        for i in self.lower..=self.upper {
            count += histogram[colors[i] as usize];
            if count >= midpoint {
                // Keep both halves non-empty.
                return i.min(self.upper - 1);
            }
        }
        self.lower
    }

    fn average(&self, colors: &[u16], histogram: &[u32]) -> Swatch {
        let mut sums = [0u64; 3];
        let mut population = 0u64;

        for &color in &colors[self.lower..=self.upper] {
            let weight = histogram[color as usize] as u64;
            population += weight;
            for (channel, sum) in sums.iter_mut().enumerate() {
                *sum += component(color, channel) as u64 * weight;
            }
        }

        let mean = |sum: u64| {
            let value = (sum as f64 / population.max(1) as f64).round() as u32;
            widen(value.min(QUANTIZE_MAX))
        };

        Swatch {
            rgb: Rgb::new(mean(sums[0]), mean(sums[1]), mean(sums[2])),
            population: population as u32,
        }
    }
}

impl Ord for Vbox {
    fn cmp(&self, other: &Self) -> Ordering {
        self.volume()
            .cmp(&other.volume())
            .then_with(|| other.lower.cmp(&self.lower))
    }
}

impl PartialOrd for Vbox {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Median-cut palette builder.
#[derive(Debug, Clone, Copy)]
pub struct DominantColorExtractor {
    max_colors: usize,
    resize_area: u32,
}

impl Default for DominantColorExtractor {
    fn default() -> Self {
        Self {
            max_colors: DEFAULT_MAX_COLORS,
            resize_area: DEFAULT_RESIZE_AREA,
        }
    }
}

impl DominantColorExtractor {
    pub fn new(max_colors: usize, resize_area: u32) -> Self {
        Self {
            max_colors: max_colors.max(1),
            resize_area: resize_area.max(1),
        }
    }

    fn scale_down(&self, image: &RgbaImage) -> Option<RgbaImage> {
        let (width, height) = image.dimensions();
        let area = width as u64 * height as u64;
        if area <= self.resize_area as u64 {
            return None;
        }
        let scale = (self.resize_area as f64 / area as f64).sqrt();
        let new_width = ((width as f64 * scale).ceil() as u32).max(1);
        let new_height = ((height as f64 * scale).ceil() as u32).max(1);
        Some(imageops::resize(image, new_width, new_height, FilterType::Nearest))
    }

    /// Builds the palette, ordered by descending population.
    pub fn palette(&self, image: &RgbaImage) -> Vec<Swatch> {
        let scaled = self.scale_down(image);
        let image = scaled.as_ref().unwrap_or(image);

        let mut histogram = vec![0u32; HISTOGRAM_SIZE];
        for pixel in image.pixels() {
            if pixel.0[3] <= MIN_ALPHA {
                continue;
            }
            histogram[quantize(pixel.0) as usize] += 1;
        }

        let mut colors: Vec<u16> = (0..HISTOGRAM_SIZE as u16)
            .filter(|&color| histogram[color as usize] > 0 && is_allowed(approximate(color)))
            .collect();

        if colors.is_empty() {
            return Vec::new();
        }

        let mut swatches = if colors.len() <= self.max_colors {
            colors
                .iter()
                .map(|&color| Swatch {
                    rgb: approximate(color),
                    population: histogram[color as usize],
                })
                .collect()
        } else {
            self.median_cut(&mut colors, &histogram)
        };

        swatches.sort_by(|a, b| {
            b.population
                .cmp(&a.population)
                .then_with(|| a.rgb.packed().cmp(&b.rgb.packed()))
        });
        swatches
    }

    fn median_cut(&self, colors: &mut [u16], histogram: &[u32]) -> Vec<Swatch> {
        let mut queue = BinaryHeap::with_capacity(self.max_colors);
        queue.push(Vbox::new(colors, histogram, 0, colors.len() - 1));

        while queue.len() < self.max_colors {
            let Some(vbox) = queue.pop() else { break };
            if !vbox.can_split() {
                queue.push(vbox);
                break;
            }
            let split = vbox.split_point(colors, histogram);
            queue.push(Vbox::new(colors, histogram, vbox.lower, split));
            queue.push(Vbox::new(colors, histogram, split + 1, vbox.upper));
        }

        queue
            .into_iter()
            .map(|vbox| vbox.average(colors, histogram))
            .filter(|swatch| is_allowed(swatch.rgb))
            .collect()
    }

    /// Most populous swatch, or [`Rgb::FALLBACK`] when nothing usable remains.
    pub fn extract(&self, image: &RgbaImage) -> Rgb {
        self.palette(image)
            .first()
            .map(|swatch| swatch.rgb)
            .unwrap_or(Rgb::FALLBACK)
    }

    /// Runs [`extract`](Self::extract) on the blocking pool.
    pub async fn extract_in_background(self, image: RgbaImage) -> Result<Rgb, JoinError> {
        tokio::task::spawn_blocking(move || self.extract(&image)).await
    }
}

pub fn extract_dominant_color(image: &RgbaImage) -> Rgb {
    DominantColorExtractor::default().extract(image)
}
