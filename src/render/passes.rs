//! Whole-buffer pixel passes over premultiplied RGBA8 surfaces.

use crate::foundation::error::{CanvasError, CanvasResult};
use crate::foundation::math::mul_div255_u8;
use crate::layer::model::ImageFilters;

/// 4x5 row-major color matrix over straight-alpha RGBA in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorMatrix(pub [f32; 20]);

impl ColorMatrix {
    /// Identity transform.
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]);

    fn rgb(rows: [[f32; 3]; 3], offset: f32) -> Self {
        let mut m = Self::IDENTITY.0;
        for (r, row) in rows.iter().enumerate() {
            m[r * 5..r * 5 + 3].copy_from_slice(row);
            m[r * 5 + 4] = offset;
        }
        Self(m)
    }

    /// Multiply RGB by `amount` (1 = unchanged).
    pub fn brightness(amount: f32) -> Self {
        let a = amount.max(0.0);
        Self::rgb([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]], 0.0)
    }

    /// Scale RGB around mid-gray by `amount` (1 = unchanged).
    pub fn contrast(amount: f32) -> Self {
        let a = amount.max(0.0);
        Self::rgb(
            [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]],
            0.5 - 0.5 * a,
        )
    }

    /// Saturation with Rec. 709 luma weights (1 = unchanged, 0 = gray).
    pub fn saturate(amount: f32) -> Self {
        let s = amount.max(0.0);
        Self::rgb(
            [
                [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
            ],
            0.0,
        )
    }

    /// Blend toward luma gray by `amount` in `[0, 1]`.
    pub fn grayscale(amount: f32) -> Self {
        let g = 1.0 - amount.clamp(0.0, 1.0);
        Self::rgb(
            [
                [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
                [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
                [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
            ],
            0.0,
        )
    }

    /// Blend toward sepia tone by `amount` in `[0, 1]`.
    pub fn sepia(amount: f32) -> Self {
        let a = 1.0 - amount.clamp(0.0, 1.0);
        Self::rgb(
            [
                [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
                [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
                [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
            ],
            0.0,
        )
    }

    /// Matrix equivalent to applying `self` and then `next`.
    pub fn then(self, next: Self) -> Self {
        let a = self.0;
        let b = next.0;
        let mut out = [0.0f32; 20];
        for i in 0..4 {
            for j in 0..5 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += b[i * 5 + k] * a[k * 5 + j];
                }
                if j == 4 {
                    acc += b[i * 5 + 4];
                }
                out[i * 5 + j] = acc;
            }
        }
        Self(out)
    }

    /// Combined matrix for an image filter set, applied in the order brightness, contrast,
    /// saturation, grayscale, sepia.
    pub fn from_filters(f: &ImageFilters) -> Self {
        let pct = |v: f64| (v / 100.0) as f32;
        Self::brightness(pct(f.brightness))
            .then(Self::contrast(pct(f.contrast)))
            .then(Self::saturate(pct(f.saturation)))
            .then(Self::grayscale(pct(f.grayscale)))
            .then(Self::sepia(pct(f.sepia)))
    }
}

/// Apply `m` to every pixel of a premultiplied buffer.
pub fn color_matrix_rgba8_premul(src: &[u8], dst: &mut [u8], m: &ColorMatrix) {
    debug_assert_eq!(src.len(), dst.len());
    let m = &m.0;
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pa = s[3] as f32 / 255.0;
        if pa == 0.0 {
            d.copy_from_slice(&[0, 0, 0, 0]);
            continue;
        }

        // premul -> straight
        let r = s[0] as f32 / 255.0 / pa;
        let g = s[1] as f32 / 255.0 / pa;
        let b = s[2] as f32 / 255.0 / pa;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        d[0] = (out_r * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[1] = (out_g * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[2] = (out_b * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Kernel radius covering three standard deviations.
pub fn blur_radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Normalized gaussian weights in Q16 fixed point; the weights sum to exactly `1 << 16`.
pub fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CanvasResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CanvasError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(CanvasError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

/// Separable gaussian blur of a premultiplied buffer, in place. Edges clamp.
pub fn blur_rgba8_premul_in_place(
    buf: &mut [u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> CanvasResult<()> {
    let radius = blur_radius_for_sigma(sigma);
    if radius == 0 || width == 0 || height == 0 {
        return Ok(());
    }
    if buf.len() != (width as usize) * (height as usize) * 4 {
        return Err(CanvasError::render("blur buffer does not match dimensions"));
    }
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; buf.len()];
    horizontal_blur_q16(buf, &mut tmp, width, height, &kernel);
    vertical_blur_q16(&tmp, buf, width, height, &kernel);
    Ok(())
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

/// Porter-Duff "source over" of premultiplied `src` onto `dst`, scaling `src` by `opacity`.
pub fn premul_over_in_place_opacity(dst: &mut [u8], src: &[u8], opacity: f32) -> CanvasResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(CanvasError::render(
            "premul_over_in_place_opacity expects equal-length rgba8 buffers",
        ));
    }
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);
        d[3] = sa.saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = sc.saturating_add(dc);
        }
    }
    Ok(())
}

/// Fill every pixel with one premultiplied value.
pub fn fill_rgba8(buf: &mut [u8], rgba_premul: [u8; 4]) {
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba_premul);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/passes.rs"]
mod tests;
