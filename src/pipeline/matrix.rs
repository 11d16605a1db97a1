//! Matrix convention helpers.
//!
//! All matrices travel as flat column-major `[f32; 16]` arrays, the layout
//! both WebVR and the rendering host use on the wire.

use glam::{Mat4, Vec3};

/// Flat indices of the Z-basis row in a column-major 4x4.
const Z_ROW: [usize; 4] = [2, 6, 10, 14];

/// Plain transpose.
pub fn transpose(m: &[f32; 16]) -> [f32; 16] {
    Mat4::from_cols_array(m).transpose().to_cols_array()
}

/// Transpose, then negate the Z-basis row (right-handed -> left-handed).
pub fn convert_view(m: &[f32; 16]) -> [f32; 16] {
    let mut out = transpose(m);
    for i in Z_ROW {
        out[i] = -out[i];
    }
    out
}

/// Seated-to-standing transform in host convention.
///
/// Uses the display's stage transform when it has one, otherwise lifts the
/// origin by `default_height` along +Y.
pub fn sit_to_stand(stage_transform: Option<&[f32; 16]>, default_height: f32) -> [f32; 16] {
    let sit_stand = match stage_transform {
        Some(transform) => *transform,
        None => Mat4::from_translation(Vec3::new(0.0, default_height, 0.0)).to_cols_array(),
    };
    transpose(&sit_stand)
}
