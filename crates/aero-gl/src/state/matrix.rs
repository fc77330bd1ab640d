//! Column-major 4×4 matrices and the legacy matrix stacks.

use std::ops::Mul;

use bytemuck::{Pod, Zeroable};

use super::translate::MatrixMode;
use crate::error::{GlError, Result};

/// Column-major 4×4 matrix, laid out exactly as the legacy API loads it.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Mat4(pub [[f32; 4]; 4]);

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub fn from_column_major(m: &[f32; 16]) -> Self {
        let mut cols = [[0.0; 4]; 4];
        for (c, col) in cols.iter_mut().enumerate() {
            col.copy_from_slice(&m[c * 4..c * 4 + 4]);
        }
        Mat4(cols)
    }

    /// Element at `row`, `col`.
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[col][row]
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [[0.0; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = self.0[r][c];
            }
        }
        Mat4(out)
    }

    pub fn transform(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (r, o) in out.iter_mut().enumerate() {
            *o = (0..4).map(|c| self.at(r, c) * v[c]).sum();
        }
        out
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[3] = [x, y, z, 1.0];
        m
    }

    pub fn scaling(x: f32, y: f32, z: f32) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        m.0[0][0] = x;
        m.0[1][1] = y;
        m.0[2][2] = z;
        m
    }

    /// Rotation by `degrees` around the axis (x, y, z); a zero axis yields identity.
    pub fn rotation(degrees: f32, x: f32, y: f32, z: f32) -> Mat4 {
        let len = (x * x + y * y + z * z).sqrt();
        if len == 0.0 {
            return Mat4::IDENTITY;
        }
        let (x, y, z) = (x / len, y / len, z / len);
        let (s, c) = degrees.to_radians().sin_cos();
        let t = 1.0 - c;
        Mat4([
            [x * x * t + c, y * x * t + z * s, x * z * t - y * s, 0.0],
            [x * y * t - z * s, y * y * t + c, y * z * t + x * s, 0.0],
            [x * z * t + y * s, y * z * t - x * s, z * z * t + c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let (rl, tb, fne) = (right - left, top - bottom, far - near);
        Mat4([
            [2.0 / rl, 0.0, 0.0, 0.0],
            [0.0, 2.0 / tb, 0.0, 0.0],
            [0.0, 0.0, -2.0 / fne, 0.0],
            [-(right + left) / rl, -(top + bottom) / tb, -(far + near) / fne, 1.0],
        ])
    }

    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let (rl, tb, fne) = (right - left, top - bottom, far - near);
        Mat4([
            [2.0 * near / rl, 0.0, 0.0, 0.0],
            [0.0, 2.0 * near / tb, 0.0, 0.0],
            [(right + left) / rl, (top + bottom) / tb, -(far + near) / fne, -1.0],
            [0.0, 0.0, -2.0 * far * near / fne, 0.0],
        ])
    }

    /// Full inverse by Gauss-Jordan elimination with partial pivoting.
    /// `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Mat4> {
        let mut a: [[f32; 4]; 4] = std::array::from_fn(|r| std::array::from_fn(|c| self.at(r, c)));
        let mut inv: [[f32; 4]; 4] = std::array::from_fn(|r| std::array::from_fn(|c| f32::from(u8::from(r == c))));
        for col in 0..4 {
            let pivot = (col..4).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
            if a[pivot][col] == 0.0 {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);
            let scale = a[col][col];
            for c in 0..4 {
                a[col][c] /= scale;
                inv[col][c] /= scale;
            }
            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                for c in 0..4 {
                    a[row][c] -= factor * a[col][c];
                    inv[row][c] -= factor * inv[col][c];
                }
            }
        }
        Some(Mat4(std::array::from_fn(|c| std::array::from_fn(|r| inv[r][c]))))
    }

    /// Inverse-transpose of the upper 3×3, embedded in a 4×4.
    ///
    /// A singular matrix yields its own upper 3×3 unchanged; lighting through
    /// a degenerate modelview is undefined anyway.
    pub fn normal_matrix(&self) -> Mat4 {
        let a = |r: usize, c: usize| self.at(r, c);
        let cof = [
            [
                a(1, 1) * a(2, 2) - a(1, 2) * a(2, 1),
                a(1, 2) * a(2, 0) - a(1, 0) * a(2, 2),
                a(1, 0) * a(2, 1) - a(1, 1) * a(2, 0),
            ],
            [
                a(0, 2) * a(2, 1) - a(0, 1) * a(2, 2),
                a(0, 0) * a(2, 2) - a(0, 2) * a(2, 0),
                a(0, 1) * a(2, 0) - a(0, 0) * a(2, 1),
            ],
            [
                a(0, 1) * a(1, 2) - a(0, 2) * a(1, 1),
                a(0, 2) * a(1, 0) - a(0, 0) * a(1, 2),
                a(0, 0) * a(1, 1) - a(0, 1) * a(1, 0),
            ],
        ];
        let det = a(0, 0) * cof[0][0] + a(0, 1) * cof[0][1] + a(0, 2) * cof[0][2];
        let mut out = Mat4::IDENTITY;
        for r in 0..3 {
            for c in 0..3 {
                // cof[r][c] is the cofactor of (r, c): inverse-transpose = cof / det.
                out.0[c][r] = if det == 0.0 { a(r, c) } else { cof[r][c] / det };
            }
        }
        out
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, v) in col.iter_mut().enumerate() {
                *v = (0..4).map(|k| self.at(r, k) * rhs.at(k, c)).sum();
            }
        }
        Mat4(out)
    }
}

/// LIFO of matrices with a fixed maximum depth; never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixStack {
    entries: Vec<Mat4>,
    max_depth: usize,
}

impl MatrixStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: vec![Mat4::IDENTITY],
            max_depth: max_depth.max(1),
        }
    }

    pub fn top(&self) -> &Mat4 {
        // The stack always holds at least the base entry.
        &self.entries[self.entries.len() - 1]
    }

    pub fn top_mut(&mut self) -> &mut Mat4 {
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, call: &'static str) -> Result<()> {
        if self.entries.len() >= self.max_depth {
            return Err(GlError::MatrixStackOverflow {
                call,
                depth: self.max_depth,
            });
        }
        let top = *self.top();
        self.entries.push(top);
        Ok(())
    }

    pub fn pop(&mut self, call: &'static str) -> Result<()> {
        if self.entries.len() <= 1 {
            return Err(GlError::MatrixStackUnderflow { call });
        }
        self.entries.pop();
        Ok(())
    }

    /// Replaces the top with `top * m`.
    pub fn multiply(&mut self, m: Mat4) {
        let top = self.top_mut();
        *top = *top * m;
    }
}

/// Projection, per-modelview-unit and per-texture-unit stacks.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixStackGroup {
    projection: MatrixStack,
    modelview: Vec<MatrixStack>,
    texture: Vec<MatrixStack>,
}

impl MatrixStackGroup {
    pub fn new(modelview_units: usize, texture_units: usize, max_depth: usize) -> Self {
        Self {
            projection: MatrixStack::new(max_depth),
            modelview: vec![MatrixStack::new(max_depth); modelview_units.max(1)],
            texture: vec![MatrixStack::new(max_depth); texture_units],
        }
    }

    /// The stack selected by `mode`; texture stacks are per `texture_unit`.
    pub fn stack_mut(
        &mut self,
        call: &'static str,
        mode: MatrixMode,
        texture_unit: usize,
    ) -> Result<&mut MatrixStack> {
        let (stacks, index, what) = match mode {
            MatrixMode::Projection => return Ok(&mut self.projection),
            MatrixMode::Modelview(unit) => (&mut self.modelview, unit as usize, "modelview matrix"),
            MatrixMode::Texture => (&mut self.texture, texture_unit, "texture matrix unit"),
        };
        let limit = stacks.len() as u32;
        stacks.get_mut(index).ok_or(GlError::CapabilityOutOfRange {
            call,
            what,
            index: index as u32,
            limit,
        })
    }

    pub fn projection(&self) -> &Mat4 {
        self.projection.top()
    }

    pub fn modelview(&self) -> &Mat4 {
        self.modelview[0].top()
    }

    pub fn texture(&self, unit: usize) -> Mat4 {
        self.texture
            .get(unit)
            .map(|stack| *stack.top())
            .unwrap_or(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 4], b: [f32; 4]) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn translate_then_rotate_applies_rotation_first() {
        let m = Mat4::translation(1.0, 0.0, 0.0) * Mat4::rotation(90.0, 0.0, 0.0, 1.0);
        approx(m.transform([1.0, 0.0, 0.0, 1.0]), [1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn column_major_load_round_trips() {
        let raw: [f32; 16] = std::array::from_fn(|i| i as f32);
        let m = Mat4::from_column_major(&raw);
        assert_eq!(m.at(1, 0), 1.0);
        assert_eq!(m.at(0, 1), 4.0);
        assert_eq!(m.transpose().at(0, 1), 1.0);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let m = Mat4::scaling(2.0, 4.0, 1.0).normal_matrix();
        approx(m.transform([1.0, 1.0, 1.0, 0.0]), [0.5, 0.25, 1.0, 0.0]);
    }

    #[test]
    fn inverse_undoes_translate_and_scale() {
        let m = Mat4::translation(1.0, 2.0, 3.0) * Mat4::scaling(2.0, 4.0, 8.0);
        let inv = m.inverse().unwrap();
        approx(inv.transform(m.transform([1.0, 1.0, 1.0, 1.0])), [1.0, 1.0, 1.0, 1.0]);
        approx(inv.transform([1.0, 2.0, 3.0, 1.0]), [0.0, 0.0, 0.0, 1.0]);
        assert!(Mat4::scaling(1.0, 0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn ortho_maps_box_to_clip_cube() {
        let m = Mat4::ortho(0.0, 10.0, 0.0, 20.0, -1.0, 1.0);
        approx(m.transform([10.0, 20.0, 1.0, 1.0]), [1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn stack_overflow_and_underflow_are_fatal() {
        let mut stack = MatrixStack::new(2);
        assert!(matches!(
            stack.pop("glPopMatrix"),
            Err(GlError::MatrixStackUnderflow { .. })
        ));
        stack.push("glPushMatrix").unwrap();
        assert!(matches!(
            stack.push("glPushMatrix"),
            Err(GlError::MatrixStackOverflow { depth: 2, .. })
        ));
    }

    #[test]
    fn each_mode_selects_its_own_stack() {
        let mut group = MatrixStackGroup::new(4, 8, 32);
        group
            .stack_mut("glScalef", MatrixMode::Projection, 0)
            .unwrap()
            .multiply(Mat4::scaling(2.0, 2.0, 2.0));
        group
            .stack_mut("glScalef", MatrixMode::Texture, 3)
            .unwrap()
            .multiply(Mat4::scaling(3.0, 3.0, 3.0));
        assert_eq!(group.projection().at(0, 0), 2.0);
        assert_eq!(group.modelview().at(0, 0), 1.0);
        assert_eq!(group.texture(3).at(0, 0), 3.0);
        assert_eq!(group.texture(2).at(0, 0), 1.0);
        assert!(matches!(
            group.stack_mut("glMatrixMode", MatrixMode::Modelview(4), 0),
            Err(GlError::CapabilityOutOfRange { index: 4, limit: 4, .. })
        ));
    }
}
