use crate::traits::Scalar;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Capacity of every state, derivative and error buffer: 3 position +
/// 3 momentum + up to 6 auxiliary components (spin, time, ...).
pub const MAX_COMPONENTS: usize = 12;

/// A trajectory segment: one fixed-capacity state vector plus its
/// arc-length parameter.
///
/// Created per segment by the caller and mutated in place by the
/// driver's advance operations. Never shared across concurrent
/// integrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTrack<T: Scalar> {
    state: [T; MAX_COMPONENTS],
    curve_length: T,
}

impl<T: Scalar> FieldTrack<T> {
    /// Builds a track from the leading state components; the remaining
    /// capacity is zero-filled.
    ///
    /// # Panics
    /// Panics if more than [`MAX_COMPONENTS`] components are given.
    pub fn new(components: &[T], curve_length: T) -> Self {
        let mut state = [T::zero(); MAX_COMPONENTS];
        state[..components.len()].copy_from_slice(components);
        Self {
            state,
            curve_length,
        }
    }

    /// Copies the full state into `buf`.
    pub fn dump_to_array(&self, buf: &mut [T; MAX_COMPONENTS]) {
        buf.copy_from_slice(&self.state);
    }

    /// Replaces the first `ncomp` state components with values from
    /// `buf`. Components beyond `ncomp` keep their previous values, so
    /// auxiliary quantities a narrower integration did not touch
    /// survive.
    pub fn load_from_array(&mut self, buf: &[T; MAX_COMPONENTS], ncomp: usize) {
        self.state[..ncomp].copy_from_slice(&buf[..ncomp]);
    }

    pub fn curve_length(&self) -> T {
        self.curve_length
    }

    pub fn set_curve_length(&mut self, curve_length: T) {
        self.curve_length = curve_length;
    }

    /// The position triple (components 0..3).
    pub fn position(&self) -> Vector3<T> {
        Vector3::new(self.state[0], self.state[1], self.state[2])
    }

    /// The momentum triple (components 3..6).
    pub fn momentum(&self) -> Vector3<T> {
        Vector3::new(self.state[3], self.state[4], self.state[5])
    }
}
