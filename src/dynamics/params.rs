//! Physical parameters of the cart and the two links.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, require_non_negative, require_positive, require_range};

/// Masses, lengths, inertias and friction of the plant, plus the numerical
/// knobs of the mass-matrix solve.
///
/// Link angles are absolute and measured from upright. `link*_com` is the
/// distance from the joint to the link's centre of mass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub cart_mass: f64,
    pub link1_mass: f64,
    pub link2_mass: f64,
    pub link1_length: f64,
    pub link2_length: f64,
    pub link1_com: f64,
    pub link2_com: f64,
    /// Moment of inertia of link 1 about its centre of mass.
    pub link1_inertia: f64,
    pub link2_inertia: f64,
    pub gravity: f64,
    /// Viscous friction on the cart rail (N·s/m).
    pub cart_friction: f64,
    /// Viscous friction at the cart/link-1 pivot (N·m·s/rad).
    pub joint1_friction: f64,
    /// Viscous friction at the link-1/link-2 joint.
    pub joint2_friction: f64,
    /// 1-norm condition number above which the regularised solve is used.
    pub condition_threshold: f64,
    /// Tikhonov weight `λ` of the regularised solve.
    pub regularization: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            cart_mass: 1.5,
            link1_mass: 0.2,
            link2_mass: 0.15,
            link1_length: 0.4,
            link2_length: 0.3,
            link1_com: 0.2,
            link2_com: 0.15,
            link1_inertia: 0.00265,
            link2_inertia: 0.00115,
            gravity: 9.81,
            cart_friction: 0.2,
            joint1_friction: 0.005,
            joint2_friction: 0.004,
            condition_threshold: 1e10,
            regularization: 1e-10,
        }
    }
}

impl PhysicsParams {
    /// Same plant with every friction coefficient zeroed.
    #[must_use]
    pub fn frictionless(self) -> Self {
        Self {
            cart_friction: 0.0,
            joint1_friction: 0.0,
            joint2_friction: 0.0,
            ..self
        }
    }

    /// `m1·lc1 + m2·L1`.
    #[inline]
    pub fn h1(&self) -> f64 {
        self.link1_mass * self.link1_com + self.link2_mass * self.link1_length
    }

    /// `m2·lc2`.
    #[inline]
    pub fn h2(&self) -> f64 {
        self.link2_mass * self.link2_com
    }

    /// `m2·L1·lc2`.
    #[inline]
    pub fn h3(&self) -> f64 {
        self.link2_mass * self.link1_length * self.link2_com
    }

    /// Total mass moved by the actuator.
    #[inline]
    pub fn total_mass(&self) -> f64 {
        self.cart_mass + self.link1_mass + self.link2_mass
    }

    /// Link-1 rotational inertia about the cart pivot, link 2 lumped at the tip.
    #[inline]
    pub fn j1(&self) -> f64 {
        self.link1_mass * self.link1_com.powi(2)
            + self.link2_mass * self.link1_length.powi(2)
            + self.link1_inertia
    }

    /// Link-2 rotational inertia about its joint.
    #[inline]
    pub fn j2(&self) -> f64 {
        self.link2_mass * self.link2_com.powi(2) + self.link2_inertia
    }

    /// Potential energy of the upright equilibrium (cart height is the datum).
    #[inline]
    pub fn upright_energy(&self) -> f64 {
        self.gravity * (self.h1() + self.h2())
    }

    /// Reject non-physical values. Field paths are prefixed with `prefix`.
    pub fn validate_at(&self, prefix: &str) -> Result<(), ConfigError> {
        let f = |name: &str| format!("{prefix}.{name}");
        require_positive(&f("cart_mass"), self.cart_mass)?;
        require_positive(&f("link1_mass"), self.link1_mass)?;
        require_positive(&f("link2_mass"), self.link2_mass)?;
        require_positive(&f("link1_length"), self.link1_length)?;
        require_positive(&f("link2_length"), self.link2_length)?;
        require_range(&f("link1_com"), self.link1_com, 0.0, self.link1_length)?;
        require_range(&f("link2_com"), self.link2_com, 0.0, self.link2_length)?;
        require_non_negative(&f("link1_inertia"), self.link1_inertia)?;
        require_non_negative(&f("link2_inertia"), self.link2_inertia)?;
        require_non_negative(&f("gravity"), self.gravity)?;
        require_non_negative(&f("cart_friction"), self.cart_friction)?;
        require_non_negative(&f("joint1_friction"), self.joint1_friction)?;
        require_non_negative(&f("joint2_friction"), self.joint2_friction)?;
        require_range(
            &f("condition_threshold"),
            self.condition_threshold,
            1.0,
            f64::MAX,
        )?;
        require_positive(&f("regularization"), self.regularization)?;
        Ok(())
    }

    /// [`validate_at`](Self::validate_at) with the `physics` prefix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_at("physics")
    }
}
