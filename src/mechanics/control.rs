/// Control mechanics: saturation, switching terms, gain adaptation.
use serde::{Deserialize, Serialize};

/// Clip to the symmetric actuator interval `[-limit, limit]`.
#[inline]
pub fn saturate(u: f64, limit: f64) -> f64 {
    u.clamp(-limit, limit)
}

/// Unit saturation: `sat(z) ∈ [-1, 1]`.
#[inline]
pub fn sat(z: f64) -> f64 {
    z.clamp(-1.0, 1.0)
}

/// Sign with `sign(0) = 0`, unlike `f64::signum`.
#[inline]
pub fn sign(z: f64) -> f64 {
    if z > 0.0 {
        1.0
    } else if z < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Shape of the discontinuous term near the sliding manifold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchingFunction {
    /// Hard relay; the boundary layer is ignored.
    Sign,
    /// Linear interpolation inside the boundary layer.
    #[default]
    Saturation,
    /// Smooth `tanh(s / φ)`.
    Tanh,
}

/// Switching term for surface value `s` and boundary-layer width `phi`.
/// A zero (or negative) width always degrades to the hard sign.
#[inline]
pub fn switching(s: f64, phi: f64, f: SwitchingFunction) -> f64 {
    if phi <= 0.0 {
        return sign(s);
    }
    match f {
        SwitchingFunction::Sign => sign(s),
        SwitchingFunction::Saturation => sat(s / phi),
        SwitchingFunction::Tanh => (s / phi).tanh(),
    }
}

/// Rate limit: move from `prev` toward `target` by at most `max_delta`.
#[inline]
pub fn slew(prev: f64, target: f64, max_delta: f64) -> f64 {
    prev + (target - prev).clamp(-max_delta, max_delta)
}

/// Wrap an angle into `(-π, π]`.
#[inline]
pub fn wrap_angle(a: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let w = (a + PI).rem_euclid(TAU) - PI;
    if w <= -PI { w + TAU } else { w }
}

/// Dead-zone / leak / clamp rule for a self-adjusting gain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptationLaw {
    /// Growth rate per unit `|s|` outside the dead zone.
    pub rate: f64,
    /// Leak rate toward `min` inside the dead zone.
    pub leak: f64,
    /// Surface magnitude below which the gain leaks instead of growing.
    pub dead_zone: f64,
    pub min: f64,
    pub max: f64,
}

/// One adaptation step: `K' = clamp(K + γ|s|dt)` outside the dead zone,
/// `K' = clamp(K − leak·(K − K_min)·dt)` inside it.
#[inline]
pub fn adapt_gain(gain: f64, s: f64, dt: f64, law: &AdaptationLaw) -> f64 {
    let next = if s.abs() > law.dead_zone {
        gain + law.rate * s.abs() * dt
    } else {
        gain - law.leak * (gain - law.min) * dt
    };
    next.clamp(law.min, law.max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAW: AdaptationLaw = AdaptationLaw {
        rate: 2.0,
        leak: 0.5,
        dead_zone: 0.01,
        min: 0.1,
        max: 10.0,
    };

    #[test]
    fn gain_grows_outside_dead_zone() {
        let k = adapt_gain(1.0, 0.5, 0.01, &LAW);
        assert!((k - (1.0 + 2.0 * 0.5 * 0.01)).abs() < 1e-12);
        // Growth is symmetric in the sign of s.
        assert_eq!(k, adapt_gain(1.0, -0.5, 0.01, &LAW));
    }

    #[test]
    fn gain_leaks_inside_dead_zone() {
        let k = adapt_gain(5.0, 0.005, 0.1, &LAW);
        assert!(k < 5.0 && k > LAW.min);
        // Repeated leaking approaches the floor but never crosses it.
        let mut g = 5.0;
        for _ in 0..10_000 {
            g = adapt_gain(g, 0.0, 0.1, &LAW);
        }
        assert!(g >= LAW.min);
        assert!(g - LAW.min < 1e-6);
    }

    #[test]
    fn gain_is_clamped() {
        assert_eq!(adapt_gain(9.99, 1e6, 1.0, &LAW), LAW.max);
        assert_eq!(adapt_gain(0.0, 0.0, 1.0, &LAW), LAW.min);
    }

    #[test]
    fn zero_boundary_layer_is_hard_sign() {
        for f in [
            SwitchingFunction::Sign,
            SwitchingFunction::Saturation,
            SwitchingFunction::Tanh,
        ] {
            assert_eq!(switching(1e-9, 0.0, f), 1.0);
            assert_eq!(switching(-3.0, 0.0, f), -1.0);
            assert_eq!(switching(0.0, 0.0, f), 0.0);
        }
        assert_eq!(switching(0.05, 0.1, SwitchingFunction::Saturation), 0.5);
    }

    #[test]
    fn wrap_angle_range() {
        use std::f64::consts::PI;
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(0.3 + 4.0 * PI) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn slew_limits_step() {
        assert_eq!(slew(0.0, 10.0, 2.0), 2.0);
        assert_eq!(slew(0.0, -10.0, 2.0), -2.0);
        assert_eq!(slew(1.0, 1.5, 2.0), 1.5);
    }
}
