// sf-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, Angle as UomAngle, Area as UomArea, Energy as UomEnergy,
    Force as UomForce, Length as UomLength, Mass as UomMass, MassRate as UomMassRate,
    Power as UomPower, Ratio as UomRatio, Time as UomTime, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Accel = UomAcceleration;
pub type Angle = UomAngle;
pub type Area = UomArea;
pub type Energy = UomEnergy;
pub type Force = UomForce;
pub type Length = UomLength;
pub type Mass = UomMass;
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Ratio = UomRatio;
pub type Time = UomTime;
pub type Velocity = UomVelocity;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn m2(v: f64) -> Area {
    use uom::si::area::square_meter;
    Area::new::<square_meter>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn mps2(v: f64) -> Accel {
    use uom::si::acceleration::meter_per_second_squared;
    Accel::new::<meter_per_second_squared>(v)
}

#[inline]
pub fn newtons(v: f64) -> Force {
    use uom::si::force::newton;
    Force::new::<newton>(v)
}

#[inline]
pub fn joules(v: f64) -> Energy {
    use uom::si::energy::joule;
    Energy::new::<joule>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn unitless(v: f64) -> Ratio {
    use uom::si::ratio::ratio;
    Ratio::new::<ratio>(v)
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;

    #[inline]
    pub fn g0() -> Accel {
        mps2(G0_MPS2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_store_si_values() {
        assert_eq!(s(2.5).value, 2.5);
        assert_eq!(m(1000.0).value, 1000.0);
        assert_eq!(kg(12.0).value, 12.0);
        assert_eq!(mps(50.0).value, 50.0);
        assert_eq!(joules(3.6e6).value, 3.6e6);
        assert!((deg(180.0).value - core::f64::consts::PI).abs() < 1e-12);
        assert_eq!(constants::g0().value, constants::G0_MPS2);
    }

    #[test]
    fn constructors_smoke() {
        let _a = m2(16.0);
        let _mdot = kgps(0.01);
        let _f = newtons(100.0);
        let _p = watts(5.0e3);
        let _r = unitless(0.5);
        let _t = rad(0.1);
    }
}
