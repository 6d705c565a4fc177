use std::fmt;

/**
    A rational number, used for time bases, frame rates and aspect ratios.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Returns the value as a float, or 0.0 when the denominator is zero.
    */
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }

    /**
        Integer division of numerator by denominator.

        Returns `None` for a zero denominator or a non-positive result, which
        is how unknown frame rates are reported.
    */
    pub fn whole(self) -> Option<u32> {
        if self.den == 0 {
            return None;
        }
        let value = self.num / self.den;
        (value > 0).then_some(value as u32)
    }

    pub fn is_zero(self) -> bool {
        self.num == 0
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
