use core::{fmt, ops};

#[macro_export]
macro_rules! complex {
    ($real:expr, $imaginary:expr) => {
        $crate::Complex::new($real, $imaginary)
    };
}

macro_rules! impl_ops {
    ($trait:ident, $method:ident, $op:tt) => {
        impl ops::$trait for Complex {
            type Output = Complex;

            fn $method(self, other: Complex) -> Complex {
                Complex {
                    real: self.real $op other.real,
                    imaginary: self.imaginary $op other.imaginary,
                }
            }
        }
    };

    ($trait:ident, $method:ident, $op:tt, real) => {
        impl ops::$trait<f64> for Complex {
            type Output = Complex;

            fn $method(self, other: f64) -> Complex {
                Complex {
                    real: self.real $op other,
                    imaginary: self.imaginary,
                }
            }
        }
    };

    ($trait_assign:ident, $method_assign:ident, $op:tt, assign) => {
        impl ops::$trait_assign for Complex {
            fn $method_assign(&mut self, other: Complex) {
                self.real = self.real $op other.real;
                self.imaginary = self.imaginary $op other.imaginary;
            }
        }
    };
}

/// Double-precision complex amplitude shared by every kernel.
#[derive(Copy, Clone, PartialOrd, PartialEq)]
pub struct Complex {
    pub real: f64,
    pub imaginary: f64,
}

impl fmt::Debug for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Complex {{ real: {:?}, imaginary: {:?} }}",
            self.real, self.imaginary
        )
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.imaginary >= 0.0 {
            write!(f, "{} + {}i", self.real, self.imaginary)
        } else {
            write!(f, "{} - {}i", self.real, -self.imaginary)
        }
    }
}

impl ops::Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        Complex {
            real: -self.real,
            imaginary: -self.imaginary,
        }
    }
}

impl From<f64> for Complex {
    fn from(real: f64) -> Complex {
        Complex {
            real,
            imaginary: 0.0,
        }
    }
}

impl Default for Complex {
    fn default() -> Complex {
        Complex {
            real: 0.0,
            imaginary: 0.0,
        }
    }
}

impl Complex {
    pub const ZERO: Complex = Complex {
        real: 0.0,
        imaginary: 0.0,
    };
    pub const ONE: Complex = Complex {
        real: 1.0,
        imaginary: 0.0,
    };
    pub const I: Complex = Complex {
        real: 0.0,
        imaginary: 1.0,
    };

    pub fn new(real: f64, imaginary: f64) -> Complex {
        Complex { real, imaginary }
    }

    pub fn from_polar(r: f64, theta: f64) -> Complex {
        Complex {
            real: r * theta.cos(),
            imaginary: r * theta.sin(),
        }
    }

    pub fn get_conjugate(&self) -> Complex {
        Complex {
            real: self.real,
            imaginary: -self.imaginary,
        }
    }

    pub fn conjugate(&mut self) {
        self.imaginary = -self.imaginary;
    }

    pub fn phase(&self) -> f64 {
        self.imaginary.atan2(self.real)
    }

    pub fn norm2(&self) -> f64 {
        self.real * self.real + self.imaginary * self.imaginary
    }

    pub fn abs(&self) -> f64 {
        self.norm2().sqrt()
    }

    pub fn is_negligible(&self, tolerance: f64) -> bool {
        self.real.abs() < tolerance && self.imaginary.abs() < tolerance
    }
}

impl_ops!(Add, add, +);
impl_ops!(Sub, sub, -);

impl ops::Mul for Complex {
    type Output = Complex;

    fn mul(self, other: Complex) -> Complex {
        // (a + bi) * (c + di) = (ac - bd) + (ad + bc)i
        Complex {
            real: self.real * other.real - self.imaginary * other.imaginary,
            imaginary: self.real * other.imaginary + self.imaginary * other.real,
        }
    }
}

impl ops::Div for Complex {
    type Output = Complex;

    fn div(self, other: Complex) -> Complex {
        // (a + bi) / (c + di) = ((ac + bd) + (bc - ad)i) / (c² + d²)
        let denom = other.real * other.real + other.imaginary * other.imaginary;
        Complex {
            real: (self.real * other.real + self.imaginary * other.imaginary) / denom,
            imaginary: (self.imaginary * other.real - self.real * other.imaginary) / denom,
        }
    }
}

impl_ops!(AddAssign, add_assign, +, assign);
impl_ops!(SubAssign, sub_assign, -, assign);

impl ops::MulAssign for Complex {
    fn mul_assign(&mut self, other: Complex) {
        let new_real = self.real * other.real - self.imaginary * other.imaginary;
        let new_imag = self.real * other.imaginary + self.imaginary * other.real;
        self.real = new_real;
        self.imaginary = new_imag;
    }
}

impl_ops!(Add, add, +, real);
impl_ops!(Sub, sub, -, real);
impl_ops!(Mul, mul, *, real);
impl_ops!(Div, div, /, real);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplication_matches_standard_complex_arithmetic() {
        let a = complex!(1.0, 2.0);
        let b = complex!(3.0, -1.0);
        let product = a * b;
        assert_eq!(product.real, 5.0);
        assert_eq!(product.imaginary, 5.0);
    }

    #[test]
    fn conjugate_negates_imaginary_part_only() {
        let z = complex!(0.5, -0.75);
        let conj = z.get_conjugate();
        assert_eq!(conj.real, 0.5);
        assert_eq!(conj.imaginary, 0.75);
    }

    #[test]
    fn abs_of_unit_vector_is_one() {
        let z = Complex::from_polar(1.0, 1.2345);
        assert!((z.abs() - 1.0).abs() < 1e-12);
    }
}
