//! Operator overloads, so that curve formulas read like the math.

use super::Expr;
use std::ops::{Add, Div, Mul, Neg, Sub};

fn sum(lhs: Expr, rhs: Expr) -> Expr {
    Expr::add([lhs, rhs])
}

fn difference(lhs: Expr, rhs: Expr) -> Expr {
    Expr::add([lhs, -rhs])
}

fn product(lhs: Expr, rhs: Expr) -> Expr {
    Expr::mul([lhs, rhs])
}

fn quotient(lhs: Expr, rhs: Expr) -> Expr {
    Expr::mul([lhs, rhs.recip()])
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $build:ident) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                $build(self, rhs)
            }
        }

        impl $trait<&Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                $build(self.clone(), rhs.clone())
            }
        }

        impl $trait<&Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                $build(self, rhs.clone())
            }
        }

        impl $trait<Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                $build(self.clone(), rhs)
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;

            fn $method(self, rhs: f64) -> Expr {
                $build(self, Expr::num(rhs))
            }
        }

        impl $trait<f64> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: f64) -> Expr {
                $build(self.clone(), Expr::num(rhs))
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                $build(Expr::num(self), rhs)
            }
        }

        impl $trait<&Expr> for f64 {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                $build(Expr::num(self), rhs.clone())
            }
        }
    };
}

binary_op!(Add, add, sum);
binary_op!(Sub, sub, difference);
binary_op!(Mul, mul, product);
binary_op!(Div, div, quotient);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::mul([Expr::num(-1.0), self])
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        -self.clone()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Expr, Symbol};

    #[test]
    fn test_operators_match_constructors() {
        let x = Expr::sym(Symbol::new("x").unwrap());
        let y = Expr::sym(Symbol::new("y").unwrap());

        assert_eq!(&x + &y, Expr::add([x.clone(), y.clone()]));
        assert_eq!(&x * &y, Expr::mul([x.clone(), y.clone()]));
        assert_eq!(&x - &x, Expr::ZERO);
        assert_eq!(&x / &x, Expr::ONE);
        assert_eq!(2.0 * x.clone() - x.clone(), x);
        assert_eq!(-(-x.clone()), x);
    }
}
