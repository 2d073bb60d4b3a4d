//! Named constants and functions callable from expressions.

use std::f64::consts;

use rand::Rng;

/// How trigonometric functions treat angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleMode {
    /// No trigonometric functions.
    None,
    #[default]
    Radian,
    Degree,
}

/// A call that matches no constant and no function of that arity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no constant or function `{name}` taking {arity} argument(s)")]
pub struct Unresolved {
    pub name: String,
    pub arity: usize,
}

struct Constant {
    name: &'static str,
    value: f64,
}

struct Function {
    name: &'static str,
    arity: usize,
    /// Accepts `arity` or more arguments.
    variadic: bool,
    apply: fn(&[f64]) -> f64,
}

impl Function {
    const fn new(name: &'static str, arity: usize, apply: fn(&[f64]) -> f64) -> Self {
        Self {
            name,
            arity,
            variadic: false,
            apply,
        }
    }

    const fn variadic(name: &'static str, min_arity: usize, apply: fn(&[f64]) -> f64) -> Self {
        Self {
            name,
            arity: min_arity,
            variadic: true,
            apply,
        }
    }

    fn accepts(&self, name: &str, arity: usize) -> bool {
        self.name.eq_ignore_ascii_case(name)
            && if self.variadic {
                arity >= self.arity
            } else {
                arity == self.arity
            }
    }
}

const CONSTANTS: &[Constant] = &[
    Constant {
        name: "e",
        value: consts::E,
    },
    Constant {
        name: "pi",
        value: consts::PI,
    },
];

fn lerp(a: &[f64]) -> f64 {
    a[0] * (1.0 - a[2]) + a[1] * a[2]
}

/// Uniform in `[0, 1)`.
fn unit_random() -> f64 {
    rand::thread_rng().gen()
}

const COMMON: &[Function] = &[
    Function::new("log", 1, |a| a[0].ln()),
    Function::new("log10", 1, |a| a[0].log10()),
    Function::new("abs", 1, |a| a[0].abs()),
    Function::new("sqrt", 1, |a| a[0].sqrt()),
    Function::variadic("max", 2, |a| a.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
    Function::variadic("min", 2, |a| a.iter().copied().fold(f64::INFINITY, f64::min)),
    Function::new("lerp", 3, lerp),
    Function::new("leap", 3, lerp),
    Function::new("rand", 0, |_| unit_random()),
    Function::new("rand", 1, |a| unit_random() * a[0]),
    Function::new("rand", 2, |a| a[0] + unit_random() * (a[1] - a[0])),
];

const RADIAN: &[Function] = &[
    Function::new("sin", 1, |a| a[0].sin()),
    Function::new("cos", 1, |a| a[0].cos()),
    Function::new("tan", 1, |a| a[0].tan()),
    Function::new("asin", 1, |a| a[0].asin()),
    Function::new("acos", 1, |a| a[0].acos()),
    Function::new("atan", 1, |a| a[0].atan()),
    Function::new("atan2", 2, |a| a[0].atan2(a[1])),
];

const DEGREE: &[Function] = &[
    Function::new("sin", 1, |a| a[0].to_radians().sin()),
    Function::new("cos", 1, |a| a[0].to_radians().cos()),
    Function::new("tan", 1, |a| a[0].to_radians().tan()),
    Function::new("asin", 1, |a| a[0].asin().to_degrees()),
    Function::new("acos", 1, |a| a[0].acos().to_degrees()),
    Function::new("atan", 1, |a| a[0].atan().to_degrees()),
    Function::new("atan2", 2, |a| a[0].atan2(a[1]).to_degrees()),
];

/// Resolves identifiers in expressions. Names match case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionTable {
    angle_mode: AngleMode,
}

impl FunctionTable {
    pub fn new(angle_mode: AngleMode) -> Self {
        Self { angle_mode }
    }

    pub fn angle_mode(&self) -> AngleMode {
        self.angle_mode
    }

    fn angle_functions(&self) -> &'static [Function] {
        match self.angle_mode {
            AngleMode::None => &[],
            AngleMode::Radian => RADIAN,
            AngleMode::Degree => DEGREE,
        }
    }

    /// Evaluate `name(args)`. Without arguments a constant of that name is
    /// preferred over a function.
    pub fn resolve(&self, name: &str, args: &[f64]) -> Result<f64, Unresolved> {
        if args.is_empty() {
            if let Some(c) = CONSTANTS.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
                return Ok(c.value);
            }
        }
        COMMON
            .iter()
            .chain(self.angle_functions())
            .find(|f| f.accepts(name, args.len()))
            .map(|f| (f.apply)(args))
            .ok_or_else(|| Unresolved {
                name: name.to_string(),
                arity: args.len(),
            })
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::new(AngleMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn test_constants_ignore_case() {
        let table = FunctionTable::default();
        assert_eq!(table.resolve("PI", &[]), Ok(consts::PI));
        assert_eq!(table.resolve("E", &[]), Ok(consts::E));
    }

    #[test]
    fn test_logarithms() {
        let table = FunctionTable::default();
        assert!(close(table.resolve("log10", &[1000.0]).unwrap(), 3.0));
        assert!(close(table.resolve("log", &[consts::E]).unwrap(), 1.0));
    }

    #[test]
    fn test_variadic_arity() {
        let table = FunctionTable::default();
        assert_eq!(table.resolve("max", &[1.0, 7.0, 3.0]), Ok(7.0));
        assert_eq!(table.resolve("min", &[4.0, 2.0]), Ok(2.0));
        assert_eq!(
            table.resolve("max", &[1.0]),
            Err(Unresolved {
                name: "max".to_string(),
                arity: 1
            })
        );
    }

    #[test]
    fn test_lerp() {
        let table = FunctionTable::default();
        assert_eq!(table.resolve("leap", &[0.0, 10.0, 0.25]), Ok(2.5));
        assert_eq!(table.resolve("lerp", &[2.0, 4.0, 0.5]), Ok(3.0));
    }

    #[test]
    fn test_random_ranges() {
        let table = FunctionTable::default();
        for _ in 0..200 {
            let unit = table.resolve("rand", &[]).unwrap();
            assert!((0.0..1.0).contains(&unit), "rand() gave {unit}");
            let below = table.resolve("RAND", &[5.0]).unwrap();
            assert!((0.0..5.0).contains(&below), "rand(5) gave {below}");
            let between = table.resolve("rand", &[-3.0, 2.0]).unwrap();
            assert!((-3.0..2.0).contains(&between), "rand(-3, 2) gave {between}");
        }
        assert_eq!(
            table.resolve("rand", &[1.0, 2.0, 3.0]),
            Err(Unresolved {
                name: "rand".to_string(),
                arity: 3
            })
        );
    }

    #[test]
    fn test_angle_modes() {
        let radian = FunctionTable::new(AngleMode::Radian);
        let degree = FunctionTable::new(AngleMode::Degree);
        assert!(close(radian.resolve("sin", &[consts::FRAC_PI_2]).unwrap(), 1.0));
        assert!(close(degree.resolve("sin", &[90.0]).unwrap(), 1.0));
        assert!(close(degree.resolve("atan2", &[1.0, 1.0]).unwrap(), 45.0));
        assert!(close(radian.resolve("atan2", &[0.0, -1.0]).unwrap(), consts::PI));
        assert!(FunctionTable::new(AngleMode::None).resolve("sin", &[0.0]).is_err());
    }

    #[test]
    fn test_unresolved_message() {
        let err = FunctionTable::default().resolve("foo", &[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no constant or function `foo` taking 2 argument(s)"
        );
    }
}
