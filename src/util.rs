/// Checks that a numerical value is in the provided interval and evaluates to
/// `Result<(), ConfigError>`
///
/// `open` excludes both bounds, `closed` includes them. NaN is always rejected.
///
/// ### Example
/// ```
/// # use torus_snake_rl::check_interval;
/// let gamma = 1.0;
/// assert!(check_interval!(gamma, open 0.0, 1.0).is_err());
/// assert!(check_interval!(gamma, closed 0.0, 1.0).is_ok());
/// ```
#[macro_export]
macro_rules! check_interval {
    (@check $name:expr, $var:expr, $ok:expr, $fmt:literal, $a:expr, $b:expr) => {
        if $ok {
            Ok(())
        } else {
            Err($crate::error::ConfigError::OutOfInterval {
                name: $crate::util::field_name($name),
                value: $var,
                bounds: format!($fmt, $a, $b),
            })
        }
    };
    ($var:expr, open $a:expr, $b:expr) => {
        $crate::check_interval!(@check stringify!($var), $var, $var > $a && $var < $b, "({}, {})", $a, $b)
    };
    ($var:expr, closed $a:expr, $b:expr) => {
        $crate::check_interval!(@check stringify!($var), $var, $var >= $a && $var <= $b, "[{}, {}]", $a, $b)
    };
}

/// Strips a receiver path like `config.gamma` down to `gamma`
pub fn field_name(expr: &'static str) -> &'static str {
    expr.rsplit('.').next().unwrap_or(expr).trim()
}

#[cfg(test)]
mod tests {
    use crate::error::ConfigError;

    #[test]
    fn open_interval_excludes_bounds() {
        let lr = 0.0;
        assert!(check_interval!(lr, open 0.0, 1.0).is_err());
        let lr = 1.0;
        assert!(check_interval!(lr, open 0.0, 1.0).is_err());
        let lr = 0.5;
        assert!(check_interval!(lr, open 0.0, 1.0).is_ok());
        let lr = f64::NAN;
        assert!(check_interval!(lr, open 0.0, 1.0).is_err(), "NaN is rejected");
    }

    #[test]
    fn closed_interval_includes_bounds() {
        let eps = 0.0;
        assert!(check_interval!(eps, closed 0.0, 1.0).is_ok());
        let eps = 1.0;
        assert!(check_interval!(eps, closed 0.0, 1.0).is_ok());
        let eps = 1.5;
        assert!(check_interval!(eps, closed 0.0, 1.0).is_err());
    }

    #[test]
    fn error_names_the_field() {
        struct Config {
            gamma: f64,
        }
        let config = Config { gamma: 2.0 };
        assert_eq!(
            check_interval!(config.gamma, open 0.0, 1.0),
            Err(ConfigError::OutOfInterval {
                name: "gamma",
                value: 2.0,
                bounds: String::from("(0, 1)"),
            }),
        );
    }
}
