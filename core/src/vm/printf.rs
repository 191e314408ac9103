//! The subset of C `printf` the machine implements: `%d %g %c %s %%`.

use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Specifier {
    Integer,
    Floating,
    Character,
    String,
}

/// An argument fetched for one specifier.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Argument {
    Integer(i32),
    Floating(f64),
    /// Bytes of a zero-terminated string, without the terminator.
    String(Vec<u8>),
}

/// The conversion specifiers of `format`, in order.
///
/// Anything after `%` other than the four conversions (including `%%`) is
/// copied through literally and takes no argument.
pub(crate) fn specifiers(format: &[u8]) -> SmallVec<[Specifier; 4]> {
    let mut specifiers = SmallVec::new();
    let mut bytes = format.iter();
    while let Some(&byte) = bytes.next() {
        if byte != b'%' {
            continue;
        }
        match bytes.next() {
            Some(b'd') => specifiers.push(Specifier::Integer),
            Some(b'g') => specifiers.push(Specifier::Floating),
            Some(b'c') => specifiers.push(Specifier::Character),
            Some(b's') => specifiers.push(Specifier::String),
            _ => {}
        }
    }
    specifiers
}

/// Expands `format` with `arguments`, one per specifier, in order.
pub(crate) fn render(format: &[u8], arguments: &[Argument]) -> Vec<u8> {
    let mut out = Vec::with_capacity(format.len());
    let mut arguments = arguments.iter();
    let mut bytes = format.iter();
    while let Some(&byte) = bytes.next() {
        if byte != b'%' {
            out.push(byte);
            continue;
        }
        match bytes.next() {
            Some(&conversion @ (b'd' | b'g' | b'c' | b's')) => {
                match (conversion, arguments.next()) {
                    (b'c', Some(Argument::Integer(value))) => out.push(*value as u8),
                    (_, Some(Argument::Integer(value))) => {
                        out.extend_from_slice(value.to_string().as_bytes())
                    }
                    (_, Some(Argument::Floating(value))) => {
                        out.extend_from_slice(format_g(*value).as_bytes())
                    }
                    (_, Some(Argument::String(text))) => out.extend_from_slice(text),
                    (_, None) => {}
                }
            }
            Some(b'%') => out.push(b'%'),
            Some(&other) => out.extend_from_slice(&[b'%', other]),
            None => out.push(b'%'),
        }
    }
    out
}

/// C's `%g` with the default precision of 6 significant digits: fixed
/// notation for exponents in `-4..6`, scientific otherwise, trailing zeros
/// removed.
pub fn format_g(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value.is_nan() {
        return if value.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; rounding can bump the exponent.
    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .expect("`{:e}` output always has an exponent");
    let exponent: i32 = exponent.parse().expect("`{:e}` exponent is an integer");

    if (-4..PRECISION).contains(&exponent) {
        let decimals = (PRECISION - 1 - exponent) as usize;
        strip_zeros(&format!("{:.*}", decimals, value)).to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_zeros(mantissa), sign, exponent.abs())
    }
}

fn strip_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_format_g() {
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(1.0), "1");
        assert_eq!(format_g(2.5), "2.5");
        assert_eq!(format_g(-0.125), "-0.125");
        assert_eq!(format_g(1.0 / 3.0), "0.333333");
        assert_eq!(format_g(123456.0), "123456");
        assert_eq!(format_g(1234567.0), "1.23457e+06");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(9.9999996), "10");
        assert_eq!(format_g(1e100), "1e+100");
        assert_eq!(format_g(f64::INFINITY), "inf");
        assert_eq!(format_g(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_g(f64::NAN), "nan");
    }

    #[test]
    fn test_specifiers_skip_percent_literals() {
        assert_eq!(
            specifiers(b"%d%% of %s: %c %g").as_slice(),
            &[
                Specifier::Integer,
                Specifier::String,
                Specifier::Character,
                Specifier::Floating,
            ]
        );
        assert!(specifiers(b"no conversions\n").is_empty());
    }

    #[test]
    fn test_render() {
        let out = render(
            b"%d%% %s%c %g\n",
            &[
                Argument::Integer(-42),
                Argument::String(b"ab".to_vec()),
                Argument::Integer(i32::from(b'!')),
                Argument::Floating(0.5),
            ],
        );
        assert_eq!(String::from_utf8(out).unwrap(), "-42% ab! 0.5\n");
    }
}
