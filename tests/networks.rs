use antline::prelude::*;
use approx::assert_relative_eq;
use num_complex::Complex;

const GHZ: f64 = 1.0e9;

#[test]
fn series_lc_at_one_gigahertz() {
    let zc = parse_impedance("10p", GHZ).unwrap();
    let zl = parse_impedance("20n", GHZ).unwrap();
    let total = parse_impedance("10p+20n", GHZ).unwrap();
    assert_relative_eq!(zc.im, -15.9155, epsilon = 1e-4);
    assert_relative_eq!(zl.im, 125.664, epsilon = 1e-3);
    assert_relative_eq!(total.re, 0.0, epsilon = 1e-12);
    assert_relative_eq!(total.im, 109.748, epsilon = 1e-3);
}

#[test]
fn magnitudes_scale_with_value_and_reactances_oppose() {
    for (small, large) in [("2p", "4p"), ("3n", "6n"), ("7o", "14o")] {
        let a = parse_impedance(small, GHZ).unwrap();
        let b = parse_impedance(large, GHZ).unwrap();
        let ratio = if small.ends_with('p') { a.norm() / b.norm() } else { b.norm() / a.norm() };
        assert_relative_eq!(ratio, 2.0, max_relative = 1e-12);
    }
    let cap = parse_impedance("1p", GHZ).unwrap();
    let ind = parse_impedance("1n", GHZ).unwrap();
    assert!(cap.im < 0.0 && ind.im > 0.0);
}

#[test]
fn series_is_commutative_and_associative() {
    let ab = parse_impedance("3p+5n", GHZ).unwrap();
    let ba = parse_impedance("5n+3p", GHZ).unwrap();
    assert_relative_eq!(ab.im, ba.im, max_relative = 1e-12);

    let left = parse_impedance("(1o+2n)+4p", GHZ).unwrap();
    let right = parse_impedance("1o+(2n+4p)", GHZ).unwrap();
    assert_relative_eq!(left.re, right.re, max_relative = 1e-12);
    assert_relative_eq!(left.im, right.im, max_relative = 1e-12);
}

#[test]
fn parallel_equal_resistors_halve() {
    let z = parse_impedance("100o/100o", GHZ).unwrap();
    assert_relative_eq!(z.re, 50.0, max_relative = 1e-12);
    assert_relative_eq!(z.im, 0.0, epsilon = 1e-12);

    let za = parse_impedance("10o", GHZ).unwrap();
    let zb = parse_impedance("2n", GHZ).unwrap();
    let zab = parse_impedance("10o/2n", GHZ).unwrap();
    let expected = za * zb / (za + zb);
    assert_relative_eq!(zab.re, expected.re, max_relative = 1e-12);
    assert_relative_eq!(zab.im, expected.im, max_relative = 1e-12);
}

#[test]
fn series_resistor_network() {
    for hz in [1.0e6, 1.0e9, 5.0e9] {
        let m = element_abcd("S(50o)", hz).unwrap();
        assert_eq!(m, TwoPort::series_impedance(Complex::new(50.0, 0.0)));
    }
}

#[test]
fn empty_network_is_identity() {
    let m = element_abcd("", GHZ).unwrap();
    assert_eq!(m, TwoPort::identity());
    assert_eq!(m.cascade(&TwoPort::identity()), TwoPort::identity());
}

#[test]
fn malformed_expressions_are_rejected() {
    for text in ["10x", "10p+", "(10p", "10p)", ""] {
        assert!(parse_impedance(text, GHZ).is_err(), "{text:?} should fail");
    }
    assert!(element_abcd("Q(10p)", GHZ).is_err());
}

#[test]
fn feed_is_shunt_of_terminated_input_impedance() {
    let load = Complex::new(50.0, 0.0);
    let m = feed_abcd("S(25o)", GHZ, load).unwrap();
    assert_relative_eq!(m.c.re, 1.0 / 75.0, max_relative = 1e-12);
    assert_eq!(m.b, Complex::new(0.0, 0.0));
}
