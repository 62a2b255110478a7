//! Plain CSV export of calculation results.

use std::io::{self, Write};

use crate::antenna::solver::Distribution;
use crate::math::Scalar;
use crate::simulation::SweepResult;
use crate::sweep::mag_db;

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

/// Writes `|V|`, `∠V`, `|I|`, `∠I` of every feed column along the grid.
///
/// `positions` holds the grid coordinates (m) and must match the grid length.
/// Phases are in degrees.
pub fn write_distribution_csv<W: Write>(
    mut w: W,
    distribution: &Distribution,
    positions: &[Scalar],
) -> io::Result<()> {
    if positions.len() != distribution.grid_len() {
        return Err(invalid(format!(
            "{} positions for {} grid points",
            positions.len(),
            distribution.grid_len()
        )));
    }
    write!(w, "position_m")?;
    for feed in 0..distribution.feed_count() {
        write!(w, ",v{feed}_mag,v{feed}_deg,i{feed}_mag,i{feed}_deg")?;
    }
    writeln!(w)?;
    for (g, x) in positions.iter().enumerate() {
        write!(w, "{x:.16e}")?;
        for feed in 0..distribution.feed_count() {
            let v = distribution.voltage[(g, feed)];
            let i = distribution.current[(g, feed)];
            write!(
                w,
                ",{:.16e},{:.16e},{:.16e},{:.16e}",
                v.norm(),
                v.arg().to_degrees(),
                i.norm(),
                i.arg().to_degrees()
            )?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Writes input impedance and reflection coefficient per frequency.
///
/// Fails when the sweep ran without port response enabled.
pub fn write_port_response_csv<W: Write>(mut w: W, result: &SweepResult) -> io::Result<()> {
    if result.input_impedance.len() != result.frequencies.len() {
        return Err(invalid("sweep has no port response".to_owned()));
    }
    let gamma_db = mag_db(result.reflection_coefficient.iter().copied());
    writeln!(w, "frequency_hz,zin_re,zin_im,gamma_re,gamma_im,gamma_db")?;
    for (idx, hz) in result.frequencies.iter().enumerate() {
        let zin = result.input_impedance[idx];
        let gamma = result.reflection_coefficient[idx];
        writeln!(
            w,
            "{:.16e},{:.16e},{:.16e},{:.16e},{:.16e},{:.16e}",
            hz, zin.re, zin.im, gamma.re, gamma.im, gamma_db[idx]
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use num_complex::Complex;

    use super::*;

    #[test]
    fn distribution_rows_follow_grid() {
        let mut dist = Distribution::zeros(1.0e9, 3, 2);
        dist.voltage[(1, 0)] = Complex::new(0.0, 2.0);
        dist.current[(2, 1)] = Complex::new(0.5, 0.0);
        let mut out = Vec::new();
        write_distribution_csv(&mut out, &dist, &[0.0, 0.5, 1.0]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "position_m,v0_mag,v0_deg,i0_mag,i0_deg,v1_mag,v1_deg,i1_mag,i1_deg"
        );
        let row: Vec<f64> = lines[1 + 1].split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(row.len(), 9);
        assert_relative_eq!(row[0], 0.5);
        assert_relative_eq!(row[1], 2.0);
        assert_relative_eq!(row[2], 90.0, epsilon = 1e-12);
        let last: Vec<f64> = lines[3].split(',').map(|f| f.parse().unwrap()).collect();
        assert_relative_eq!(last[7], 0.5);
    }

    #[test]
    fn distribution_rejects_mismatched_positions() {
        let dist = Distribution::zeros(1.0e9, 3, 1);
        assert!(write_distribution_csv(Vec::new(), &dist, &[0.0, 1.0]).is_err());
    }

    #[test]
    fn port_response_requires_data() {
        let mut result = SweepResult {
            frequencies: vec![1.0e9],
            ..SweepResult::default()
        };
        assert!(write_port_response_csv(Vec::new(), &result).is_err());

        result.input_impedance.push(Complex::new(50.0, 0.0));
        result.reflection_coefficient.push(Complex::new(0.1, 0.0));
        let mut out = Vec::new();
        write_port_response_csv(&mut out, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        let db: f64 = text.lines().nth(1).unwrap().rsplit(',').next().unwrap().parse().unwrap();
        assert_relative_eq!(db, -20.0, epsilon = 1e-9);
    }
}
