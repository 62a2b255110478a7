use antline::prelude::*;
use num_complex::Complex;

fn main() -> Result<(), AntlineError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // 10 cm centre-fed wire on a 200 Ω line, 201 grid points.
    let line = LineSettings::default();
    let grid = GridSettings {
        antenna_length_m: 0.1,
        grid_count: 201,
    };
    let model = AntennaModel::from_settings(&line, &grid)
        .with_element(AntennaElement::feed(100, "S(50o)"))
        .with_element(AntennaElement::element(60, "P(1p+5n)")) // trap
        .with_load_impedance(Complex::new(50.0, 0.0))
        .with_port_response(true);

    let freqs = FrequencySettings {
        start_hz: 1.0e9,
        stop_hz: 4.0e9,
        count: 31,
    }
    .frequencies();

    let worker = SweepWorker::spawn(LineCalculator::new(model), freqs)?;
    let mut sweep = None;
    while let Some(event) = worker.recv() {
        match event {
            CalculationEvent::Progress(p) if p % 20 == 0 => eprintln!("progress {p}%"),
            CalculationEvent::Finished(result) => sweep = Some(result?),
            _ => {}
        }
    }
    let calc = worker.join()?;
    let Some(sweep) = sweep else {
        return Err(AntlineError::Worker("sweep finished without a result".to_owned()));
    };

    println!("f(GHz), Zin_real(ohm), Zin_imag(ohm), |Gamma|(dB)");
    let gamma_db = mag_db(sweep.reflection_coefficient.iter().copied());
    for ((hz, zin), db) in sweep.frequencies.iter().zip(&sweep.input_impedance).zip(gamma_db) {
        println!("{:.3}, {:.4e}, {:.4e}, {:.2}", hz / 1e9, zin.re, zin.im, db);
    }

    let centre = sweep.frequencies.len() / 2;
    let current = mag(sweep.distributions[centre].current_column(0).unwrap_or_default());
    println!("\n|I| along the wire at {:.3} GHz", sweep.frequencies[centre] / 1e9);
    for (x, i) in calc.model().grid.iter().zip(current).step_by(20) {
        println!("{:.4}, {:.4e}", x, i);
    }
    Ok(())
}
