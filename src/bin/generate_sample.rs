use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};

/// Logistic growth curve.
fn logistic(t: f64, k: f64, x0: f64, r: f64) -> f64 {
    k / (1.0 + ((k - x0) / x0) * (-r * t).exp())
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Two header rows: (upper, lower). The pH group's upper cell is written as
/// a merged range below.
const HEADER: &[(&str, &str)] = &[
    ("Sample No", ""),
    ("Day", ""),
    ("VCD", "[106 cells/mL]"),
    ("Via.", "[%]"),
    ("Gluc.", "[g/L]"),
    ("Lact.", "[g/L]"),
    ("", "(int.) [-]"),
    ("", "(ext.) [-]"),
    ("Titer", "[mg/L]"),
];

fn main() -> Result<(), XlsxError> {
    let mut rng = SimpleRng::new(42);

    let samples = ["Run12-1", "Run12-2", "Run12-3", "Run12-4"];
    let days = 0..=14;

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let merged = Format::new().set_bold().set_align(FormatAlign::Center);

    let sheet = workbook.add_worksheet();
    sheet.set_name("Br RAW Data")?;
    sheet.write_string_with_format(0, 0, "Bioreactor raw data", &bold)?;
    sheet.write_string(1, 0, "Generated sample – synthetic values")?;

    for (col, (upper, lower)) in HEADER.iter().enumerate() {
        let col = col as u16;
        if !upper.is_empty() {
            sheet.write_string_with_format(3, col, *upper, &bold)?;
        }
        if !lower.is_empty() {
            sheet.write_string_with_format(4, col, *lower, &bold)?;
        }
    }
    // "pH" spans the internal and external probe columns.
    sheet.merge_range(3, 6, 3, 7, "pH", &merged)?;

    let mut row: u32 = 5;
    for (i, sample) in samples.iter().enumerate() {
        let growth = 0.55 + 0.05 * i as f64;
        let capacity = 18.0 + 2.0 * i as f64;

        for day in days.clone() {
            let t = day as f64;
            let vcd = logistic(t, capacity, 0.4, growth) * (1.0 + rng.gauss(0.0, 0.03));
            let viability = (99.0 - 0.004 * t.powi(3) + rng.gauss(0.0, 0.4)).min(100.0);
            let glucose = (6.0 - 0.3 * t + rng.gauss(0.0, 0.1)).max(0.5);
            let lactate = (0.4 + 0.25 * t - 0.012 * t * t + rng.gauss(0.0, 0.05)).max(0.0);
            let ph_int = 7.05 - 0.01 * t + rng.gauss(0.0, 0.02);
            let ph_ext = ph_int + rng.gauss(0.0, 0.03);
            let titer = 9.0 * t * t * (1.0 + 0.1 * i as f64);

            sheet.write_string(row, 0, *sample)?;
            sheet.write_number(row, 1, t)?;
            sheet.write_number(row, 2, (vcd * 100.0).round() / 100.0)?;
            sheet.write_number(row, 3, (viability * 10.0).round() / 10.0)?;
            sheet.write_number(row, 4, (glucose * 100.0).round() / 100.0)?;
            sheet.write_number(row, 5, (lactate * 100.0).round() / 100.0)?;
            sheet.write_number(row, 6, (ph_int * 100.0).round() / 100.0)?;
            sheet.write_number(row, 7, (ph_ext * 100.0).round() / 100.0)?;
            // titer is only sampled every other day
            if day % 2 == 0 {
                sheet.write_number(row, 8, titer.round())?;
            }
            row += 1;
        }
    }

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    summary.write_string(0, 0, "See 'Br RAW Data'")?;

    let output_path = "sample_bioreactor.xlsx";
    workbook.save(output_path)?;

    println!(
        "Wrote {} readings ({} samples × {} days) to {output_path}",
        row - 5,
        samples.len(),
        days.count()
    );
    Ok(())
}
