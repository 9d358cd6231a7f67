use std::path::Path;

use anyhow::{Context, Result};

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// CDC-style natality export, with the odd suppressed count left in.
fn write_natality(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let states = [
        ("Alabama", 4800.0),
        ("California", 34000.0),
        ("Florida", 18500.0),
        ("New York", 17500.0),
        ("Texas", 31000.0),
        ("Wyoming", 480.0),
    ];

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "State of Residence",
        "Month",
        "Month Code",
        "Year Code",
        "Sex of Infant",
        "Births",
    ])?;

    let mut rows = 0;
    for (state, monthly) in states {
        for (m, month) in MONTHS.iter().enumerate() {
            for (sex, share) in [("Female", 0.488), ("Male", 0.512)] {
                let noise = 0.9 + rng.next_f64() * 0.2;
                let births = if rng.below(50) == 0 {
                    "Suppressed".to_string()
                } else {
                    format!("{}", (monthly * share * noise).round() as i64)
                };
                writer.write_record([
                    state.to_string(),
                    month.to_string(),
                    (m + 1).to_string(),
                    "2025".to_string(),
                    sex.to_string(),
                    births,
                ])?;
                rows += 1;
            }
        }
    }
    writer.flush()?;
    Ok(rows)
}

/// Retail transactions with the columns the retail dashboard requires.
fn write_retail(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let categories = ["Books", "Clothing", "Electronics", "Groceries", "Home"];
    let regions = ["East", "North", "South", "West"];
    let age_groups = ["18-24", "25-34", "35-44", "45-54", "55+"];
    let genders = ["Female", "Male"];
    let channels = ["In-Store", "Online"];
    let labels = ["Loyal", "New", "Returning"];

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Label",
        "CustomerID",
        "TransactionID",
        "TransactionDate",
        "ProductCategory",
        "PurchaseAmount",
        "CustomerAgeGroup",
        "CustomerGender",
        "CustomerRegion",
        "CustomerSatisfaction",
        "RetailChannel",
    ])?;

    let n_rows = 500;
    for i in 0..n_rows {
        let customer = 1000 + rng.below(150);
        let amount = 5.0 + rng.next_f64() * 495.0;
        let satisfaction = 1 + rng.below(5);
        writer.write_record([
            rng.pick(&labels).to_string(),
            customer.to_string(),
            format!("T{:05}", i + 1),
            format!("2025-{:02}-{:02}", 1 + rng.below(12), 1 + rng.below(28)),
            rng.pick(&categories).to_string(),
            format!("{amount:.2}"),
            rng.pick(&age_groups).to_string(),
            rng.pick(&genders).to_string(),
            rng.pick(&regions).to_string(),
            satisfaction.to_string(),
            rng.pick(&channels).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(n_rows)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let natality = Path::new("Provisional_Natality_2025_CDC.csv");
    let rows = write_natality(natality, &mut rng)?;
    println!("Wrote {rows} natality rows to {}", natality.display());

    let retail = Path::new("Retail_Customer_Transactions.csv");
    let rows = write_retail(retail, &mut rng)?;
    println!(
        "Wrote {rows} retail rows to {} (run with RUSTY_DASH_RETAIL_DATA={} to use it)",
        retail.display(),
        retail.display()
    );
    Ok(())
}
