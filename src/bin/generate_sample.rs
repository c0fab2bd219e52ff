//! Writes a small demo sales dataset as `sample_sales.csv` and
//! `sample_sales.parquet` in the working directory.
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
const PRODUCTS: [(&str, f64); 5] = [
    ("Widget", 4.5),
    ("Gadget", 12.0),
    ("Doohickey", 7.25),
    ("Gizmo", 19.99),
    ("Thingamajig", 2.75),
];
const CHANNELS: [&str; 3] = ["Online", "Retail", "Wholesale"];
const ROWS: usize = 400;

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Sale {
    order_id: i64,
    region: &'static str,
    product: &'static str,
    channel: &'static str,
    units: i64,
    /// Missing for roughly one order in thirty.
    unit_price: Option<f64>,
    revenue: Option<f64>,
}

fn generate(rng: &mut SimpleRng) -> Vec<Sale> {
    (0..ROWS)
        .map(|i| {
            let region = REGIONS[rng.below(REGIONS.len())];
            let (product, list_price) = PRODUCTS[rng.below(PRODUCTS.len())];
            let channel = CHANNELS[rng.below(CHANNELS.len())];
            let base = if channel == "Wholesale" { 40.0 } else { 8.0 };
            let units = rng.gauss(base, base / 4.0).round().max(1.0) as i64;
            let discount = if channel == "Wholesale" { 0.8 } else { 1.0 };
            let unit_price = (rng.below(30) != 0)
                .then(|| ((list_price * discount + rng.gauss(0.0, 0.2)) * 100.0).round() / 100.0);
            Sale {
                order_id: 1000 + i as i64,
                region,
                product,
                channel,
                units,
                unit_price,
                revenue: unit_price.map(|p| (p * units as f64 * 100.0).round() / 100.0),
            }
        })
        .collect()
}

fn write_csv(path: &str, sales: &[Sale]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["order_id", "region", "product", "channel", "units", "unit_price", "revenue"])?;
    let fmt = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    for s in sales {
        writer.write_record([
            s.order_id.to_string(),
            s.region.to_string(),
            s.product.to_string(),
            s.channel.to_string(),
            s.units.to_string(),
            fmt(s.unit_price),
            fmt(s.revenue),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, sales: &[Sale]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("order_id", DataType::Int64, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("product", DataType::Utf8, false),
        Field::new("channel", DataType::Utf8, false),
        Field::new("units", DataType::Int64, false),
        Field::new("unit_price", DataType::Float64, true),
        Field::new("revenue", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(sales.iter().map(|s| s.order_id))),
            Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.region))),
            Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.product))),
            Arc::new(StringArray::from_iter_values(sales.iter().map(|s| s.channel))),
            Arc::new(Int64Array::from_iter_values(sales.iter().map(|s| s.units))),
            Arc::new(Float64Array::from(sales.iter().map(|s| s.unit_price).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(sales.iter().map(|s| s.revenue).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let sales = generate(&mut rng);

    write_csv("sample_sales.csv", &sales)?;
    write_parquet("sample_sales.parquet", &sales)?;

    println!(
        "Wrote {} orders to sample_sales.csv and sample_sales.parquet",
        sales.len()
    );
    Ok(())
}
