#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::cast_precision_loss)]

use chained_hash::{BucketHasher, HashTable, MultiplicativeHash, PolynomialHash, StdHash};
use plotters::prelude::*;
use rand::{Rng, distr::Alphanumeric};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// Largest table measured; smaller ones take a prefix of the same keys
const MAX_KEYS: usize = 100_000;
const NUM_STEPS: usize = 10;

// Hash strategies to compare
const METHODS: [&str; 3] = ["Polynomial", "Multiplicative", "Std"];

#[derive(Debug, Clone, Copy)]
struct ChainStats {
    /// Mean length of the non-empty chains
    average: f64,
    longest: usize,
    /// Fraction of buckets holding no entry
    empty_share: f64,
}

fn random_keys(count: usize) -> Vec<String> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| {
            let len = rng.random_range(4..16);
            (&mut rng).sample_iter(Alphanumeric).take(len).map(char::from).collect::<String>()
        })
        .collect()
}

// Fills a table through `hasher` and summarizes its bucket occupancy
fn chain_stats<H: BucketHasher<String>>(hasher: H, keys: &[String]) -> ChainStats {
    let mut table = HashTable::with_hasher(hasher);
    for (value, key) in keys.iter().enumerate() {
        table.insert(key.clone(), value);
    }

    let lengths = table.chain_lengths();
    let occupied: Vec<usize> = lengths.iter().copied().filter(|&len| len > 0).collect();
    let average = if occupied.is_empty() {
        0.0
    } else {
        occupied.iter().sum::<usize>() as f64 / occupied.len() as f64
    };

    ChainStats {
        average,
        longest: occupied.iter().copied().max().unwrap_or(0),
        empty_share: (lengths.len() - occupied.len()) as f64 / lengths.len() as f64,
    }
}

fn draw_chart(
    path: &str,
    caption: &str,
    y_desc: &str,
    key_counts: &[usize],
    series: &[Vec<f64>],
) -> Result<(), Box<dyn std::error::Error>> {
    let font_family = "sans-serif";
    let colors = [
        RGBColor(220, 50, 50), // Bright red
        RGBColor(50, 90, 220), // Bright blue
        RGBColor(50, 180, 50), // Bright green
    ];

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_y = series.iter().flatten().fold(0.0_f64, |max, &y| max.max(y)) * 1.1; // Add 10% margin
    let last = key_counts.len().saturating_sub(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, (font_family, 35))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .right_y_label_area_size(10)
        .build_cartesian_2d(0..last, 0.0..max_y.max(1.0))?;

    chart
        .configure_mesh()
        .x_labels(key_counts.len())
        .x_label_formatter(&|x| key_counts.get(*x).map(ToString::to_string).unwrap_or_default())
        .x_desc("Number of Keys Inserted")
        .y_desc(y_desc)
        .axis_desc_style((font_family, 16))
        .draw()?;

    for (method_idx, (&method, points)) in METHODS.iter().zip(series).enumerate() {
        let color = colors[method_idx % colors.len()];
        let line_style = ShapeStyle::from(&color).stroke_width(2);

        chart
            .draw_series(LineSeries::new(
                points.iter().enumerate().map(|(i, &y)| (i, y)),
                line_style,
            ))?
            .label(method)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series(
            points.iter().enumerate().map(|(i, &y)| Circle::new((i, y), 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chained_hash=info,chain_stats=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let key_counts: Vec<usize> = (1..=NUM_STEPS).map(|step| MAX_KEYS * step / NUM_STEPS).collect();

    // Generate random keys once so every strategy sees the same input
    let keys = random_keys(MAX_KEYS);

    let mut average_chain: Vec<Vec<f64>> = vec![Vec::new(); METHODS.len()];
    let mut longest_chain: Vec<Vec<f64>> = vec![Vec::new(); METHODS.len()];

    for &count in &key_counts {
        info!(keys = count, "measuring chain lengths");
        let sample = &keys[..count];

        let results = [
            chain_stats(PolynomialHash, sample),
            chain_stats(MultiplicativeHash::default(), sample),
            chain_stats(StdHash, sample),
        ];

        for (method_idx, (&method, stats)) in METHODS.iter().zip(&results).enumerate() {
            info!(
                method,
                average = stats.average,
                longest = stats.longest,
                empty = stats.empty_share,
                "chain statistics"
            );
            average_chain[method_idx].push(stats.average);
            longest_chain[method_idx].push(stats.longest as f64);
        }
    }

    draw_chart(
        "average_chain_length.png",
        "Average Length of Non-Empty Chains",
        "Entries per Chain",
        &key_counts,
        &average_chain,
    )?;
    draw_chart(
        "longest_chain.png",
        "Longest Chain",
        "Entries in Longest Chain",
        &key_counts,
        &longest_chain,
    )?;

    info!("generated average_chain_length.png and longest_chain.png");

    Ok(())
}
