use std::{env, error::Error, fs, path::Path};

use strum::VariantArray;
use torus_snake_rl::{
    algo::AgentKind,
    driver::{Driver, DriverConfig},
};

const GRID_SIZE: usize = 10;
const NUM_EPISODES: usize = 2000;
const BLOCK: usize = 100;

/// Usage: `cargo run --example td_snake -- ["Q-Learning" | "SARSA" | "Expected SARSA"] [episodes]`
fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    let kinds = match args.next() {
        Some(name) => vec![AgentKind::from_name(&name)?],
        None => AgentKind::VARIANTS.to_vec(),
    };
    let episodes = match args.next() {
        Some(n) => n.parse()?,
        None => NUM_EPISODES,
    };

    let path = Path::new("demos/out");
    fs::create_dir_all(path)?;
    let mut wtr = csv::Writer::from_path(path.join("td_snake.csv"))?;
    wtr.write_record(["agent", "episode", "score", "steps", "truncated"])?;

    let mut driver = Driver::new(DriverConfig {
        grid_size: GRID_SIZE,
        seed: Some(0),
        max_steps_per_episode: Some(10_000),
        ..Default::default()
    })?;

    for kind in kinds {
        driver.select_agent(kind);
        let start = driver.history().len();
        for i in 0..episodes {
            let sample = driver
                .run_episode()
                .expect("driver is not in manual mode");
            wtr.write_record(&[
                kind.to_string(),
                i.to_string(),
                sample.score.to_string(),
                sample.steps.to_string(),
                sample.truncated.to_string(),
            ])?;
        }

        let scores: Vec<f64> = driver.history()[start..]
            .iter()
            .map(|s| s.score as f64)
            .collect();
        let block_means: Vec<String> = scores
            .chunks(BLOCK)
            .map(|c| format!("{:.2}", c.iter().sum::<f64>() / c.len() as f64))
            .collect();
        println!(
            "{kind}: {} states, epsilon {:.3}, mean score per {BLOCK} episodes: {}",
            driver.active_agent().table_len(),
            driver.active_agent().epsilon(),
            block_means.join(" "),
        );
    }

    wtr.flush()?;
    Ok(())
}
