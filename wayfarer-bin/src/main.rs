use std::env;
use std::process::ExitCode;

use wayfarer::Engine;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        eprintln!(
            "usage: {} <nodes.csv> <edges.csv> <from_id> <to_id> [profile] [rain]",
            args[0]
        );
        return ExitCode::FAILURE;
    }

    let profile = args.get(5).map_or("standard", String::as_str);
    let rain = args.get(6).is_some_and(|flag| flag == "rain");

    match run(&args[1], &args[2], &args[3], &args[4], profile, rain) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    nodes_csv: &str,
    edges_csv: &str,
    from_id: &str,
    to_id: &str,
    profile: &str,
    rain: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let instant = std::time::Instant::now();
    let engine = Engine::from_csv(nodes_csv, edges_csv)?;
    log::info!("engine ready in {:?}", instant.elapsed());

    let itinerary = engine.route_details(from_id, to_id, profile, rain)?;
    if itinerary.path.is_empty() {
        eprintln!("no route from {from_id} to {to_id} for profile {profile}");
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&itinerary)?);
    Ok(())
}
