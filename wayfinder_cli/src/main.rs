// CLI entry point for one-shot route queries.
//
// Loads a map file, builds the route graph, routes from a live position to a
// destination id, and prints the route plus turn instructions as JSON on
// stdout. Logs go to stderr (filter with `RUST_LOG`, default `warn`), so the
// JSON output can be piped.
//
// Usage:
//   wayfind --map <FILE> --from <X,Y,Z> --to <ID> [OPTIONS]
//     --config <FILE>     RouteConfig JSON (defaults for missing fields)
//     --heading <DEG>     Current heading, clockwise from +Z (default: 0)
//     --compact           Single-line JSON

use std::path::PathBuf;
use std::process::exit;

use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wayfinder_core::turn::{TurnInstruction, instructions_for_route};
use wayfinder_core::{MapData, RouteConfig, RouteResult, Vec3, build_route_graph, find_path};

struct Args {
    map: PathBuf,
    config: Option<PathBuf>,
    from: Vec3,
    to: String,
    heading: f32,
    compact: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    route: RouteResult,
    instructions: Vec<TurnInstruction>,
    skipped_records: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();

    let config = match &args.config {
        Some(path) => match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|json| RouteConfig::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => fail(&format!("Failed to load config {}: {e}", path.display())),
        },
        None => RouteConfig::default(),
    };

    let map = match MapData::from_path(&args.map) {
        Ok(map) => map,
        Err(e) => fail(&format!("Failed to load map {}: {e}", args.map.display())),
    };

    let report = build_route_graph(&map, &config);
    let mut graph = report.graph;
    info!(map = %args.map.display(), from = %args.from, to = %args.to, "routing");

    let route = match find_path(&mut graph, args.from, &args.to, &config) {
        Ok(route) => route,
        Err(e) => fail(&format!("No route: {e}")),
    };

    let output = Output {
        instructions: instructions_for_route(&route, args.heading, &config.turn),
        route,
        skipped_records: report.skipped.len(),
    };
    let json = if args.compact {
        serde_json::to_string(&output)
    } else {
        serde_json::to_string_pretty(&output)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&format!("Failed to serialize route: {e}")),
    }
}

fn fail(message: &str) -> ! {
    error!("{message}");
    eprintln!("{message}");
    exit(1);
}

/// Parse `x,y,z` into a position.
fn parse_vec3(s: &str) -> Option<Vec3> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    match parts[..] {
        [x, y, z] => Some(Vec3::new(x, y, z)).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Parse command-line arguments. Plain `std::env::args()` matching.
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut map = None;
    let mut config = None;
    let mut from = None;
    let mut to = None;
    let mut heading = 0.0;
    let mut compact = false;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--map" => {
                i += 1;
                map = Some(
                    args.get(i)
                        .map(PathBuf::from)
                        .unwrap_or_else(|| usage_error("--map requires a file path")),
                );
            }
            "--config" => {
                i += 1;
                config = Some(
                    args.get(i)
                        .map(PathBuf::from)
                        .unwrap_or_else(|| usage_error("--config requires a file path")),
                );
            }
            "--from" => {
                i += 1;
                from = Some(
                    args.get(i)
                        .and_then(|s| parse_vec3(s))
                        .unwrap_or_else(|| usage_error("--from requires a position as X,Y,Z")),
                );
            }
            "--to" => {
                i += 1;
                to = Some(
                    args.get(i)
                        .cloned()
                        .unwrap_or_else(|| usage_error("--to requires a destination id")),
                );
            }
            "--heading" => {
                i += 1;
                heading = args
                    .get(i)
                    .and_then(|s| s.parse::<f32>().ok())
                    .filter(|h| h.is_finite())
                    .unwrap_or_else(|| usage_error("--heading requires a number of degrees"));
            }
            "--compact" => compact = true,
            "--help" | "-h" => {
                print_usage();
                exit(0);
            }
            other => usage_error(&format!("Unknown argument: {other}")),
        }
        i += 1;
    }

    match (map, from, to) {
        (Some(map), Some(from), Some(to)) => Args {
            map,
            config,
            from,
            to,
            heading,
            compact,
        },
        _ => usage_error("--map, --from and --to are required"),
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("{message}");
    print_usage();
    exit(1);
}

fn print_usage() {
    println!("Usage: wayfind --map <FILE> --from <X,Y,Z> --to <ID> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --map <FILE>        Map JSON (beacons, waypoints, doorways)");
    println!("  --from <X,Y,Z>      Live position in map coordinates");
    println!("  --to <ID>           Destination node id");
    println!("  --config <FILE>     Route config JSON (optional)");
    println!("  --heading <DEG>     Current heading, clockwise from +Z (default: 0)");
    println!("  --compact           Print single-line JSON");
    println!("  --help, -h          Show this help");
}
